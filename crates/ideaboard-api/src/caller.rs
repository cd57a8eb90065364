//! The identity a request acts as.
//!
//! Authentication happens upstream; by the time a request reaches this
//! router the gateway has put the authenticated user's id in
//! [`CALLER_HEADER`].

use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::error::ApiError;

pub const CALLER_HEADER: &str = "x-user-id";

/// The user id the request acts as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller(pub Uuid);

impl<S> FromRequestParts<S> for Caller
where
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    _state: &S,
  ) -> Result<Self, Self::Rejection> {
    parts
      .headers
      .get(CALLER_HEADER)
      .and_then(|v| v.to_str().ok())
      .and_then(|v| Uuid::parse_str(v.trim()).ok())
      .map(Caller)
      .ok_or(ApiError::Unauthenticated)
  }
}
