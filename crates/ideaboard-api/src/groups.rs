//! Handlers for idea group endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/groups/{id}/members` | Join as MEMBER |
//! | `DELETE` | `/groups/{id}/members` | Leave; the creator cannot |
//! | `POST`   | `/groups/{id}/messages` | Body: `{"content":"..."}`; members only |
//! | `POST`   | `/groups/{id}/read` | Mark every message read |
//! | `POST`   | `/messages/{id}/read` | Mark one message read |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use ideaboard_core::{clock::Clock, notification::Notifier, store::EngagementStore};
use serde::Serialize;
use uuid::Uuid;

use crate::{Shared, caller::Caller, error::ApiError, ideas::ContentBody};

// ─── Membership ──────────────────────────────────────────────────────────────

/// `POST /groups/{id}/members`
pub async fn join<S, N, C>(
  State(engine): State<Shared<S, N, C>>,
  Caller(me): Caller,
  Path(group_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError>
where
  S: EngagementStore,
  N: Notifier,
  C: Clock,
{
  let member = engine.join_group(me, group_id).await?;
  Ok((StatusCode::CREATED, Json(member)))
}

/// `DELETE /groups/{id}/members`
pub async fn leave<S, N, C>(
  State(engine): State<Shared<S, N, C>>,
  Caller(me): Caller,
  Path(group_id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: EngagementStore,
  N: Notifier,
  C: Clock,
{
  engine.leave_group(me, group_id).await?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Messages ────────────────────────────────────────────────────────────────

/// `POST /groups/{id}/messages`
pub async fn send<S, N, C>(
  State(engine): State<Shared<S, N, C>>,
  Caller(me): Caller,
  Path(group_id): Path<Uuid>,
  Json(body): Json<ContentBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: EngagementStore,
  N: Notifier,
  C: Clock,
{
  let message = engine.send_group_message(me, group_id, &body.content).await?;
  Ok((StatusCode::CREATED, Json(message)))
}

#[derive(Debug, Serialize)]
pub struct Marked<T> {
  pub marked: T,
}

/// `POST /groups/{id}/read`: `{"marked": <messages newly read>}`
pub async fn read_all<S, N, C>(
  State(engine): State<Shared<S, N, C>>,
  Caller(me): Caller,
  Path(group_id): Path<Uuid>,
) -> Result<Json<Marked<u64>>, ApiError>
where
  S: EngagementStore,
  N: Notifier,
  C: Clock,
{
  let marked = engine.mark_group_read(me, group_id).await?;
  Ok(Json(Marked { marked }))
}

/// `POST /messages/{id}/read`: `{"marked": <receipt created>}`
pub async fn read_one<S, N, C>(
  State(engine): State<Shared<S, N, C>>,
  Caller(me): Caller,
  Path(message_id): Path<Uuid>,
) -> Result<Json<Marked<bool>>, ApiError>
where
  S: EngagementStore,
  N: Notifier,
  C: Clock,
{
  let marked = engine.mark_message_read(me, message_id).await?;
  Ok(Json(Marked { marked }))
}
