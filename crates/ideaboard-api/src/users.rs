//! Handlers for `/users` and `/me` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/users` | Body: `{"username":"...","role":"EMPLOYEE"}` |
//! | `GET`  | `/users/{id}/progress` | XP, level and progress within level |
//! | `GET`  | `/me/progress` | Same, for the caller |
//! | `GET`  | `/me/likes` | Weekly like usage |
//! | `GET`  | `/me/unread` | Per-group unread counts and their total |
//! | `GET`  | `/me/unread/total` | Just the total |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use ideaboard_core::{
  clock::Clock,
  group::UnreadSummary,
  notification::Notifier,
  store::EngagementStore,
  user::{UserProgress, UserRole},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Shared, caller::Caller, error::ApiError};

// ─── Create ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub username: String,
  #[serde(default)]
  pub role:     UserRole,
}

/// `POST /users`: returns 201 + the new user.
pub async fn create<S, N, C>(
  State(engine): State<Shared<S, N, C>>,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: EngagementStore,
  N: Notifier,
  C: Clock,
{
  let user = engine.create_user(&body.username, body.role).await?;
  Ok((StatusCode::CREATED, Json(user)))
}

// ─── Progress ────────────────────────────────────────────────────────────────

/// `GET /users/{id}/progress`
pub async fn progress<S, N, C>(
  State(engine): State<Shared<S, N, C>>,
  Path(user_id): Path<Uuid>,
) -> Result<Json<UserProgress>, ApiError>
where
  S: EngagementStore,
  N: Notifier,
  C: Clock,
{
  Ok(Json(engine.user_progress(user_id).await?))
}

/// `GET /me/progress`
pub async fn my_progress<S, N, C>(
  State(engine): State<Shared<S, N, C>>,
  Caller(me): Caller,
) -> Result<Json<UserProgress>, ApiError>
where
  S: EngagementStore,
  N: Notifier,
  C: Clock,
{
  Ok(Json(engine.user_progress(me).await?))
}

// ─── Likes ───────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct LikeUsage {
  pub used:      u64,
  pub remaining: u32,
}

/// `GET /me/likes`
pub async fn my_likes<S, N, C>(
  State(engine): State<Shared<S, N, C>>,
  Caller(me): Caller,
) -> Result<Json<LikeUsage>, ApiError>
where
  S: EngagementStore,
  N: Notifier,
  C: Clock,
{
  let used = engine.weekly_likes_used(me).await?;
  let remaining = engine.remaining_likes(me).await?;
  Ok(Json(LikeUsage { used, remaining }))
}

// ─── Unread ──────────────────────────────────────────────────────────────────

/// `GET /me/unread`
pub async fn my_unread<S, N, C>(
  State(engine): State<Shared<S, N, C>>,
  Caller(me): Caller,
) -> Result<Json<UnreadSummary>, ApiError>
where
  S: EngagementStore,
  N: Notifier,
  C: Clock,
{
  Ok(Json(engine.unread_summary(me).await?))
}

#[derive(Debug, Serialize)]
pub struct UnreadTotal {
  pub total: u64,
}

/// `GET /me/unread/total`
pub async fn my_unread_total<S, N, C>(
  State(engine): State<Shared<S, N, C>>,
  Caller(me): Caller,
) -> Result<Json<UnreadTotal>, ApiError>
where
  S: EngagementStore,
  N: Notifier,
  C: Clock,
{
  Ok(Json(UnreadTotal { total: engine.total_unread(me).await? }))
}
