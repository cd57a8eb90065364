//! Handlers for `/ideas` endpoints and the reactions on them.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/ideas` | Body: [`IdeaDraft`]; returns 201 + idea, checklist and group |
//! | `GET`    | `/ideas/{id}` | Idea with its ordered checklist |
//! | `DELETE` | `/ideas/{id}` | Admin only |
//! | `PUT`    | `/ideas/{id}/status` | Body: `{"status":"COMPLETED"}` |
//! | `POST`   | `/ideas/{id}/like` | Spends one weekly like |
//! | `DELETE` | `/ideas/{id}/like` | Does not refund the like |
//! | `POST`   | `/ideas/{id}/comments` | Body: `{"content":"..."}` |
//! | `DELETE` | `/comments/{id}` | Author or admin |
//! | `POST`   | `/comments/{id}/reactions` | Body: `{"emoji":"🎉"}`; 409 on a repeat |
//! | `DELETE` | `/comments/{id}/reactions/{emoji}` | Removes the caller's reaction |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use ideaboard_core::{
  clock::Clock,
  idea::{Idea, IdeaStatus, IdeaView, Reaction},
  notification::Notifier,
  store::EngagementStore,
};
use ideaboard_engine::IdeaDraft;
use serde::Deserialize;
use uuid::Uuid;

use crate::{Shared, caller::Caller, error::ApiError};

// ─── Ideas ───────────────────────────────────────────────────────────────────

/// `POST /ideas`
pub async fn submit<S, N, C>(
  State(engine): State<Shared<S, N, C>>,
  Caller(me): Caller,
  Json(draft): Json<IdeaDraft>,
) -> Result<impl IntoResponse, ApiError>
where
  S: EngagementStore,
  N: Notifier,
  C: Clock,
{
  let submitted = engine.submit_idea(me, draft).await?;
  Ok((StatusCode::CREATED, Json(submitted)))
}

/// `GET /ideas/{id}`
pub async fn get_one<S, N, C>(
  State(engine): State<Shared<S, N, C>>,
  Path(idea_id): Path<Uuid>,
) -> Result<Json<IdeaView>, ApiError>
where
  S: EngagementStore,
  N: Notifier,
  C: Clock,
{
  Ok(Json(engine.get_idea(idea_id).await?))
}

/// `DELETE /ideas/{id}`
pub async fn delete_one<S, N, C>(
  State(engine): State<Shared<S, N, C>>,
  Caller(me): Caller,
  Path(idea_id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: EngagementStore,
  N: Notifier,
  C: Clock,
{
  engine.delete_idea(me, idea_id).await?;
  Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct StatusBody {
  pub status: IdeaStatus,
}

/// `PUT /ideas/{id}/status`
pub async fn set_status<S, N, C>(
  State(engine): State<Shared<S, N, C>>,
  Caller(me): Caller,
  Path(idea_id): Path<Uuid>,
  Json(body): Json<StatusBody>,
) -> Result<Json<Idea>, ApiError>
where
  S: EngagementStore,
  N: Notifier,
  C: Clock,
{
  Ok(Json(engine.update_idea_status(me, idea_id, body.status).await?))
}

// ─── Likes ───────────────────────────────────────────────────────────────────

/// `POST /ideas/{id}/like`
pub async fn like<S, N, C>(
  State(engine): State<Shared<S, N, C>>,
  Caller(me): Caller,
  Path(idea_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError>
where
  S: EngagementStore,
  N: Notifier,
  C: Clock,
{
  let like = engine.like_idea(me, idea_id).await?;
  Ok((StatusCode::CREATED, Json(like)))
}

/// `DELETE /ideas/{id}/like`
pub async fn unlike<S, N, C>(
  State(engine): State<Shared<S, N, C>>,
  Caller(me): Caller,
  Path(idea_id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: EngagementStore,
  N: Notifier,
  C: Clock,
{
  engine.unlike_idea(me, idea_id).await?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Comments ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ContentBody {
  pub content: String,
}

/// `POST /ideas/{id}/comments`
pub async fn comment<S, N, C>(
  State(engine): State<Shared<S, N, C>>,
  Caller(me): Caller,
  Path(idea_id): Path<Uuid>,
  Json(body): Json<ContentBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: EngagementStore,
  N: Notifier,
  C: Clock,
{
  let comment = engine.post_comment(me, idea_id, &body.content).await?;
  Ok((StatusCode::CREATED, Json(comment)))
}

/// `DELETE /comments/{id}`
pub async fn delete_comment<S, N, C>(
  State(engine): State<Shared<S, N, C>>,
  Caller(me): Caller,
  Path(comment_id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: EngagementStore,
  N: Notifier,
  C: Clock,
{
  engine.delete_comment(me, comment_id).await?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Reactions ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ReactionBody {
  pub emoji: String,
}

/// `POST /comments/{id}/reactions`
pub async fn react<S, N, C>(
  State(engine): State<Shared<S, N, C>>,
  Caller(me): Caller,
  Path(comment_id): Path<Uuid>,
  Json(body): Json<ReactionBody>,
) -> Result<(StatusCode, Json<Reaction>), ApiError>
where
  S: EngagementStore,
  N: Notifier,
  C: Clock,
{
  let reaction = engine.add_reaction(me, comment_id, &body.emoji).await?;
  Ok((StatusCode::CREATED, Json(reaction)))
}

/// `DELETE /comments/{id}/reactions/{emoji}`
pub async fn unreact<S, N, C>(
  State(engine): State<Shared<S, N, C>>,
  Caller(me): Caller,
  Path((comment_id, emoji)): Path<(Uuid, String)>,
) -> Result<StatusCode, ApiError>
where
  S: EngagementStore,
  N: Notifier,
  C: Clock,
{
  engine.remove_reaction(me, comment_id, &emoji).await?;
  Ok(StatusCode::NO_CONTENT)
}
