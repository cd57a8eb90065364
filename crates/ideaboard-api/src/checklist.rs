//! Handlers for `/ideas/{id}/checklist` endpoints.
//!
//! Every response is the changed item (absent after a delete), the idea as
//! written and the progress update that was applied.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/ideas/{id}/checklist` | Body: `{"title":"..."}`; appended last |
//! | `PUT`    | `/ideas/{id}/checklist/{item}` | Body: `{"title":"..."}` |
//! | `DELETE` | `/ideas/{id}/checklist/{item}` | |
//! | `POST`   | `/ideas/{id}/checklist/{item}/toggle` | May move CONCEPT to IN_PROGRESS |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use ideaboard_core::{
  clock::Clock,
  notification::Notifier,
  store::{ChecklistApplied, EngagementStore},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{Shared, caller::Caller, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct TitleBody {
  pub title: String,
}

/// `POST /ideas/{id}/checklist`
pub async fn create<S, N, C>(
  State(engine): State<Shared<S, N, C>>,
  Caller(me): Caller,
  Path(idea_id): Path<Uuid>,
  Json(body): Json<TitleBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: EngagementStore,
  N: Notifier,
  C: Clock,
{
  let applied = engine.create_checklist_item(me, idea_id, &body.title).await?;
  Ok((StatusCode::CREATED, Json(applied)))
}

/// `PUT /ideas/{id}/checklist/{item}`
pub async fn rename<S, N, C>(
  State(engine): State<Shared<S, N, C>>,
  Caller(me): Caller,
  Path((idea_id, item_id)): Path<(Uuid, Uuid)>,
  Json(body): Json<TitleBody>,
) -> Result<Json<ChecklistApplied>, ApiError>
where
  S: EngagementStore,
  N: Notifier,
  C: Clock,
{
  Ok(Json(
    engine
      .update_checklist_item(me, idea_id, item_id, &body.title)
      .await?,
  ))
}

/// `DELETE /ideas/{id}/checklist/{item}`
pub async fn delete_one<S, N, C>(
  State(engine): State<Shared<S, N, C>>,
  Caller(me): Caller,
  Path((idea_id, item_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ChecklistApplied>, ApiError>
where
  S: EngagementStore,
  N: Notifier,
  C: Clock,
{
  Ok(Json(engine.delete_checklist_item(me, idea_id, item_id).await?))
}

/// `POST /ideas/{id}/checklist/{item}/toggle`
pub async fn toggle<S, N, C>(
  State(engine): State<Shared<S, N, C>>,
  Caller(me): Caller,
  Path((idea_id, item_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ChecklistApplied>, ApiError>
where
  S: EngagementStore,
  N: Notifier,
  C: Clock,
{
  Ok(Json(engine.toggle_checklist_item(me, idea_id, item_id).await?))
}
