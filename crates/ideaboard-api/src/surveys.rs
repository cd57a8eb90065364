//! Handlers for `/surveys` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/surveys` | Body: [`SurveyDraft`]; returns 201 + the survey as seen by its creator |
//! | `GET`    | `/surveys/{id}` | Includes the options the caller voted for |
//! | `DELETE` | `/surveys/{id}` | Creator or admin |
//! | `POST`   | `/surveys/{id}/votes` | Body: `{"option_ids":[...]}` |
//! | `POST`   | `/surveys/{id}/close` | Creator or admin |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
};
use ideaboard_core::{
  clock::Clock, notification::Notifier, store::EngagementStore, survey::SurveyView,
};
use ideaboard_engine::SurveyDraft;
use serde::Deserialize;
use uuid::Uuid;

use crate::{Shared, caller::Caller, error::ApiError};

/// `POST /surveys`
pub async fn create<S, N, C>(
  State(engine): State<Shared<S, N, C>>,
  Caller(me): Caller,
  Json(draft): Json<SurveyDraft>,
) -> Result<(StatusCode, Json<SurveyView>), ApiError>
where
  S: EngagementStore,
  N: Notifier,
  C: Clock,
{
  let view = engine.create_survey(me, draft).await?;
  Ok((StatusCode::CREATED, Json(view)))
}

/// `GET /surveys/{id}`
pub async fn get_one<S, N, C>(
  State(engine): State<Shared<S, N, C>>,
  Caller(me): Caller,
  Path(survey_id): Path<Uuid>,
) -> Result<Json<SurveyView>, ApiError>
where
  S: EngagementStore,
  N: Notifier,
  C: Clock,
{
  Ok(Json(engine.get_survey(me, survey_id).await?))
}

/// `DELETE /surveys/{id}`
pub async fn delete_one<S, N, C>(
  State(engine): State<Shared<S, N, C>>,
  Caller(me): Caller,
  Path(survey_id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: EngagementStore,
  N: Notifier,
  C: Clock,
{
  engine.delete_survey(me, survey_id).await?;
  Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct VoteBody {
  pub option_ids: Vec<Uuid>,
}

/// `POST /surveys/{id}/votes`
pub async fn vote<S, N, C>(
  State(engine): State<Shared<S, N, C>>,
  Caller(me): Caller,
  Path(survey_id): Path<Uuid>,
  Json(body): Json<VoteBody>,
) -> Result<Json<SurveyView>, ApiError>
where
  S: EngagementStore,
  N: Notifier,
  C: Clock,
{
  Ok(Json(engine.vote_survey(me, survey_id, body.option_ids).await?))
}

/// `POST /surveys/{id}/close`
pub async fn close<S, N, C>(
  State(engine): State<Shared<S, N, C>>,
  Caller(me): Caller,
  Path(survey_id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: EngagementStore,
  N: Notifier,
  C: Clock,
{
  engine.close_survey(me, survey_id).await?;
  Ok(StatusCode::NO_CONTENT)
}
