//! Handlers for the persisted notification inbox.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/me/notifications` | Newest first |
//! | `POST` | `/notifications/{id}/read` | 404 unless the caller owns it |

use axum::{
  Json, Router,
  extract::{Path, State},
  http::StatusCode,
  routing::{get, post},
};
use ideaboard_api::{ApiError, Caller};
use ideaboard_core::{Entity, Error};
use ideaboard_store_sqlite::{SqliteStore, StoredNotification};
use uuid::Uuid;

pub fn router(store: SqliteStore) -> Router<()> {
  Router::new()
    .route("/me/notifications", get(list))
    .route("/notifications/{id}/read", post(mark_read))
    .with_state(store)
}

/// `GET /me/notifications`
async fn list(
  State(store): State<SqliteStore>,
  Caller(me): Caller,
) -> Result<Json<Vec<StoredNotification>>, ApiError> {
  let inbox = store.notifications_for(me).await.map_err(Error::storage)?;
  Ok(Json(inbox))
}

/// `POST /notifications/{id}/read`
async fn mark_read(
  State(store): State<SqliteStore>,
  Caller(me): Caller,
  Path(notification_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  let found = store
    .mark_notification_read(me, notification_id)
    .await
    .map_err(Error::storage)?;
  if !found {
    return Err(Error::not_found(Entity::Notification, notification_id).into());
  }
  Ok(StatusCode::NO_CONTENT)
}
