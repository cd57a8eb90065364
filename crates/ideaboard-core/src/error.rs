//! Error types for `ideaboard-core`.

use thiserror::Error;
use uuid::Uuid;

/// The kind of entity an unresolved id referred to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum Entity {
  User,
  Idea,
  ChecklistItem,
  Like,
  Comment,
  Group,
  Membership,
  Message,
  Badge,
  Notification,
  Reaction,
  Survey,
  SurveyOption,
}

/// Every failure the engagement engine can report.
///
/// All variants except [`Error::StorageFailure`] are business-rule outcomes
/// that the caller is expected to translate into a user-facing response.
#[derive(Debug, Error)]
pub enum Error {
  #[error("{entity} not found: {id}")]
  NotFound { entity: Entity, id: Uuid },

  #[error("forbidden: {0}")]
  Forbidden(String),

  #[error("invalid operation: {0}")]
  InvalidOperation(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("weekly like quota of {limit} exhausted; it resets on Sunday at midnight")]
  QuotaExceeded { limit: u32 },

  #[error("checklist of idea {0} is locked because the idea is completed")]
  ChecklistLocked(Uuid),

  #[error("validation failed: {0}")]
  Validation(String),

  #[error("storage failure: {0}")]
  StorageFailure(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub fn not_found(entity: Entity, id: Uuid) -> Self {
    Self::NotFound { entity, id }
  }

  /// Wrap a backend error without altering it.
  pub fn storage<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::StorageFailure(Box::new(err))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
