//! Outbound notification requests and the collaborator that receives them.
//!
//! The engine only decides who is notified and with what content. Delivery
//! (push, email, in-app inbox) belongs to the [`Notifier`] implementation.

use std::future::Future;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
  Like,
  Comment,
  Reaction,
  StatusChange,
  BadgeEarned,
  LevelUp,
  Message,
  Mention,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
  pub target_user:         Uuid,
  pub kind:                NotificationKind,
  pub title:               String,
  pub message:             String,
  pub link:                Option<String>,
  pub source_user:         Option<Uuid>,
  /// e.g. `"Idea"`, `"Badge"`, `"IdeaGroup"`.
  pub related_entity_type: Option<String>,
  pub related_entity_id:   Option<Uuid>,
}

/// Receiver of notification requests emitted by the engine.
///
/// Called only after the originating unit of work has been persisted; a
/// failure here is logged by the caller and does not undo that work.
pub trait Notifier: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn notify(
    &self,
    notification: Notification,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
