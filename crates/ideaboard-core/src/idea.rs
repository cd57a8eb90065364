//! Ideas and the records owned by them: checklist items, likes, comments.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

pub const MAX_IDEA_TITLE_LEN: usize = 200;
pub const MAX_CHECKLIST_TITLE_LEN: usize = 200;
pub const MAX_COMMENT_LEN: usize = 200;
pub const MAX_CATEGORY_LEN: usize = 100;
pub const MAX_EMOJI_LEN: usize = 20;

// ─── Status ──────────────────────────────────────────────────────────────────

/// Lifecycle state of an idea. See [`crate::progress`] for the transitions.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum IdeaStatus {
  Concept,
  InProgress,
  Completed,
}

impl IdeaStatus {
  /// Human-readable label used in notification text.
  pub fn label(self) -> &'static str {
    match self {
      Self::Concept => "Concept",
      Self::InProgress => "In progress",
      Self::Completed => "Completed",
    }
  }
}

// ─── Idea ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Idea {
  pub idea_id:             Uuid,
  pub author_id:           Uuid,
  pub title:               String,
  pub description:         String,
  pub category:            String,
  pub tags:                Vec<String>,
  pub status:              IdeaStatus,
  /// `round(100 * completed / total)` whenever the checklist is non-empty.
  pub progress_percentage: u8,
  /// Always equal to the number of rows in the likes table for this idea.
  pub like_count:          u32,
  /// Always equal to the number of comments on this idea.
  pub comment_count:       u32,
  pub view_count:          u32,
  pub created_at:          DateTime<Utc>,
  pub updated_at:          DateTime<Utc>,
}

/// Input to [`crate::store::EngagementStore::create_idea`]. Status, progress
/// and counters are always initialised by the store.
#[derive(Debug, Clone)]
pub struct NewIdea {
  pub author_id:   Uuid,
  pub title:       String,
  pub description: String,
  pub category:    String,
  pub tags:        Vec<String>,
  /// Initial checklist titles, already trimmed and non-blank.
  pub checklist:   Vec<String>,
}

/// A single to-do owned by an idea.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChecklistItem {
  pub item_id:          Uuid,
  pub idea_id:          Uuid,
  pub title:            String,
  pub is_completed:     bool,
  /// Stable insertion order; never renumbered on delete.
  pub ordinal_position: u32,
  pub created_at:       DateTime<Utc>,
}

/// An idea together with its ordered checklist.
#[derive(Debug, Clone, Serialize)]
pub struct IdeaView {
  pub idea:      Idea,
  pub checklist: Vec<ChecklistItem>,
}

// ─── Reactions ───────────────────────────────────────────────────────────────

/// At most one per `(user_id, idea_id)`; never on the user's own idea.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Like {
  pub like_id:    Uuid,
  pub user_id:    Uuid,
  pub idea_id:    Uuid,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
  pub comment_id:     Uuid,
  pub idea_id:        Uuid,
  pub author_id:      Uuid,
  pub content:        String,
  /// Always equal to the number of reactions on this comment.
  pub reaction_count: u32,
  pub created_at:     DateTime<Utc>,
}

/// An emoji reaction. At most one per `(comment_id, user_id, emoji)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
  pub comment_id: Uuid,
  pub user_id:    Uuid,
  pub emoji:      String,
  pub created_at: DateTime<Utc>,
}

// ─── Validation ──────────────────────────────────────────────────────────────

/// Trim `value` and check it is non-blank and at most `max` characters.
pub fn normalize_text(field: &str, value: &str, max: usize) -> Result<String> {
  let trimmed = value.trim();
  if trimmed.is_empty() {
    return Err(Error::Validation(format!("{field} is required")));
  }
  if trimmed.chars().count() > max {
    return Err(Error::Validation(format!(
      "{field} must be {max} characters or less"
    )));
  }
  Ok(trimmed.to_owned())
}
