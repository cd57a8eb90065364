//! Idea groups: one discussion group per idea, its members and messages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const MAX_MESSAGE_LEN: usize = 2000;

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
pub enum GroupRole {
  Creator,
  Member,
}

/// Created together with its idea and deleted with it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdeaGroup {
  pub group_id:    Uuid,
  pub idea_id:     Uuid,
  pub name:        String,
  pub description: String,
  pub created_by:  Uuid,
  pub created_at:  DateTime<Utc>,
  /// Bumped whenever a message is posted.
  pub updated_at:  DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupMember {
  pub group_id:  Uuid,
  pub user_id:   Uuid,
  pub role:      GroupRole,
  pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupMessage {
  pub message_id: Uuid,
  pub group_id:   Uuid,
  pub sender_id:  Uuid,
  pub content:    String,
  pub created_at: DateTime<Utc>,
}

// ─── Unread counts ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GroupUnread {
  pub group_id: Uuid,
  pub unread:   u64,
}

/// Per-group unread counts over a user's memberships, plus their sum.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UnreadSummary {
  pub groups: Vec<GroupUnread>,
  pub total:  u64,
}

impl FromIterator<GroupUnread> for UnreadSummary {
  fn from_iter<I: IntoIterator<Item = GroupUnread>>(iter: I) -> Self {
    let groups: Vec<GroupUnread> = iter.into_iter().collect();
    let total = groups.iter().map(|g| g.unread).sum();
    Self { groups, total }
  }
}
