//! Users, roles and the gamification records attached to them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

pub const USERNAME_LEN: std::ops::RangeInclusive<usize> = 3..=50;

/// Organisational role. Only the two privileged roles may act on ideas they
/// did not author.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
  #[default]
  Employee,
  ProjectManager,
  Admin,
}

/// Trim `raw` and check it against [`USERNAME_LEN`].
pub fn normalize_username(raw: &str) -> Result<String> {
  let name = raw.trim();
  if !USERNAME_LEN.contains(&name.chars().count()) {
    return Err(Error::Validation(format!(
      "username must be between {} and {} characters",
      USERNAME_LEN.start(),
      USERNAME_LEN.end()
    )));
  }
  Ok(name.to_owned())
}

impl UserRole {
  /// `PROJECT_MANAGER` or `ADMIN`.
  pub fn is_privileged(self) -> bool {
    matches!(self, Self::ProjectManager | Self::Admin)
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
  pub user_id:    Uuid,
  pub username:   String,
  pub role:       UserRole,
  /// Cumulative, never decreases.
  pub xp_points:  u32,
  /// Always `LevelTable::level_for(xp_points)` after an award completes.
  pub level:      u32,
  pub created_at: DateTime<Utc>,
}

/// The identity a request acts as; resolved from the store per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
  pub user_id: Uuid,
  pub role:    UserRole,
}

impl From<&User> for Actor {
  fn from(user: &User) -> Self {
    Self { user_id: user.user_id, role: user.role }
  }
}

// ─── Badges ──────────────────────────────────────────────────────────────────

/// A catalogue entry. `name` is unique and doubles as the criterion key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Badge {
  pub badge_id:     Uuid,
  pub name:         String,
  pub display_name: String,
  pub description:  String,
  pub criteria:     String,
  pub xp_reward:    u32,
}

/// A permanent grant. At most one exists per `(user_id, badge_id)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserBadge {
  pub user_id:   Uuid,
  pub badge_id:  Uuid,
  pub earned_at: DateTime<Utc>,
}

/// Aggregates that badge criteria are evaluated against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UserStats {
  pub ideas_authored:    u64,
  /// Sum of `like_count` over every idea the user authored.
  pub likes_received:    u64,
  pub comments_authored: u64,
}

// ─── XP ──────────────────────────────────────────────────────────────────────

/// Result of an atomic XP increment, as observed by the incrementing call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XpChange {
  pub user_id:      Uuid,
  pub xp_before:    u32,
  pub xp_after:     u32,
  /// The level persisted at the time of the increment.
  pub stored_level: u32,
}

/// What a single award did, reported by the store call that paid it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XpAward {
  pub change:     XpChange,
  /// `level_for(change.xp_after)`; the stored level after the award.
  pub level:      u32,
  /// This award is the one that moved the stored level up. Exactly one of
  /// several concurrent awards crossing the same threshold sees `true`.
  pub leveled_up: bool,
}

/// Display-oriented summary of a user's progression.
#[derive(Debug, Clone, Serialize)]
pub struct UserProgress {
  pub user_id:               Uuid,
  pub xp_points:             u32,
  pub level:                 u32,
  /// `None` at the maximum level.
  pub next_level_xp:         Option<u32>,
  pub progress_within_level: u8,
}
