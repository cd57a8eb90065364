//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 UTC strings with a fixed microsecond
//! precision, so lexical order in SQL equals chronological order. Enums are
//! stored as their `SCREAMING_SNAKE_CASE` labels, tags as a JSON array and
//! UUIDs as hyphenated lowercase strings.

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use ideaboard_core::{
  group::{GroupMember, GroupMessage, IdeaGroup},
  idea::{ChecklistItem, Comment, Idea, Like},
  survey::{Survey, SurveyOption, SurveyView},
  user::{Badge, User, UserBadge},
};
use rusqlite::Row;
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

/// Parse a stored enum label.
pub fn decode_label<T: FromStr>(column: &str, s: &str) -> Result<T> {
  T::from_str(s).map_err(|_| Error::Decode(format!("{column}: {s:?}")))
}

pub fn decode_count(column: &str, n: i64) -> Result<u32> {
  u32::try_from(n).map_err(|_| Error::Decode(format!("{column}: {n}")))
}

pub fn encode_tags(tags: &[String]) -> Result<String> {
  Ok(serde_json::to_string(tags)?)
}

pub fn decode_tags(s: &str) -> Result<Vec<String>> {
  Ok(serde_json::from_str(s)?)
}

// ─── Row types ───────────────────────────────────────────────────────────────
//
// Each `Raw*` struct is read inside a `Connection::call` closure with
// `Raw*::read` and decoded outside it, so decode failures surface as this
// crate's error rather than as a rusqlite one.

pub const USER_COLUMNS: &str =
  "user_id, username, role, xp_points, level, created_at";

pub struct RawUser {
  pub user_id:    String,
  pub username:   String,
  pub role:       String,
  pub xp_points:  i64,
  pub level:      i64,
  pub created_at: String,
}

impl RawUser {
  pub fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:    row.get(0)?,
      username:   row.get(1)?,
      role:       row.get(2)?,
      xp_points:  row.get(3)?,
      level:      row.get(4)?,
      created_at: row.get(5)?,
    })
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      user_id:    decode_uuid(&self.user_id)?,
      username:   self.username,
      role:       decode_label("role", &self.role)?,
      xp_points:  decode_count("xp_points", self.xp_points)?,
      level:      decode_count("level", self.level)?,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

pub const BADGE_COLUMNS: &str =
  "badge_id, name, display_name, description, criteria, xp_reward";

pub struct RawBadge {
  pub badge_id:     String,
  pub name:         String,
  pub display_name: String,
  pub description:  String,
  pub criteria:     String,
  pub xp_reward:    i64,
}

impl RawBadge {
  pub fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      badge_id:     row.get(0)?,
      name:         row.get(1)?,
      display_name: row.get(2)?,
      description:  row.get(3)?,
      criteria:     row.get(4)?,
      xp_reward:    row.get(5)?,
    })
  }

  pub fn into_badge(self) -> Result<Badge> {
    Ok(Badge {
      badge_id:     decode_uuid(&self.badge_id)?,
      name:         self.name,
      display_name: self.display_name,
      description:  self.description,
      criteria:     self.criteria,
      xp_reward:    decode_count("xp_reward", self.xp_reward)?,
    })
  }
}

pub struct RawUserBadge {
  pub user_id:   String,
  pub badge_id:  String,
  pub earned_at: String,
}

impl RawUserBadge {
  pub fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:   row.get(0)?,
      badge_id:  row.get(1)?,
      earned_at: row.get(2)?,
    })
  }

  pub fn into_user_badge(self) -> Result<UserBadge> {
    Ok(UserBadge {
      user_id:   decode_uuid(&self.user_id)?,
      badge_id:  decode_uuid(&self.badge_id)?,
      earned_at: decode_dt(&self.earned_at)?,
    })
  }
}

pub const IDEA_COLUMNS: &str = "idea_id, author_id, title, description, \
                                category, tags, status, progress_percentage, \
                                like_count, comment_count, view_count, \
                                created_at, updated_at";

pub struct RawIdea {
  pub idea_id:             String,
  pub author_id:           String,
  pub title:               String,
  pub description:         String,
  pub category:            String,
  pub tags:                String,
  pub status:              String,
  pub progress_percentage: i64,
  pub like_count:          i64,
  pub comment_count:       i64,
  pub view_count:          i64,
  pub created_at:          String,
  pub updated_at:          String,
}

impl RawIdea {
  pub fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      idea_id:             row.get(0)?,
      author_id:           row.get(1)?,
      title:               row.get(2)?,
      description:         row.get(3)?,
      category:            row.get(4)?,
      tags:                row.get(5)?,
      status:              row.get(6)?,
      progress_percentage: row.get(7)?,
      like_count:          row.get(8)?,
      comment_count:       row.get(9)?,
      view_count:          row.get(10)?,
      created_at:          row.get(11)?,
      updated_at:          row.get(12)?,
    })
  }

  pub fn into_idea(self) -> Result<Idea> {
    let progress = u8::try_from(self.progress_percentage)
      .ok()
      .filter(|p| *p <= 100)
      .ok_or_else(|| {
        Error::Decode(format!(
          "progress_percentage: {}",
          self.progress_percentage
        ))
      })?;

    Ok(Idea {
      idea_id:             decode_uuid(&self.idea_id)?,
      author_id:           decode_uuid(&self.author_id)?,
      title:               self.title,
      description:         self.description,
      category:            self.category,
      tags:                decode_tags(&self.tags)?,
      status:              decode_label("status", &self.status)?,
      progress_percentage: progress,
      like_count:          decode_count("like_count", self.like_count)?,
      comment_count:       decode_count("comment_count", self.comment_count)?,
      view_count:          decode_count("view_count", self.view_count)?,
      created_at:          decode_dt(&self.created_at)?,
      updated_at:          decode_dt(&self.updated_at)?,
    })
  }
}

pub const ITEM_COLUMNS: &str =
  "item_id, idea_id, title, is_completed, ordinal_position, created_at";

pub struct RawChecklistItem {
  pub item_id:          String,
  pub idea_id:          String,
  pub title:            String,
  pub is_completed:     bool,
  pub ordinal_position: i64,
  pub created_at:       String,
}

impl RawChecklistItem {
  pub fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      item_id:          row.get(0)?,
      idea_id:          row.get(1)?,
      title:            row.get(2)?,
      is_completed:     row.get(3)?,
      ordinal_position: row.get(4)?,
      created_at:       row.get(5)?,
    })
  }

  pub fn into_item(self) -> Result<ChecklistItem> {
    Ok(ChecklistItem {
      item_id:          decode_uuid(&self.item_id)?,
      idea_id:          decode_uuid(&self.idea_id)?,
      title:            self.title,
      is_completed:     self.is_completed,
      ordinal_position: decode_count(
        "ordinal_position",
        self.ordinal_position,
      )?,
      created_at:       decode_dt(&self.created_at)?,
    })
  }
}

pub struct RawLike {
  pub like_id:    String,
  pub user_id:    String,
  pub idea_id:    String,
  pub created_at: String,
}

impl RawLike {
  pub fn into_like(self) -> Result<Like> {
    Ok(Like {
      like_id:    decode_uuid(&self.like_id)?,
      user_id:    decode_uuid(&self.user_id)?,
      idea_id:    decode_uuid(&self.idea_id)?,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

pub const COMMENT_COLUMNS: &str =
  "comment_id, idea_id, author_id, content, reaction_count, created_at";

pub struct RawComment {
  pub comment_id:     String,
  pub idea_id:        String,
  pub author_id:      String,
  pub content:        String,
  pub reaction_count: i64,
  pub created_at:     String,
}

impl RawComment {
  pub fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      comment_id:     row.get(0)?,
      idea_id:        row.get(1)?,
      author_id:      row.get(2)?,
      content:        row.get(3)?,
      reaction_count: row.get(4)?,
      created_at:     row.get(5)?,
    })
  }

  pub fn into_comment(self) -> Result<Comment> {
    Ok(Comment {
      comment_id:     decode_uuid(&self.comment_id)?,
      idea_id:        decode_uuid(&self.idea_id)?,
      author_id:      decode_uuid(&self.author_id)?,
      content:        self.content,
      reaction_count: decode_count("reaction_count", self.reaction_count)?,
      created_at:     decode_dt(&self.created_at)?,
    })
  }
}

pub const GROUP_COLUMNS: &str =
  "group_id, idea_id, name, description, created_by, created_at, updated_at";

pub struct RawGroup {
  pub group_id:    String,
  pub idea_id:     String,
  pub name:        String,
  pub description: String,
  pub created_by:  String,
  pub created_at:  String,
  pub updated_at:  String,
}

impl RawGroup {
  pub fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      group_id:    row.get(0)?,
      idea_id:     row.get(1)?,
      name:        row.get(2)?,
      description: row.get(3)?,
      created_by:  row.get(4)?,
      created_at:  row.get(5)?,
      updated_at:  row.get(6)?,
    })
  }

  pub fn into_group(self) -> Result<IdeaGroup> {
    Ok(IdeaGroup {
      group_id:    decode_uuid(&self.group_id)?,
      idea_id:     decode_uuid(&self.idea_id)?,
      name:        self.name,
      description: self.description,
      created_by:  decode_uuid(&self.created_by)?,
      created_at:  decode_dt(&self.created_at)?,
      updated_at:  decode_dt(&self.updated_at)?,
    })
  }
}

pub const MEMBER_COLUMNS: &str = "group_id, user_id, role, joined_at";

pub struct RawMember {
  pub group_id:  String,
  pub user_id:   String,
  pub role:      String,
  pub joined_at: String,
}

impl RawMember {
  pub fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      group_id:  row.get(0)?,
      user_id:   row.get(1)?,
      role:      row.get(2)?,
      joined_at: row.get(3)?,
    })
  }

  pub fn into_member(self) -> Result<GroupMember> {
    Ok(GroupMember {
      group_id:  decode_uuid(&self.group_id)?,
      user_id:   decode_uuid(&self.user_id)?,
      role:      decode_label("role", &self.role)?,
      joined_at: decode_dt(&self.joined_at)?,
    })
  }
}

pub const MESSAGE_COLUMNS: &str =
  "message_id, group_id, sender_id, content, created_at";

pub struct RawMessage {
  pub message_id: String,
  pub group_id:   String,
  pub sender_id:  String,
  pub content:    String,
  pub created_at: String,
}

impl RawMessage {
  pub fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      message_id: row.get(0)?,
      group_id:   row.get(1)?,
      sender_id:  row.get(2)?,
      content:    row.get(3)?,
      created_at: row.get(4)?,
    })
  }

  pub fn into_message(self) -> Result<GroupMessage> {
    Ok(GroupMessage {
      message_id: decode_uuid(&self.message_id)?,
      group_id:   decode_uuid(&self.group_id)?,
      sender_id:  decode_uuid(&self.sender_id)?,
      content:    self.content,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

pub const SURVEY_COLUMNS: &str = "survey_id, creator_id, question, description, \
                                  is_active, is_anonymous, allow_multiple_votes, \
                                  total_votes, created_at";

pub struct RawSurvey {
  pub survey_id:            String,
  pub creator_id:           String,
  pub question:             String,
  pub description:          Option<String>,
  pub is_active:            bool,
  pub is_anonymous:         bool,
  pub allow_multiple_votes: bool,
  pub total_votes:          i64,
  pub created_at:           String,
}

impl RawSurvey {
  pub fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      survey_id:            row.get(0)?,
      creator_id:           row.get(1)?,
      question:             row.get(2)?,
      description:          row.get(3)?,
      is_active:            row.get(4)?,
      is_anonymous:         row.get(5)?,
      allow_multiple_votes: row.get(6)?,
      total_votes:          row.get(7)?,
      created_at:           row.get(8)?,
    })
  }

  pub fn into_survey(self) -> Result<Survey> {
    Ok(Survey {
      survey_id:            decode_uuid(&self.survey_id)?,
      creator_id:           decode_uuid(&self.creator_id)?,
      question:             self.question,
      description:          self.description,
      is_active:            self.is_active,
      is_anonymous:         self.is_anonymous,
      allow_multiple_votes: self.allow_multiple_votes,
      total_votes:          decode_count("total_votes", self.total_votes)?,
      created_at:           decode_dt(&self.created_at)?,
    })
  }
}

pub const OPTION_COLUMNS: &str =
  "option_id, survey_id, option_text, vote_count, display_order";

pub struct RawSurveyOption {
  pub option_id:     String,
  pub survey_id:     String,
  pub option_text:   String,
  pub vote_count:    i64,
  pub display_order: i64,
}

impl RawSurveyOption {
  pub fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      option_id:     row.get(0)?,
      survey_id:     row.get(1)?,
      option_text:   row.get(2)?,
      vote_count:    row.get(3)?,
      display_order: row.get(4)?,
    })
  }

  pub fn into_option(self) -> Result<SurveyOption> {
    Ok(SurveyOption {
      option_id:     decode_uuid(&self.option_id)?,
      survey_id:     decode_uuid(&self.survey_id)?,
      option_text:   self.option_text,
      vote_count:    decode_count("vote_count", self.vote_count)?,
      display_order: decode_count("display_order", self.display_order)?,
    })
  }
}

/// A survey, its options and the option ids one viewer voted for.
pub struct RawSurveyView {
  pub survey:  RawSurvey,
  pub options: Vec<RawSurveyOption>,
  pub voted:   Vec<String>,
}

impl RawSurveyView {
  pub fn into_view(self) -> Result<SurveyView> {
    Ok(SurveyView {
      survey:           self.survey.into_survey()?,
      options:          self
        .options
        .into_iter()
        .map(RawSurveyOption::into_option)
        .collect::<Result<_>>()?,
      voted_option_ids: self
        .voted
        .iter()
        .map(|id| decode_uuid(id))
        .collect::<Result<_>>()?,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone as _;

  use super::*;

  #[test]
  fn timestamps_sort_lexically() {
    let early = Utc.with_ymd_and_hms(2026, 6, 7, 0, 0, 0).unwrap();
    let late = early + chrono::TimeDelta::microseconds(1);
    let whole = Utc.with_ymd_and_hms(2026, 6, 7, 0, 0, 1).unwrap();

    assert!(encode_dt(early) < encode_dt(late));
    assert!(encode_dt(late) < encode_dt(whole));
    assert_eq!(encode_dt(early).len(), encode_dt(whole).len());
    assert_eq!(decode_dt(&encode_dt(late)).unwrap(), late);
  }

  #[test]
  fn unknown_labels_are_decode_errors() {
    let err = decode_label::<ideaboard_core::idea::IdeaStatus>("status", "DONE")
      .unwrap_err();
    assert!(matches!(err, Error::Decode(_)));
  }

  #[test]
  fn negative_counters_are_rejected() {
    assert!(matches!(decode_count("like_count", -1), Err(Error::Decode(_))));
  }
}
