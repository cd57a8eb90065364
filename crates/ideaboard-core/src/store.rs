//! The `EngagementStore` trait and the outcome types its atomic operations
//! report.
//!
//! The trait is implemented by storage backends (e.g.
//! `ideaboard-store-sqlite`). Every method is one atomic unit of work. Where
//! a business rule depends on state that a concurrent request could change
//! (a counter, a uniqueness constraint, the weekly quota, the checklist lock)
//! the backend decides it inside that unit and reports the result as an
//! outcome value. `Self::Error` is reserved for I/O and encoding failures.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::{
  group::{GroupMember, GroupMessage, GroupRole, IdeaGroup},
  idea::{ChecklistItem, Comment, Idea, IdeaStatus, Like, NewIdea, Reaction},
  level::LevelTable,
  progress::ProgressUpdate,
  survey::{NewSurvey, SurveyView, VoteRejection},
  user::{Badge, User, UserBadge, UserRole, UserStats, XpAward},
};

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// The quota a like insert is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaWindow {
  /// Start of the current quota week.
  pub since: DateTime<Utc>,
  /// Likes allowed per week.
  pub limit: u32,
  /// Timestamp recorded on the new like.
  pub now:   DateTime<Utc>,
}

/// A mutation of an idea's checklist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChecklistChange {
  /// Append an item after the current highest ordinal position.
  Create { title: String },
  Rename { item_id: Uuid, title: String },
  Delete { item_id: Uuid },
  Toggle { item_id: Uuid },
}

impl ChecklistChange {
  /// Only toggles run the status transition; other changes refresh progress.
  pub fn is_toggle(&self) -> bool { matches!(self, Self::Toggle { .. }) }
}

/// XP earned by a write and paid inside the same unit of work. The stored
/// level is brought up to `levels.level_for(xp)` in that unit too. Each
/// method that takes a grant documents who receives it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XpGrant {
  pub amount: u32,
  pub levels: LevelTable,
}

// ─── Outcomes ────────────────────────────────────────────────────────────────

/// Everything created by [`EngagementStore::create_idea`].
#[derive(Debug, Clone, Serialize)]
pub struct SubmittedIdea {
  pub idea:      Idea,
  pub checklist: Vec<ChecklistItem>,
  pub group:     IdeaGroup,
}

/// A write together with the XP it paid.
#[derive(Debug, Clone)]
pub struct Rewarded<T> {
  pub value: T,
  pub award: XpAward,
}

#[derive(Debug, Clone)]
pub enum LikeInsert {
  /// The like row exists, `like_count` was incremented with it and the
  /// idea's author was paid `award`.
  Inserted { like: Like, award: XpAward },
  /// The user already spent the whole weekly quota; nothing was written.
  QuotaExhausted,
  /// A like for this `(user, idea)` pair already exists; nothing was written.
  Duplicate,
  IdeaMissing,
}

/// The idea after a status compare-and-set succeeded.
#[derive(Debug, Clone)]
pub struct StatusWritten {
  pub idea:  Idea,
  /// Present when a grant was passed.
  pub award: Option<XpAward>,
}

#[derive(Debug, Clone)]
pub enum ReactionInsert {
  /// The reaction row exists and `reaction_count` was incremented with it.
  Inserted(Reaction),
  Duplicate,
  CommentMissing,
}

#[derive(Debug, Clone)]
pub enum VoteOutcome {
  /// New votes (possibly none) were inserted with their counters.
  Cast(SurveyView),
  SurveyMissing,
  Rejected(VoteRejection),
}

#[derive(Debug, Clone, Serialize)]
pub struct ChecklistApplied {
  /// The idea after progress and status were written.
  pub idea:   Idea,
  /// The affected item; `None` after a delete.
  pub item:   Option<ChecklistItem>,
  pub update: ProgressUpdate,
}

#[derive(Debug, Clone)]
pub enum ChecklistOutcome {
  Applied(ChecklistApplied),
  IdeaMissing,
  /// The item does not exist or belongs to another idea.
  ItemMissing,
  /// The idea is COMPLETED; nothing was written.
  Locked,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over an engagement store backend.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait EngagementStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Users ─────────────────────────────────────────────────────────────

  /// `None` if the username is already taken.
  fn add_user(
    &self,
    username: String,
    role: UserRole,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  fn get_user(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  fn user_stats(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<UserStats, Self::Error>> + Send + '_;

  // ── Badges ────────────────────────────────────────────────────────────

  fn badge_by_name(
    &self,
    name: String,
  ) -> impl Future<Output = Result<Option<Badge>, Self::Error>> + Send + '_;

  fn has_badge(
    &self,
    user_id: Uuid,
    badge_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Insert the grant unless one already exists. `None` means another call
  /// got there first; there is never more than one row per pair.
  fn grant_badge(
    &self,
    user_id: Uuid,
    badge_id: Uuid,
  ) -> impl Future<Output = Result<Option<UserBadge>, Self::Error>> + Send + '_;

  fn user_badges(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Vec<UserBadge>, Self::Error>> + Send + '_;

  // ── Ideas and checklists ──────────────────────────────────────────────

  /// Persist the idea (CONCEPT, progress 0), its checklist, its group and
  /// the author's CREATOR membership, and pay `reward` to the author, in one
  /// unit.
  fn create_idea(
    &self,
    input: NewIdea,
    reward: XpGrant,
  ) -> impl Future<Output = Result<Rewarded<SubmittedIdea>, Self::Error>> + Send + '_;

  fn get_idea(
    &self,
    idea_id: Uuid,
  ) -> impl Future<Output = Result<Option<Idea>, Self::Error>> + Send + '_;

  /// Increment `view_count` and return the idea as written.
  fn increment_views(
    &self,
    idea_id: Uuid,
  ) -> impl Future<Output = Result<Option<Idea>, Self::Error>> + Send + '_;

  /// Ordered by `ordinal_position`.
  fn checklist(
    &self,
    idea_id: Uuid,
  ) -> impl Future<Output = Result<Vec<ChecklistItem>, Self::Error>> + Send + '_;

  /// Delete the idea and everything it owns. Returns whether it existed.
  fn delete_idea(
    &self,
    idea_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Apply `change`, recompute progress from the resulting checklist (see
  /// [`ChecklistChange::is_toggle`]) and persist both, refusing if the idea
  /// is COMPLETED at the time of the write.
  fn apply_checklist_change(
    &self,
    idea_id: Uuid,
    change: ChecklistChange,
  ) -> impl Future<Output = Result<ChecklistOutcome, Self::Error>> + Send + '_;

  /// Compare-and-set the status: write `to` (and `progress`, when given)
  /// only if the stored status is still `expected`, paying `reward` to the
  /// idea's author in the same unit. `None` if the idea is gone or its
  /// status moved underneath the caller; nothing is paid then.
  fn set_idea_status(
    &self,
    idea_id: Uuid,
    expected: IdeaStatus,
    to: IdeaStatus,
    progress: Option<u8>,
    reward: Option<XpGrant>,
  ) -> impl Future<Output = Result<Option<StatusWritten>, Self::Error>> + Send + '_;

  // ── Likes ─────────────────────────────────────────────────────────────

  /// Check the quota, insert the like, record it in the quota ledger,
  /// increment `like_count` and pay `reward` to the idea's author, all in
  /// one unit.
  fn insert_like(
    &self,
    user_id: Uuid,
    idea_id: Uuid,
    window: QuotaWindow,
    reward: XpGrant,
  ) -> impl Future<Output = Result<LikeInsert, Self::Error>> + Send + '_;

  /// Remove the like and decrement `like_count` together. The quota ledger
  /// is untouched. Returns whether a like existed.
  fn delete_like(
    &self,
    user_id: Uuid,
    idea_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Likes the user has created since `since`, including ones since removed.
  fn count_likes_since(
    &self,
    user_id: Uuid,
    since: DateTime<Utc>,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  fn has_liked(
    &self,
    user_id: Uuid,
    idea_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Comments ──────────────────────────────────────────────────────────

  /// Insert the comment, increment `comment_count` and pay `reward` to the
  /// comment's author together. `None` if the idea does not exist.
  fn insert_comment(
    &self,
    idea_id: Uuid,
    author_id: Uuid,
    content: String,
    reward: XpGrant,
  ) -> impl Future<Output = Result<Option<Rewarded<Comment>>, Self::Error>> + Send + '_;

  fn get_comment(
    &self,
    comment_id: Uuid,
  ) -> impl Future<Output = Result<Option<Comment>, Self::Error>> + Send + '_;

  /// Delete the comment and decrement `comment_count` together.
  fn delete_comment(
    &self,
    comment_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Insert the reaction unless the triple exists, incrementing
  /// `reaction_count` with it.
  fn insert_reaction(
    &self,
    comment_id: Uuid,
    user_id: Uuid,
    emoji: String,
  ) -> impl Future<Output = Result<ReactionInsert, Self::Error>> + Send + '_;

  /// Remove the reaction and decrement `reaction_count` together. Returns
  /// whether it existed.
  fn delete_reaction(
    &self,
    comment_id: Uuid,
    user_id: Uuid,
    emoji: String,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Surveys ───────────────────────────────────────────────────────────

  /// Persist an active survey and its options (display order 0..n).
  fn create_survey(
    &self,
    input: NewSurvey,
  ) -> impl Future<Output = Result<SurveyView, Self::Error>> + Send + '_;

  /// The survey with the options `viewer` has voted for.
  fn survey_view(
    &self,
    survey_id: Uuid,
    viewer: Uuid,
  ) -> impl Future<Output = Result<Option<SurveyView>, Self::Error>> + Send + '_;

  /// Decide the vote with [`crate::survey::plan_votes`] and insert the new
  /// vote rows, each bumping its option's `vote_count` and the survey's
  /// `total_votes`, in one unit.
  fn cast_votes(
    &self,
    survey_id: Uuid,
    user_id: Uuid,
    option_ids: Vec<Uuid>,
  ) -> impl Future<Output = Result<VoteOutcome, Self::Error>> + Send + '_;

  /// Mark the survey inactive. Returns whether it existed.
  fn close_survey(
    &self,
    survey_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Delete the survey with its options and votes. Returns whether it
  /// existed.
  fn delete_survey(
    &self,
    survey_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Groups ────────────────────────────────────────────────────────────

  fn get_group(
    &self,
    group_id: Uuid,
  ) -> impl Future<Output = Result<Option<IdeaGroup>, Self::Error>> + Send + '_;

  fn group_for_idea(
    &self,
    idea_id: Uuid,
  ) -> impl Future<Output = Result<Option<IdeaGroup>, Self::Error>> + Send + '_;

  fn membership(
    &self,
    group_id: Uuid,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Option<GroupMember>, Self::Error>> + Send + '_;

  /// Insert a membership unless one exists; `None` on duplicate.
  fn add_member(
    &self,
    group_id: Uuid,
    user_id: Uuid,
    role: GroupRole,
  ) -> impl Future<Output = Result<Option<GroupMember>, Self::Error>> + Send + '_;

  fn remove_member(
    &self,
    group_id: Uuid,
    user_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn members(
    &self,
    group_id: Uuid,
  ) -> impl Future<Output = Result<Vec<GroupMember>, Self::Error>> + Send + '_;

  /// Every membership the user holds.
  fn memberships_of(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Vec<GroupMember>, Self::Error>> + Send + '_;

  /// Append a message, record the sender's own read receipt and bump the
  /// group's `updated_at`.
  fn insert_message(
    &self,
    group_id: Uuid,
    sender_id: Uuid,
    content: String,
  ) -> impl Future<Output = Result<GroupMessage, Self::Error>> + Send + '_;

  fn get_message(
    &self,
    message_id: Uuid,
  ) -> impl Future<Output = Result<Option<GroupMessage>, Self::Error>> + Send + '_;

  /// Record a read receipt unless one exists. Returns whether one was
  /// created.
  fn insert_read_receipt(
    &self,
    message_id: Uuid,
    user_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Create receipts for every message in the group not sent by the user
  /// and not yet read by them. Returns how many were created.
  fn mark_group_read(
    &self,
    group_id: Uuid,
    user_id: Uuid,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// Messages in the group sent by someone else with no receipt for the
  /// user.
  fn count_unread(
    &self,
    group_id: Uuid,
    user_id: Uuid,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;
}
