//! [`Engine`]: the entry point for every engagement operation.
//!
//! Each method resolves the caller, checks policy and performs one atomic
//! store operation, which also pays any XP the action earns. Badges are
//! evaluated and notifications dispatched after that write has committed, so
//! failures in either are logged and swallowed.

use ideaboard_core::{
  Entity, Error, Result,
  badge,
  clock::{Clock, SystemClock},
  group::{
    GroupMember, GroupMessage, GroupRole, IdeaGroup, MAX_MESSAGE_LEN,
    UnreadSummary,
  },
  idea::{
    Comment, Idea, IdeaStatus, IdeaView, Like, MAX_CATEGORY_LEN,
    MAX_CHECKLIST_TITLE_LEN, MAX_COMMENT_LEN, MAX_EMOJI_LEN,
    MAX_IDEA_TITLE_LEN, NewIdea, Reaction, normalize_text,
  },
  level::LevelTable,
  notification::{Notification, Notifier},
  policy,
  progress,
  store::{
    ChecklistApplied, ChecklistChange, ChecklistOutcome, EngagementStore,
    ReactionInsert, SubmittedIdea, VoteOutcome,
  },
  survey::{self, MAX_QUESTION_LEN, NewSurvey, SurveyView, VoteRejection},
  user::{Actor, User, UserProgress, UserRole, normalize_username},
};
use serde::Deserialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
  badges::BadgeEvaluator,
  config::{EngineConfig, XpRewards},
  notices,
  quota::QuotaTracker,
  unread::UnreadTracker,
  xp::{XpAward, XpLedger},
};

/// Compare-and-set attempts for a status change before giving up.
const STATUS_ATTEMPTS: usize = 3;

/// A survey as submitted by its creator.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SurveyDraft {
  pub question:             String,
  pub description:          Option<String>,
  /// At least two; each trimmed and non-blank.
  pub options:              Vec<String>,
  pub is_anonymous:         bool,
  pub allow_multiple_votes: bool,
}

/// An idea as submitted by its author.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IdeaDraft {
  pub title:       String,
  pub description: String,
  pub category:    String,
  pub tags:        Vec<String>,
  /// Initial checklist titles; blank entries are dropped.
  pub checklist:   Vec<String>,
}

pub struct Engine<S, N, C = SystemClock> {
  store:    S,
  notifier: N,
  clock:    C,
  rewards:  XpRewards,
  quota:    QuotaTracker,
  xp:       XpLedger,
  badges:   BadgeEvaluator,
  unread:   UnreadTracker,
}

impl<S, N, C> Engine<S, N, C>
where
  S: EngagementStore,
  N: Notifier,
  C: Clock,
{
  pub fn new(store: S, notifier: N, clock: C, config: EngineConfig) -> Self {
    Self {
      store,
      notifier,
      clock,
      rewards: config.rewards,
      quota: QuotaTracker::new(config.weekly_like_limit),
      xp: XpLedger::default(),
      badges: BadgeEvaluator::default(),
      unread: UnreadTracker,
    }
  }

  pub fn with_levels(mut self, levels: LevelTable) -> Self {
    self.xp = XpLedger::new(levels);
    self
  }

  pub fn with_badges(mut self, badges: BadgeEvaluator) -> Self {
    self.badges = badges;
    self
  }

  pub fn store(&self) -> &S { &self.store }

  pub fn notifier(&self) -> &N { &self.notifier }

  pub fn clock(&self) -> &C { &self.clock }

  // ─── Shared steps ──────────────────────────────────────────────────────────

  async fn user(&self, user_id: Uuid) -> Result<User> {
    self
      .store
      .get_user(user_id)
      .await
      .map_err(Error::storage)?
      .ok_or_else(|| Error::not_found(Entity::User, user_id))
  }

  async fn idea(&self, idea_id: Uuid) -> Result<Idea> {
    self
      .store
      .get_idea(idea_id)
      .await
      .map_err(Error::storage)?
      .ok_or_else(|| Error::not_found(Entity::Idea, idea_id))
  }

  async fn comment(&self, comment_id: Uuid) -> Result<Comment> {
    self
      .store
      .get_comment(comment_id)
      .await
      .map_err(Error::storage)?
      .ok_or_else(|| Error::not_found(Entity::Comment, comment_id))
  }

  async fn group(&self, group_id: Uuid) -> Result<IdeaGroup> {
    self
      .store
      .get_group(group_id)
      .await
      .map_err(Error::storage)?
      .ok_or_else(|| Error::not_found(Entity::Group, group_id))
  }

  async fn require_member(&self, group_id: Uuid, user_id: Uuid) -> Result<GroupMember> {
    self
      .store
      .membership(group_id, user_id)
      .await
      .map_err(Error::storage)?
      .ok_or_else(|| Error::Forbidden("you are not a member of this group".into()))
  }

  async fn dispatch(&self, notification: Notification) {
    let target = notification.target_user;
    let kind = notification.kind;
    if let Err(e) = self.notifier.notify(notification).await {
      warn!(%target, %kind, error = %e, "notification dispatch failed");
    }
  }

  /// Follow up on an award the store has committed: announce a level-up,
  /// then evaluate `criterion` for the recipient. A failed evaluation is
  /// logged; the criterion is evaluated again on the next qualifying action.
  async fn settle(&self, award: &XpAward, criterion: Option<&str>) {
    self.xp.record(award);
    let user_id = award.change.user_id;
    if award.leveled_up {
      self.dispatch(notices::level_up(user_id, award.level)).await;
    }
    let Some(criterion) = criterion else {
      return;
    };
    match self.badges.evaluate(&self.store, user_id, criterion).await {
      Ok(Some(badge)) => {
        self.dispatch(notices::badge_earned(user_id, &badge)).await;
      }
      Ok(None) => {}
      Err(e) => {
        warn!(%user_id, badge = criterion, error = %e, "badge evaluation failed");
      }
    }
  }

  // ─── Users ─────────────────────────────────────────────────────────────────

  pub async fn create_user(&self, username: &str, role: UserRole) -> Result<User> {
    let username = normalize_username(username)?;
    let user = self
      .store
      .add_user(username.clone(), role)
      .await
      .map_err(Error::storage)?
      .ok_or_else(|| Error::Conflict(format!("username {username:?} is taken")))?;
    info!(user_id = %user.user_id, %role, "user created");
    Ok(user)
  }

  pub async fn user_progress(&self, user_id: Uuid) -> Result<UserProgress> {
    let user = self.user(user_id).await?;
    Ok(self.xp.progress(&user))
  }

  // ─── Ideas ─────────────────────────────────────────────────────────────────

  pub async fn submit_idea(
    &self,
    actor_id: Uuid,
    draft: IdeaDraft,
  ) -> Result<SubmittedIdea> {
    let author = self.user(actor_id).await?;

    let title = normalize_text("title", &draft.title, MAX_IDEA_TITLE_LEN)?;
    let description = normalize_text("description", &draft.description, usize::MAX)?;
    let category = normalize_text("category", &draft.category, MAX_CATEGORY_LEN)?;
    let tags = draft
      .tags
      .iter()
      .map(|t| t.trim())
      .filter(|t| !t.is_empty())
      .map(str::to_owned)
      .collect();
    let checklist = draft
      .checklist
      .iter()
      .filter(|t| !t.trim().is_empty())
      .map(|t| normalize_text("checklist item", t, MAX_CHECKLIST_TITLE_LEN))
      .collect::<Result<Vec<_>>>()?;

    let rewarded = self
      .store
      .create_idea(
        NewIdea {
          author_id: author.user_id,
          title,
          description,
          category,
          tags,
          checklist,
        },
        self.xp.grant(self.rewards.idea_submitted),
      )
      .await
      .map_err(Error::storage)?;
    let submitted = rewarded.value;
    info!(
      idea_id = %submitted.idea.idea_id,
      author_id = %author.user_id,
      items = submitted.checklist.len(),
      "idea submitted"
    );

    self.settle(&rewarded.award, Some(badge::FIRST_IDEA)).await;
    Ok(submitted)
  }

  /// The idea with its checklist. Every call counts as a view.
  pub async fn get_idea(&self, idea_id: Uuid) -> Result<IdeaView> {
    let idea = self
      .store
      .increment_views(idea_id)
      .await
      .map_err(Error::storage)?
      .ok_or_else(|| Error::not_found(Entity::Idea, idea_id))?;
    let checklist = self
      .store
      .checklist(idea_id)
      .await
      .map_err(Error::storage)?;
    Ok(IdeaView { idea, checklist })
  }

  pub async fn delete_idea(&self, actor_id: Uuid, idea_id: Uuid) -> Result<()> {
    let actor = Actor::from(&self.user(actor_id).await?);
    if !policy::can_delete_idea(&actor) {
      return Err(Error::Forbidden("only an admin may delete ideas".into()));
    }
    if !self
      .store
      .delete_idea(idea_id)
      .await
      .map_err(Error::storage)?
    {
      return Err(Error::not_found(Entity::Idea, idea_id));
    }
    info!(%idea_id, by = %actor_id, "idea deleted");
    Ok(())
  }

  // ─── Checklist ─────────────────────────────────────────────────────────────

  async fn change_checklist(
    &self,
    actor_id: Uuid,
    idea_id: Uuid,
    change: ChecklistChange,
  ) -> Result<ChecklistApplied> {
    let actor = Actor::from(&self.user(actor_id).await?);
    let idea = self.idea(idea_id).await?;
    progress::ensure_checklist_editable(&idea, &actor)?;

    let missing_item = match &change {
      ChecklistChange::Rename { item_id, .. }
      | ChecklistChange::Delete { item_id }
      | ChecklistChange::Toggle { item_id } => Some(*item_id),
      ChecklistChange::Create { .. } => None,
    };

    let applied = match self
      .store
      .apply_checklist_change(idea_id, change)
      .await
      .map_err(Error::storage)?
    {
      ChecklistOutcome::Applied(applied) => applied,
      ChecklistOutcome::IdeaMissing => {
        return Err(Error::not_found(Entity::Idea, idea_id));
      }
      ChecklistOutcome::ItemMissing => {
        return Err(Error::not_found(
          Entity::ChecklistItem,
          missing_item.unwrap_or(idea_id),
        ));
      }
      ChecklistOutcome::Locked => return Err(Error::ChecklistLocked(idea_id)),
    };

    let update = applied.update;
    debug!(
      %idea_id,
      progress = update.progress_percentage,
      status = %update.status,
      "checklist changed"
    );
    if update.transitioned_to_in_progress {
      info!(%idea_id, "idea moved from CONCEPT to IN_PROGRESS");
    }
    if update.all_todos_completed {
      debug!(%idea_id, "all checklist items completed");
    }
    Ok(applied)
  }

  pub async fn create_checklist_item(
    &self,
    actor_id: Uuid,
    idea_id: Uuid,
    title: &str,
  ) -> Result<ChecklistApplied> {
    let title = normalize_text("title", title, MAX_CHECKLIST_TITLE_LEN)?;
    self
      .change_checklist(actor_id, idea_id, ChecklistChange::Create { title })
      .await
  }

  pub async fn update_checklist_item(
    &self,
    actor_id: Uuid,
    idea_id: Uuid,
    item_id: Uuid,
    title: &str,
  ) -> Result<ChecklistApplied> {
    let title = normalize_text("title", title, MAX_CHECKLIST_TITLE_LEN)?;
    self
      .change_checklist(actor_id, idea_id, ChecklistChange::Rename {
        item_id,
        title,
      })
      .await
  }

  pub async fn delete_checklist_item(
    &self,
    actor_id: Uuid,
    idea_id: Uuid,
    item_id: Uuid,
  ) -> Result<ChecklistApplied> {
    self
      .change_checklist(actor_id, idea_id, ChecklistChange::Delete { item_id })
      .await
  }

  pub async fn toggle_checklist_item(
    &self,
    actor_id: Uuid,
    idea_id: Uuid,
    item_id: Uuid,
  ) -> Result<ChecklistApplied> {
    self
      .change_checklist(actor_id, idea_id, ChecklistChange::Toggle { item_id })
      .await
  }

  // ─── Status ────────────────────────────────────────────────────────────────

  pub async fn update_idea_status(
    &self,
    actor_id: Uuid,
    idea_id: Uuid,
    requested: IdeaStatus,
  ) -> Result<Idea> {
    let actor_user = self.user(actor_id).await?;
    let actor = Actor::from(&actor_user);

    for attempt in 1..=STATUS_ATTEMPTS {
      let idea = self.idea(idea_id).await?;
      let change = progress::plan_status_change(&idea, requested, &actor)?;

      let reward = change
        .awards_completion()
        .then(|| self.xp.grant(self.rewards.idea_completed));
      let Some(written) = self
        .store
        .set_idea_status(
          idea_id,
          change.from,
          change.to,
          change.progress_percentage,
          reward,
        )
        .await
        .map_err(Error::storage)?
      else {
        debug!(%idea_id, attempt, "status moved concurrently; retrying");
        continue;
      };
      let updated = written.idea;

      if change.is_transition() {
        info!(%idea_id, from = %change.from, to = %change.to, "idea status changed");
      }
      if let Some(award) = &written.award {
        self.settle(award, None).await;
      }
      if change.is_transition() && actor.user_id != updated.author_id {
        self
          .dispatch(notices::status_changed(&updated, change.to, &actor_user))
          .await;
      }
      return Ok(updated);
    }

    Err(Error::Conflict(
      "the idea's status changed concurrently; please retry".into(),
    ))
  }

  // ─── Likes ─────────────────────────────────────────────────────────────────

  pub async fn like_idea(&self, actor_id: Uuid, idea_id: Uuid) -> Result<Like> {
    let liker = self.user(actor_id).await?;
    let idea = self.idea(idea_id).await?;

    let (like, award) = self
      .quota
      .like(
        &self.store,
        liker.user_id,
        &idea,
        self.clock.now(),
        self.xp.grant(self.rewards.like_received),
      )
      .await?;

    self.settle(&award, Some(badge::POPULAR)).await;
    self.dispatch(notices::liked(&idea, &liker)).await;
    Ok(like)
  }

  pub async fn unlike_idea(&self, actor_id: Uuid, idea_id: Uuid) -> Result<()> {
    let user = self.user(actor_id).await?;
    self.quota.unlike(&self.store, user.user_id, idea_id).await
  }

  pub async fn remaining_likes(&self, user_id: Uuid) -> Result<u32> {
    let user = self.user(user_id).await?;
    self
      .quota
      .remaining(&self.store, user.user_id, self.clock.now())
      .await
  }

  pub async fn weekly_likes_used(&self, user_id: Uuid) -> Result<u64> {
    let user = self.user(user_id).await?;
    self
      .quota
      .used(&self.store, user.user_id, self.clock.now())
      .await
  }

  // ─── Comments ──────────────────────────────────────────────────────────────

  pub async fn post_comment(
    &self,
    actor_id: Uuid,
    idea_id: Uuid,
    content: &str,
  ) -> Result<Comment> {
    let author = self.user(actor_id).await?;
    let content = normalize_text("comment", content, MAX_COMMENT_LEN)?;
    let idea = self.idea(idea_id).await?;

    let rewarded = self
      .store
      .insert_comment(
        idea_id,
        author.user_id,
        content,
        self.xp.grant(self.rewards.comment_posted),
      )
      .await
      .map_err(Error::storage)?
      .ok_or_else(|| Error::not_found(Entity::Idea, idea_id))?;
    let comment = rewarded.value;
    debug!(%idea_id, comment_id = %comment.comment_id, "comment posted");

    self.settle(&rewarded.award, Some(badge::COMMENTATOR)).await;
    if idea.author_id != author.user_id {
      self
        .dispatch(notices::commented(&idea, &author, &comment.content))
        .await;
    }
    Ok(comment)
  }

  pub async fn delete_comment(&self, actor_id: Uuid, comment_id: Uuid) -> Result<()> {
    let actor = Actor::from(&self.user(actor_id).await?);
    let comment = self.comment(comment_id).await?;
    if !policy::can_delete_comment(&comment, &actor) {
      return Err(Error::Forbidden(
        "only the comment's author or an admin may delete it".into(),
      ));
    }
    if !self
      .store
      .delete_comment(comment_id)
      .await
      .map_err(Error::storage)?
    {
      return Err(Error::not_found(Entity::Comment, comment_id));
    }
    debug!(%comment_id, by = %actor_id, "comment deleted");
    Ok(())
  }

  pub async fn add_reaction(
    &self,
    actor_id: Uuid,
    comment_id: Uuid,
    emoji: &str,
  ) -> Result<Reaction> {
    let reactor = self.user(actor_id).await?;
    let emoji = normalize_text("emoji", emoji, MAX_EMOJI_LEN)?;
    let comment = self.comment(comment_id).await?;

    let reaction = match self
      .store
      .insert_reaction(comment_id, reactor.user_id, emoji)
      .await
      .map_err(Error::storage)?
    {
      ReactionInsert::Inserted(reaction) => reaction,
      ReactionInsert::Duplicate => {
        return Err(Error::Conflict(
          "you already reacted with this emoji".into(),
        ));
      }
      ReactionInsert::CommentMissing => {
        return Err(Error::not_found(Entity::Comment, comment_id));
      }
    };
    debug!(%comment_id, emoji = %reaction.emoji, "reaction added");

    if comment.author_id != reactor.user_id {
      self
        .dispatch(notices::reacted(&comment, &reactor, &reaction.emoji))
        .await;
    }
    Ok(reaction)
  }

  pub async fn remove_reaction(
    &self,
    actor_id: Uuid,
    comment_id: Uuid,
    emoji: &str,
  ) -> Result<()> {
    let user = self.user(actor_id).await?;
    if !self
      .store
      .delete_reaction(comment_id, user.user_id, emoji.trim().to_owned())
      .await
      .map_err(Error::storage)?
    {
      return Err(Error::not_found(Entity::Reaction, comment_id));
    }
    debug!(%comment_id, user_id = %user.user_id, "reaction removed");
    Ok(())
  }

  // ─── Surveys ───────────────────────────────────────────────────────────────

  pub async fn create_survey(
    &self,
    actor_id: Uuid,
    draft: SurveyDraft,
  ) -> Result<SurveyView> {
    let creator = self.user(actor_id).await?;
    let question = normalize_text("question", &draft.question, MAX_QUESTION_LEN)?;
    let description = draft
      .description
      .as_deref()
      .map(str::trim)
      .filter(|d| !d.is_empty())
      .map(str::to_owned);
    let options = survey::normalize_options(&draft.options)?;

    let view = self
      .store
      .create_survey(NewSurvey {
        creator_id: creator.user_id,
        question,
        description,
        options,
        is_anonymous: draft.is_anonymous,
        allow_multiple_votes: draft.allow_multiple_votes,
      })
      .await
      .map_err(Error::storage)?;
    info!(
      survey_id = %view.survey.survey_id,
      creator_id = %creator.user_id,
      options = view.options.len(),
      "survey created"
    );
    Ok(view)
  }

  /// The survey as seen by `viewer_id`, including the options they voted for.
  pub async fn get_survey(&self, viewer_id: Uuid, survey_id: Uuid) -> Result<SurveyView> {
    let viewer = self.user(viewer_id).await?;
    self
      .store
      .survey_view(survey_id, viewer.user_id)
      .await
      .map_err(Error::storage)?
      .ok_or_else(|| Error::not_found(Entity::Survey, survey_id))
  }

  pub async fn vote_survey(
    &self,
    actor_id: Uuid,
    survey_id: Uuid,
    option_ids: Vec<Uuid>,
  ) -> Result<SurveyView> {
    let voter = self.user(actor_id).await?;
    if option_ids.is_empty() {
      return Err(Error::Validation("select at least one option".into()));
    }

    match self
      .store
      .cast_votes(survey_id, voter.user_id, option_ids)
      .await
      .map_err(Error::storage)?
    {
      VoteOutcome::Cast(view) => {
        debug!(
          %survey_id,
          user_id = %voter.user_id,
          total = view.survey.total_votes,
          "survey vote cast"
        );
        Ok(view)
      }
      VoteOutcome::SurveyMissing => Err(Error::not_found(Entity::Survey, survey_id)),
      VoteOutcome::Rejected(VoteRejection::Closed) => {
        Err(Error::InvalidOperation("the survey is closed".into()))
      }
      VoteOutcome::Rejected(VoteRejection::AlreadyVoted) => {
        Err(Error::Conflict("you already voted on this survey".into()))
      }
      VoteOutcome::Rejected(VoteRejection::SingleChoice) => Err(
        Error::InvalidOperation("this survey allows a single choice".into()),
      ),
      VoteOutcome::Rejected(VoteRejection::UnknownOption(option_id)) => Err(
        Error::Validation(format!("option {option_id} does not belong to this survey")),
      ),
    }
  }

  async fn require_survey_manager(&self, actor_id: Uuid, survey_id: Uuid) -> Result<()> {
    let user = self.user(actor_id).await?;
    let view = self
      .store
      .survey_view(survey_id, user.user_id)
      .await
      .map_err(Error::storage)?
      .ok_or_else(|| Error::not_found(Entity::Survey, survey_id))?;
    if !policy::can_manage_survey(&view.survey, &Actor::from(&user)) {
      return Err(Error::Forbidden(
        "only the survey's creator or an admin may manage it".into(),
      ));
    }
    Ok(())
  }

  pub async fn close_survey(&self, actor_id: Uuid, survey_id: Uuid) -> Result<()> {
    self.require_survey_manager(actor_id, survey_id).await?;
    if !self
      .store
      .close_survey(survey_id)
      .await
      .map_err(Error::storage)?
    {
      return Err(Error::not_found(Entity::Survey, survey_id));
    }
    info!(%survey_id, by = %actor_id, "survey closed");
    Ok(())
  }

  pub async fn delete_survey(&self, actor_id: Uuid, survey_id: Uuid) -> Result<()> {
    self.require_survey_manager(actor_id, survey_id).await?;
    if !self
      .store
      .delete_survey(survey_id)
      .await
      .map_err(Error::storage)?
    {
      return Err(Error::not_found(Entity::Survey, survey_id));
    }
    info!(%survey_id, by = %actor_id, "survey deleted");
    Ok(())
  }

  // ─── Groups ────────────────────────────────────────────────────────────────

  pub async fn join_group(&self, actor_id: Uuid, group_id: Uuid) -> Result<GroupMember> {
    let user = self.user(actor_id).await?;
    let group = self.group(group_id).await?;

    let member = self
      .store
      .add_member(group_id, user.user_id, GroupRole::Member)
      .await
      .map_err(Error::storage)?
      .ok_or_else(|| {
        Error::Conflict("you are already a member of this group".into())
      })?;
    debug!(%group_id, user_id = %user.user_id, "joined group");

    self.dispatch(notices::member_joined(&group, &user)).await;
    Ok(member)
  }

  pub async fn leave_group(&self, actor_id: Uuid, group_id: Uuid) -> Result<()> {
    let user = self.user(actor_id).await?;
    self.group(group_id).await?;

    let membership = self
      .store
      .membership(group_id, user.user_id)
      .await
      .map_err(Error::storage)?
      .ok_or_else(|| Error::not_found(Entity::Membership, group_id))?;
    if membership.role == GroupRole::Creator {
      return Err(Error::InvalidOperation(
        "the group creator cannot leave the group".into(),
      ));
    }

    if !self
      .store
      .remove_member(group_id, user.user_id)
      .await
      .map_err(Error::storage)?
    {
      return Err(Error::not_found(Entity::Membership, group_id));
    }
    debug!(%group_id, user_id = %user.user_id, "left group");
    Ok(())
  }

  pub async fn send_group_message(
    &self,
    actor_id: Uuid,
    group_id: Uuid,
    content: &str,
  ) -> Result<GroupMessage> {
    let sender = self.user(actor_id).await?;
    let content = normalize_text("message", content, MAX_MESSAGE_LEN)?;
    let group = self.group(group_id).await?;
    self.require_member(group_id, sender.user_id).await?;

    let message = self
      .store
      .insert_message(group_id, sender.user_id, content)
      .await
      .map_err(Error::storage)?;
    debug!(%group_id, message_id = %message.message_id, "group message sent");

    let members = self.store.members(group_id).await.map_err(Error::storage)?;
    for member in members.iter().filter(|m| m.user_id != sender.user_id) {
      self
        .dispatch(notices::group_message(
          &group,
          &sender,
          &message.content,
          member.user_id,
        ))
        .await;
    }
    Ok(message)
  }

  /// Returns whether a receipt was created.
  pub async fn mark_message_read(&self, actor_id: Uuid, message_id: Uuid) -> Result<bool> {
    let user = self.user(actor_id).await?;
    let message = self
      .store
      .get_message(message_id)
      .await
      .map_err(Error::storage)?
      .ok_or_else(|| Error::not_found(Entity::Message, message_id))?;
    self.require_member(message.group_id, user.user_id).await?;
    self.unread.mark_read(&self.store, &message, user.user_id).await
  }

  /// Returns how many messages became read.
  pub async fn mark_group_read(&self, actor_id: Uuid, group_id: Uuid) -> Result<u64> {
    let user = self.user(actor_id).await?;
    self.group(group_id).await?;
    self.require_member(group_id, user.user_id).await?;
    let marked = self
      .unread
      .mark_all_read(&self.store, group_id, user.user_id)
      .await?;
    debug!(%group_id, user_id = %user.user_id, marked, "group marked read");
    Ok(marked)
  }

  pub async fn unread_summary(&self, user_id: Uuid) -> Result<UnreadSummary> {
    let user = self.user(user_id).await?;
    self.unread.summary(&self.store, user.user_id).await
  }

  pub async fn total_unread(&self, user_id: Uuid) -> Result<u64> {
    let user = self.user(user_id).await?;
    self.unread.total_unread(&self.store, user.user_id).await
  }
}
