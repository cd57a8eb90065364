//! [`SqliteStore`]: the SQLite implementation of [`EngagementStore`].

use std::{path::Path, str::FromStr as _};

use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension as _, TransactionBehavior};
use tracing::debug;
use uuid::Uuid;

use ideaboard_core::{
  group::{GroupMember, GroupMessage, GroupRole, IdeaGroup},
  idea::{ChecklistItem, Comment, Idea, IdeaStatus, NewIdea, Reaction},
  progress::{self, ProgressUpdate},
  store::{
    ChecklistApplied, ChecklistChange, ChecklistOutcome, EngagementStore,
    LikeInsert, QuotaWindow, ReactionInsert, Rewarded, StatusWritten,
    SubmittedIdea, VoteOutcome, XpGrant,
  },
  survey::{self, NewSurvey, Survey, SurveyOption, SurveyView},
  user::{Badge, User, UserBadge, UserRole, UserStats, XpAward, XpChange},
};

use crate::{
  Error, Result,
  encode::{
    BADGE_COLUMNS, COMMENT_COLUMNS, GROUP_COLUMNS, IDEA_COLUMNS, ITEM_COLUMNS,
    MEMBER_COLUMNS, MESSAGE_COLUMNS, OPTION_COLUMNS, RawBadge,
    RawChecklistItem, RawComment, RawGroup, RawIdea, RawLike, RawMember,
    RawMessage, RawSurvey, RawSurveyOption, RawSurveyView, RawUser,
    RawUserBadge, SURVEY_COLUMNS, USER_COLUMNS, decode_count, decode_uuid,
    encode_dt, encode_tags, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// An Ideaboard engagement store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run a single-row statement keyed on `?1`: a `SELECT`, or a write with
  /// a `RETURNING` clause.
  async fn fetch_one<R, T>(
    &self,
    sql: String,
    key: Uuid,
    read: fn(&rusqlite::Row<'_>) -> rusqlite::Result<R>,
    decode: fn(R) -> Result<T>,
  ) -> Result<Option<T>>
  where
    R: Send + 'static,
  {
    let key_str = encode_uuid(key);
    let raw: Option<R> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(&sql, rusqlite::params![key_str], read)
            .optional()?,
        )
      })
      .await?;
    raw.map(decode).transpose()
  }
}

/// Wrap a decode failure raised inside a `Connection::call` closure.
fn other(e: impl std::error::Error + Send + Sync + 'static) -> tokio_rusqlite::Error {
  tokio_rusqlite::Error::Other(Box::new(e))
}

fn read_idea(
  conn: &rusqlite::Connection,
  idea_id: &str,
) -> rusqlite::Result<Option<RawIdea>> {
  conn
    .query_row(
      &format!("SELECT {IDEA_COLUMNS} FROM ideas WHERE idea_id = ?1"),
      rusqlite::params![idea_id],
      RawIdea::read,
    )
    .optional()
}

/// Pay `grant` to `user_id` inside the caller's transaction and bring the
/// stored level up to `level_for` of the new total. A missing user is an
/// error, which rolls the whole transaction back.
fn award_xp(
  conn: &rusqlite::Connection,
  user_id: Uuid,
  grant: &XpGrant,
) -> tokio_rusqlite::Result<XpAward> {
  let id_str = encode_uuid(user_id);
  let (xp, stored): (i64, i64) = conn.query_row(
    "UPDATE users SET xp_points = xp_points + ?2
     WHERE user_id = ?1
     RETURNING xp_points, level",
    rusqlite::params![id_str, grant.amount],
    |r| Ok((r.get(0)?, r.get(1)?)),
  )?;
  let xp_after = decode_count("xp_points", xp).map_err(other)?;
  let stored_level = decode_count("level", stored).map_err(other)?;

  let level = grant.levels.level_for(xp_after);
  let leveled_up = level > stored_level
    && conn.execute(
      "UPDATE users SET level = ?2 WHERE user_id = ?1 AND level < ?2",
      rusqlite::params![id_str, level],
    )? > 0;

  Ok(XpAward {
    change: XpChange {
      user_id,
      xp_before: xp_after.saturating_sub(grant.amount),
      xp_after,
      stored_level,
    },
    level,
    leveled_up,
  })
}

fn read_survey_view(
  conn: &rusqlite::Connection,
  survey_id: &str,
  viewer: &str,
) -> rusqlite::Result<Option<RawSurveyView>> {
  let Some(survey) = conn
    .query_row(
      &format!("SELECT {SURVEY_COLUMNS} FROM surveys WHERE survey_id = ?1"),
      rusqlite::params![survey_id],
      RawSurvey::read,
    )
    .optional()?
  else {
    return Ok(None);
  };

  let options = conn
    .prepare(&format!(
      "SELECT {OPTION_COLUMNS} FROM survey_options
       WHERE survey_id = ?1
       ORDER BY display_order"
    ))?
    .query_map(rusqlite::params![survey_id], RawSurveyOption::read)?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  let voted = conn
    .prepare(
      "SELECT v.option_id FROM survey_votes v
       JOIN survey_options o ON o.option_id = v.option_id
       WHERE v.survey_id = ?1 AND v.user_id = ?2
       ORDER BY o.display_order",
    )?
    .query_map(rusqlite::params![survey_id, viewer], |r| r.get(0))?
    .collect::<rusqlite::Result<Vec<String>>>()?;

  Ok(Some(RawSurveyView { survey, options, voted }))
}

enum RawChecklistOutcome {
  Applied {
    idea:   RawIdea,
    item:   Option<RawChecklistItem>,
    update: ProgressUpdate,
  },
  IdeaMissing,
  ItemMissing,
  Locked,
}

enum RawLikeInsert {
  Inserted { like: RawLike, award: XpAward },
  QuotaExhausted,
  Duplicate,
  IdeaMissing,
}

// ─── EngagementStore impl ────────────────────────────────────────────────────

impl EngagementStore for SqliteStore {
  type Error = Error;

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn add_user(
    &self,
    username: String,
    role: UserRole,
  ) -> Result<Option<User>> {
    let user = User {
      user_id: Uuid::new_v4(),
      username,
      role,
      xp_points: 0,
      level: 1,
      created_at: Utc::now(),
    };

    let id_str   = encode_uuid(user.user_id);
    let name     = user.username.clone();
    let role_str = role.to_string();
    let at_str   = encode_dt(user.created_at);

    let inserted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "INSERT OR IGNORE INTO users
             (user_id, username, role, xp_points, level, created_at)
           VALUES (?1, ?2, ?3, 0, 1, ?4)",
          rusqlite::params![id_str, name, role_str, at_str],
        )?)
      })
      .await?;

    Ok((inserted > 0).then_some(user))
  }

  async fn get_user(&self, user_id: Uuid) -> Result<Option<User>> {
    self
      .fetch_one(
        format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = ?1"),
        user_id,
        RawUser::read,
        RawUser::into_user,
      )
      .await
  }

  async fn user_stats(&self, user_id: Uuid) -> Result<UserStats> {
    let id_str = encode_uuid(user_id);

    let (ideas, likes, comments): (i64, i64, i64) = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT
             (SELECT COUNT(*) FROM ideas WHERE author_id = ?1),
             (SELECT COALESCE(SUM(like_count), 0) FROM ideas WHERE author_id = ?1),
             (SELECT COUNT(*) FROM comments WHERE author_id = ?1)",
          rusqlite::params![id_str],
          |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
        )?)
      })
      .await?;

    Ok(UserStats {
      ideas_authored:    ideas.max(0) as u64,
      likes_received:    likes.max(0) as u64,
      comments_authored: comments.max(0) as u64,
    })
  }

  // ── Badges ────────────────────────────────────────────────────────────────

  async fn badge_by_name(&self, name: String) -> Result<Option<Badge>> {
    let raw: Option<RawBadge> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {BADGE_COLUMNS} FROM badges WHERE name = ?1"),
              rusqlite::params![name],
              RawBadge::read,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawBadge::into_badge).transpose()
  }

  async fn has_badge(&self, user_id: Uuid, badge_id: Uuid) -> Result<bool> {
    let user_str  = encode_uuid(user_id);
    let badge_str = encode_uuid(badge_id);

    Ok(
      self
        .conn
        .call(move |conn| {
          Ok(
            conn
              .query_row(
                "SELECT 1 FROM user_badges WHERE user_id = ?1 AND badge_id = ?2",
                rusqlite::params![user_str, badge_str],
                |_| Ok(true),
              )
              .optional()?
              .unwrap_or(false),
          )
        })
        .await?,
    )
  }

  async fn grant_badge(
    &self,
    user_id: Uuid,
    badge_id: Uuid,
  ) -> Result<Option<UserBadge>> {
    let earned_at = Utc::now();
    let user_str  = encode_uuid(user_id);
    let badge_str = encode_uuid(badge_id);
    let at_str    = encode_dt(earned_at);

    let inserted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "INSERT OR IGNORE INTO user_badges (user_id, badge_id, earned_at)
           VALUES (?1, ?2, ?3)",
          rusqlite::params![user_str, badge_str, at_str],
        )?)
      })
      .await?;

    if inserted == 0 {
      debug!(%user_id, %badge_id, "badge already held");
      return Ok(None);
    }
    Ok(Some(UserBadge { user_id, badge_id, earned_at }))
  }

  async fn user_badges(&self, user_id: Uuid) -> Result<Vec<UserBadge>> {
    let id_str = encode_uuid(user_id);

    let raws: Vec<RawUserBadge> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT user_id, badge_id, earned_at FROM user_badges
           WHERE user_id = ?1
           ORDER BY earned_at, badge_id",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], RawUserBadge::read)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawUserBadge::into_user_badge).collect()
  }

  // ── Ideas and checklists ──────────────────────────────────────────────────

  async fn create_idea(
    &self,
    input: NewIdea,
    reward: XpGrant,
  ) -> Result<Rewarded<SubmittedIdea>> {
    let now = Utc::now();
    let idea = Idea {
      idea_id:             Uuid::new_v4(),
      author_id:           input.author_id,
      title:               input.title,
      description:         input.description,
      category:            input.category,
      tags:                input.tags,
      status:              IdeaStatus::Concept,
      progress_percentage: 0,
      like_count:          0,
      comment_count:       0,
      view_count:          0,
      created_at:          now,
      updated_at:          now,
    };
    let checklist: Vec<ChecklistItem> = input
      .checklist
      .into_iter()
      .enumerate()
      .map(|(i, title)| ChecklistItem {
        item_id: Uuid::new_v4(),
        idea_id: idea.idea_id,
        title,
        is_completed: false,
        ordinal_position: i as u32,
        created_at: now,
      })
      .collect();
    let group = IdeaGroup {
      group_id:    Uuid::new_v4(),
      idea_id:     idea.idea_id,
      name:        format!("Group: {}", idea.title),
      description: format!("Discussion group for idea: {}", idea.title),
      created_by:  idea.author_id,
      created_at:  now,
      updated_at:  now,
    };

    let idea_str   = encode_uuid(idea.idea_id);
    let author_str = encode_uuid(idea.author_id);
    let title      = idea.title.clone();
    let desc       = idea.description.clone();
    let category   = idea.category.clone();
    let tags_str   = encode_tags(&idea.tags)?;
    let status_str = idea.status.to_string();
    let at_str     = encode_dt(now);
    let items: Vec<(String, String, u32)> = checklist
      .iter()
      .map(|i| (encode_uuid(i.item_id), i.title.clone(), i.ordinal_position))
      .collect();
    let group_str  = encode_uuid(group.group_id);
    let group_name = group.name.clone();
    let group_desc = group.description.clone();
    let creator    = GroupRole::Creator.to_string();
    let author_id  = idea.author_id;

    let award = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute(
          "INSERT INTO ideas (
             idea_id, author_id, title, description, category, tags, status,
             progress_percentage, like_count, comment_count, view_count,
             created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0, 0, 0, 0, ?8, ?8)",
          rusqlite::params![
            idea_str, author_str, title, desc, category, tags_str, status_str,
            at_str,
          ],
        )?;
        {
          let mut stmt = tx.prepare(
            "INSERT INTO checklist_items
               (item_id, idea_id, title, is_completed, ordinal_position, created_at)
             VALUES (?1, ?2, ?3, 0, ?4, ?5)",
          )?;
          for (item_id, item_title, ordinal) in &items {
            stmt.execute(rusqlite::params![
              item_id, idea_str, item_title, ordinal, at_str
            ])?;
          }
        }
        tx.execute(
          "INSERT INTO idea_groups
             (group_id, idea_id, name, description, created_by, created_at, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
          rusqlite::params![
            group_str, idea_str, group_name, group_desc, author_str, at_str
          ],
        )?;
        tx.execute(
          "INSERT INTO group_members (group_id, user_id, role, joined_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![group_str, author_str, creator, at_str],
        )?;
        let award = award_xp(&tx, author_id, &reward)?;
        tx.commit()?;
        Ok(award)
      })
      .await?;

    Ok(Rewarded {
      value: SubmittedIdea { idea, checklist, group },
      award,
    })
  }

  async fn get_idea(&self, idea_id: Uuid) -> Result<Option<Idea>> {
    self
      .fetch_one(
        format!("SELECT {IDEA_COLUMNS} FROM ideas WHERE idea_id = ?1"),
        idea_id,
        RawIdea::read,
        RawIdea::into_idea,
      )
      .await
  }

  async fn increment_views(&self, idea_id: Uuid) -> Result<Option<Idea>> {
    self
      .fetch_one(
        format!(
          "UPDATE ideas SET view_count = view_count + 1
           WHERE idea_id = ?1
           RETURNING {IDEA_COLUMNS}"
        ),
        idea_id,
        RawIdea::read,
        RawIdea::into_idea,
      )
      .await
  }

  async fn checklist(&self, idea_id: Uuid) -> Result<Vec<ChecklistItem>> {
    let id_str = encode_uuid(idea_id);

    let raws: Vec<RawChecklistItem> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {ITEM_COLUMNS} FROM checklist_items
           WHERE idea_id = ?1
           ORDER BY ordinal_position, created_at"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], RawChecklistItem::read)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawChecklistItem::into_item).collect()
  }

  async fn delete_idea(&self, idea_id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(idea_id);

    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM ideas WHERE idea_id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await?;

    Ok(deleted > 0)
  }

  async fn apply_checklist_change(
    &self,
    idea_id: Uuid,
    change: ChecklistChange,
  ) -> Result<ChecklistOutcome> {
    let idea_str     = encode_uuid(idea_id);
    let now_str      = encode_dt(Utc::now());
    let new_item_str = encode_uuid(Uuid::new_v4());
    let is_toggle    = change.is_toggle();

    let raw = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let head: Option<(String, u8)> = tx
          .query_row(
            "SELECT status, progress_percentage FROM ideas WHERE idea_id = ?1",
            rusqlite::params![idea_str],
            |r| Ok((r.get(0)?, r.get(1)?)),
          )
          .optional()?;
        let Some((status_str, current_progress)) = head else {
          return Ok(RawChecklistOutcome::IdeaMissing);
        };
        let status = IdeaStatus::from_str(&status_str).map_err(other)?;
        if status == IdeaStatus::Completed {
          return Ok(RawChecklistOutcome::Locked);
        }

        let touched = match change {
          ChecklistChange::Create { title } => {
            let ordinal: i64 = tx.query_row(
              "SELECT COALESCE(MAX(ordinal_position), -1) + 1
               FROM checklist_items WHERE idea_id = ?1",
              rusqlite::params![idea_str],
              |r| r.get(0),
            )?;
            tx.execute(
              "INSERT INTO checklist_items
                 (item_id, idea_id, title, is_completed, ordinal_position, created_at)
               VALUES (?1, ?2, ?3, 0, ?4, ?5)",
              rusqlite::params![new_item_str, idea_str, title, ordinal, now_str],
            )?;
            Some(new_item_str)
          }
          ChecklistChange::Rename { item_id, title } => {
            let item_str = encode_uuid(item_id);
            let n = tx.execute(
              "UPDATE checklist_items SET title = ?3
               WHERE item_id = ?1 AND idea_id = ?2",
              rusqlite::params![item_str, idea_str, title],
            )?;
            if n == 0 {
              return Ok(RawChecklistOutcome::ItemMissing);
            }
            Some(item_str)
          }
          ChecklistChange::Delete { item_id } => {
            let n = tx.execute(
              "DELETE FROM checklist_items WHERE item_id = ?1 AND idea_id = ?2",
              rusqlite::params![encode_uuid(item_id), idea_str],
            )?;
            if n == 0 {
              return Ok(RawChecklistOutcome::ItemMissing);
            }
            None
          }
          ChecklistChange::Toggle { item_id } => {
            let item_str = encode_uuid(item_id);
            let n = tx.execute(
              "UPDATE checklist_items
               SET is_completed = CASE is_completed WHEN 0 THEN 1 ELSE 0 END
               WHERE item_id = ?1 AND idea_id = ?2",
              rusqlite::params![item_str, idea_str],
            )?;
            if n == 0 {
              return Ok(RawChecklistOutcome::ItemMissing);
            }
            Some(item_str)
          }
        };

        let (total, completed): (i64, i64) = tx.query_row(
          "SELECT COUNT(*), COALESCE(SUM(is_completed), 0)
           FROM checklist_items WHERE idea_id = ?1",
          rusqlite::params![idea_str],
          |r| Ok((r.get(0)?, r.get(1)?)),
        )?;
        let (total, completed) = (total.max(0) as usize, completed.max(0) as usize);
        let update = if is_toggle {
          progress::recompute(status, current_progress, completed, total)
        } else {
          progress::refresh(status, current_progress, completed, total)
        };

        tx.execute(
          "UPDATE ideas SET progress_percentage = ?2, status = ?3, updated_at = ?4
           WHERE idea_id = ?1",
          rusqlite::params![
            idea_str,
            update.progress_percentage,
            update.status.to_string(),
            now_str,
          ],
        )?;

        let Some(idea) = read_idea(&tx, &idea_str)? else {
          return Ok(RawChecklistOutcome::IdeaMissing);
        };
        let item = touched
          .map(|item_str| {
            tx.query_row(
              &format!("SELECT {ITEM_COLUMNS} FROM checklist_items WHERE item_id = ?1"),
              rusqlite::params![item_str],
              RawChecklistItem::read,
            )
          })
          .transpose()?;

        tx.commit()?;
        Ok(RawChecklistOutcome::Applied { idea, item, update })
      })
      .await?;

    Ok(match raw {
      RawChecklistOutcome::Applied { idea, item, update } => {
        ChecklistOutcome::Applied(ChecklistApplied {
          idea: idea.into_idea()?,
          item: item.map(RawChecklistItem::into_item).transpose()?,
          update,
        })
      }
      RawChecklistOutcome::IdeaMissing => ChecklistOutcome::IdeaMissing,
      RawChecklistOutcome::ItemMissing => ChecklistOutcome::ItemMissing,
      RawChecklistOutcome::Locked => ChecklistOutcome::Locked,
    })
  }

  async fn set_idea_status(
    &self,
    idea_id: Uuid,
    expected: IdeaStatus,
    to: IdeaStatus,
    progress: Option<u8>,
    reward: Option<XpGrant>,
  ) -> Result<Option<StatusWritten>> {
    let id_str       = encode_uuid(idea_id);
    let expected_str = expected.to_string();
    let to_str       = to.to_string();
    let now_str      = encode_dt(Utc::now());

    let raw: Option<(RawIdea, Option<XpAward>)> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let Some(idea) = tx
          .query_row(
            &format!(
              "UPDATE ideas
               SET status = ?3,
                   progress_percentage = COALESCE(?4, progress_percentage),
                   updated_at = ?5
               WHERE idea_id = ?1 AND status = ?2
               RETURNING {IDEA_COLUMNS}"
            ),
            rusqlite::params![id_str, expected_str, to_str, progress, now_str],
            RawIdea::read,
          )
          .optional()?
        else {
          return Ok(None);
        };

        let award = match &reward {
          Some(grant) => {
            let author_id = decode_uuid(&idea.author_id).map_err(other)?;
            Some(award_xp(&tx, author_id, grant)?)
          }
          None => None,
        };
        tx.commit()?;
        Ok(Some((idea, award)))
      })
      .await?;

    raw
      .map(|(idea, award)| Ok(StatusWritten { idea: idea.into_idea()?, award }))
      .transpose()
  }

  // ── Likes ─────────────────────────────────────────────────────────────────

  async fn insert_like(
    &self,
    user_id: Uuid,
    idea_id: Uuid,
    window: QuotaWindow,
    reward: XpGrant,
  ) -> Result<LikeInsert> {
    let like_str  = encode_uuid(Uuid::new_v4());
    let user_str  = encode_uuid(user_id);
    let idea_str  = encode_uuid(idea_id);
    let since_str = encode_dt(window.since);
    let now_str   = encode_dt(window.now);
    let limit     = i64::from(window.limit);

    let raw = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let author: Option<String> = tx
          .query_row(
            "SELECT author_id FROM ideas WHERE idea_id = ?1",
            rusqlite::params![idea_str],
            |r| r.get(0),
          )
          .optional()?;
        let Some(author_str) = author else {
          return Ok(RawLikeInsert::IdeaMissing);
        };

        let used: i64 = tx.query_row(
          "SELECT COUNT(*) FROM like_ledger WHERE user_id = ?1 AND created_at >= ?2",
          rusqlite::params![user_str, since_str],
          |r| r.get(0),
        )?;
        if used >= limit {
          return Ok(RawLikeInsert::QuotaExhausted);
        }

        let inserted = tx.execute(
          "INSERT OR IGNORE INTO likes (like_id, user_id, idea_id, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![like_str, user_str, idea_str, now_str],
        )?;
        if inserted == 0 {
          return Ok(RawLikeInsert::Duplicate);
        }

        tx.execute(
          "INSERT INTO like_ledger (user_id, idea_id, created_at) VALUES (?1, ?2, ?3)",
          rusqlite::params![user_str, idea_str, now_str],
        )?;
        tx.execute(
          "UPDATE ideas SET like_count = like_count + 1 WHERE idea_id = ?1",
          rusqlite::params![idea_str],
        )?;
        let author_id = decode_uuid(&author_str).map_err(other)?;
        let award = award_xp(&tx, author_id, &reward)?;
        tx.commit()?;

        Ok(RawLikeInsert::Inserted {
          like: RawLike {
            like_id:    like_str,
            user_id:    user_str,
            idea_id:    idea_str,
            created_at: now_str,
          },
          award,
        })
      })
      .await?;

    Ok(match raw {
      RawLikeInsert::Inserted { like, award } => {
        LikeInsert::Inserted { like: like.into_like()?, award }
      }
      RawLikeInsert::QuotaExhausted => LikeInsert::QuotaExhausted,
      RawLikeInsert::Duplicate => LikeInsert::Duplicate,
      RawLikeInsert::IdeaMissing => LikeInsert::IdeaMissing,
    })
  }

  async fn delete_like(&self, user_id: Uuid, idea_id: Uuid) -> Result<bool> {
    let user_str = encode_uuid(user_id);
    let idea_str = encode_uuid(idea_id);

    Ok(
      self
        .conn
        .call(move |conn| {
          let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
          let deleted = tx.execute(
            "DELETE FROM likes WHERE user_id = ?1 AND idea_id = ?2",
            rusqlite::params![user_str, idea_str],
          )?;
          if deleted > 0 {
            tx.execute(
              "UPDATE ideas SET like_count = like_count - 1 WHERE idea_id = ?1",
              rusqlite::params![idea_str],
            )?;
          }
          tx.commit()?;
          Ok(deleted > 0)
        })
        .await?,
    )
  }

  async fn count_likes_since(
    &self,
    user_id: Uuid,
    since: DateTime<Utc>,
  ) -> Result<u64> {
    let user_str  = encode_uuid(user_id);
    let since_str = encode_dt(since);

    let n: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM like_ledger WHERE user_id = ?1 AND created_at >= ?2",
          rusqlite::params![user_str, since_str],
          |r| r.get(0),
        )?)
      })
      .await?;

    Ok(n.max(0) as u64)
  }

  async fn has_liked(&self, user_id: Uuid, idea_id: Uuid) -> Result<bool> {
    let user_str = encode_uuid(user_id);
    let idea_str = encode_uuid(idea_id);

    Ok(
      self
        .conn
        .call(move |conn| {
          Ok(
            conn
              .query_row(
                "SELECT 1 FROM likes WHERE user_id = ?1 AND idea_id = ?2",
                rusqlite::params![user_str, idea_str],
                |_| Ok(true),
              )
              .optional()?
              .unwrap_or(false),
          )
        })
        .await?,
    )
  }

  // ── Comments ──────────────────────────────────────────────────────────────

  async fn insert_comment(
    &self,
    idea_id: Uuid,
    author_id: Uuid,
    content: String,
    reward: XpGrant,
  ) -> Result<Option<Rewarded<Comment>>> {
    let comment = Comment {
      comment_id: Uuid::new_v4(),
      idea_id,
      author_id,
      content,
      reaction_count: 0,
      created_at: Utc::now(),
    };

    let comment_str = encode_uuid(comment.comment_id);
    let idea_str    = encode_uuid(idea_id);
    let author_str  = encode_uuid(author_id);
    let content     = comment.content.clone();
    let at_str      = encode_dt(comment.created_at);

    let award = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let bumped = tx.execute(
          "UPDATE ideas SET comment_count = comment_count + 1 WHERE idea_id = ?1",
          rusqlite::params![idea_str],
        )?;
        if bumped == 0 {
          return Ok(None);
        }
        tx.execute(
          "INSERT INTO comments
             (comment_id, idea_id, author_id, content, reaction_count, created_at)
           VALUES (?1, ?2, ?3, ?4, 0, ?5)",
          rusqlite::params![comment_str, idea_str, author_str, content, at_str],
        )?;
        let award = award_xp(&tx, author_id, &reward)?;
        tx.commit()?;
        Ok(Some(award))
      })
      .await?;

    Ok(award.map(|award| Rewarded { value: comment, award }))
  }

  async fn get_comment(&self, comment_id: Uuid) -> Result<Option<Comment>> {
    self
      .fetch_one(
        format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE comment_id = ?1"),
        comment_id,
        RawComment::read,
        RawComment::into_comment,
      )
      .await
  }

  async fn delete_comment(&self, comment_id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(comment_id);

    Ok(
      self
        .conn
        .call(move |conn| {
          let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
          let idea: Option<String> = tx
            .query_row(
              "DELETE FROM comments WHERE comment_id = ?1 RETURNING idea_id",
              rusqlite::params![id_str],
              |r| r.get(0),
            )
            .optional()?;
          let Some(idea_str) = idea else {
            return Ok(false);
          };
          tx.execute(
            "UPDATE ideas SET comment_count = comment_count - 1 WHERE idea_id = ?1",
            rusqlite::params![idea_str],
          )?;
          tx.commit()?;
          Ok(true)
        })
        .await?,
    )
  }

  async fn insert_reaction(
    &self,
    comment_id: Uuid,
    user_id: Uuid,
    emoji: String,
  ) -> Result<ReactionInsert> {
    let reaction = Reaction { comment_id, user_id, emoji, created_at: Utc::now() };

    let comment_str = encode_uuid(comment_id);
    let user_str    = encode_uuid(user_id);
    let emoji       = reaction.emoji.clone();
    let at_str      = encode_dt(reaction.created_at);

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let exists = tx
          .query_row(
            "SELECT 1 FROM comments WHERE comment_id = ?1",
            rusqlite::params![comment_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if !exists {
          return Ok(ReactionInsert::CommentMissing);
        }

        let inserted = tx.execute(
          "INSERT OR IGNORE INTO comment_reactions (comment_id, user_id, emoji, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![comment_str, user_str, emoji, at_str],
        )?;
        if inserted == 0 {
          return Ok(ReactionInsert::Duplicate);
        }
        tx.execute(
          "UPDATE comments SET reaction_count = reaction_count + 1 WHERE comment_id = ?1",
          rusqlite::params![comment_str],
        )?;
        tx.commit()?;
        Ok(ReactionInsert::Inserted(reaction))
      })
      .await?;

    Ok(outcome)
  }

  async fn delete_reaction(
    &self,
    comment_id: Uuid,
    user_id: Uuid,
    emoji: String,
  ) -> Result<bool> {
    let comment_str = encode_uuid(comment_id);
    let user_str    = encode_uuid(user_id);

    Ok(
      self
        .conn
        .call(move |conn| {
          let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
          let deleted = tx.execute(
            "DELETE FROM comment_reactions
             WHERE comment_id = ?1 AND user_id = ?2 AND emoji = ?3",
            rusqlite::params![comment_str, user_str, emoji],
          )?;
          if deleted > 0 {
            tx.execute(
              "UPDATE comments SET reaction_count = reaction_count - 1
               WHERE comment_id = ?1",
              rusqlite::params![comment_str],
            )?;
          }
          tx.commit()?;
          Ok(deleted > 0)
        })
        .await?,
    )
  }

  // ── Surveys ───────────────────────────────────────────────────────────────

  async fn create_survey(&self, input: NewSurvey) -> Result<SurveyView> {
    let survey = Survey {
      survey_id:            Uuid::new_v4(),
      creator_id:           input.creator_id,
      question:             input.question,
      description:          input.description,
      is_active:            true,
      is_anonymous:         input.is_anonymous,
      allow_multiple_votes: input.allow_multiple_votes,
      total_votes:          0,
      created_at:           Utc::now(),
    };
    let options: Vec<SurveyOption> = input
      .options
      .into_iter()
      .enumerate()
      .map(|(i, option_text)| SurveyOption {
        option_id: Uuid::new_v4(),
        survey_id: survey.survey_id,
        option_text,
        vote_count: 0,
        display_order: i as u32,
      })
      .collect();

    let survey_str  = encode_uuid(survey.survey_id);
    let creator_str = encode_uuid(survey.creator_id);
    let question    = survey.question.clone();
    let description = survey.description.clone();
    let anonymous   = survey.is_anonymous;
    let multiple    = survey.allow_multiple_votes;
    let at_str      = encode_dt(survey.created_at);
    let rows: Vec<(String, String, u32)> = options
      .iter()
      .map(|o| (encode_uuid(o.option_id), o.option_text.clone(), o.display_order))
      .collect();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute(
          "INSERT INTO surveys (
             survey_id, creator_id, question, description, is_active,
             is_anonymous, allow_multiple_votes, total_votes, created_at
           ) VALUES (?1, ?2, ?3, ?4, 1, ?5, ?6, 0, ?7)",
          rusqlite::params![
            survey_str, creator_str, question, description, anonymous, multiple,
            at_str,
          ],
        )?;
        {
          let mut stmt = tx.prepare(
            "INSERT INTO survey_options
               (option_id, survey_id, option_text, vote_count, display_order)
             VALUES (?1, ?2, ?3, 0, ?4)",
          )?;
          for (option_id, text, order) in &rows {
            stmt.execute(rusqlite::params![option_id, survey_str, text, order])?;
          }
        }
        tx.commit()?;
        Ok(())
      })
      .await?;

    Ok(SurveyView { survey, options, voted_option_ids: Vec::new() })
  }

  async fn survey_view(
    &self,
    survey_id: Uuid,
    viewer: Uuid,
  ) -> Result<Option<SurveyView>> {
    let survey_str = encode_uuid(survey_id);
    let viewer_str = encode_uuid(viewer);

    let raw = self
      .conn
      .call(move |conn| Ok(read_survey_view(conn, &survey_str, &viewer_str)?))
      .await?;

    raw.map(RawSurveyView::into_view).transpose()
  }

  async fn cast_votes(
    &self,
    survey_id: Uuid,
    user_id: Uuid,
    option_ids: Vec<Uuid>,
  ) -> Result<VoteOutcome> {
    let survey_str = encode_uuid(survey_id);
    let user_str   = encode_uuid(user_id);
    let now_str    = encode_dt(Utc::now());

    // Decoded in the closure; decode failures travel through `other`.
    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let Some(before) = read_survey_view(&tx, &survey_str, &user_str)? else {
          return Ok(VoteOutcome::SurveyMissing);
        };
        let before = before.into_view().map_err(other)?;
        let known: Vec<Uuid> = before.options.iter().map(|o| o.option_id).collect();

        let fresh = match survey::plan_votes(
          &before.survey,
          &known,
          &before.voted_option_ids,
          &option_ids,
        ) {
          Ok(fresh) => fresh,
          Err(rejection) => return Ok(VoteOutcome::Rejected(rejection)),
        };

        for option_id in fresh {
          let option_str = encode_uuid(option_id);
          let inserted = tx.execute(
            "INSERT OR IGNORE INTO survey_votes (survey_id, option_id, user_id, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![survey_str, option_str, user_str, now_str],
          )?;
          if inserted == 0 {
            continue;
          }
          tx.execute(
            "UPDATE survey_options SET vote_count = vote_count + 1 WHERE option_id = ?1",
            rusqlite::params![option_str],
          )?;
          tx.execute(
            "UPDATE surveys SET total_votes = total_votes + 1 WHERE survey_id = ?1",
            rusqlite::params![survey_str],
          )?;
        }

        let Some(after) = read_survey_view(&tx, &survey_str, &user_str)? else {
          return Ok(VoteOutcome::SurveyMissing);
        };
        tx.commit()?;
        Ok(VoteOutcome::Cast(after.into_view().map_err(other)?))
      })
      .await?;

    Ok(outcome)
  }

  async fn close_survey(&self, survey_id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(survey_id);

    let closed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE surveys SET is_active = 0 WHERE survey_id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await?;

    Ok(closed > 0)
  }

  async fn delete_survey(&self, survey_id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(survey_id);

    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM surveys WHERE survey_id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await?;

    Ok(deleted > 0)
  }

  // ── Groups ────────────────────────────────────────────────────────────────

  async fn get_group(&self, group_id: Uuid) -> Result<Option<IdeaGroup>> {
    self
      .fetch_one(
        format!("SELECT {GROUP_COLUMNS} FROM idea_groups WHERE group_id = ?1"),
        group_id,
        RawGroup::read,
        RawGroup::into_group,
      )
      .await
  }

  async fn group_for_idea(&self, idea_id: Uuid) -> Result<Option<IdeaGroup>> {
    self
      .fetch_one(
        format!("SELECT {GROUP_COLUMNS} FROM idea_groups WHERE idea_id = ?1"),
        idea_id,
        RawGroup::read,
        RawGroup::into_group,
      )
      .await
  }

  async fn membership(
    &self,
    group_id: Uuid,
    user_id: Uuid,
  ) -> Result<Option<GroupMember>> {
    let group_str = encode_uuid(group_id);
    let user_str  = encode_uuid(user_id);

    let raw: Option<RawMember> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {MEMBER_COLUMNS} FROM group_members
                 WHERE group_id = ?1 AND user_id = ?2"
              ),
              rusqlite::params![group_str, user_str],
              RawMember::read,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawMember::into_member).transpose()
  }

  async fn add_member(
    &self,
    group_id: Uuid,
    user_id: Uuid,
    role: GroupRole,
  ) -> Result<Option<GroupMember>> {
    let member = GroupMember { group_id, user_id, role, joined_at: Utc::now() };

    let group_str = encode_uuid(group_id);
    let user_str  = encode_uuid(user_id);
    let role_str  = role.to_string();
    let at_str    = encode_dt(member.joined_at);

    let inserted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "INSERT OR IGNORE INTO group_members (group_id, user_id, role, joined_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![group_str, user_str, role_str, at_str],
        )?)
      })
      .await?;

    Ok((inserted > 0).then_some(member))
  }

  async fn remove_member(&self, group_id: Uuid, user_id: Uuid) -> Result<bool> {
    let group_str = encode_uuid(group_id);
    let user_str  = encode_uuid(user_id);

    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM group_members WHERE group_id = ?1 AND user_id = ?2",
          rusqlite::params![group_str, user_str],
        )?)
      })
      .await?;

    Ok(removed > 0)
  }

  async fn members(&self, group_id: Uuid) -> Result<Vec<GroupMember>> {
    let group_str = encode_uuid(group_id);

    let raws: Vec<RawMember> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {MEMBER_COLUMNS} FROM group_members
           WHERE group_id = ?1
           ORDER BY joined_at, rowid"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![group_str], RawMember::read)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawMember::into_member).collect()
  }

  async fn memberships_of(&self, user_id: Uuid) -> Result<Vec<GroupMember>> {
    let user_str = encode_uuid(user_id);

    let raws: Vec<RawMember> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {MEMBER_COLUMNS} FROM group_members
           WHERE user_id = ?1
           ORDER BY joined_at, rowid"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![user_str], RawMember::read)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawMember::into_member).collect()
  }

  async fn insert_message(
    &self,
    group_id: Uuid,
    sender_id: Uuid,
    content: String,
  ) -> Result<GroupMessage> {
    let message = GroupMessage {
      message_id: Uuid::new_v4(),
      group_id,
      sender_id,
      content,
      created_at: Utc::now(),
    };

    let message_str = encode_uuid(message.message_id);
    let group_str   = encode_uuid(group_id);
    let sender_str  = encode_uuid(sender_id);
    let content     = message.content.clone();
    let at_str      = encode_dt(message.created_at);

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute(
          "INSERT INTO group_messages (message_id, group_id, sender_id, content, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![message_str, group_str, sender_str, content, at_str],
        )?;
        tx.execute(
          "INSERT INTO group_message_reads (message_id, user_id, read_at)
           VALUES (?1, ?2, ?3)",
          rusqlite::params![message_str, sender_str, at_str],
        )?;
        tx.execute(
          "UPDATE idea_groups SET updated_at = ?2 WHERE group_id = ?1",
          rusqlite::params![group_str, at_str],
        )?;
        tx.commit()?;
        Ok(())
      })
      .await?;

    Ok(message)
  }

  async fn get_message(&self, message_id: Uuid) -> Result<Option<GroupMessage>> {
    self
      .fetch_one(
        format!("SELECT {MESSAGE_COLUMNS} FROM group_messages WHERE message_id = ?1"),
        message_id,
        RawMessage::read,
        RawMessage::into_message,
      )
      .await
  }

  async fn insert_read_receipt(
    &self,
    message_id: Uuid,
    user_id: Uuid,
  ) -> Result<bool> {
    let message_str = encode_uuid(message_id);
    let user_str    = encode_uuid(user_id);
    let at_str      = encode_dt(Utc::now());

    let inserted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "INSERT OR IGNORE INTO group_message_reads (message_id, user_id, read_at)
           VALUES (?1, ?2, ?3)",
          rusqlite::params![message_str, user_str, at_str],
        )?)
      })
      .await?;

    Ok(inserted > 0)
  }

  async fn mark_group_read(&self, group_id: Uuid, user_id: Uuid) -> Result<u64> {
    let group_str = encode_uuid(group_id);
    let user_str  = encode_uuid(user_id);
    let at_str    = encode_dt(Utc::now());

    let marked = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "INSERT OR IGNORE INTO group_message_reads (message_id, user_id, read_at)
           SELECT m.message_id, ?2, ?3
           FROM group_messages m
           WHERE m.group_id = ?1
             AND m.sender_id != ?2
             AND NOT EXISTS (
               SELECT 1 FROM group_message_reads r
               WHERE r.message_id = m.message_id AND r.user_id = ?2
             )",
          rusqlite::params![group_str, user_str, at_str],
        )?)
      })
      .await?;

    Ok(marked as u64)
  }

  async fn count_unread(&self, group_id: Uuid, user_id: Uuid) -> Result<u64> {
    let group_str = encode_uuid(group_id);
    let user_str  = encode_uuid(user_id);

    let n: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*)
           FROM group_messages m
           WHERE m.group_id = ?1
             AND m.sender_id != ?2
             AND NOT EXISTS (
               SELECT 1 FROM group_message_reads r
               WHERE r.message_id = m.message_id AND r.user_id = ?2
             )",
          rusqlite::params![group_str, user_str],
          |r| r.get(0),
        )?)
      })
      .await?;

    Ok(n.max(0) as u64)
  }
}
