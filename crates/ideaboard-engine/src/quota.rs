//! The weekly like quota.
//!
//! Usage is the number of likes a user created since the start of the
//! current quota week, including likes they have since withdrawn. The week
//! boundary is taken in the server's local time zone from the `now` passed
//! in, so it moves as soon as the clock crosses Sunday midnight.

use chrono::{DateTime, Local, Utc};
use ideaboard_core::{
  Entity, Error, Result,
  clock::WeekWindow,
  idea::{Idea, Like},
  store::{EngagementStore, LikeInsert, QuotaWindow, XpGrant},
  user::XpAward,
};
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone, Copy)]
pub struct QuotaTracker {
  limit: u32,
}

impl QuotaTracker {
  pub fn new(limit: u32) -> Self { Self { limit } }

  pub fn limit(&self) -> u32 { self.limit }

  pub fn window(&self, now: DateTime<Utc>) -> QuotaWindow {
    let week = WeekWindow::containing(now, &Local);
    QuotaWindow { since: week.start, limit: self.limit, now }
  }

  pub async fn used<S: EngagementStore>(
    &self,
    store: &S,
    user_id: Uuid,
    now: DateTime<Utc>,
  ) -> Result<u64> {
    store
      .count_likes_since(user_id, self.window(now).since)
      .await
      .map_err(Error::storage)
  }

  /// `max(0, limit - used)`.
  pub async fn remaining<S: EngagementStore>(
    &self,
    store: &S,
    user_id: Uuid,
    now: DateTime<Utc>,
  ) -> Result<u32> {
    let used = self.used(store, user_id, now).await?;
    let used = u32::try_from(used).unwrap_or(u32::MAX);
    Ok(self.limit.saturating_sub(used))
  }

  /// Spend one quota slot on liking `idea`, paying `reward` to its author
  /// in the same write.
  pub async fn like<S: EngagementStore>(
    &self,
    store: &S,
    user_id: Uuid,
    idea: &Idea,
    now: DateTime<Utc>,
    reward: XpGrant,
  ) -> Result<(Like, XpAward)> {
    if idea.author_id == user_id {
      return Err(Error::InvalidOperation(
        "you cannot like your own idea".into(),
      ));
    }

    let window = self.window(now);
    match store
      .insert_like(user_id, idea.idea_id, window, reward)
      .await
      .map_err(Error::storage)?
    {
      LikeInsert::Inserted { like, award } => {
        debug!(%user_id, idea_id = %idea.idea_id, since = %window.since, "like recorded");
        Ok((like, award))
      }
      LikeInsert::QuotaExhausted => {
        debug!(%user_id, limit = self.limit, "weekly like quota exhausted");
        Err(Error::QuotaExceeded { limit: self.limit })
      }
      LikeInsert::Duplicate => {
        Err(Error::Conflict("you already like this idea".into()))
      }
      LikeInsert::IdeaMissing => {
        Err(Error::not_found(Entity::Idea, idea.idea_id))
      }
    }
  }

  /// Withdraw a like. The quota slot it used stays spent.
  pub async fn unlike<S: EngagementStore>(
    &self,
    store: &S,
    user_id: Uuid,
    idea_id: Uuid,
  ) -> Result<()> {
    let removed = store
      .delete_like(user_id, idea_id)
      .await
      .map_err(Error::storage)?;
    if !removed {
      return Err(Error::not_found(Entity::Like, idea_id));
    }
    debug!(%user_id, %idea_id, "like withdrawn");
    Ok(())
  }
}
