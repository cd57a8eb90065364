//! Unread message accounting for group conversations.
//!
//! A message is unread for a user when someone else sent it and the user has
//! no read receipt for it. Totals are built by walking the user's own
//! memberships.

use ideaboard_core::{
  Error, Result,
  group::{GroupMessage, GroupUnread, UnreadSummary},
  store::EngagementStore,
};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default)]
pub struct UnreadTracker;

impl UnreadTracker {
  pub async fn unread<S: EngagementStore>(
    &self,
    store: &S,
    group_id: Uuid,
    user_id: Uuid,
  ) -> Result<u64> {
    store
      .count_unread(group_id, user_id)
      .await
      .map_err(Error::storage)
  }

  /// Idempotent. Returns whether a receipt was created.
  pub async fn mark_read<S: EngagementStore>(
    &self,
    store: &S,
    message: &GroupMessage,
    user_id: Uuid,
  ) -> Result<bool> {
    if message.sender_id == user_id {
      return Ok(false);
    }
    store
      .insert_read_receipt(message.message_id, user_id)
      .await
      .map_err(Error::storage)
  }

  /// Returns how many messages became read.
  pub async fn mark_all_read<S: EngagementStore>(
    &self,
    store: &S,
    group_id: Uuid,
    user_id: Uuid,
  ) -> Result<u64> {
    store
      .mark_group_read(group_id, user_id)
      .await
      .map_err(Error::storage)
  }

  pub async fn summary<S: EngagementStore>(
    &self,
    store: &S,
    user_id: Uuid,
  ) -> Result<UnreadSummary> {
    let memberships = store
      .memberships_of(user_id)
      .await
      .map_err(Error::storage)?;

    let mut groups = Vec::with_capacity(memberships.len());
    for m in memberships {
      let unread = self.unread(store, m.group_id, user_id).await?;
      groups.push(GroupUnread { group_id: m.group_id, unread });
    }
    Ok(groups.into_iter().collect())
  }

  pub async fn total_unread<S: EngagementStore>(
    &self,
    store: &S,
    user_id: Uuid,
  ) -> Result<u64> {
    Ok(self.summary(store, user_id).await?.total)
  }
}
