//! Badge evaluation.
//!
//! The evaluator holds a registry of [`BadgeCriterion`]s keyed by catalogue
//! name and is otherwise criterion-agnostic.

use ideaboard_core::{
  Error, Result,
  badge::{self, BadgeCriterion},
  store::EngagementStore,
  user::Badge,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct BadgeEvaluator {
  criteria: Vec<BadgeCriterion>,
}

impl Default for BadgeEvaluator {
  fn default() -> Self { Self::new(badge::standard_criteria()) }
}

impl BadgeEvaluator {
  pub fn new(criteria: Vec<BadgeCriterion>) -> Self { Self { criteria } }

  /// Add or replace the criterion registered under `criterion.name`.
  pub fn register(&mut self, criterion: BadgeCriterion) {
    self.criteria.retain(|c| c.name != criterion.name);
    self.criteria.push(criterion);
  }

  pub fn criterion(&self, name: &str) -> Option<&BadgeCriterion> {
    self.criteria.iter().find(|c| c.name == name)
  }

  /// Grant the badge named `name` if the user now qualifies. Returns the
  /// badge only when this call created the grant.
  pub async fn evaluate<S: EngagementStore>(
    &self,
    store: &S,
    user_id: Uuid,
    name: &str,
  ) -> Result<Option<Badge>> {
    let Some(criterion) = self.criterion(name) else {
      warn!(badge = name, "no criterion registered");
      return Ok(None);
    };
    let Some(badge) = store
      .badge_by_name(name.to_owned())
      .await
      .map_err(Error::storage)?
    else {
      warn!(badge = name, "badge missing from catalogue");
      return Ok(None);
    };

    if store
      .has_badge(user_id, badge.badge_id)
      .await
      .map_err(Error::storage)?
    {
      return Ok(None);
    }

    let stats = store.user_stats(user_id).await.map_err(Error::storage)?;
    if !criterion.is_met(&stats) {
      return Ok(None);
    }

    match store
      .grant_badge(user_id, badge.badge_id)
      .await
      .map_err(Error::storage)?
    {
      Some(_) => {
        info!(%user_id, badge = name, "badge granted");
        Ok(Some(badge))
      }
      None => {
        debug!(%user_id, badge = name, "lost grant race");
        Ok(None)
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use ideaboard_core::user::UserStats;

  use super::*;

  #[test]
  fn registering_replaces_by_name() {
    let mut evaluator = BadgeEvaluator::default();
    assert!(evaluator.criterion(badge::POPULAR).is_some());

    evaluator.register(BadgeCriterion {
      name:      badge::POPULAR,
      predicate: |s| s.likes_received >= 1,
    });
    let popular = evaluator.criterion(badge::POPULAR).unwrap();
    assert!(popular.is_met(&UserStats { likes_received: 1, ..Default::default() }));
    assert_eq!(
      evaluator
        .criteria
        .iter()
        .filter(|c| c.name == badge::POPULAR)
        .count(),
      1
    );
  }
}
