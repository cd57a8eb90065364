//! Tunables for the engagement rules.
//!
//! The defaults are the production rules; deployments normally leave the
//! `[engagement]` table out of their config entirely.

use serde::Deserialize;

/// XP paid for each qualifying action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct XpRewards {
  pub idea_submitted: u32,
  pub idea_completed: u32,
  pub like_received:  u32,
  pub comment_posted: u32,
}

impl Default for XpRewards {
  fn default() -> Self {
    Self {
      idea_submitted: 50,
      idea_completed: 100,
      like_received:  10,
      comment_posted: 5,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
  /// Likes a user may hand out per quota week.
  pub weekly_like_limit: u32,
  pub rewards:           XpRewards,
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self { weekly_like_limit: 3, rewards: XpRewards::default() }
  }
}
