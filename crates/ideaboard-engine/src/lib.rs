//! The Ideaboard engagement engine.
//!
//! [`Engine`] is the single entry point the API layer calls. It is generic
//! over an [`EngagementStore`], a [`Notifier`] and a [`Clock`], and composes
//! the rule components that live in this crate:
//!
//! - [`QuotaTracker`]: the weekly like limit.
//! - [`XpLedger`]: XP grants paid by the store and level tracking.
//! - [`BadgeEvaluator`]: at-most-once badge grants.
//! - [`UnreadTracker`]: per-group and total unread message counts.
//!
//! [`EngagementStore`]: ideaboard_core::store::EngagementStore
//! [`Notifier`]: ideaboard_core::notification::Notifier
//! [`Clock`]: ideaboard_core::clock::Clock

pub mod badges;
pub mod config;
pub mod engine;
pub mod notices;
pub mod quota;
pub mod unread;
pub mod xp;

pub use badges::BadgeEvaluator;
pub use config::{EngineConfig, XpRewards};
pub use engine::{Engine, IdeaDraft, SurveyDraft};
pub use quota::QuotaTracker;
pub use unread::UnreadTracker;
pub use xp::{XpAward, XpLedger};
