//! SQLite backend for the Ideaboard engagement store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Every [`EngagementStore`] method runs
//! as a single statement or an `IMMEDIATE` transaction, which is what makes
//! the counters, the weekly like quota and badge grants race-free.
//!
//! [`EngagementStore`]: ideaboard_core::store::EngagementStore

mod encode;
mod notify;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use notify::StoredNotification;
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
