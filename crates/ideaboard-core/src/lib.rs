//! Core types and trait definitions for the Ideaboard engagement engine.
//!
//! This crate is deliberately free of HTTP and database dependencies. It
//! holds the domain model, the error taxonomy, the persistence and
//! notification seams, and the pure rules: the quota week, the level table,
//! the progress state machine, the capability policy and badge criteria.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod badge;
pub mod clock;
pub mod error;
pub mod group;
pub mod idea;
pub mod level;
pub mod notification;
pub mod policy;
pub mod progress;
pub mod store;
pub mod survey;
pub mod user;

pub use error::{Entity, Error, Result};
