//! JSON REST API for Ideaboard engagement.
//!
//! Exposes an axum [`Router`] backed by an [`Engine`]. Authentication, TLS and
//! transport concerns are the caller's responsibility; handlers that act on
//! behalf of a user read its id from the `X-User-Id` header.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", ideaboard_api::api_router(engine.clone()))
//! ```

pub mod caller;
pub mod checklist;
pub mod error;
pub mod groups;
pub mod ideas;
pub mod surveys;
pub mod users;

use std::sync::Arc;

use axum::{
  Router,
  routing::{delete, get, post, put},
};
use ideaboard_core::{clock::Clock, notification::Notifier, store::EngagementStore};
use ideaboard_engine::Engine;

pub use caller::{CALLER_HEADER, Caller};
pub use error::ApiError;

pub(crate) type Shared<S, N, C> = Arc<Engine<S, N, C>>;

/// Build a fully-materialised API router for `engine`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, N, C>(engine: Arc<Engine<S, N, C>>) -> Router<()>
where
  S: EngagementStore + 'static,
  N: Notifier + 'static,
  C: Clock + 'static,
{
  Router::new()
    // Users
    .route("/users", post(users::create::<S, N, C>))
    .route("/users/{id}/progress", get(users::progress::<S, N, C>))
    .route("/me/progress", get(users::my_progress::<S, N, C>))
    .route("/me/likes", get(users::my_likes::<S, N, C>))
    .route("/me/unread", get(users::my_unread::<S, N, C>))
    .route("/me/unread/total", get(users::my_unread_total::<S, N, C>))
    // Ideas
    .route("/ideas", post(ideas::submit::<S, N, C>))
    .route(
      "/ideas/{id}",
      get(ideas::get_one::<S, N, C>).delete(ideas::delete_one::<S, N, C>),
    )
    .route("/ideas/{id}/status", put(ideas::set_status::<S, N, C>))
    .route(
      "/ideas/{id}/like",
      post(ideas::like::<S, N, C>).delete(ideas::unlike::<S, N, C>),
    )
    .route("/ideas/{id}/comments", post(ideas::comment::<S, N, C>))
    .route("/comments/{id}", delete(ideas::delete_comment::<S, N, C>))
    .route("/comments/{id}/reactions", post(ideas::react::<S, N, C>))
    .route(
      "/comments/{id}/reactions/{emoji}",
      delete(ideas::unreact::<S, N, C>),
    )
    // Checklist
    .route("/ideas/{id}/checklist", post(checklist::create::<S, N, C>))
    .route(
      "/ideas/{id}/checklist/{item}",
      put(checklist::rename::<S, N, C>).delete(checklist::delete_one::<S, N, C>),
    )
    .route(
      "/ideas/{id}/checklist/{item}/toggle",
      post(checklist::toggle::<S, N, C>),
    )
    // Surveys
    .route("/surveys", post(surveys::create::<S, N, C>))
    .route(
      "/surveys/{id}",
      get(surveys::get_one::<S, N, C>).delete(surveys::delete_one::<S, N, C>),
    )
    .route("/surveys/{id}/votes", post(surveys::vote::<S, N, C>))
    .route("/surveys/{id}/close", post(surveys::close::<S, N, C>))
    // Groups
    .route(
      "/groups/{id}/members",
      post(groups::join::<S, N, C>).delete(groups::leave::<S, N, C>),
    )
    .route("/groups/{id}/messages", post(groups::send::<S, N, C>))
    .route("/groups/{id}/read", post(groups::read_all::<S, N, C>))
    .route("/messages/{id}/read", post(groups::read_one::<S, N, C>))
    .with_state(engine)
}
