//! Wiring for the Ideaboard engagement server.
//!
//! Holds the runtime configuration and assembles the HTTP application from
//! the engine API and the SQLite-backed notification inbox.

pub mod inbox;

use std::{path::PathBuf, sync::Arc};

use axum::Router;
use ideaboard_core::clock::SystemClock;
use ideaboard_engine::{Engine, EngineConfig};
use ideaboard_store_sqlite::SqliteStore;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

/// The engine as deployed: SQLite for both state and the notification inbox.
pub type ServerEngine = Engine<SqliteStore, SqliteStore, SystemClock>;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `IDEABOARD_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:       String,
  #[serde(default = "default_port")]
  pub port:       u16,
  #[serde(default = "default_store_path")]
  pub store_path: PathBuf,
  #[serde(default)]
  pub engagement: EngineConfig,
}

fn default_host() -> String { "127.0.0.1".to_owned() }

fn default_port() -> u16 { 8080 }

fn default_store_path() -> PathBuf { PathBuf::from("~/.local/share/ideaboard/ideaboard.db") }

// ─── Application ─────────────────────────────────────────────────────────────

pub fn engine(store: SqliteStore, config: EngineConfig) -> ServerEngine {
  Engine::new(store.clone(), store, SystemClock, config)
}

/// Build the full application: everything lives under `/api`.
pub fn app(engine: Arc<ServerEngine>) -> Router {
  let inbox = inbox::router(engine.store().clone());
  Router::new()
    .nest("/api", ideaboard_api::api_router(engine).merge(inbox))
    .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
  use axum::{
    body::Body,
    http::{Request, StatusCode},
  };
  use config::{Config, File, FileFormat};
  use ideaboard_api::CALLER_HEADER;
  use ideaboard_core::user::UserRole;
  use ideaboard_engine::IdeaDraft;
  use serde_json::Value;
  use tower::ServiceExt as _;

  use super::*;

  #[test]
  fn config_defaults_fill_a_partial_file() {
    let settings = Config::builder()
      .add_source(File::from_str(
        "port = 9000\n[engagement]\nweekly_like_limit = 5\n",
        FileFormat::Toml,
      ))
      .build()
      .unwrap();
    let cfg: ServerConfig = settings.try_deserialize().unwrap();
    assert_eq!(cfg.host, "127.0.0.1");
    assert_eq!(cfg.port, 9000);
    assert_eq!(cfg.engagement.weekly_like_limit, 5);
    assert_eq!(cfg.engagement.rewards.idea_submitted, 50);
  }

  #[tokio::test]
  async fn likes_land_in_the_authors_inbox() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let engine = Arc::new(engine(store, EngineConfig::default()));
    let alice = engine.create_user("alice", UserRole::Employee).await.unwrap();
    let bob = engine.create_user("bob", UserRole::Employee).await.unwrap();
    let idea = engine
      .submit_idea(alice.user_id, IdeaDraft {
        title:       "Fruit basket on Mondays".into(),
        description: "Apples, mostly.".into(),
        category:    "Office".into(),
        ..Default::default()
      })
      .await
      .unwrap()
      .idea;
    engine.like_idea(bob.user_id, idea.idea_id).await.unwrap();

    let app = app(engine);
    let response = app
      .clone()
      .oneshot(
        Request::builder()
          .uri("/api/me/notifications")
          .header(CALLER_HEADER, alice.user_id.to_string())
          .body(Body::empty())
          .unwrap(),
      )
      .await
      .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
      .await
      .unwrap();
    let inbox: Value = serde_json::from_slice(&bytes).unwrap();
    let kinds: Vec<&str> = inbox
      .as_array()
      .unwrap()
      .iter()
      .map(|n| n["kind"].as_str().unwrap())
      .collect();
    // Newest first: the like, then the badge from submitting.
    assert_eq!(kinds, vec!["LIKE", "BADGE_EARNED"]);

    let like_id = inbox[0]["notification_id"].as_str().unwrap();
    let read = |caller: uuid::Uuid| {
      Request::builder()
        .method("POST")
        .uri(format!("/api/notifications/{like_id}/read"))
        .header(CALLER_HEADER, caller.to_string())
        .body(Body::empty())
        .unwrap()
    };
    let response = app.clone().oneshot(read(bob.user_id)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let response = app.oneshot(read(alice.user_id)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
  }
}
