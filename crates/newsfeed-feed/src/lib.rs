//! The feed service: participants, friend edges and timelines over JSON.
//!
//! Exposes an axum [`Router`] backed by any store implementing the
//! `newsfeed-core` store traits, with friend reads served through a
//! [`KeyValueCache`].

pub mod error;
pub mod friends;
pub mod handlers;
pub mod timeline;

pub use error::{ApiError, FriendError};
pub use friends::{FriendDirectory, FriendList};

use std::{path::PathBuf, sync::Arc, time::Duration};

use axum::{
  Router,
  routing::{get, post},
};
use newsfeed_core::store::{EventLog, FriendGraph, KeyValueCache, ParticipantStore};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime configuration, deserialised from `config.toml` and `FEED_*`
/// environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct FeedConfig {
  pub host:                String,
  pub port:                u16,
  pub store_path:          PathBuf,
  pub cache_path:          PathBuf,
  /// How long inbound and outbound events are kept.
  #[serde(default = "default_retention_days")]
  pub retention_days:      u64,
  /// How often expired events are physically removed.
  #[serde(default = "default_purge_interval_secs")]
  pub purge_interval_secs: u64,
}

fn default_retention_days() -> u64 { 90 }

fn default_purge_interval_secs() -> u64 { 60 * 60 }

impl FeedConfig {
  pub fn retention(&self) -> Duration {
    Duration::from_secs(self.retention_days.saturating_mul(24 * 60 * 60))
  }

  pub fn purge_interval(&self) -> Duration {
    Duration::from_secs(self.purge_interval_secs.max(1))
  }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Everything the feed router needs from its durable store.
pub trait FeedStore: FriendGraph + EventLog + ParticipantStore + 'static {}

impl<T> FeedStore for T where T: FriendGraph + EventLog + ParticipantStore + 'static {}

/// Shared state threaded through all axum handlers.
pub struct AppState<S, C> {
  pub store:   Arc<S>,
  pub friends: FriendDirectory<S, C>,
}

impl<S, C> Clone for AppState<S, C> {
  fn clone(&self) -> Self {
    Self { store: Arc::clone(&self.store), friends: self.friends.clone() }
  }
}

impl<S, C> AppState<S, C>
where
  S: FeedStore,
  C: KeyValueCache + 'static,
{
  pub fn new(store: Arc<S>, friend_cache: Arc<C>) -> Self {
    let friends = FriendDirectory::new(Arc::clone(&store), friend_cache);
    Self { store, friends }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the feed service router.
pub fn router<S, C>(state: AppState<S, C>) -> Router
where
  S: FeedStore,
  C: KeyValueCache + 'static,
{
  use handlers::{events, friends, participants};

  Router::new()
    .route("/participant",                post(participants::create::<S, C>))
    .route("/participant/friends",        post(friends::create::<S, C>))
    .route("/participant/inbound",        post(events::append_inbound::<S, C>))
    .route("/participant/outbound",       post(events::append_outbound::<S, C>))
    .route("/participant/{id}",           get(participants::get_one::<S, C>))
    .route("/participant/{id}/friends",   get(friends::list::<S, C>))
    .route("/participant/{id}/inbound",   get(events::list_inbound::<S, C>))
    .route("/participant/{id}/outbound",  get(events::list_outbound::<S, C>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

// ─── Integration tests ────────────────────────────────────────────────────────
