//! The edge service: password-grant login and a bearer-authenticated view of
//! the feed.
//!
//! A username seen for the first time is provisioned on the spot: the feed
//! service creates its participant, an OAuth client is registered for it and
//! its credential record is written to the credential cache.

pub mod authorize;
pub mod bearer;
pub mod clients;
pub mod error;
pub mod feed_client;
pub mod gate;
pub mod handlers;
pub mod locks;
pub mod provision;
pub mod tokens;

pub use error::{ApiError, AuthError, ProvisionError};
pub use feed_client::FeedClient;
pub use gate::CredentialGate;
pub use provision::Provisioner;

use std::{path::PathBuf, sync::Arc, time::Duration};

use axum::{
  Router,
  extract::FromRef,
  routing::{get, post},
};
use newsfeed_core::store::KeyValueCache;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use crate::{clients::MemoryClientRegistry, error::FeedError, tokens::MemoryTokenIssuer};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime configuration, deserialised from `edge.toml` and `EDGE_*`
/// environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct EdgeConfig {
  pub host:                  String,
  pub port:                  u16,
  /// Base URL of the feed service, which is also the identity service.
  pub feed_url:              String,
  /// Domain recorded on provisioned OAuth clients.
  pub domain:                String,
  pub credential_cache_path: PathBuf,
  /// Lifetime of credential records. Absent or zero: records never expire.
  #[serde(default)]
  pub credential_ttl_secs:   Option<u64>,
  #[serde(default = "default_token_lifetime_secs")]
  pub token_lifetime_secs:   u64,
  #[serde(default = "default_upstream_timeout_secs")]
  pub upstream_timeout_secs: u64,
}

fn default_token_lifetime_secs() -> u64 { 2 * 60 * 60 }

fn default_upstream_timeout_secs() -> u64 { 10 }

impl EdgeConfig {
  pub fn credential_ttl(&self) -> Option<Duration> {
    self.credential_ttl_secs.filter(|s| *s > 0).map(Duration::from_secs)
  }

  pub fn token_lifetime(&self) -> Duration { Duration::from_secs(self.token_lifetime_secs) }

  pub fn upstream_timeout(&self) -> Duration {
    Duration::from_secs(self.upstream_timeout_secs.max(1))
  }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<C> {
  pub gate:    Arc<CredentialGate<C, FeedClient, MemoryClientRegistry>>,
  pub clients: Arc<MemoryClientRegistry>,
  pub tokens:  Arc<MemoryTokenIssuer>,
  pub feed:    FeedClient,
}

impl<C> Clone for AppState<C> {
  fn clone(&self) -> Self {
    Self {
      gate:    Arc::clone(&self.gate),
      clients: Arc::clone(&self.clients),
      tokens:  Arc::clone(&self.tokens),
      feed:    self.feed.clone(),
    }
  }
}

impl<C> AppState<C>
where
  C: KeyValueCache + 'static,
{
  /// Wire the gate, registry and token issuer over `credentials`.
  pub fn new(config: &EdgeConfig, credentials: Arc<C>) -> Result<Self, FeedError> {
    let feed = FeedClient::new(config.feed_url.clone(), config.upstream_timeout())?;
    let clients = Arc::new(MemoryClientRegistry::new());

    let provisioner = Provisioner::new(
      Arc::new(feed.clone()),
      Arc::clone(&clients),
      Arc::clone(&credentials),
    )
    .with_domain(config.domain.clone())
    .with_credential_ttl(config.credential_ttl());

    Ok(Self {
      gate: Arc::new(CredentialGate::new(credentials, provisioner)),
      clients,
      tokens: Arc::new(MemoryTokenIssuer::new(config.token_lifetime())),
      feed,
    })
  }
}

impl<C> FromRef<AppState<C>> for Arc<MemoryTokenIssuer> {
  fn from_ref(state: &AppState<C>) -> Self { Arc::clone(&state.tokens) }
}

impl<C> FromRef<AppState<C>> for FeedClient {
  fn from_ref(state: &AppState<C>) -> Self { state.feed.clone() }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the edge service router.
pub fn router<C>(state: AppState<C>) -> Router
where
  C: KeyValueCache + 'static,
{
  use handlers::{account, oauth};

  Router::new()
    .route("/token",    post(oauth::token::<C>))
    .route("/test",     get(oauth::test))
    .route("/me",       get(account::me))
    .route("/friends",  get(account::friends).post(account::add_friend))
    .route("/inbound",  get(account::inbound))
    .route("/outbound", get(account::outbound).post(account::post_story))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

// ─── Integration tests ────────────────────────────────────────────────────────
