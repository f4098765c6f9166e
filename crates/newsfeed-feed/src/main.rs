//! feed server binary.
//!
//! Reads `feed.toml` (or the path given with `--config`) layered under
//! `FEED_*` environment variables, opens the SQLite store and friend cache,
//! and serves the feed API over HTTP.

use std::{
  path::PathBuf,
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use newsfeed_core::store::EventLog;
use newsfeed_feed::{AppState, FeedConfig};
use newsfeed_store_sqlite::{SqliteCache, SqliteStore, resolve_db_path};
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Newsfeed feed service")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "feed.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings = config::Config::builder()
    .set_default("host", "0.0.0.0")?
    .set_default("port", 8080)?
    .set_default("store_path", "feed.db")?
    .set_default("cache_path", "feed-cache.db")?
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("FEED"))
    .build()
    .context("failed to read config file")?;

  let cfg: FeedConfig = settings
    .try_deserialize()
    .context("failed to deserialise FeedConfig")?;

  let store_path = resolve_db_path(&cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?
    .with_retention(cfg.retention());

  let cache_path = resolve_db_path(&cfg.cache_path);
  let cache = SqliteCache::open(&cache_path)
    .await
    .with_context(|| format!("failed to open friend cache at {cache_path:?}"))?;

  let store = Arc::new(store);
  spawn_purge(Arc::clone(&store), cfg.purge_interval());

  let app = newsfeed_feed::router(AppState::new(store, Arc::new(cache)));
  let address = format!("{}:{}", cfg.host, cfg.port);

  tracing::info!(retention_days = cfg.retention_days, "Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Periodically delete expired events. Reads already hide them; this only
/// reclaims space.
fn spawn_purge(store: Arc<SqliteStore>, every: std::time::Duration) {
  tokio::spawn(async move {
    let mut ticker = tokio::time::interval(every);
    loop {
      ticker.tick().await;
      if let Err(e) = store.purge_expired().await {
        tracing::warn!(error = %e, "event purge failed");
      }
    }
  });
}
