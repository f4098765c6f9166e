//! edge server binary.
//!
//! Reads `edge.toml` (or the path given with `--config`) layered under
//! `EDGE_*` environment variables, opens the credential cache and serves the
//! token endpoint and the bearer-authenticated feed view over HTTP.

use std::{
  path::PathBuf,
  sync::Arc,
  time::Duration,
};

use anyhow::Context as _;
use clap::Parser;
use newsfeed_edge::{AppState, EdgeConfig, tokens::MemoryTokenIssuer};
use newsfeed_store_sqlite::{SqliteCache, resolve_db_path};
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// How often expired credential records and tokens are swept.
const SWEEP_INTERVAL: Duration = Duration::from_secs(10 * 60);

#[derive(Parser)]
#[command(author, version, about = "Newsfeed edge service")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "edge.toml")]
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
    .set_default("port", 9000)?
    .set_default("feed_url", "http://localhost:8080")?
    .set_default("domain", "http://localhost:9000")?
    .set_default("credential_cache_path", "edge-credentials.db")?
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("EDGE"))
    .build()
    .context("failed to read config file")?;

  let cfg: EdgeConfig = settings
    .try_deserialize()
    .context("failed to deserialise EdgeConfig")?;

  let cache_path = resolve_db_path(&cfg.credential_cache_path);
  let credentials = SqliteCache::open(&cache_path)
    .await
    .with_context(|| format!("failed to open credential cache at {cache_path:?}"))?;
  let credentials = Arc::new(credentials);

  let state = AppState::new(&cfg, Arc::clone(&credentials))
    .context("failed to build feed client")?;
  spawn_sweep(credentials, Arc::clone(&state.tokens));

  let app = newsfeed_edge::router(state);
  let address = format!("{}:{}", cfg.host, cfg.port);

  tracing::info!(
    feed_url = %cfg.feed_url,
    credential_ttl_secs = ?cfg.credential_ttl_secs,
    "Listening on http://{address}"
  );
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Periodically drop expired credential records and tokens. Reads already
/// ignore them; this only reclaims space.
fn spawn_sweep(credentials: Arc<SqliteCache>, tokens: Arc<MemoryTokenIssuer>) {
  tokio::spawn(async move {
    let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
    loop {
      ticker.tick().await;
      if let Err(e) = credentials.purge_expired().await {
        tracing::warn!(error = %e, "credential sweep failed");
      }
      let dropped = tokens.purge_expired();
      tracing::debug!(dropped, "token sweep");
    }
  });
}
