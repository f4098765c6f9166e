//! [`SqliteCache`], a [`KeyValueCache`] with per-entry expiry.

use std::{path::Path, time::Duration};

use chrono::Utc;
use rusqlite::OptionalExtension as _;

use newsfeed_core::store::KeyValueCache;

use crate::{Result, encode::cache_expiry_millis, schema::CACHE_SCHEMA};

/// A string key-value cache in its own SQLite database.
///
/// Each instance is an independent keyspace. Expired entries are invisible to
/// reads immediately and physically removed by [`SqliteCache::purge_expired`]
/// or when the key is next written.
#[derive(Clone)]
pub struct SqliteCache {
  conn: tokio_rusqlite::Connection,
}

impl SqliteCache {
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let cache = Self { conn };
    cache.init_schema().await?;
    Ok(cache)
  }

  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let cache = Self { conn };
    cache.init_schema().await?;
    Ok(cache)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(CACHE_SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Delete every expired entry; returns how many were removed.
  pub async fn purge_expired(&self) -> Result<usize> {
    let now_ms = Utc::now().timestamp_millis();
    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM entries WHERE expires_at IS NOT NULL AND expires_at <= ?1",
          rusqlite::params![now_ms],
        )?)
      })
      .await?;
    Ok(removed)
  }
}

impl KeyValueCache for SqliteCache {
  type Error = crate::Error;

  async fn get(&self, key: &str) -> Result<Option<String>> {
    let key    = key.to_owned();
    let now_ms = Utc::now().timestamp_millis();

    let value = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT value FROM entries
             WHERE key = ?1 AND (expires_at IS NULL OR expires_at > ?2)",
            rusqlite::params![key, now_ms],
            |r| r.get(0),
          )
          .optional()?)
      })
      .await?;
    Ok(value)
  }

  async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
    let key        = key.to_owned();
    let value      = value.to_owned();
    let expires_at = cache_expiry_millis(Utc::now(), ttl);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO entries (key, value, expires_at) VALUES (?1, ?2, ?3)
           ON CONFLICT (key) DO UPDATE
             SET value = excluded.value, expires_at = excluded.expires_at",
          rusqlite::params![key, value, expires_at],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn delete(&self, key: &str) -> Result<bool> {
    let key    = key.to_owned();
    let now_ms = Utc::now().timestamp_millis();

    let live = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let live = tx.execute(
          "DELETE FROM entries
           WHERE key = ?1 AND (expires_at IS NULL OR expires_at > ?2)",
          rusqlite::params![key, now_ms],
        )?;
        // Whatever is left under the key has expired.
        tx.execute("DELETE FROM entries WHERE key = ?1", rusqlite::params![key])?;
        tx.commit()?;
        Ok(live > 0)
      })
      .await?;
    Ok(live)
  }
}
