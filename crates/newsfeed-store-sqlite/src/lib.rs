//! SQLite backends for the newsfeed stores.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. [`SqliteStore`] holds the friend graph,
//! the participants and the event log; [`SqliteCache`] is the key-value cache
//! with per-entry expiry.

mod cache;
mod encode;
mod path;
mod schema;
mod store;

pub mod error;

pub use cache::SqliteCache;
pub use error::{Error, Result};
pub use path::resolve_db_path;
pub use store::{DEFAULT_RETENTION, SqliteStore};

#[cfg(test)]
mod tests;
