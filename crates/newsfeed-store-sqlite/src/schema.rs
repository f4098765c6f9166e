//! SQL schema for the newsfeed SQLite stores.
//!
//! Executed once at connection startup. Every statement is idempotent.

/// DDL for [`crate::SqliteStore`].
pub const STORE_SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS participants (
    id    INTEGER PRIMARY KEY AUTOINCREMENT,
    name  TEXT NOT NULL,
    link  TEXT NOT NULL DEFAULT ''
);

-- One row per friendship; the pair is unique in either direction.
CREATE TABLE IF NOT EXISTS friends (
    id       INTEGER PRIMARY KEY AUTOINCREMENT,
    from_id  INTEGER NOT NULL,
    to_id    INTEGER NOT NULL,
    UNIQUE (from_id, to_id),
    CHECK  (from_id != to_id)
);

-- Events are append-only. Rows past expires_at are invisible to reads and
-- removed by purge_expired. Times are microseconds since the Unix epoch.
CREATE TABLE IF NOT EXISTS inbound (
    participant_id       INTEGER NOT NULL,
    from_participant_id  INTEGER NOT NULL,
    occurred             INTEGER NOT NULL,
    expires_at           INTEGER NOT NULL,
    subject              TEXT NOT NULL,
    story                TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS outbound (
    participant_id  INTEGER NOT NULL,
    occurred        INTEGER NOT NULL,
    expires_at      INTEGER NOT NULL,
    subject         TEXT NOT NULL,
    story           TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS friends_to_idx         ON friends(to_id);
CREATE INDEX IF NOT EXISTS inbound_participant_idx  ON inbound(participant_id, occurred);
CREATE INDEX IF NOT EXISTS outbound_participant_idx ON outbound(participant_id, occurred);

PRAGMA user_version = 1;
";

/// DDL for [`crate::SqliteCache`].
pub const CACHE_SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- expires_at is milliseconds since the Unix epoch; NULL never expires.
CREATE TABLE IF NOT EXISTS entries (
    key         TEXT PRIMARY KEY,
    value       TEXT NOT NULL,
    expires_at  INTEGER
);

CREATE INDEX IF NOT EXISTS entries_expiry_idx ON entries(expires_at);

PRAGMA user_version = 1;
";
