//! [`SqliteStore`]: the SQLite implementation of [`FriendGraph`],
//! [`EventLog`] and [`ParticipantStore`].

use std::{path::Path, time::Duration};

use rusqlite::OptionalExtension as _;

use newsfeed_core::{
  event::{Inbound, NewInbound, NewOutbound, Outbound},
  friend::FriendRow,
  participant::Participant,
  store::{EventLog, FriendGraph, ParticipantStore},
};

use crate::{
  Result,
  encode::{RawInbound, RawOutbound, cutoff_micros, encode_dt, expiry_micros, now},
  schema::STORE_SCHEMA,
};

/// How long events live when no retention is configured: 90 days.
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(90 * 24 * 60 * 60);

// ─── Store ───────────────────────────────────────────────────────────────────

/// The feed's durable state backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn:      tokio_rusqlite::Connection,
  retention: Duration,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn, retention: DEFAULT_RETENTION };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn, retention: DEFAULT_RETENTION };
    store.init_schema().await?;
    Ok(store)
  }

  /// Replace the event retention window. Applies to events appended from
  /// now on, and reads and purges also drop anything older than the window
  /// whatever expiry it was written with.
  pub fn with_retention(mut self, retention: Duration) -> Self {
    self.retention = retention;
    self
  }

  pub fn retention(&self) -> Duration { self.retention }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(STORE_SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── FriendGraph impl ────────────────────────────────────────────────────────

impl FriendGraph for SqliteStore {
  type Error = crate::Error;

  async fn upsert_friends(&self, to: i64, from: i64) -> Result<i64> {
    let id = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let existing: Option<i64> = tx
          .query_row(
            "SELECT id FROM friends
             WHERE (from_id = ?1 AND to_id = ?2) OR (from_id = ?2 AND to_id = ?1)
             ORDER BY id LIMIT 1",
            rusqlite::params![from, to],
            |r| r.get(0),
          )
          .optional()?;

        let id = match existing {
          Some(id) => id,
          None => {
            tx.execute(
              "INSERT INTO friends (from_id, to_id) VALUES (?1, ?2)",
              rusqlite::params![from, to],
            )?;
            tx.last_insert_rowid()
          }
        };
        tx.commit()?;
        Ok(id)
      })
      .await?;
    Ok(id)
  }

  async fn fetch_friends(&self, participant_id: i64) -> Result<Vec<FriendRow>> {
    let rows = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT id, CASE WHEN from_id = ?1 THEN to_id ELSE from_id END
           FROM friends
           WHERE from_id = ?1 OR to_id = ?1
           ORDER BY id",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![participant_id], |row| {
            Ok(FriendRow { edge_id: row.get(0)?, other_id: row.get(1)? })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(rows)
  }
}

// ─── EventLog impl ───────────────────────────────────────────────────────────

impl EventLog for SqliteStore {
  type Error = crate::Error;

  async fn append_inbound(&self, event: NewInbound) -> Result<Inbound> {
    let occurred = now();
    let inbound = Inbound {
      to: event.to,
      from: event.from,
      occurred,
      subject: event.subject,
      story: event.story,
    };

    let occurred_us = encode_dt(occurred);
    let expires_us  = expiry_micros(occurred, self.retention);
    let to          = inbound.to;
    let from        = inbound.from;
    let subject     = inbound.subject.clone();
    let story       = inbound.story.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO inbound (
             participant_id, from_participant_id, occurred, expires_at, subject, story
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![to, from, occurred_us, expires_us, subject, story],
        )?;
        Ok(())
      })
      .await?;

    Ok(inbound)
  }

  async fn get_inbound(&self, participant_id: i64) -> Result<Vec<Inbound>> {
    let at        = now();
    let now_us    = encode_dt(at);
    let cutoff_us = cutoff_micros(at, self.retention);

    let raws: Vec<RawInbound> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT participant_id, from_participant_id, occurred, subject, story
           FROM inbound
           WHERE participant_id = ?1 AND expires_at > ?2 AND occurred > ?3
           ORDER BY occurred DESC, rowid DESC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![participant_id, now_us, cutoff_us], |row| {
            Ok(RawInbound {
              to:       row.get(0)?,
              from:     row.get(1)?,
              occurred: row.get(2)?,
              subject:  row.get(3)?,
              story:    row.get(4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawInbound::into_inbound).collect()
  }

  async fn append_outbound(&self, event: NewOutbound) -> Result<Outbound> {
    let occurred = now();
    let outbound = Outbound {
      from: event.from,
      occurred,
      subject: event.subject,
      story: event.story,
    };

    let occurred_us = encode_dt(occurred);
    let expires_us  = expiry_micros(occurred, self.retention);
    let from        = outbound.from;
    let subject     = outbound.subject.clone();
    let story       = outbound.story.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO outbound (participant_id, occurred, expires_at, subject, story)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![from, occurred_us, expires_us, subject, story],
        )?;
        Ok(())
      })
      .await?;

    Ok(outbound)
  }

  async fn get_outbound(&self, participant_id: i64) -> Result<Vec<Outbound>> {
    let at        = now();
    let now_us    = encode_dt(at);
    let cutoff_us = cutoff_micros(at, self.retention);

    let raws: Vec<RawOutbound> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT participant_id, occurred, subject, story
           FROM outbound
           WHERE participant_id = ?1 AND expires_at > ?2 AND occurred > ?3
           ORDER BY occurred DESC, rowid DESC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![participant_id, now_us, cutoff_us], |row| {
            Ok(RawOutbound {
              from:     row.get(0)?,
              occurred: row.get(1)?,
              subject:  row.get(2)?,
              story:    row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawOutbound::into_outbound).collect()
  }

  async fn purge_expired(&self) -> Result<usize> {
    let at        = now();
    let now_us    = encode_dt(at);
    let cutoff_us = cutoff_micros(at, self.retention);

    let removed = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let inbound = tx.execute(
          "DELETE FROM inbound WHERE expires_at <= ?1 OR occurred <= ?2",
          rusqlite::params![now_us, cutoff_us],
        )?;
        let outbound = tx.execute(
          "DELETE FROM outbound WHERE expires_at <= ?1 OR occurred <= ?2",
          rusqlite::params![now_us, cutoff_us],
        )?;
        tx.commit()?;
        Ok(inbound + outbound)
      })
      .await?;

    if removed > 0 {
      tracing::debug!(removed, "purged expired events");
    }
    Ok(removed)
  }
}

// ─── ParticipantStore impl ───────────────────────────────────────────────────

impl ParticipantStore for SqliteStore {
  type Error = crate::Error;

  async fn create_participant(&self, name: String, link: String) -> Result<Participant> {
    let (n, l) = (name.clone(), link.clone());
    let id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO participants (name, link) VALUES (?1, ?2)",
          rusqlite::params![n, l],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(Participant { id, name, link })
  }

  async fn get_participant(&self, id: i64) -> Result<Option<Participant>> {
    let participant = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT id, name, link FROM participants WHERE id = ?1",
            rusqlite::params![id],
            |row| {
              Ok(Participant {
                id:   row.get(0)?,
                name: row.get(1)?,
                link: row.get(2)?,
              })
            },
          )
          .optional()?)
      })
      .await?;
    Ok(participant)
  }
}
