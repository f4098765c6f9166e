//! Storage traits for the newsfeed services.
//!
//! Each trait describes one external store. Backends (e.g.
//! `newsfeed-store-sqlite`) implement them; the feed and edge services depend
//! on this abstraction only. A missing record is `Ok(None)` or an empty
//! `Vec`; every `Err` is a failure to talk to the store.
//!
//! All methods return `Send` futures so the traits can be used in
//! multi-threaded async runtimes (e.g. tokio with `axum`).

use std::{future::Future, time::Duration};

use crate::{
  event::{Inbound, NewInbound, NewOutbound, Outbound},
  friend::FriendRow,
  participant::Participant,
};

// ─── Key-value cache ─────────────────────────────────────────────────────────

/// A string key-value cache with optional per-entry expiry.
pub trait KeyValueCache: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Fetch the live value under `key`. Expired entries read as `None`.
  fn get<'a>(
    &'a self,
    key: &'a str,
  ) -> impl Future<Output = Result<Option<String>, Self::Error>> + Send + 'a;

  /// Store `value` under `key`, replacing any previous value.
  ///
  /// `ttl = None` stores the entry without expiry.
  fn set<'a>(
    &'a self,
    key: &'a str,
    value: &'a str,
    ttl: Option<Duration>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Remove `key`. Returns whether a live entry was removed.
  fn delete<'a>(
    &'a self,
    key: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;
}

// ─── Friend graph ────────────────────────────────────────────────────────────

/// The relational store of friend edges.
pub trait FriendGraph: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Insert the edge between `to` and `from` unless one already exists in
  /// either direction, and return the edge id.
  fn upsert_friends(
    &self,
    to: i64,
    from: i64,
  ) -> impl Future<Output = Result<i64, Self::Error>> + Send + '_;

  /// All edges touching `participant_id`, in edge-id order.
  fn fetch_friends(
    &self,
    participant_id: i64,
  ) -> impl Future<Output = Result<Vec<FriendRow>, Self::Error>> + Send + '_;
}

// ─── Event log ───────────────────────────────────────────────────────────────

/// The time-ordered, retention-bounded event store.
///
/// Reads never return rows older than the store's retention window, whether
/// or not [`EventLog::purge_expired`] has run.
pub trait EventLog: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Append an inbound event stamped with the current time.
  fn append_inbound(
    &self,
    event: NewInbound,
  ) -> impl Future<Output = Result<Inbound, Self::Error>> + Send + '_;

  /// Live inbound events for `participant_id`, newest first.
  fn get_inbound(
    &self,
    participant_id: i64,
  ) -> impl Future<Output = Result<Vec<Inbound>, Self::Error>> + Send + '_;

  /// Append an outbound event stamped with the current time.
  fn append_outbound(
    &self,
    event: NewOutbound,
  ) -> impl Future<Output = Result<Outbound, Self::Error>> + Send + '_;

  /// Live outbound events posted by `participant_id`, newest first.
  fn get_outbound(
    &self,
    participant_id: i64,
  ) -> impl Future<Output = Result<Vec<Outbound>, Self::Error>> + Send + '_;

  /// Physically delete expired rows; returns how many were removed.
  fn purge_expired(&self) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;
}

// ─── Participants ────────────────────────────────────────────────────────────

/// The identity store behind `POST /participant`.
pub trait ParticipantStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Persist a new participant; the store assigns the id.
  fn create_participant(
    &self,
    name: String,
    link: String,
  ) -> impl Future<Output = Result<Participant, Self::Error>> + Send + '_;

  /// Retrieve a participant by id. Returns `None` if not found.
  fn get_participant(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<Participant>, Self::Error>> + Send + '_;
}
