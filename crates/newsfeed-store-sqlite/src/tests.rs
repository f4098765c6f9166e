//! Integration tests for `SqliteStore` and `SqliteCache` against in-memory
//! databases.

use std::time::Duration;

use newsfeed_core::{
  event::{NewInbound, NewOutbound},
  friend::FriendRow,
  store::{EventLog, FriendGraph, KeyValueCache, ParticipantStore},
};

use crate::{SqliteCache, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

async fn cache() -> SqliteCache {
  SqliteCache::open_in_memory()
    .await
    .expect("in-memory cache")
}

fn inbound(to: i64, from: i64, subject: &str) -> NewInbound {
  NewInbound {
    to,
    from,
    subject: subject.into(),
    story: format!("story about {subject}"),
  }
}

// ─── Participants ────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_get_participant() {
  let s = store().await;

  let p = s.create_participant("alice".into(), String::new()).await.unwrap();
  assert!(p.has_id());
  assert_eq!(p.name, "alice");

  let fetched = s.get_participant(p.id).await.unwrap().unwrap();
  assert_eq!(fetched, p);
}

#[tokio::test]
async fn participant_ids_are_distinct() {
  let s = store().await;
  let a = s.create_participant("alice".into(), String::new()).await.unwrap();
  let b = s.create_participant("alice".into(), String::new()).await.unwrap();
  assert_ne!(a.id, b.id);
}

#[tokio::test]
async fn get_participant_missing_returns_none() {
  let s = store().await;
  assert!(s.get_participant(4242).await.unwrap().is_none());
}

// ─── Friend graph ────────────────────────────────────────────────────────────

#[tokio::test]
async fn upsert_assigns_non_zero_edge_id() {
  let s = store().await;
  let id = s.upsert_friends(202, 101).await.unwrap();
  assert_ne!(id, 0);
}

#[tokio::test]
async fn upsert_is_idempotent_in_both_directions() {
  let s = store().await;
  let first  = s.upsert_friends(202, 101).await.unwrap();
  let again  = s.upsert_friends(202, 101).await.unwrap();
  let mirror = s.upsert_friends(101, 202).await.unwrap();
  assert_eq!(first, again);
  assert_eq!(first, mirror);

  assert_eq!(s.fetch_friends(101).await.unwrap().len(), 1);
}

#[tokio::test]
async fn fetch_returns_counterpart_for_both_endpoints() {
  let s = store().await;
  let id = s.upsert_friends(202, 101).await.unwrap();

  assert_eq!(
    s.fetch_friends(101).await.unwrap(),
    vec![FriendRow { edge_id: id, other_id: 202 }]
  );
  assert_eq!(
    s.fetch_friends(202).await.unwrap(),
    vec![FriendRow { edge_id: id, other_id: 101 }]
  );
}

#[tokio::test]
async fn fetch_orders_by_edge_id() {
  let s = store().await;
  let a = s.upsert_friends(3, 1).await.unwrap();
  let b = s.upsert_friends(1, 2).await.unwrap();

  let rows = s.fetch_friends(1).await.unwrap();
  assert_eq!(rows, vec![
    FriendRow { edge_id: a, other_id: 3 },
    FriendRow { edge_id: b, other_id: 2 },
  ]);
}

#[tokio::test]
async fn fetch_without_edges_is_empty() {
  let s = store().await;
  assert!(s.fetch_friends(101).await.unwrap().is_empty());
}

#[tokio::test]
async fn self_friendship_is_rejected() {
  let s = store().await;
  assert!(s.upsert_friends(101, 101).await.is_err());
}

// ─── Event log ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn inbound_is_returned_newest_first() {
  let s = store().await;
  s.append_inbound(inbound(101, 202, "first")).await.unwrap();
  s.append_inbound(inbound(101, 303, "second")).await.unwrap();
  s.append_inbound(inbound(101, 202, "third")).await.unwrap();

  let events = s.get_inbound(101).await.unwrap();
  let subjects: Vec<_> = events.iter().map(|e| e.subject.as_str()).collect();
  assert_eq!(subjects, ["third", "second", "first"]);
  assert!(events.windows(2).all(|w| w[0].occurred >= w[1].occurred));
}

#[tokio::test]
async fn inbound_round_trips_fields() {
  let s = store().await;
  let written = s.append_inbound(inbound(101, 202, "hello")).await.unwrap();

  let read = s.get_inbound(101).await.unwrap();
  assert_eq!(read, vec![written]);
}

#[tokio::test]
async fn inbound_is_scoped_to_participant() {
  let s = store().await;
  s.append_inbound(inbound(101, 202, "for 101")).await.unwrap();
  s.append_inbound(inbound(202, 101, "for 202")).await.unwrap();

  let events = s.get_inbound(202).await.unwrap();
  assert_eq!(events.len(), 1);
  assert_eq!(events[0].subject, "for 202");
}

#[tokio::test]
async fn no_inbound_is_empty_not_error() {
  let s = store().await;
  assert!(s.get_inbound(101).await.unwrap().is_empty());
}

#[tokio::test]
async fn expired_events_are_invisible_before_purge() {
  let s = store().await.with_retention(Duration::from_millis(50));
  s.append_inbound(inbound(101, 202, "old")).await.unwrap();
  s.append_outbound(NewOutbound { from: 101, subject: "old".into(), story: String::new() })
    .await
    .unwrap();

  tokio::time::sleep(Duration::from_millis(100)).await;

  assert!(s.get_inbound(101).await.unwrap().is_empty());
  assert!(s.get_outbound(101).await.unwrap().is_empty());
  assert_eq!(s.purge_expired().await.unwrap(), 2);
  assert_eq!(s.purge_expired().await.unwrap(), 0);
}

#[tokio::test]
async fn shortened_retention_hides_events_written_under_the_old_window() {
  let long = store().await;
  long.append_inbound(inbound(101, 202, "old")).await.unwrap();
  long
    .append_outbound(NewOutbound { from: 101, subject: "old".into(), story: String::new() })
    .await
    .unwrap();

  tokio::time::sleep(Duration::from_millis(100)).await;

  let short = long.clone().with_retention(Duration::from_millis(50));
  assert!(short.get_inbound(101).await.unwrap().is_empty());
  assert!(short.get_outbound(101).await.unwrap().is_empty());

  // The long window still sees them until the short one purges.
  assert_eq!(long.get_inbound(101).await.unwrap().len(), 1);
  assert_eq!(short.purge_expired().await.unwrap(), 2);
  assert!(long.get_inbound(101).await.unwrap().is_empty());
}

#[tokio::test]
async fn events_within_retention_survive_purge() {
  let s = store().await;
  s.append_inbound(inbound(101, 202, "fresh")).await.unwrap();

  assert_eq!(s.purge_expired().await.unwrap(), 0);
  assert_eq!(s.get_inbound(101).await.unwrap().len(), 1);
}

#[tokio::test]
async fn outbound_is_returned_newest_first() {
  let s = store().await;
  for subject in ["a", "b"] {
    s.append_outbound(NewOutbound { from: 101, subject: subject.into(), story: String::new() })
      .await
      .unwrap();
  }

  let subjects: Vec<_> = s
    .get_outbound(101)
    .await
    .unwrap()
    .into_iter()
    .map(|e| e.subject)
    .collect();
  assert_eq!(subjects, ["b", "a"]);
}

// ─── Cache ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn cache_get_missing_returns_none() {
  let c = cache().await;
  assert!(c.get("alice").await.unwrap().is_none());
}

#[tokio::test]
async fn cache_set_then_get() {
  let c = cache().await;
  c.set("alice", "v1", None).await.unwrap();
  assert_eq!(c.get("alice").await.unwrap().as_deref(), Some("v1"));

  c.set("alice", "v2", None).await.unwrap();
  assert_eq!(c.get("alice").await.unwrap().as_deref(), Some("v2"));
}

#[tokio::test]
async fn cache_entry_expires_after_ttl() {
  let c = cache().await;
  c.set("alice", "v1", Some(Duration::from_millis(50))).await.unwrap();
  assert!(c.get("alice").await.unwrap().is_some());

  tokio::time::sleep(Duration::from_millis(100)).await;
  assert!(c.get("alice").await.unwrap().is_none());
  assert_eq!(c.purge_expired().await.unwrap(), 1);
}

#[tokio::test]
async fn cache_zero_ttl_never_expires() {
  let c = cache().await;
  c.set("Friends::101", "[]", Some(Duration::ZERO)).await.unwrap();
  tokio::time::sleep(Duration::from_millis(20)).await;
  assert_eq!(c.get("Friends::101").await.unwrap().as_deref(), Some("[]"));
}

#[tokio::test]
async fn cache_delete_reports_live_entries_only() {
  let c = cache().await;
  assert!(!c.delete("alice").await.unwrap());

  c.set("alice", "v1", None).await.unwrap();
  assert!(c.delete("alice").await.unwrap());
  assert!(c.get("alice").await.unwrap().is_none());

  c.set("bob", "v1", Some(Duration::from_millis(10))).await.unwrap();
  tokio::time::sleep(Duration::from_millis(30)).await;
  assert!(!c.delete("bob").await.unwrap());
  assert_eq!(c.purge_expired().await.unwrap(), 0);
}

#[tokio::test]
async fn caches_are_independent_keyspaces() {
  let a = cache().await;
  let b = cache().await;
  a.set("k", "a", None).await.unwrap();
  assert!(b.get("k").await.unwrap().is_none());
}
