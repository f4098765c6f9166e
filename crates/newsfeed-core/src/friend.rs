//! Friend edges and their cached list representation.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Prefix of the friend read-cache keyspace.
pub const FRIENDS_KEY_PREFIX: &str = "Friends::";

/// A directed friend edge.
///
/// In a friend list, `from` is the participant the list belongs to and `to`
/// is the other party.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Friend {
  #[serde(default)]
  pub id:   i64,
  pub from: i64,
  pub to:   i64,
}

/// A row returned by the friend graph's fetch procedure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FriendRow {
  pub edge_id:  i64,
  /// The counterpart of the participant that was queried.
  pub other_id: i64,
}

/// Cache key holding the serialised friend list of `participant_id`.
pub fn friends_cache_key(participant_id: i64) -> String {
  format!("{FRIENDS_KEY_PREFIX}{participant_id}")
}

/// Build the friend list of `participant_id` from fetched rows.
pub fn friends_from_rows(participant_id: i64, rows: &[FriendRow]) -> Vec<Friend> {
  rows
    .iter()
    .map(|r| Friend { id: r.edge_id, from: participant_id, to: r.other_id })
    .collect()
}

/// Serialise a friend list for the read cache.
pub fn encode_friends(friends: &[Friend]) -> Result<String> {
  Ok(serde_json::to_string(friends)?)
}

/// Parse a cached friend list.
pub fn decode_friends(payload: &str) -> Result<Vec<Friend>> {
  serde_json::from_str(payload).map_err(Error::MalformedFriendList)
}
