//! Cache-aside access to the friend graph.
//!
//! Reads go through the friend read cache and populate it on a miss. Writes
//! go to the friend graph and then delete the cached lists of both
//! endpoints; the write path never writes the cache.
//!
//! A read that fetched from the graph before a concurrent write and stores
//! its result after that write's invalidation can leave a stale entry until
//! the next write touching the participant. That window is accepted.

use std::sync::Arc;

use newsfeed_core::{
  friend::{Friend, decode_friends, encode_friends, friends_cache_key, friends_from_rows},
  store::{FriendGraph, KeyValueCache},
};

use crate::error::FriendError;

/// A friend list together with the exact JSON held in the read cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FriendList {
  pub json:    String,
  pub friends: Vec<Friend>,
}

/// Friend reads and writes over a [`FriendGraph`] fronted by a
/// [`KeyValueCache`].
pub struct FriendDirectory<G, C> {
  graph: Arc<G>,
  cache: Arc<C>,
}

impl<G, C> Clone for FriendDirectory<G, C> {
  fn clone(&self) -> Self {
    Self { graph: Arc::clone(&self.graph), cache: Arc::clone(&self.cache) }
  }
}

impl<G, C> FriendDirectory<G, C>
where
  G: FriendGraph,
  C: KeyValueCache,
{
  pub fn new(graph: Arc<G>, cache: Arc<C>) -> Self { Self { graph, cache } }

  /// The friends of `participant_id`, from the cache when present.
  ///
  /// A cached entry that does not parse is deleted and reported as
  /// [`FriendError::CorruptCacheEntry`]; it is never treated as a miss.
  pub async fn get_friends(&self, participant_id: i64) -> Result<FriendList, FriendError> {
    let key = friends_cache_key(participant_id);

    if let Some(json) = self.cache.get(&key).await.map_err(FriendError::cache)? {
      return match decode_friends(&json) {
        Ok(friends) => {
          tracing::debug!(%key, "friend cache hit");
          Ok(FriendList { json, friends })
        }
        Err(source) => {
          if let Err(e) = self.cache.delete(&key).await {
            tracing::warn!(%key, error = %e, "cannot delete corrupt friend cache entry");
          }
          Err(FriendError::CorruptCacheEntry { key, source })
        }
      };
    }

    tracing::debug!(%key, "friend cache miss");
    let rows = self
      .graph
      .fetch_friends(participant_id)
      .await
      .map_err(FriendError::graph)?;
    let friends = friends_from_rows(participant_id, &rows);
    let json = encode_friends(&friends).map_err(FriendError::Encode)?;

    self
      .cache
      .set(&key, &json, None)
      .await
      .map_err(FriendError::cache)?;

    Ok(FriendList { json, friends })
  }

  /// Record a friendship between `from` and `to` and invalidate both cached
  /// lists.
  ///
  /// Invalidation failures are logged and do not fail the write.
  pub async fn add_friend(&self, from: i64, to: i64) -> Result<Friend, FriendError> {
    if from <= 0 || to <= 0 || from == to {
      return Err(FriendError::InvalidEdge { from, to });
    }

    let id = self
      .graph
      .upsert_friends(to, from)
      .await
      .map_err(FriendError::graph)?;

    for participant_id in [from, to] {
      let key = friends_cache_key(participant_id);
      if let Err(e) = self.cache.delete(&key).await {
        tracing::warn!(%key, error = %e, "friend cache invalidation failed; list may be stale");
      }
    }

    Ok(Friend { id, from, to })
  }
}
