//! Posting to a participant's outbound log and delivering the post to the
//! inbound log of every friend.

use newsfeed_core::{
  event::{NewOutbound, Outbound},
  store::{EventLog, FriendGraph, KeyValueCache},
};

use crate::{error::ApiError, friends::FriendDirectory};

/// Append `post` to the author's outbound log, then append one inbound event
/// per current friend of the author.
///
/// Delivery stops at the first failing append and reports it; events
/// already appended stay in place.
pub async fn publish<L, G, C>(
  log: &L,
  friends: &FriendDirectory<G, C>,
  post: NewOutbound,
) -> Result<Outbound, ApiError>
where
  L: EventLog,
  G: FriendGraph,
  C: KeyValueCache,
{
  let outbound = log
    .append_outbound(post.clone())
    .await
    .map_err(ApiError::store)?;

  let recipients = friends.get_friends(post.from).await?.friends;
  for friend in &recipients {
    log
      .append_inbound(post.deliver_to(friend.to))
      .await
      .map_err(ApiError::store)?;
  }

  tracing::info!(from = post.from, recipients = recipients.len(), "published story");
  Ok(outbound)
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use newsfeed_store_sqlite::{SqliteCache, SqliteStore};

  use super::*;

  #[tokio::test]
  async fn post_reaches_every_friend_and_nobody_else() {
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    let cache = Arc::new(SqliteCache::open_in_memory().await.unwrap());
    let dir = FriendDirectory::new(Arc::clone(&store), cache);

    dir.add_friend(101, 202).await.unwrap();
    dir.add_friend(303, 101).await.unwrap();

    let post = NewOutbound { from: 101, subject: "hello".into(), story: "world".into() };
    let out = publish(store.as_ref(), &dir, post).await.unwrap();
    assert_eq!(out.from, 101);

    for friend in [202, 303] {
      let inbox = store.get_inbound(friend).await.unwrap();
      assert_eq!(inbox.len(), 1, "inbox of {friend}");
      assert_eq!(inbox[0].from, 101);
      assert_eq!(inbox[0].subject, "hello");
    }
    assert!(store.get_inbound(101).await.unwrap().is_empty());
    assert!(store.get_inbound(404).await.unwrap().is_empty());
    assert_eq!(store.get_outbound(101).await.unwrap(), vec![out]);
  }

  #[tokio::test]
  async fn post_without_friends_is_only_outbound() {
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    let cache = Arc::new(SqliteCache::open_in_memory().await.unwrap());
    let dir = FriendDirectory::new(Arc::clone(&store), cache);

    let post = NewOutbound { from: 101, subject: "alone".into(), story: String::new() };
    publish(store.as_ref(), &dir, post).await.unwrap();
    assert_eq!(store.get_outbound(101).await.unwrap().len(), 1);
  }
}
