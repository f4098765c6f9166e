//! Per-key async mutual exclusion.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// A table of async mutexes keyed by string, created on demand.
///
/// An entry lives only while some task holds or is waiting for its lock.
#[derive(Default)]
pub struct KeyedLocks {
  locks: DashMap<String, Arc<Mutex<()>>>,
}

/// Holds the lock for one key until dropped.
pub struct KeyedGuard<'a> {
  // Field order matters: the mutex guard must drop before the slot.
  _guard: OwnedMutexGuard<()>,
  _slot:  Slot<'a>,
}

/// Reclaims a key's entry once the last holder or waiter is gone, including
/// a waiter whose `lock` future is dropped before it acquires.
struct Slot<'a> {
  table: &'a KeyedLocks,
  key:   String,
}

impl KeyedLocks {
  pub fn new() -> Self { Self::default() }

  /// Wait for exclusive access to `key`.
  pub async fn lock(&self, key: &str) -> KeyedGuard<'_> {
    let slot = Slot { table: self, key: key.to_owned() };
    // The shard guard is released at the end of this statement, before the
    // await below.
    let mutex = Arc::clone(self.locks.entry(key.to_owned()).or_default().value());
    let guard = mutex.lock_owned().await;
    KeyedGuard { _guard: guard, _slot: slot }
  }

  /// Number of keys with a holder or waiter.
  pub fn len(&self) -> usize { self.locks.len() }

  pub fn is_empty(&self) -> bool { self.locks.is_empty() }
}

impl Drop for Slot<'_> {
  fn drop(&mut self) {
    // Only the table's own handle left means nobody holds or awaits it.
    self
      .table
      .locks
      .remove_if(&self.key, |_, mutex| Arc::strong_count(mutex) == 1);
  }
}

#[cfg(test)]
mod tests {
  use std::time::Duration;

  use super::*;

  #[tokio::test]
  async fn same_key_is_exclusive() {
    let locks = Arc::new(KeyedLocks::new());
    let first = locks.lock("alice").await;

    let contender = {
      let locks = Arc::clone(&locks);
      tokio::spawn(async move {
        let _g = locks.lock("alice").await;
      })
    };

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!contender.is_finished());

    drop(first);
    contender.await.unwrap();
  }

  #[tokio::test]
  async fn different_keys_do_not_block() {
    let locks = KeyedLocks::new();
    let _a = locks.lock("alice").await;
    let b = tokio::time::timeout(Duration::from_millis(50), locks.lock("bob")).await;
    assert!(b.is_ok());
  }

  #[tokio::test]
  async fn entries_are_removed_when_released() {
    let locks = KeyedLocks::new();
    {
      let _g = locks.lock("alice").await;
      assert_eq!(locks.len(), 1);
    }
    assert!(locks.is_empty());
  }

  #[tokio::test]
  async fn entry_survives_while_someone_waits() {
    let locks = Arc::new(KeyedLocks::new());
    let first = locks.lock("alice").await;

    let waiter = {
      let locks = Arc::clone(&locks);
      tokio::spawn(async move {
        let _g = locks.lock("alice").await;
      })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;

    drop(first);
    assert_eq!(locks.len(), 1);
    waiter.await.unwrap();
    assert!(locks.is_empty());
  }

  #[tokio::test]
  async fn abandoned_waiter_does_not_leak_its_entry() {
    let locks = KeyedLocks::new();
    let holder = locks.lock("alice").await;

    let mut waiter = Box::pin(locks.lock("alice"));
    assert!(tokio::time::timeout(Duration::ZERO, &mut waiter).await.is_err());

    drop(holder);
    assert_eq!(locks.len(), 1);
    drop(waiter);
    assert!(locks.is_empty());
  }

  #[tokio::test]
  async fn waiter_abandoned_while_lock_is_held_leaves_cleanup_to_holder() {
    let locks = KeyedLocks::new();
    let holder = locks.lock("alice").await;

    let mut waiter = Box::pin(locks.lock("alice"));
    assert!(tokio::time::timeout(Duration::ZERO, &mut waiter).await.is_err());
    drop(waiter);
    assert_eq!(locks.len(), 1);

    drop(holder);
    assert!(locks.is_empty());
  }
}
