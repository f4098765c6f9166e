//! The password-grant credential check.
//!
//! A username is either provisioned (the credential cache holds its record)
//! or not. The first successful attempt for an unknown username provisions
//! it; every later attempt is checked against the stored record. Concurrent
//! first attempts for one username are serialised by a per-username lock and
//! the loser re-reads the record the winner wrote.

use std::sync::Arc;

use newsfeed_core::{credential::CredentialRecord, store::KeyValueCache};

use crate::{
  clients::ClientRegistry,
  error::AuthError,
  locks::KeyedLocks,
  provision::{IdentityService, Provisioner},
};

pub struct CredentialGate<C, I, R> {
  cache:       Arc<C>,
  provisioner: Provisioner<I, R, C>,
  locks:       KeyedLocks,
}

impl<C, I, R> CredentialGate<C, I, R>
where
  C: KeyValueCache,
  I: IdentityService,
  R: ClientRegistry,
{
  /// `cache` must be the same credential cache the provisioner writes to.
  pub fn new(cache: Arc<C>, provisioner: Provisioner<I, R, C>) -> Self {
    Self { cache, provisioner, locks: KeyedLocks::new() }
  }

  /// Check `password` for `username` and return the participant id.
  pub async fn validate(&self, username: &str, password: &str) -> Result<String, AuthError> {
    if let Some(payload) = self.lookup(username).await? {
      return check(username, &payload, password);
    }

    let _guard = self.locks.lock(username).await;
    if let Some(payload) = self.lookup(username).await? {
      tracing::debug!(%username, "provisioned concurrently; checking stored record");
      return check(username, &payload, password);
    }

    Ok(self.provisioner.provision(username, password).await?)
  }

  async fn lookup(&self, username: &str) -> Result<Option<String>, AuthError> {
    self.cache.get(username).await.map_err(AuthError::cache)
  }
}

fn check(username: &str, payload: &str, password: &str) -> Result<String, AuthError> {
  let record = CredentialRecord::decode(payload).map_err(|e| {
    tracing::warn!(%username, error = %e, "unusable credential record");
    AuthError::InvalidStoredCredential(e)
  })?;

  if record.matches(password) {
    Ok(record.participant_id)
  } else {
    tracing::warn!(%username, "password rejected");
    Err(AuthError::IncorrectPassword)
  }
}

#[cfg(test)]
mod tests {
  use std::{
    sync::atomic::{AtomicI64, AtomicUsize, Ordering},
    time::Duration,
  };

  use newsfeed_core::participant::Participant;
  use newsfeed_store_sqlite::SqliteCache;

  use super::*;
  use crate::{
    clients::{ClientRegistration, MemoryClientRegistry},
    error::{IdentityError, ProvisionError},
  };

  /// Hands out ids 101, 102, … and counts calls.
  struct CountingIdentity {
    next:  AtomicI64,
    calls: AtomicUsize,
    delay: Duration,
  }

  impl CountingIdentity {
    fn new() -> Self {
      Self { next: AtomicI64::new(101), calls: AtomicUsize::new(0), delay: Duration::ZERO }
    }

    fn calls(&self) -> usize { self.calls.load(Ordering::SeqCst) }
  }

  impl IdentityService for CountingIdentity {
    async fn create_participant(&self, request: Participant) -> Result<Participant, IdentityError> {
      self.calls.fetch_add(1, Ordering::SeqCst);
      tokio::time::sleep(self.delay).await;
      let id = self.next.fetch_add(1, Ordering::SeqCst);
      Ok(Participant { id, ..request })
    }
  }

  struct UnreachableIdentity;

  impl IdentityService for UnreachableIdentity {
    async fn create_participant(&self, _: Participant) -> Result<Participant, IdentityError> {
      Err(IdentityError::Unreachable("connection refused".into()))
    }
  }

  /// A credential cache whose every call fails.
  struct DownCache;

  #[derive(Debug, thiserror::Error)]
  #[error("cache connection refused")]
  struct Refused;

  impl KeyValueCache for DownCache {
    type Error = Refused;

    async fn get(&self, _: &str) -> Result<Option<String>, Refused> { Err(Refused) }

    async fn set(&self, _: &str, _: &str, _: Option<Duration>) -> Result<(), Refused> {
      Err(Refused)
    }

    async fn delete(&self, _: &str) -> Result<bool, Refused> { Err(Refused) }
  }

  type Gate<C, I> = CredentialGate<C, I, MemoryClientRegistry>;

  fn gate_over<C, I>(cache: Arc<C>, identity: Arc<I>) -> (Gate<C, I>, Arc<MemoryClientRegistry>)
  where
    C: KeyValueCache,
    I: IdentityService,
  {
    let clients = Arc::new(MemoryClientRegistry::new());
    let provisioner = Provisioner::new(identity, Arc::clone(&clients), Arc::clone(&cache));
    (CredentialGate::new(cache, provisioner), clients)
  }

  async fn gate() -> (Gate<SqliteCache, CountingIdentity>, Arc<SqliteCache>, Arc<CountingIdentity>) {
    let cache = Arc::new(SqliteCache::open_in_memory().await.unwrap());
    let identity = Arc::new(CountingIdentity::new());
    let (gate, _) = gate_over(Arc::clone(&cache), Arc::clone(&identity));
    (gate, cache, identity)
  }

  #[tokio::test]
  async fn first_login_provisions_and_second_reuses() {
    let (gate, cache, identity) = gate().await;

    assert_eq!(gate.validate("alice", "secret1").await.unwrap(), "101");
    assert_eq!(
      cache.get("alice").await.unwrap().as_deref(),
      Some(r#"{"password":"secret1","userid":"101"}"#)
    );

    assert_eq!(gate.validate("alice", "secret1").await.unwrap(), "101");
    assert_eq!(identity.calls(), 1);
  }

  #[tokio::test]
  async fn wrong_password_is_rejected_without_provisioning() {
    let (gate, _, identity) = gate().await;
    gate.validate("alice", "secret1").await.unwrap();

    for attempt in ["secret2", "Secret1", ""] {
      assert!(matches!(
        gate.validate("alice", attempt).await,
        Err(AuthError::IncorrectPassword)
      ));
    }
    assert_eq!(identity.calls(), 1);
  }

  #[tokio::test]
  async fn distinct_usernames_get_distinct_ids() {
    let (gate, _, _) = gate().await;
    let a = gate.validate("alice", "pw").await.unwrap();
    let b = gate.validate("bob", "pw").await.unwrap();
    assert_ne!(a, b);
  }

  #[tokio::test]
  async fn malformed_records_are_never_matched() {
    let (gate, cache, identity) = gate().await;

    for payload in ["", "secret1", r#"{"password":"secret1"}"#, r#"{"password":"secret1","userid":""}"#] {
      cache.set("alice", payload, None).await.unwrap();
      let result = gate.validate("alice", "secret1").await;
      assert!(
        matches!(result, Err(AuthError::InvalidStoredCredential(_))),
        "payload {payload:?} gave {result:?}"
      );
    }
    assert_eq!(identity.calls(), 0);
  }

  #[tokio::test]
  async fn cache_failure_short_circuits_before_provisioning() {
    let identity = Arc::new(CountingIdentity::new());
    let (gate, clients) = gate_over(Arc::new(DownCache), Arc::clone(&identity));

    assert!(matches!(
      gate.validate("alice", "secret1").await,
      Err(AuthError::CacheUnavailable(_))
    ));
    assert_eq!(identity.calls(), 0);
    assert!(clients.is_empty());
  }

  #[tokio::test]
  async fn unreachable_identity_service_is_a_provisioning_failure() {
    let cache = Arc::new(SqliteCache::open_in_memory().await.unwrap());
    let (gate, _) = gate_over(Arc::clone(&cache), Arc::new(UnreachableIdentity));

    assert!(matches!(
      gate.validate("alice", "secret1").await,
      Err(AuthError::Provisioning(ProvisionError::CreateParticipant(_)))
    ));
    assert!(cache.get("alice").await.unwrap().is_none());
  }

  #[tokio::test]
  async fn failed_registration_leaves_username_unprovisioned() {
    let cache = Arc::new(SqliteCache::open_in_memory().await.unwrap());
    let identity = Arc::new(CountingIdentity::new());
    let (gate, clients) = gate_over(Arc::clone(&cache), Arc::clone(&identity));

    // Occupy the id the identity service will hand out first.
    clients
      .register(ClientRegistration { id: "101".into(), secret: "x".into(), domain: String::new() })
      .await
      .unwrap();

    assert!(matches!(
      gate.validate("alice", "secret1").await,
      Err(AuthError::Provisioning(ProvisionError::RegisterClient { .. }))
    ));
    assert!(cache.get("alice").await.unwrap().is_none());

    // The next attempt provisions afresh.
    assert_eq!(gate.validate("alice", "secret1").await.unwrap(), "102");
    assert_eq!(identity.calls(), 2);
  }

  #[tokio::test]
  async fn concurrent_first_logins_provision_once() {
    let cache = Arc::new(SqliteCache::open_in_memory().await.unwrap());
    let identity = Arc::new(CountingIdentity {
      delay: Duration::from_millis(30),
      ..CountingIdentity::new()
    });
    let (gate, clients) = gate_over(cache, Arc::clone(&identity));

    let (a, b) = tokio::join!(
      gate.validate("alice", "secret1"),
      gate.validate("alice", "secret1"),
    );

    assert_eq!(a.unwrap(), "101");
    assert_eq!(b.unwrap(), "101");
    assert_eq!(identity.calls(), 1);
    assert_eq!(clients.len(), 1);
    assert!(gate.locks.is_empty());
  }

  #[tokio::test]
  async fn concurrent_loser_with_other_password_is_rejected() {
    let cache = Arc::new(SqliteCache::open_in_memory().await.unwrap());
    let identity = Arc::new(CountingIdentity {
      delay: Duration::from_millis(30),
      ..CountingIdentity::new()
    });
    let (gate, _) = gate_over(cache, Arc::clone(&identity));

    let (a, b) = tokio::join!(gate.validate("alice", "secret1"), async {
      // Arrive while the first attempt is provisioning.
      tokio::time::sleep(Duration::from_millis(10)).await;
      gate.validate("alice", "other").await
    });

    assert_eq!(a.unwrap(), "101");
    assert!(matches!(b, Err(AuthError::IncorrectPassword)));
    assert_eq!(identity.calls(), 1);
  }
}
