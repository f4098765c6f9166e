//! OAuth client registrations.

use std::future::Future;

use dashmap::{DashMap, mapref::entry::Entry};

use crate::error::RegistryError;

/// The OAuth client minted for a provisioned participant.
///
/// `id` equals the participant id. The secret is generated once and never
/// rotated.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientRegistration {
  pub id:     String,
  pub secret: String,
  pub domain: String,
}

impl std::fmt::Debug for ClientRegistration {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ClientRegistration")
      .field("id", &self.id)
      .field("secret", &"<redacted>")
      .field("domain", &self.domain)
      .finish()
  }
}

/// Where OAuth clients are registered and looked up.
pub trait ClientRegistry: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Register a new client. Registering an id twice is an error.
  fn register(
    &self,
    client: ClientRegistration,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn get<'a>(
    &'a self,
    id: &'a str,
  ) -> impl Future<Output = Result<Option<ClientRegistration>, Self::Error>> + Send + 'a;
}

/// Process-local [`ClientRegistry`].
#[derive(Default)]
pub struct MemoryClientRegistry {
  clients: DashMap<String, ClientRegistration>,
}

impl MemoryClientRegistry {
  pub fn new() -> Self { Self::default() }

  pub fn len(&self) -> usize { self.clients.len() }

  pub fn is_empty(&self) -> bool { self.clients.is_empty() }
}

impl ClientRegistry for MemoryClientRegistry {
  type Error = RegistryError;

  async fn register(&self, client: ClientRegistration) -> Result<(), RegistryError> {
    match self.clients.entry(client.id.clone()) {
      Entry::Occupied(_) => Err(RegistryError::DuplicateClient(client.id)),
      Entry::Vacant(slot) => {
        slot.insert(client);
        Ok(())
      }
    }
  }

  async fn get(&self, id: &str) -> Result<Option<ClientRegistration>, RegistryError> {
    Ok(self.clients.get(id).map(|c| c.value().clone()))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn client(id: &str) -> ClientRegistration {
    ClientRegistration {
      id:     id.into(),
      secret: "s3cret".into(),
      domain: "http://localhost:9000".into(),
    }
  }

  #[tokio::test]
  async fn register_then_get() {
    let registry = MemoryClientRegistry::new();
    registry.register(client("101")).await.unwrap();
    assert_eq!(registry.get("101").await.unwrap(), Some(client("101")));
    assert_eq!(registry.get("202").await.unwrap(), None);
  }

  #[tokio::test]
  async fn secrets_are_never_replaced() {
    let registry = MemoryClientRegistry::new();
    registry.register(client("101")).await.unwrap();

    let mut rotated = client("101");
    rotated.secret = "other".into();
    assert!(matches!(
      registry.register(rotated).await,
      Err(RegistryError::DuplicateClient(id)) if id == "101"
    ));
    assert_eq!(registry.get("101").await.unwrap().unwrap().secret, "s3cret");
  }

  #[test]
  fn debug_hides_secret() {
    let printed = format!("{:?}", client("101"));
    assert!(!printed.contains("s3cret"));
  }
}
