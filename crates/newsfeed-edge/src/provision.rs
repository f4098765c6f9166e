//! First-contact provisioning of a username.
//!
//! Provisioning creates the participant, registers its OAuth client and
//! finally writes the credential record. The credential write is the commit
//! point: until it succeeds the username still reads as never provisioned,
//! so a failed attempt is redone from the start by the next login.

use std::{future::Future, sync::Arc, time::Duration};

use newsfeed_core::{credential::CredentialRecord, participant::Participant, store::KeyValueCache};
use rand_core::{OsRng, RngCore as _};

use crate::{
  clients::{ClientRegistration, ClientRegistry},
  error::{IdentityError, ProvisionError},
};

/// The service that owns participant identities.
pub trait IdentityService: Send + Sync {
  /// Create a participant from a request carrying only a name. The reply
  /// must carry the assigned id.
  fn create_participant(
    &self,
    request: Participant,
  ) -> impl Future<Output = Result<Participant, IdentityError>> + Send + '_;
}

/// A fresh client secret: 32 bytes from the OS RNG, hex encoded.
pub fn generate_secret() -> String {
  let mut bytes = [0u8; 32];
  OsRng.fill_bytes(&mut bytes);
  hex::encode(bytes)
}

pub struct Provisioner<I, R, C> {
  identity:       Arc<I>,
  clients:        Arc<R>,
  credentials:    Arc<C>,
  domain:         String,
  credential_ttl: Option<Duration>,
}

impl<I, R, C> Provisioner<I, R, C>
where
  I: IdentityService,
  R: ClientRegistry,
  C: KeyValueCache,
{
  pub fn new(identity: Arc<I>, clients: Arc<R>, credentials: Arc<C>) -> Self {
    Self {
      identity,
      clients,
      credentials,
      domain: String::new(),
      credential_ttl: None,
    }
  }

  /// Domain recorded on every registered client.
  pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
    self.domain = domain.into();
    self
  }

  /// Lifetime of written credential records; `None` keeps them forever.
  pub fn with_credential_ttl(mut self, ttl: Option<Duration>) -> Self {
    self.credential_ttl = ttl;
    self
  }

  /// Provision `username` and return its new participant id.
  ///
  /// The caller must hold the username's provisioning lock.
  pub async fn provision(&self, username: &str, password: &str) -> Result<String, ProvisionError> {
    let created = self
      .identity
      .create_participant(Participant::named(username))
      .await?;
    if !created.has_id() {
      return Err(ProvisionError::InvalidResponse("participant has no id".into()));
    }
    let participant_id = created.id.to_string();

    let client = ClientRegistration {
      id:     participant_id.clone(),
      secret: generate_secret(),
      domain: self.domain.clone(),
    };
    self
      .clients
      .register(client)
      .await
      .map_err(|e| ProvisionError::RegisterClient {
        client_id: participant_id.clone(),
        source:    Box::new(e),
      })?;

    let record = CredentialRecord::new(password, &participant_id)
      .encode()
      .map_err(ProvisionError::EncodeCredential)?;
    self
      .credentials
      .set(username, &record, self.credential_ttl)
      .await
      .map_err(|e| ProvisionError::CredentialWrite(Box::new(e)))?;

    tracing::info!(%username, %participant_id, "provisioned participant");
    Ok(participant_id)
  }
}
