//! Opaque bearer tokens for the password grant.
//!
//! Tokens are 32 random bytes, URL-safe base64 without padding. Only the
//! SHA-256 digest of a token is kept, so a dump of the token table cannot be
//! replayed.

use std::{future::Future, time::Duration};

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rand_core::{OsRng, RngCore as _};
use serde::Serialize;
use sha2::{Digest as _, Sha256};

use crate::error::TokenError;

/// The token endpoint's success body.
#[derive(Debug, Clone, Serialize)]
pub struct AccessToken {
  pub access_token: String,
  pub token_type:   &'static str,
  pub expires_in:   u64,
}

/// What a valid bearer token stands for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenInfo {
  /// Seconds until the token expires.
  pub expires_in: i64,
  pub client_id:  String,
  pub user_id:    String,
}

pub trait TokenIssuer: Send + Sync {
  fn issue<'a>(
    &'a self,
    client_id: &'a str,
    user_id: &'a str,
  ) -> impl Future<Output = Result<AccessToken, TokenError>> + Send + 'a;

  fn validate<'a>(
    &'a self,
    bearer: &'a str,
  ) -> impl Future<Output = Result<TokenInfo, TokenError>> + Send + 'a;
}

struct Grant {
  client_id:  String,
  user_id:    String,
  expires_at: DateTime<Utc>,
}

/// Process-local [`TokenIssuer`]. Tokens do not survive a restart.
pub struct MemoryTokenIssuer {
  grants:   DashMap<String, Grant>,
  lifetime: Duration,
}

impl MemoryTokenIssuer {
  pub fn new(lifetime: Duration) -> Self { Self { grants: DashMap::new(), lifetime } }

  /// Drop expired grants; returns how many were removed.
  pub fn purge_expired(&self) -> usize {
    let now = Utc::now();
    let before = self.grants.len();
    self.grants.retain(|_, g| g.expires_at > now);
    before.saturating_sub(self.grants.len())
  }
}

fn digest(token: &str) -> String { hex::encode(Sha256::digest(token.as_bytes())) }

impl TokenIssuer for MemoryTokenIssuer {
  async fn issue(&self, client_id: &str, user_id: &str) -> Result<AccessToken, TokenError> {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    let token = URL_SAFE_NO_PAD.encode(bytes);

    let lifetime = chrono::Duration::from_std(self.lifetime).unwrap_or(chrono::Duration::MAX);
    let expires_at = Utc::now()
      .checked_add_signed(lifetime)
      .unwrap_or(DateTime::<Utc>::MAX_UTC);

    self.grants.insert(digest(&token), Grant {
      client_id: client_id.to_owned(),
      user_id: user_id.to_owned(),
      expires_at,
    });

    Ok(AccessToken {
      access_token: token,
      token_type:   "Bearer",
      expires_in:   self.lifetime.as_secs(),
    })
  }

  async fn validate(&self, bearer: &str) -> Result<TokenInfo, TokenError> {
    let key = digest(bearer);
    let now = Utc::now();

    let info = {
      let grant = self.grants.get(&key).ok_or(TokenError::Unknown)?;
      if grant.expires_at <= now {
        None
      } else {
        Some(TokenInfo {
          expires_in: (grant.expires_at - now).num_seconds(),
          client_id:  grant.client_id.clone(),
          user_id:    grant.user_id.clone(),
        })
      }
    };

    match info {
      Some(info) => Ok(info),
      None => {
        self.grants.remove(&key);
        Err(TokenError::Expired)
      }
    }
  }
}
