//! Credential records held in the credential cache.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// The value stored under a username in the credential cache.
///
/// Serialised as `{"password":"…","userid":"…"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRecord {
  pub password:       String,
  #[serde(rename = "userid")]
  pub participant_id: String,
}

impl CredentialRecord {
  pub fn new(password: impl Into<String>, participant_id: impl Into<String>) -> Self {
    Self { password: password.into(), participant_id: participant_id.into() }
  }

  pub fn encode(&self) -> Result<String> { Ok(serde_json::to_string(self)?) }

  /// Parse a cached payload. Empty, unparsable and id-less payloads are all
  /// rejected; none of them may be matched against a password.
  pub fn decode(payload: &str) -> Result<Self> {
    if payload.is_empty() {
      return Err(Error::EmptyCredential);
    }
    let record: Self =
      serde_json::from_str(payload).map_err(Error::MalformedCredential)?;
    if record.participant_id.is_empty() {
      return Err(Error::MissingParticipantId);
    }
    Ok(record)
  }

  /// Exact, case-sensitive comparison.
  pub fn matches(&self, password: &str) -> bool { self.password == password }
}
