//! Error types for `newsfeed-core`.
//!
//! Everything here is a data validity failure: a payload that was read
//! successfully but cannot be interpreted.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("credential payload is empty")]
  EmptyCredential,

  #[error("credential payload is malformed: {0}")]
  MalformedCredential(#[source] serde_json::Error),

  #[error("credential payload has no participant id")]
  MissingParticipantId,

  #[error("friend list payload is malformed: {0}")]
  MalformedFriendList(#[source] serde_json::Error),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
