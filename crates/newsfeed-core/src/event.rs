//! Inbound and outbound feed events.
//!
//! Events are append-only. They are never updated and disappear only when
//! the event log's retention window has passed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A story delivered to a participant's timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inbound {
  pub to:       i64,
  pub from:     i64,
  /// Server-assigned at insertion.
  pub occurred: DateTime<Utc>,
  pub subject:  String,
  pub story:    String,
}

/// A story posted by a participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outbound {
  pub from:     i64,
  pub occurred: DateTime<Utc>,
  pub subject:  String,
  pub story:    String,
}

/// Input to [`crate::store::EventLog::append_inbound`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewInbound {
  pub to:      i64,
  pub from:    i64,
  #[serde(default)]
  pub subject: String,
  #[serde(default)]
  pub story:   String,
}

/// Input to [`crate::store::EventLog::append_outbound`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOutbound {
  pub from:    i64,
  #[serde(default)]
  pub subject: String,
  #[serde(default)]
  pub story:   String,
}

impl NewOutbound {
  /// The inbound copy of this post delivered to `to`.
  pub fn deliver_to(&self, to: i64) -> NewInbound {
    NewInbound {
      to,
      from: self.from,
      subject: self.subject.clone(),
      story: self.story.clone(),
    }
  }
}
