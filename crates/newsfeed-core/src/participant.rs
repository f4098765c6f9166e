//! Participant: the identity every other record hangs off.

use serde::{Deserialize, Serialize};

/// A participant as owned by the identity service.
///
/// The id is assigned by the identity service and never changes afterwards.
/// An id of `0` means "not yet assigned".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
  #[serde(default, skip_serializing_if = "is_zero")]
  pub id:   i64,
  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub name: String,
  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub link: String,
}

impl Participant {
  /// The minimal creation request: a name and nothing else.
  pub fn named(name: impl Into<String>) -> Self {
    Self { id: 0, name: name.into(), link: String::new() }
  }

  /// Whether the identity service has assigned an id.
  pub fn has_id(&self) -> bool { self.id != 0 }
}

fn is_zero(v: &i64) -> bool { *v == 0 }
