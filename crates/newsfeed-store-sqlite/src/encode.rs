//! Encoding and decoding helpers between domain types and SQLite columns.
//!
//! Event timestamps are stored as integer microseconds since the Unix epoch;
//! cache expiries as integer milliseconds.

use std::time::Duration;

use chrono::{DateTime, SubsecRound as _, Utc};
use newsfeed_core::event::{Inbound, Outbound};

use crate::{Error, Result};

// ─── DateTime<Utc>
// ────────────────────────────────────────────────────────────

/// The current time, truncated to what a column can hold.
pub fn now() -> DateTime<Utc> { Utc::now().trunc_subsecs(6) }

pub fn encode_dt(dt: DateTime<Utc>) -> i64 { dt.timestamp_micros() }

pub fn decode_dt(micros: i64) -> Result<DateTime<Utc>> {
  DateTime::from_timestamp_micros(micros).ok_or(Error::Timestamp(micros))
}

// ─── Expiry
// ───────────────────────────────────────────────────────────────────

/// `start + ttl` in microseconds, saturating at the far future.
pub fn expiry_micros(start: DateTime<Utc>, ttl: Duration) -> i64 {
  let ttl = i64::try_from(ttl.as_micros()).unwrap_or(i64::MAX);
  encode_dt(start).saturating_add(ttl)
}

/// `end - retention` in microseconds: events at or before this are out of the
/// window.
pub fn cutoff_micros(end: DateTime<Utc>, retention: Duration) -> i64 {
  let retention = i64::try_from(retention.as_micros()).unwrap_or(i64::MAX);
  encode_dt(end).saturating_sub(retention)
}

/// Cache expiry in milliseconds. A zero TTL means "never expires".
pub fn cache_expiry_millis(start: DateTime<Utc>, ttl: Option<Duration>) -> Option<i64> {
  let ttl = ttl.filter(|t| !t.is_zero())?;
  let ttl = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
  Some(start.timestamp_millis().saturating_add(ttl))
}

// ─── Raw rows
// ─────────────────────────────────────────────────────────────────

pub struct RawInbound {
  pub to:       i64,
  pub from:     i64,
  pub occurred: i64,
  pub subject:  String,
  pub story:    String,
}

impl RawInbound {
  pub fn into_inbound(self) -> Result<Inbound> {
    Ok(Inbound {
      to:       self.to,
      from:     self.from,
      occurred: decode_dt(self.occurred)?,
      subject:  self.subject,
      story:    self.story,
    })
  }
}

pub struct RawOutbound {
  pub from:     i64,
  pub occurred: i64,
  pub subject:  String,
  pub story:    String,
}

impl RawOutbound {
  pub fn into_outbound(self) -> Result<Outbound> {
    Ok(Outbound {
      from:     self.from,
      occurred: decode_dt(self.occurred)?,
      subject:  self.subject,
      story:    self.story,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone as _;

  use super::*;

  #[test]
  fn dt_round_trips_at_microsecond_precision() {
    let dt = now();
    assert_eq!(decode_dt(encode_dt(dt)).unwrap(), dt);
  }

  #[test]
  fn zero_ttl_never_expires() {
    let start = Utc.timestamp_opt(1_000, 0).unwrap();
    assert_eq!(cache_expiry_millis(start, None), None);
    assert_eq!(cache_expiry_millis(start, Some(Duration::ZERO)), None);
    assert_eq!(
      cache_expiry_millis(start, Some(Duration::from_secs(3600))),
      Some(1_000_000 + 3_600_000)
    );
  }

  #[test]
  fn huge_retention_saturates() {
    let start = Utc.timestamp_opt(1_000, 0).unwrap();
    assert_eq!(expiry_micros(start, Duration::MAX), i64::MAX);
  }
}
