//! # Temporal Types — UTC Millisecond Timestamps
//!
//! `Timestamp` is UTC-only, truncated to millisecond precision, and
//! serializes as an integer count of epoch milliseconds. Integer form keeps
//! it valid inside canonical bytes; millisecond precision matches what the
//! position source reports.

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CoreError;

/// A UTC timestamp with millisecond precision.
///
/// # Construction
///
/// - [`Timestamp::now()`] — current UTC time, truncated.
/// - [`Timestamp::from_utc()`] — from a `DateTime<Utc>`, truncating.
/// - [`Timestamp::from_millis()`] — from epoch milliseconds.
/// - [`Timestamp::parse()`] — from an RFC 3339 string with `Z` suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Current UTC time, truncated to milliseconds.
    pub fn now() -> Self {
        Self(truncate_to_millis(Utc::now()))
    }

    /// From a `chrono::DateTime<Utc>`, truncating sub-millisecond precision.
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(truncate_to_millis(dt))
    }

    /// From Unix epoch milliseconds.
    pub fn from_millis(millis: i64) -> Result<Self, CoreError> {
        DateTime::from_timestamp_millis(millis)
            .map(Self)
            .ok_or_else(|| CoreError::InvalidTimestamp(format!("epoch millis out of range: {millis}")))
    }

    /// Parse an RFC 3339 timestamp. Only the `Z` suffix is accepted.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        if !s.ends_with('Z') {
            return Err(CoreError::InvalidTimestamp(format!(
                "timestamp must use Z suffix (UTC only), got: {s:?}"
            )));
        }
        let dt = DateTime::parse_from_rfc3339(s)
            .map_err(|e| CoreError::InvalidTimestamp(format!("invalid RFC 3339 timestamp {s:?}: {e}")))?;
        Ok(Self(truncate_to_millis(dt.with_timezone(&Utc))))
    }

    /// Unix epoch milliseconds.
    pub fn as_millis(&self) -> i64 {
        self.0.timestamp_millis()
    }

    /// Access the inner `DateTime<Utc>`.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Milliseconds elapsed from `earlier` to `self` (negative if earlier is later).
    pub fn millis_since(&self, earlier: &Timestamp) -> i64 {
        self.as_millis() - earlier.as_millis()
    }

    /// Render as ISO 8601 with millisecond precision and Z suffix.
    pub fn to_iso8601(&self) -> String {
        self.0.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.as_millis())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let millis = i64::deserialize(deserializer)?;
        Self::from_millis(millis).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_iso8601())
    }
}

fn truncate_to_millis(dt: DateTime<Utc>) -> DateTime<Utc> {
    let nanos = dt.nanosecond();
    dt.with_nanosecond(nanos - nanos % 1_000_000).unwrap_or(dt)
}
