//! # Identity Newtypes
//!
//! Newtype wrappers for the identifiers that cross the wire. A `TripId`
//! cannot be passed where a `StationId` is expected.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;

/// Unique identifier for a monitored trip (one ride).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TripId(pub Uuid);

/// Unique identifier for an alert recorded by the receiver console.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AlertId(pub Uuid);

/// Identifier of an authority node (police station or route-anchored unit).
///
/// Non-empty, no surrounding whitespace. The station dataset uses ids like
/// `ps_001`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub struct StationId(String);

/// Identifier of a simulated relay peer. Lives for one relay episode.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelayNodeId(String);

impl TripId {
    /// Generate a new random trip identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TripId {
    fn default() -> Self {
        Self::new()
    }
}

impl AlertId {
    /// Generate a new random alert identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for AlertId {
    fn default() -> Self {
        Self::new()
    }
}

impl StationId {
    /// Create a station identifier.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidIdentifier`] for empty or padded values.
    pub fn new(value: impl Into<String>) -> Result<Self, CoreError> {
        let s = value.into();
        if s.is_empty() || s.trim() != s {
            return Err(CoreError::InvalidIdentifier(format!(
                "station id must be non-empty without surrounding whitespace: {s:?}"
            )));
        }
        Ok(Self(s))
    }

    /// Access the identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for StationId {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl RelayNodeId {
    /// Generate a short random relay node identifier (`relay-xxxxxxxx`).
    pub fn random() -> Self {
        let simple = Uuid::new_v4().simple().to_string();
        Self(format!("relay-{}", &simple[..8]))
    }

    /// Access the identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TripId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "trip:{}", self.0)
    }
}

impl std::fmt::Display for AlertId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "alert:{}", self.0)
    }
}

impl std::fmt::Display for StationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::fmt::Display for RelayNodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
