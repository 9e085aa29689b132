//! # Error Types
//!
//! Errors raised by the foundational types. All use `thiserror`.
//!
//! Coordinate errors carry the offending values so a rejected position tick
//! can be logged with full context by the session that received it.

use thiserror::Error;

/// Top-level error type for `sahayak-core`.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Canonicalization failed.
    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    /// A coordinate failed validation.
    #[error("coordinate error: {0}")]
    Coordinate(#[from] CoordinateError),

    /// A timestamp could not be parsed or is out of range.
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// An identifier failed validation.
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// A packet's hex fields do not decode.
    #[error("malformed packet: {0}")]
    MalformedPacket(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Error during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// Float values are not permitted in canonical representations.
    /// Locations must be carried as integer microdegrees.
    #[error("float values are not permitted in canonical representations: {0}")]
    FloatRejected(f64),

    /// JSON serialization failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

/// Error validating a WGS84 coordinate.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoordinateError {
    /// Latitude or longitude is NaN or infinite.
    #[error("coordinate is not finite: ({lat}, {lng})")]
    NonFinite {
        /// Rejected latitude.
        lat: f64,
        /// Rejected longitude.
        lng: f64,
    },

    /// Latitude outside `[-90, 90]`.
    #[error("latitude out of range: {0}")]
    LatitudeOutOfRange(f64),

    /// Longitude outside `[-180, 180]`.
    #[error("longitude out of range: {0}")]
    LongitudeOutOfRange(f64),
}
