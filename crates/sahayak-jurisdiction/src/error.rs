//! # Error Types
//!
//! Failures on the receiver side. Verification outcomes are not errors: a
//! packet that fails its signature check is recorded as `Invalid`.

use std::path::PathBuf;

use sahayak_core::{AlertId, CanonicalizationError, StationId};
use thiserror::Error;

/// Top-level error type for `sahayak-jurisdiction`.
#[derive(Error, Debug)]
pub enum JurisdictionError {
    /// The station dataset could not be read from disk.
    #[error("failed to read station dataset {path}: {source}")]
    DatasetIo {
        /// File that was being read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The station dataset is not the expected JSON array.
    #[error("station dataset is malformed: {0}")]
    DatasetFormat(#[from] serde_json::Error),

    /// Two stations share an identifier.
    #[error("duplicate station id: {0}")]
    DuplicateStation(StationId),

    /// A lookup needed at least one station.
    #[error("no stations loaded")]
    NoStations,

    /// Coverage radius must be finite and positive.
    #[error("invalid jurisdiction radius: {0} km")]
    InvalidRadius(f64),

    /// Route segmentation parameters cannot form a partition.
    #[error("cannot split a route of {route_length} points among {nodes} nodes")]
    InvalidSegmentation {
        /// Number of route points.
        route_length: usize,
        /// Number of owning nodes.
        nodes: usize,
    },

    /// No alert with this identifier has been recorded.
    #[error("alert not found: {0}")]
    AlertNotFound(AlertId),

    /// The packet could not be canonicalized for its digest.
    #[error("packet digest failed: {0}")]
    Digest(#[from] CanonicalizationError),
}
