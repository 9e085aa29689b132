use sahayak_core::CoordinateError;
use thiserror::Error;

/// Errors building a corridor or accepting route geometry.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CorridorError {
    /// A route corridor needs at least two points.
    #[error("route has {0} point(s), at least 2 required")]
    TooFewPoints(usize),

    /// A vertex of the route is not a valid coordinate.
    #[error("invalid route vertex at index {index}: {source}")]
    InvalidVertex {
        /// Position in the route.
        index: usize,
        /// Why the vertex was rejected.
        source: CoordinateError,
    },

    /// Total distance or duration is negative or not finite.
    #[error("invalid route metrics: distance {distance_m} m, duration {duration_s} s")]
    InvalidMetrics {
        /// Reported distance in metres.
        distance_m: f64,
        /// Reported duration in seconds.
        duration_s: f64,
    },

    /// Buffer radius is not a positive finite distance.
    #[error("invalid buffer radius {0} km")]
    InvalidBuffer(f64),
}
