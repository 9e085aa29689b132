use sahayak_core::CoordinateError;
use sahayak_corridor::CorridorError;
use sahayak_state::TransitionError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure reported by the position source. Recorded on the trip view,
/// never raised as an error.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionError {
    /// The rider denied location permission.
    #[error("location permission denied")]
    PermissionDenied,
    /// No fix is available.
    #[error("position unavailable")]
    Unavailable,
    /// The fix did not arrive in time.
    #[error("position request timed out")]
    Timeout,
}

/// Errors from the monitoring session.
#[derive(Error, Debug)]
pub enum MonitorError {
    /// Configuration could not be read or is invalid.
    #[error("invalid monitor configuration: {0}")]
    Config(String),

    /// A tick carried an invalid coordinate.
    #[error("invalid position: {0}")]
    InvalidPosition(#[from] CoordinateError),

    /// An operation needs a trip but none is running.
    #[error("no active trip")]
    NoActiveTrip,

    /// `start_trip` while a trip is still running.
    #[error("a trip is already active")]
    TripAlreadyActive,

    /// A state machine rejected a transition.
    #[error(transparent)]
    Transition(#[from] TransitionError),

    /// Route geometry was rejected.
    #[error(transparent)]
    Corridor(#[from] CorridorError),

    /// The transport channel refused the event.
    #[error("transport channel closed")]
    ChannelClosed,

    /// The session task has stopped.
    #[error("monitor session is not running")]
    SessionClosed,
}
