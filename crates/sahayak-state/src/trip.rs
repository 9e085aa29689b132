//! # Trip Lifecycle
//!
//! ```text
//! Active ──▶ Alert ──▶ Completed
//!   │                     ▲
//!   └─────────────────────┘
//! ```
//!
//! `Alert` is entered on the first tick outside the corridor and is never
//! left automatically. `Completed` is terminal. The trip owns the ordered
//! path of every accepted position tick.

use serde::{Deserialize, Serialize};

use sahayak_core::{Coordinate, Timestamp, TripId};

use crate::error::TransitionError;

/// Lifecycle status of a trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TripStatus {
    /// Inside the corridor so far.
    Active,
    /// Left the corridor at least once.
    Alert,
    /// Ended by the rider (terminal).
    Completed,
}

impl TripStatus {
    /// Canonical state name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Alert => "ALERT",
            Self::Completed => "COMPLETED",
        }
    }

    /// Whether position ticks still affect risk.
    pub fn is_monitoring(&self) -> bool {
        matches!(self, Self::Active | Self::Alert)
    }

    /// Whether this state is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl std::fmt::Display for TripStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Record of a trip status change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripTransitionRecord {
    /// Status before the transition.
    pub from_state: TripStatus,
    /// Status after the transition.
    pub to_state: TripStatus,
    /// When the transition occurred.
    pub timestamp: Timestamp,
    /// Why it happened.
    pub reason: String,
}

/// A monitored trip. Owned exclusively by one monitoring session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trip {
    /// Trip identifier, carried in every emergency payload.
    pub id: TripId,
    status: TripStatus,
    started_at: Timestamp,
    start_location: Coordinate,
    path: Vec<Coordinate>,
    transitions: Vec<TripTransitionRecord>,
}

impl Trip {
    /// Start a new trip at `start_location`. The start point is the first
    /// element of the path.
    pub fn start(start_location: Coordinate, started_at: Timestamp) -> Self {
        Self {
            id: TripId::new(),
            status: TripStatus::Active,
            started_at,
            start_location,
            path: vec![start_location],
            transitions: Vec::new(),
        }
    }

    /// Current status.
    pub fn status(&self) -> TripStatus {
        self.status
    }

    /// When the trip started.
    pub fn started_at(&self) -> Timestamp {
        self.started_at
    }

    /// Where the trip started.
    pub fn start_location(&self) -> Coordinate {
        self.start_location
    }

    /// Every accepted position, oldest first.
    pub fn path(&self) -> &[Coordinate] {
        &self.path
    }

    /// The most recent accepted position.
    pub fn last_position(&self) -> Coordinate {
        self.path.last().copied().unwrap_or(self.start_location)
    }

    /// Ordered status transition log.
    pub fn transitions(&self) -> &[TripTransitionRecord] {
        &self.transitions
    }

    /// Append a tick's position to the path.
    ///
    /// # Errors
    ///
    /// [`TransitionError::TripCompleted`] once the trip has ended.
    pub fn record_position(&mut self, position: Coordinate) -> Result<(), TransitionError> {
        if self.status.is_terminal() {
            return Err(TransitionError::TripCompleted);
        }
        self.path.push(position);
        Ok(())
    }

    /// Move `Active → Alert`. Returns whether a transition happened; an
    /// already alerted trip stays as it is.
    pub fn raise_alert(&mut self, at: Timestamp) -> Result<bool, TransitionError> {
        match self.status {
            TripStatus::Active => {
                self.try_transition(TripStatus::Alert, at, "left safety corridor")?;
                Ok(true)
            }
            TripStatus::Alert => Ok(false),
            TripStatus::Completed => Err(TransitionError::TripCompleted),
        }
    }

    /// End the trip.
    pub fn complete(&mut self, at: Timestamp) -> Result<(), TransitionError> {
        self.try_transition(TripStatus::Completed, at, "ended by rider")
    }

    /// Attempt a status transition with runtime validation and record it.
    pub fn try_transition(
        &mut self,
        to: TripStatus,
        at: Timestamp,
        reason: &str,
    ) -> Result<(), TransitionError> {
        let valid = matches!(
            (self.status, to),
            (TripStatus::Active, TripStatus::Alert)
                | (TripStatus::Active, TripStatus::Completed)
                | (TripStatus::Alert, TripStatus::Completed)
        );
        if !valid {
            return Err(TransitionError::InvalidTransition {
                machine: "trip",
                from: self.status.name().to_string(),
                to: to.name().to_string(),
            });
        }

        tracing::info!(
            trip_id = %self.id,
            from = self.status.name(),
            to = to.name(),
            reason,
            "trip status changed"
        );
        self.transitions.push(TripTransitionRecord {
            from_state: self.status,
            to_state: to,
            timestamp: at,
            reason: reason.to_string(),
        });
        self.status = to;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trip() -> Trip {
        Trip::start(
            Coordinate::new(12.9716, 77.5946).unwrap(),
            Timestamp::from_millis(1_760_000_000_000).unwrap(),
        )
    }

    fn at(ms: i64) -> Timestamp {
        Timestamp::from_millis(1_760_000_000_000 + ms).unwrap()
    }

    #[test]
    fn test_start_state() {
        let t = trip();
        assert_eq!(t.status(), TripStatus::Active);
        assert_eq!(t.path().len(), 1);
        assert_eq!(t.last_position(), t.start_location());
        assert!(t.transitions().is_empty());
    }

    #[test]
    fn test_alert_is_one_way_and_idempotent() {
        let mut t = trip();
        assert!(t.raise_alert(at(1000)).unwrap());
        assert!(!t.raise_alert(at(2000)).unwrap());
        assert_eq!(t.status(), TripStatus::Alert);
        assert_eq!(t.transitions().len(), 1);
        assert!(t.try_transition(TripStatus::Active, at(3000), "recovered").is_err());
    }

    #[test]
    fn test_complete_from_active_and_alert() {
        let mut a = trip();
        a.complete(at(1)).unwrap();
        assert_eq!(a.status(), TripStatus::Completed);

        let mut b = trip();
        b.raise_alert(at(1)).unwrap();
        b.complete(at(2)).unwrap();
        assert_eq!(b.transitions().len(), 2);
        assert_eq!(b.transitions()[1].from_state, TripStatus::Alert);
    }

    #[test]
    fn test_completed_is_terminal() {
        let mut t = trip();
        t.complete(at(1)).unwrap();
        assert!(matches!(
            t.complete(at(2)),
            Err(TransitionError::InvalidTransition { machine: "trip", .. })
        ));
        assert_eq!(t.raise_alert(at(3)), Err(TransitionError::TripCompleted));
        let p = Coordinate::new(12.98, 77.60).unwrap();
        assert_eq!(t.record_position(p), Err(TransitionError::TripCompleted));
        assert_eq!(t.path().len(), 1);
    }

    #[test]
    fn test_path_grows_in_order() {
        let mut t = trip();
        let a = Coordinate::new(12.975, 77.598).unwrap();
        let b = Coordinate::new(12.978, 77.601).unwrap();
        t.record_position(a).unwrap();
        t.record_position(b).unwrap();
        assert_eq!(t.path(), &[t.start_location(), a, b]);
        assert_eq!(t.last_position(), b);
    }

    #[test]
    fn test_status_serializes_screaming() {
        assert_eq!(
            serde_json::to_string(&TripStatus::Alert).unwrap(),
            "\"ALERT\""
        );
    }
}
