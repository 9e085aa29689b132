//! # Jurisdiction Hand-off Tracking
//!
//! Assignments are recomputed from scratch on every position. The tracker
//! remembers only the current owner and reports a [`Handoff`] when the
//! owner actually changes, so a point jittering inside one station's area
//! never flickers.

use sahayak_core::StationId;
use serde::{Deserialize, Serialize};

use crate::segments::SegmentAssignment;
use crate::stations::Assignment;

/// An assignment under either policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum Jurisdiction {
    /// Closest station to the position.
    Nearest(Assignment),
    /// Owner of the route segment containing the position's route index.
    Segment(SegmentAssignment),
}

impl Jurisdiction {
    /// The owning station under either policy.
    pub fn station_id(&self) -> &StationId {
        match self {
            Self::Nearest(a) => &a.station_id,
            Self::Segment(s) => &s.station_id,
        }
    }
}

/// Transfer of responsibility between two stations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Handoff {
    /// Previous owner.
    pub from: StationId,
    /// New owner.
    pub to: StationId,
}

/// Current owner of one tracked stream.
#[derive(Debug, Clone, Default)]
pub struct JurisdictionTracker {
    current: Option<StationId>,
    handoffs: u64,
}

impl JurisdictionTracker {
    /// A tracker with no owner yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current owner, if any position has been observed.
    pub fn current(&self) -> Option<&StationId> {
        self.current.as_ref()
    }

    /// Hand-offs reported so far.
    pub fn handoffs(&self) -> u64 {
        self.handoffs
    }

    /// Feed a fresh assignment.
    ///
    /// The first observation establishes the owner without a hand-off.
    pub fn observe(&mut self, jurisdiction: &Jurisdiction) -> Option<Handoff> {
        let owner = jurisdiction.station_id();
        match self.current.replace(owner.clone()) {
            Some(previous) if &previous != owner => {
                self.handoffs += 1;
                Some(Handoff {
                    from: previous,
                    to: owner.clone(),
                })
            }
            _ => None,
        }
    }
}
