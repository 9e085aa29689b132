//! # Transport Events
//!
//! Messages carried by the real-time link between rider devices and the
//! police console. The variant tag is explicit (`"type"`), so a receiver
//! matches on an enum instead of interpreting a free-form string field.
//!
//! The rider's monitoring session emits only [`TransportEvent::Emergency`].
//! Location streams and arrival notices come from tracking clients and
//! responding units.

use serde::{Deserialize, Serialize};

use crate::coordinate::Coordinate;
use crate::identity::TripId;
use crate::payload::SignedPacket;
use crate::temporal::Timestamp;

/// Whether an arrival notice is an estimate or a confirmed event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ArrivalKind {
    /// Estimated arrival computed from route progress.
    Predicted,
    /// Arrival confirmed on scene.
    Actual,
}

/// An event on the rider → console transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransportEvent {
    /// A signed (or unsigned) emergency record. No acknowledgement is expected.
    Emergency {
        /// The packet.
        packet: SignedPacket,
    },
    /// A raw position for jurisdiction tracking.
    LocationUpdate {
        /// Trip being tracked.
        trip_id: TripId,
        /// Reported position.
        location: Coordinate,
        /// Index of the position along the known route, when available.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        route_index: Option<usize>,
    },
    /// A responding unit's arrival notice.
    Arrival {
        /// Trip the unit is responding to.
        trip_id: TripId,
        /// Estimate or confirmation.
        kind: ArrivalKind,
        /// When the arrival happened or is expected.
        at: Timestamp,
    },
}

impl TransportEvent {
    /// The trip this event concerns.
    pub fn trip_id(&self) -> TripId {
        match self {
            Self::Emergency { packet } => packet.payload().trip_id,
            Self::LocationUpdate { trip_id, .. } | Self::Arrival { trip_id, .. } => *trip_id,
        }
    }

    /// Short event name for logs.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Emergency { .. } => "emergency",
            Self::LocationUpdate { .. } => "location_update",
            Self::Arrival { .. } => "arrival",
        }
    }
}
