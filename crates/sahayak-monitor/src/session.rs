//! # Trip Session
//!
//! Everything one trip owns: the trip, its risk state, its relay state, its
//! current corridor and its key pair. `TripSession` is synchronous. The
//! runtime calls it from a single task, one command at a time, which is how
//! ticks are serialized.
//!
//! The corridor is held behind an `Arc` and replaced whole when route
//! geometry arrives. A tick clones the `Arc` once and evaluates containment
//! and distance against that one corridor.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use sahayak_core::{Coordinate, EmergencyPayload, SignedPacket, Timestamp, TripId};
use sahayak_corridor::{Corridor, CorridorInput, CorridorKind, RouteGeometry};
use sahayak_crypto::TripKeyPair;
use sahayak_state::{
    RelayNode, RelayPhase, RelayStart, RelayState, RiskLevel, RiskState, Trip, TripStatus,
};

use crate::config::MonitorConfig;
use crate::error::{MonitorError, PositionError};

/// What one tick did.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    /// `None` while no corridor is defined.
    pub inside: Option<bool>,
    /// Distance from the route centreline, km, when a corridor exists.
    pub distance_km: Option<f64>,
    /// Score after the tick.
    pub score: f64,
    /// Level after the tick.
    pub level: RiskLevel,
    /// Whether this tick moved the trip `Active → Alert`.
    pub alert_raised: bool,
    /// The payload to sign, on the one tick that fires the latch.
    pub emission: Option<EmergencyPayload>,
}

/// Read-only view of a running trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripView {
    /// Trip identifier.
    pub trip_id: TripId,
    /// Lifecycle status.
    pub status: TripStatus,
    /// Accepted positions, including the start.
    pub path_len: usize,
    /// Most recent accepted position.
    pub last_position: Coordinate,
    /// Risk score.
    pub score: f64,
    /// Derived level.
    pub level: RiskLevel,
    /// Outside ticks since the last inside tick.
    pub consecutive_ticks_outside: u32,
    /// Whether the emission latch has fired.
    pub emitted: bool,
    /// Current corridor source, if any.
    pub corridor: Option<CorridorKind>,
    /// Relay phase.
    pub relay_phase: RelayPhase,
    /// Relay hop count.
    pub relay_hop_count: usize,
    /// Relay peers in the current episode.
    pub relay_nodes: Vec<RelayNode>,
    /// Whether a packet awaits reconnect replay.
    pub pending_packet: bool,
    /// Whether the trip key pair has been generated.
    pub key_ready: bool,
    /// Last error from the position source, cleared by the next valid tick.
    pub last_position_error: Option<PositionError>,
}

/// State owned by one trip.
pub struct TripSession {
    config: Arc<MonitorConfig>,
    trip: Trip,
    destination: Option<Coordinate>,
    risk: RiskState,
    relay: RelayState,
    corridor: Option<Arc<Corridor>>,
    key: Option<Arc<TripKeyPair>>,
    last_position_error: Option<PositionError>,
}

impl std::fmt::Debug for TripSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TripSession")
            .field("trip_id", &self.trip.id)
            .field("status", &self.trip.status())
            .field("score", &self.risk.score())
            .field("relay_phase", &self.relay.phase())
            .field("key_ready", &self.key.is_some())
            .finish_non_exhaustive()
    }
}

impl TripSession {
    /// Start a trip. The fallback corridor (straight line to `destination`)
    /// is in place before the first tick.
    pub fn start(
        config: Arc<MonitorConfig>,
        start: Coordinate,
        destination: Option<Coordinate>,
        at: Timestamp,
    ) -> Self {
        let trip = Trip::start(start, at);
        let input = CorridorInput {
            route: Vec::new(),
            start: Some(start),
            destination,
        };
        let corridor = Corridor::build(&input, &config.corridor).map(Arc::new);
        tracing::info!(
            trip_id = %trip.id,
            %start,
            corridor = ?corridor.as_ref().map(|c| c.kind()),
            "trip started"
        );
        Self {
            config,
            trip,
            destination,
            risk: RiskState::new(),
            relay: RelayState::new(),
            corridor,
            key: None,
            last_position_error: None,
        }
    }

    /// Trip identifier.
    pub fn trip_id(&self) -> TripId {
        self.trip.id
    }

    /// The trip.
    pub fn trip(&self) -> &Trip {
        &self.trip
    }

    /// Risk state.
    pub fn risk(&self) -> &RiskState {
        &self.risk
    }

    /// Relay state.
    pub fn relay(&self) -> &RelayState {
        &self.relay
    }

    /// Destination, if one was given.
    pub fn destination(&self) -> Option<Coordinate> {
        self.destination
    }

    /// The corridor in force.
    pub fn corridor(&self) -> Option<Arc<Corridor>> {
        self.corridor.clone()
    }

    /// Install the trip key once generated.
    pub fn attach_key(&mut self, key: TripKeyPair) {
        self.key = Some(Arc::new(key));
    }

    /// Signing handle, if the key is ready.
    pub fn key(&self) -> Option<Arc<TripKeyPair>> {
        self.key.clone()
    }

    /// Process one position tick.
    ///
    /// # Errors
    ///
    /// [`MonitorError::Transition`] once the trip has completed; state is
    /// left untouched.
    pub fn on_tick(&mut self, position: Coordinate, at: Timestamp) -> Result<TickReport, MonitorError> {
        self.trip.record_position(position)?;
        self.last_position_error = None;

        let Some(corridor) = self.corridor.clone() else {
            return Ok(TickReport {
                inside: None,
                distance_km: None,
                score: self.risk.score(),
                level: self.risk.level(&self.config.risk),
                alert_raised: false,
                emission: None,
            });
        };

        let distance_km = corridor.distance_km(&position);
        let inside = distance_km <= corridor.buffer_km();
        let policy = &self.config.risk;
        let mut alert_raised = false;
        let mut emission = None;

        if inside {
            self.risk.observe_inside(policy);
        } else {
            alert_raised = self.trip.raise_alert(at)?;
            let increase = self.risk.observe_outside(policy, distance_km);
            tracing::debug!(
                trip_id = %self.trip.id,
                distance_km,
                increase,
                score = self.risk.score(),
                consecutive = self.risk.consecutive_ticks_outside(),
                "outside corridor"
            );
            emission = self.risk.try_emit(policy, self.trip.id, position, at);
        }

        Ok(TickReport {
            inside: Some(inside),
            distance_km: Some(distance_km),
            score: self.risk.score(),
            level: self.risk.level(policy),
            alert_raised,
            emission,
        })
    }

    /// Record a position source failure. Risk state and path are untouched;
    /// the last accepted position stays authoritative.
    pub fn on_position_error(&mut self, error: PositionError) {
        tracing::warn!(trip_id = %self.trip.id, %error, "position source error");
        self.last_position_error = Some(error);
    }

    /// Replace the fallback corridor with one built from route geometry.
    ///
    /// # Errors
    ///
    /// Rejected geometry leaves the current corridor in place.
    pub fn install_route(&mut self, route: &RouteGeometry) -> Result<(), MonitorError> {
        let corridor = Corridor::from_route(route, &self.config.corridor)?;
        tracing::info!(
            trip_id = %self.trip.id,
            vertices = route.len(),
            distance_m = route.distance_m,
            duration_s = route.duration_s,
            "route corridor installed"
        );
        self.corridor = Some(Arc::new(corridor));
        Ok(())
    }

    /// Manual emergency trigger. Goes through the same latch as the
    /// threshold path, so it fires at most once per trip across both.
    pub fn force_emergency(&mut self, at: Timestamp) -> Result<Option<EmergencyPayload>, MonitorError> {
        if !self.trip.status().is_monitoring() {
            return Err(MonitorError::Transition(
                sahayak_state::TransitionError::TripCompleted,
            ));
        }
        Ok(self
            .risk
            .try_emit_manual(self.trip.id, self.trip.last_position(), at))
    }

    /// Offer a packet to the relay queue.
    pub fn queue_for_relay(&mut self, packet: SignedPacket) -> RelayStart {
        self.relay.begin(packet)
    }

    /// Record relay peers for `episode`.
    pub fn relay_discovered(&mut self, episode: u64, nodes: Vec<RelayNode>) {
        self.relay.discovered(episode, nodes);
    }

    /// Advance the relay on a timer for `episode`.
    pub fn relay_advance(&mut self, episode: u64) -> Result<RelayPhase, MonitorError> {
        Ok(self.relay.advance(episode)?)
    }

    /// Take the pending packet for reconnect replay.
    pub fn flush_relay(&mut self) -> Option<SignedPacket> {
        self.relay.flush()
    }

    /// End the trip: complete it, zero risk, cancel the relay and drop the
    /// key. Consumes the session.
    pub fn end(mut self, at: Timestamp) -> Result<Trip, MonitorError> {
        self.trip.complete(at)?;
        self.risk.reset();
        self.relay.cancel();
        self.key = None;
        Ok(self.trip)
    }

    /// Read-only view.
    pub fn view(&self) -> TripView {
        TripView {
            trip_id: self.trip.id,
            status: self.trip.status(),
            path_len: self.trip.path().len(),
            last_position: self.trip.last_position(),
            score: self.risk.score(),
            level: self.risk.level(&self.config.risk),
            consecutive_ticks_outside: self.risk.consecutive_ticks_outside(),
            emitted: self.risk.emitted(),
            corridor: self.corridor.as_ref().map(|c| c.kind()),
            relay_phase: self.relay.phase(),
            relay_hop_count: self.relay.hop_count(),
            relay_nodes: self.relay.nodes().to_vec(),
            pending_packet: self.relay.has_pending(),
            key_ready: self.key.is_some(),
            last_position_error: self.last_position_error,
        }
    }
}
