//! # Monitor Runtime
//!
//! [`spawn_monitor`] starts the session task and returns a
//! [`MonitorHandle`]. The task multiplexes, in priority order:
//!
//! 1. **Relay timer**: the single armed phase deadline, if any.
//! 2. **Internal results**: key generation and signing, which run on the
//!    blocking pool and report back here.
//! 3. **Commands** from the handle: ticks, route geometry, connectivity,
//!    position errors, manual trigger, end of trip, snapshots.
//!
//! Only this task touches the [`TripSession`], so ticks are serialized no
//! matter how the position source delivers them. Ticks keep flowing while a
//! key is generated or a packet is signed.
//!
//! Every internal result carries its trip id and is discarded if that trip
//! is no longer the running one. After a trip ends nothing for it is ever
//! transmitted.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;

use sahayak_core::{Coordinate, EmergencyPayload, SignedPacket, Timestamp, TransportEvent, TripId};
use sahayak_corridor::RouteGeometry;
use sahayak_crypto::TripKeyPair;
use sahayak_state::{RelayPhase, RelayStart};

use crate::config::MonitorConfig;
use crate::discovery::RelayDiscovery;
use crate::error::{MonitorError, PositionError};
use crate::session::{TripSession, TripView};
use crate::transport::{Connectivity, ConnectivityChange, EmergencyChannel, TransportMonitor};

const COMMAND_CHANNEL_SIZE: usize = 256;

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

enum MonitorCommand {
    StartTrip {
        start: Coordinate,
        destination: Option<Coordinate>,
        reply: oneshot::Sender<Result<TripId, MonitorError>>,
    },
    Tick {
        position: Coordinate,
    },
    RouteGeometry {
        route: RouteGeometry,
    },
    PositionError {
        error: PositionError,
    },
    SetConnectivity {
        to: Connectivity,
    },
    ToggleConnectivity,
    ForceEmergency {
        reply: oneshot::Sender<Result<bool, MonitorError>>,
    },
    EndTrip {
        reply: oneshot::Sender<Result<TripId, MonitorError>>,
    },
    Snapshot {
        reply: oneshot::Sender<SessionSnapshot>,
    },
}

// Manual Debug because oneshot::Sender does not implement Debug.
impl std::fmt::Debug for MonitorCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StartTrip { start, .. } => f
                .debug_struct("StartTrip")
                .field("start", start)
                .finish_non_exhaustive(),
            Self::Tick { position } => f.debug_struct("Tick").field("position", position).finish(),
            Self::RouteGeometry { route } => f
                .debug_struct("RouteGeometry")
                .field("vertices", &route.len())
                .finish(),
            Self::PositionError { error } => {
                f.debug_struct("PositionError").field("error", error).finish()
            }
            Self::SetConnectivity { to } => f.debug_struct("SetConnectivity").field("to", to).finish(),
            Self::ToggleConnectivity => f.write_str("ToggleConnectivity"),
            Self::ForceEmergency { .. } => f.write_str("ForceEmergency"),
            Self::EndTrip { .. } => f.write_str("EndTrip"),
            Self::Snapshot { .. } => f.write_str("Snapshot"),
        }
    }
}

enum Internal {
    KeyReady { trip_id: TripId, key: TripKeyPair },
    PacketSealed { trip_id: TripId, packet: SignedPacket },
}

struct RelayTimer {
    deadline: Instant,
    trip_id: TripId,
    episode: u64,
}

// ---------------------------------------------------------------------------
// SessionSnapshot
// ---------------------------------------------------------------------------

/// Immutable view of the monitor for UIs and tests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// The running trip, if any.
    pub trip: Option<TripView>,
    /// Transport connectivity.
    pub connectivity: Connectivity,
    /// Emergency events handed to the channel since the monitor started.
    pub emergencies_sent: u64,
    /// How many of those were reconnect replays.
    pub replays: u64,
}

// ---------------------------------------------------------------------------
// MonitorHandle
// ---------------------------------------------------------------------------

/// Cloneable handle to a running monitor task.
#[derive(Debug, Clone)]
pub struct MonitorHandle {
    tx: mpsc::Sender<MonitorCommand>,
}

impl MonitorHandle {
    async fn send(&self, command: MonitorCommand) -> Result<(), MonitorError> {
        self.tx
            .send(command)
            .await
            .map_err(|_| MonitorError::SessionClosed)
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> MonitorCommand,
    ) -> Result<T, MonitorError> {
        let (reply, rx) = oneshot::channel();
        self.send(make(reply)).await?;
        rx.await.map_err(|_| MonitorError::SessionClosed)
    }

    /// Start a trip. Key generation begins immediately in the background.
    pub async fn start_trip(
        &self,
        start: Coordinate,
        destination: Option<Coordinate>,
    ) -> Result<TripId, MonitorError> {
        self.request(|reply| MonitorCommand::StartTrip {
            start,
            destination,
            reply,
        })
        .await?
    }

    /// Position source entry point.
    ///
    /// # Errors
    ///
    /// [`MonitorError::InvalidPosition`] for non-finite or out-of-range
    /// degrees; such ticks never reach the session.
    pub async fn tick(&self, lat: f64, lng: f64) -> Result<(), MonitorError> {
        let position = Coordinate::new(lat, lng)?;
        self.send(MonitorCommand::Tick { position }).await
    }

    /// Route geometry source entry point.
    pub async fn route_geometry(&self, route: RouteGeometry) -> Result<(), MonitorError> {
        self.send(MonitorCommand::RouteGeometry { route }).await
    }

    /// Report a position source failure.
    pub async fn position_error(&self, error: PositionError) -> Result<(), MonitorError> {
        self.send(MonitorCommand::PositionError { error }).await
    }

    /// Runtime connectivity signal.
    pub async fn set_connectivity(&self, to: Connectivity) -> Result<(), MonitorError> {
        self.send(MonitorCommand::SetConnectivity { to }).await
    }

    /// Demand toggle of connectivity.
    pub async fn toggle_connectivity(&self) -> Result<(), MonitorError> {
        self.send(MonitorCommand::ToggleConnectivity).await
    }

    /// Manual emergency. Returns whether it fired (false if the trip has
    /// already emitted).
    pub async fn force_emergency(&self) -> Result<bool, MonitorError> {
        self.request(|reply| MonitorCommand::ForceEmergency { reply })
            .await?
    }

    /// End the running trip.
    pub async fn end_trip(&self) -> Result<TripId, MonitorError> {
        self.request(|reply| MonitorCommand::EndTrip { reply }).await?
    }

    /// Current state.
    pub async fn snapshot(&self) -> Result<SessionSnapshot, MonitorError> {
        self.request(|reply| MonitorCommand::Snapshot { reply }).await
    }
}

/// Spawn a monitor task on the current tokio runtime. The task exits when
/// every handle has been dropped.
pub fn spawn_monitor(
    config: MonitorConfig,
    channel: Arc<dyn EmergencyChannel>,
    discovery: Arc<dyn RelayDiscovery>,
) -> MonitorHandle {
    let (tx, rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);
    let (internal_tx, internal_rx) = mpsc::unbounded_channel();
    let actor = MonitorActor {
        config: Arc::new(config),
        session: None,
        transport: TransportMonitor::default(),
        channel,
        discovery,
        internal_tx,
        relay_timer: None,
        emergencies_sent: 0,
        replays: 0,
    };
    tokio::spawn(actor.run(rx, internal_rx));
    MonitorHandle { tx }
}

// ---------------------------------------------------------------------------
// Actor
// ---------------------------------------------------------------------------

struct MonitorActor {
    config: Arc<MonitorConfig>,
    session: Option<TripSession>,
    transport: TransportMonitor,
    channel: Arc<dyn EmergencyChannel>,
    discovery: Arc<dyn RelayDiscovery>,
    internal_tx: mpsc::UnboundedSender<Internal>,
    relay_timer: Option<RelayTimer>,
    emergencies_sent: u64,
    replays: u64,
}

async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

impl MonitorActor {
    async fn run(
        mut self,
        mut commands: mpsc::Receiver<MonitorCommand>,
        mut internal: mpsc::UnboundedReceiver<Internal>,
    ) {
        tracing::debug!("monitor task started");
        loop {
            let deadline = self.relay_timer.as_ref().map(|t| t.deadline);
            tokio::select! {
                biased;

                () = sleep_until_opt(deadline) => {
                    if let Some(timer) = self.relay_timer.take() {
                        self.on_relay_timer(timer);
                    }
                }

                Some(event) = internal.recv() => self.on_internal(event),

                command = commands.recv() => match command {
                    Some(command) => self.on_command(command),
                    None => break,
                },
            }
        }
        tracing::debug!("monitor task stopped");
    }

    fn on_command(&mut self, command: MonitorCommand) {
        tracing::trace!(?command, "monitor command");
        match command {
            MonitorCommand::StartTrip {
                start,
                destination,
                reply,
            } => {
                let _ = reply.send(self.start_trip(start, destination));
            }
            MonitorCommand::Tick { position } => self.on_tick(position),
            MonitorCommand::RouteGeometry { route } => match self.session.as_mut() {
                Some(session) => {
                    if let Err(e) = session.install_route(&route) {
                        tracing::warn!(error = %e, "route geometry rejected, keeping current corridor");
                    }
                }
                None => tracing::debug!("route geometry without an active trip"),
            },
            MonitorCommand::PositionError { error } => match self.session.as_mut() {
                Some(session) => session.on_position_error(error),
                None => tracing::debug!(%error, "position error without an active trip"),
            },
            MonitorCommand::SetConnectivity { to } => {
                let change = self.transport.set(to);
                self.on_connectivity_change(change);
            }
            MonitorCommand::ToggleConnectivity => {
                let change = self.transport.toggle();
                self.on_connectivity_change(change);
            }
            MonitorCommand::ForceEmergency { reply } => {
                let _ = reply.send(self.force_emergency());
            }
            MonitorCommand::EndTrip { reply } => {
                let _ = reply.send(self.end_trip());
            }
            MonitorCommand::Snapshot { reply } => {
                let _ = reply.send(self.snapshot());
            }
        }
    }

    fn start_trip(
        &mut self,
        start: Coordinate,
        destination: Option<Coordinate>,
    ) -> Result<TripId, MonitorError> {
        if self.session.is_some() {
            return Err(MonitorError::TripAlreadyActive);
        }
        let session = TripSession::start(self.config.clone(), start, destination, Timestamp::now());
        let trip_id = session.trip_id();
        self.session = Some(session);

        let tx = self.internal_tx.clone();
        tokio::task::spawn_blocking(move || {
            let key = TripKeyPair::generate();
            let _ = tx.send(Internal::KeyReady { trip_id, key });
        });
        Ok(trip_id)
    }

    fn on_tick(&mut self, position: Coordinate) {
        let Some(session) = self.session.as_mut() else {
            tracing::debug!(%position, "tick without an active trip");
            return;
        };
        match session.on_tick(position, Timestamp::now()) {
            Ok(report) => {
                if let Some(payload) = report.emission {
                    self.seal_in_background(payload);
                }
            }
            Err(e) => tracing::warn!(error = %e, "tick rejected"),
        }
    }

    fn force_emergency(&mut self) -> Result<bool, MonitorError> {
        let session = self.session.as_mut().ok_or(MonitorError::NoActiveTrip)?;
        match session.force_emergency(Timestamp::now())? {
            Some(payload) => {
                self.seal_in_background(payload);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// The latch is already set; signing happens off the tick path.
    fn seal_in_background(&self, payload: EmergencyPayload) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let trip_id = session.trip_id();
        let key = session.key();
        let tx = self.internal_tx.clone();
        tokio::task::spawn_blocking(move || {
            let packet = sahayak_crypto::seal(key.as_deref(), payload);
            let _ = tx.send(Internal::PacketSealed { trip_id, packet });
        });
    }

    fn on_internal(&mut self, event: Internal) {
        match event {
            Internal::KeyReady { trip_id, key } => match self.current_session(trip_id) {
                Some(session) => {
                    session.attach_key(key);
                    tracing::debug!(%trip_id, "trip key ready");
                }
                None => tracing::debug!(%trip_id, "discarding key for ended trip"),
            },
            Internal::PacketSealed { trip_id, packet } => {
                if self.current_session(trip_id).is_none() {
                    tracing::info!(%trip_id, "discarding packet for ended trip");
                    return;
                }
                self.dispatch(trip_id, packet);
            }
        }
    }

    fn current_session(&mut self, trip_id: TripId) -> Option<&mut TripSession> {
        self.session
            .as_mut()
            .filter(|s| s.trip_id() == trip_id && s.trip().status().is_monitoring())
    }

    /// Direct send when online, relay queue otherwise.
    fn dispatch(&mut self, trip_id: TripId, packet: SignedPacket) {
        if self.transport.is_online() {
            match self.transmit(packet.clone()) {
                Ok(()) => {
                    tracing::warn!(%trip_id, signed = !packet.is_unsigned(), "emergency sent");
                    return;
                }
                Err(e) => {
                    tracing::error!(%trip_id, error = %e, "direct send failed, queueing for relay");
                }
            }
        }
        let Some(session) = self.session.as_mut() else {
            return;
        };
        match session.queue_for_relay(packet) {
            RelayStart::Started { episode } => {
                let near = session.trip().last_position();
                session.relay_discovered(episode, self.discovery.discover(near));
                self.arm_relay_timer(trip_id, episode, self.config.relay.scanning());
            }
            RelayStart::AlreadyActive { phase } => {
                tracing::warn!(%trip_id, %phase, "relay busy, emergency dropped");
            }
        }
    }

    fn transmit(&mut self, packet: SignedPacket) -> Result<(), MonitorError> {
        self.channel.send(TransportEvent::Emergency { packet })?;
        self.emergencies_sent += 1;
        metrics::counter!("sahayak_emergencies_emitted_total").increment(1);
        Ok(())
    }

    fn arm_relay_timer(&mut self, trip_id: TripId, episode: u64, after: Duration) {
        self.relay_timer = Some(RelayTimer {
            deadline: Instant::now() + after,
            trip_id,
            episode,
        });
    }

    fn on_relay_timer(&mut self, timer: RelayTimer) {
        let Some(session) = self.current_session(timer.trip_id) else {
            return;
        };
        match session.relay_advance(timer.episode) {
            Ok(RelayPhase::Connecting) => {
                let after = self.config.relay.connecting();
                self.arm_relay_timer(timer.trip_id, timer.episode, after);
            }
            Ok(phase) => {
                tracing::info!(trip_id = %timer.trip_id, %phase, "relay holding packet");
            }
            Err(e) => tracing::debug!(error = %e, "relay timer ignored"),
        }
    }

    fn on_connectivity_change(&mut self, change: Option<ConnectivityChange>) {
        if change != Some(ConnectivityChange::Reconnected) {
            return;
        }
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let trip_id = session.trip_id();
        let Some(packet) = session.relay().pending_packet().cloned() else {
            return;
        };
        // The slot is released only once the channel has taken the packet.
        if let Err(e) = self.transmit(packet) {
            tracing::error!(%trip_id, error = %e, "reconnect replay failed, packet stays queued");
            return;
        }
        if let Some(session) = self.session.as_mut() {
            session.flush_relay();
        }
        self.relay_timer = None;
        self.replays += 1;
        metrics::counter!("sahayak_relay_replays_total").increment(1);
        tracing::warn!(%trip_id, "queued emergency replayed on reconnect");
    }

    fn end_trip(&mut self) -> Result<TripId, MonitorError> {
        let session = self.session.take().ok_or(MonitorError::NoActiveTrip)?;
        self.relay_timer = None;
        let trip = session.end(Timestamp::now())?;
        tracing::info!(trip_id = %trip.id, path_len = trip.path().len(), "trip ended");
        Ok(trip.id)
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            trip: self.session.as_ref().map(TripSession::view),
            connectivity: self.transport.state(),
            emergencies_sent: self.emergencies_sent,
            replays: self.replays,
        }
    }
}
