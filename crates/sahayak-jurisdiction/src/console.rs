//! # Alert Console
//!
//! The receiving end of the transport. An emergency is recorded and
//! returned to the caller immediately with status `Pending` and its
//! nearest-authority jurisdiction; signature verification runs on the
//! blocking pool and updates the record when it finishes. Classification is
//! advisory and never delays the alert itself.
//!
//! The same packet can arrive twice (relay hop, then reconnect replay). Each
//! packet is keyed by the SHA-256 digest of its canonical form, so the
//! second delivery bumps a counter on the existing record instead of
//! creating another alert.
//!
//! Location updates feed one [`JurisdictionTracker`] per trip. A trip with
//! a registered [`RouteSegments`] partition uses the route-progress policy
//! whenever the update carries a route index; otherwise nearest-authority.
//!
//! Both books are bounded by [`ConsoleLimits`]: the oldest alert and the
//! least recently seen trip stream are evicted first.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use sahayak_core::{
    AlertId, ArrivalKind, ContentDigest, Coordinate, Severity, SignedPacket, Timestamp, TransportEvent,
    TripId, WirePacket,
};
use sahayak_crypto::{verify_packet, PacketVerdict};
use serde::{Deserialize, Serialize};
use tokio::sync::Notify;

use crate::error::JurisdictionError;
use crate::segments::RouteSegments;
use crate::stations::{Assignment, JurisdictionPolicy, StationRegistry};
use crate::tracker::{Handoff, Jurisdiction, JurisdictionTracker};

/// Receiver-side classification of an alert's signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    /// Verification still running.
    Pending,
    /// Signature valid for the embedded key.
    Verified,
    /// Signature present but wrong.
    Invalid,
    /// No signature attached.
    Unsigned,
}

impl VerificationStatus {
    /// Canonical string name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Verified => "verified",
            Self::Invalid => "invalid",
            Self::Unsigned => "unsigned",
        }
    }

    /// Whether verification has finished.
    pub fn is_settled(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl From<PacketVerdict> for VerificationStatus {
    fn from(verdict: PacketVerdict) -> Self {
        match verdict {
            PacketVerdict::Verified => Self::Verified,
            PacketVerdict::Invalid => Self::Invalid,
            PacketVerdict::Unsigned => Self::Unsigned,
        }
    }
}

impl std::fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One emergency as shown on the console.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRecord {
    /// Console-assigned identifier.
    pub alert_id: AlertId,
    /// Trip that raised the emergency.
    pub trip_id: TripId,
    /// Hex SHA-256 of the canonical packet.
    pub digest: String,
    /// Payload severity.
    pub severity: Severity,
    /// Position carried in the payload.
    pub location: Coordinate,
    /// Sender's emission time.
    pub emitted_at: Timestamp,
    /// First arrival at the console.
    pub received_at: Timestamp,
    /// Signature classification.
    pub verification: VerificationStatus,
    /// Nearest station at the emergency location.
    pub jurisdiction: Option<Assignment>,
    /// How many times this packet has arrived.
    pub deliveries: u32,
    /// The packet as received.
    pub packet: WirePacket,
}

/// Immediate answer to a submitted packet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    /// Record the packet maps to.
    pub alert_id: AlertId,
    /// Classification at the time of the answer.
    pub verification: VerificationStatus,
    /// Nearest station at the emergency location.
    pub jurisdiction: Option<Assignment>,
    /// The packet had already been received.
    pub duplicate: bool,
}

/// Assignment for one position of a tracked trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationReport {
    /// Trip being tracked.
    pub trip_id: TripId,
    /// Owner for this position.
    pub jurisdiction: Jurisdiction,
    /// Present only when the owner changed.
    pub handoff: Option<Handoff>,
}

/// What the console did with a transport event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Ingested {
    /// An emergency was recorded or deduplicated.
    Alert(Submission),
    /// A position was assigned.
    Location(LocationReport),
    /// An arrival notice was logged.
    Arrival {
        /// Trip the unit responded to.
        trip_id: TripId,
        /// Estimate or confirmation.
        arrival: ArrivalKind,
    },
}

/// Alerts kept before the oldest is evicted.
pub const DEFAULT_MAX_ALERTS: usize = 10_000;

/// Trip streams kept before the least recently seen is evicted.
pub const DEFAULT_MAX_TRACKED_TRIPS: usize = 10_000;

/// Retention bounds for the console's in-memory books.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleLimits {
    /// Maximum alerts held.
    pub max_alerts: usize,
    /// Maximum trips tracked at once.
    pub max_tracked_trips: usize,
}

impl Default for ConsoleLimits {
    fn default() -> Self {
        Self {
            max_alerts: DEFAULT_MAX_ALERTS,
            max_tracked_trips: DEFAULT_MAX_TRACKED_TRIPS,
        }
    }
}

#[derive(Debug, Default)]
struct AlertBook {
    records: HashMap<AlertId, AlertRecord>,
    order: VecDeque<(AlertId, ContentDigest)>,
    by_digest: HashMap<ContentDigest, AlertId>,
}

impl AlertBook {
    fn evict_over(&mut self, max: usize) {
        while self.order.len() > max {
            let Some((alert_id, digest)) = self.order.pop_front() else {
                break;
            };
            self.records.remove(&alert_id);
            self.by_digest.remove(&digest);
            tracing::debug!(%alert_id, "oldest alert evicted");
        }
    }
}

#[derive(Debug, Default)]
struct TripStream {
    tracker: JurisdictionTracker,
    route: Option<RouteSegments>,
    last_seen: u64,
}

#[derive(Debug, Default)]
struct StreamBook {
    streams: HashMap<TripId, TripStream>,
    sequence: u64,
}

impl StreamBook {
    /// The stream for `trip_id`, created if needed. Creating one at capacity
    /// evicts the least recently seen stream.
    fn touch(&mut self, trip_id: TripId, max: usize) -> &mut TripStream {
        if !self.streams.contains_key(&trip_id) && self.streams.len() >= max.max(1) {
            let stale = self
                .streams
                .iter()
                .min_by_key(|(_, stream)| stream.last_seen)
                .map(|(id, _)| *id);
            if let Some(stale) = stale {
                self.streams.remove(&stale);
                tracing::info!(trip_id = %stale, "least recently seen trip stream evicted");
            }
        }
        self.sequence += 1;
        let stream = self.streams.entry(trip_id).or_default();
        stream.last_seen = self.sequence;
        stream
    }
}

#[derive(Debug)]
struct ConsoleInner {
    registry: StationRegistry,
    policy: JurisdictionPolicy,
    limits: ConsoleLimits,
    alerts: RwLock<AlertBook>,
    streams: Mutex<StreamBook>,
    settled: Notify,
}

/// Shared, cloneable console state.
///
/// Locks are `parking_lot` and never held across an `.await`.
#[derive(Debug, Clone)]
pub struct AlertConsole {
    inner: Arc<ConsoleInner>,
}

impl AlertConsole {
    /// A console resolving jurisdiction against `registry`, default limits.
    pub fn new(registry: StationRegistry, policy: JurisdictionPolicy) -> Self {
        Self::with_limits(registry, policy, ConsoleLimits::default())
    }

    /// A console with explicit retention bounds.
    pub fn with_limits(
        registry: StationRegistry,
        policy: JurisdictionPolicy,
        limits: ConsoleLimits,
    ) -> Self {
        Self {
            inner: Arc::new(ConsoleInner {
                registry,
                policy,
                limits,
                alerts: RwLock::new(AlertBook::default()),
                streams: Mutex::new(StreamBook::default()),
                settled: Notify::new(),
            }),
        }
    }

    /// Stations known to this console.
    pub fn registry(&self) -> &StationRegistry {
        &self.inner.registry
    }

    /// Nearest-authority policy in force.
    pub fn policy(&self) -> &JurisdictionPolicy {
        &self.inner.policy
    }

    /// Nearest-authority lookup for an arbitrary position.
    pub fn resolve(&self, position: &Coordinate) -> Result<Assignment, JurisdictionError> {
        self.inner
            .registry
            .nearest(position, &self.inner.policy)
            .ok_or(JurisdictionError::NoStations)
    }

    /// Dispatch a transport event.
    pub fn ingest(&self, event: TransportEvent) -> Result<Ingested, JurisdictionError> {
        match event {
            TransportEvent::Emergency { packet } => self.submit(packet).map(Ingested::Alert),
            TransportEvent::LocationUpdate {
                trip_id,
                location,
                route_index,
            } => self
                .locate(trip_id, location, route_index)
                .map(Ingested::Location),
            TransportEvent::Arrival { trip_id, kind, at } => {
                tracing::info!(%trip_id, ?kind, %at, "responder arrival");
                Ok(Ingested::Arrival {
                    trip_id,
                    arrival: kind,
                })
            }
        }
    }

    /// Record an emergency packet and start verifying it.
    ///
    /// Returns before verification finishes. Signed packets start out
    /// `Pending`; unsigned ones are classified on the spot.
    pub fn submit(&self, packet: SignedPacket) -> Result<Submission, JurisdictionError> {
        let verification = if packet.is_unsigned() {
            VerificationStatus::Unsigned
        } else {
            VerificationStatus::Pending
        };
        self.record(WirePacket::from(&packet), verification, Some(packet))
    }

    /// Record a packet exactly as it arrived. One whose signature or key is
    /// not valid hex is kept and classified `Invalid`.
    pub fn submit_wire(&self, wire: WirePacket) -> Result<Submission, JurisdictionError> {
        match wire.decode() {
            Ok(packet) => self.submit(packet),
            Err(e) => {
                tracing::warn!(trip_id = %wire.payload.trip_id, error = %e, "undecodable signature");
                self.record(wire, VerificationStatus::Invalid, None)
            }
        }
    }

    fn record(
        &self,
        wire: WirePacket,
        verification: VerificationStatus,
        to_verify: Option<SignedPacket>,
    ) -> Result<Submission, JurisdictionError> {
        let digest = wire.digest()?;
        let payload = wire.payload.clone();

        let mut book = self.inner.alerts.write();
        if let Some(alert_id) = book.by_digest.get(&digest).copied() {
            if let Some(record) = book.records.get_mut(&alert_id) {
                record.deliveries += 1;
                tracing::info!(%alert_id, trip_id = %payload.trip_id, deliveries = record.deliveries, "duplicate emergency delivery");
                return Ok(Submission {
                    alert_id,
                    verification: record.verification,
                    jurisdiction: record.jurisdiction.clone(),
                    duplicate: true,
                });
            }
        }

        let alert_id = AlertId::new();
        let jurisdiction = self.inner.registry.nearest(&payload.location, &self.inner.policy);
        book.records.insert(
            alert_id,
            AlertRecord {
                alert_id,
                trip_id: payload.trip_id,
                digest: digest.to_hex(),
                severity: payload.severity,
                location: payload.location,
                emitted_at: payload.timestamp,
                received_at: Timestamp::now(),
                verification,
                jurisdiction: jurisdiction.clone(),
                deliveries: 1,
                packet: wire,
            },
        );
        book.order.push_back((alert_id, digest));
        book.by_digest.insert(digest, alert_id);
        book.evict_over(self.inner.limits.max_alerts);
        drop(book);

        metrics::counter!("sahayak_alerts_received_total").increment(1);
        tracing::warn!(
            %alert_id,
            trip_id = %payload.trip_id,
            severity = %payload.severity,
            location = %payload.location,
            station = jurisdiction.as_ref().map(|a| a.station_id.as_str()),
            "emergency received"
        );

        match (verification, to_verify) {
            (VerificationStatus::Pending, Some(packet)) => self.spawn_verification(alert_id, packet),
            (settled, _) => {
                metrics::counter!("sahayak_alerts_verified_total", "outcome" => settled.as_str()).increment(1);
            }
        }

        Ok(Submission {
            alert_id,
            verification,
            jurisdiction,
            duplicate: false,
        })
    }

    fn spawn_verification(&self, alert_id: AlertId, packet: SignedPacket) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            self.settle(alert_id, verify_packet(&packet));
            return;
        };
        let console = self.clone();
        runtime.spawn(async move {
            let verdict = match tokio::task::spawn_blocking(move || verify_packet(&packet)).await {
                Ok(verdict) => verdict,
                Err(e) => {
                    tracing::error!(%alert_id, error = %e, "verification task failed");
                    PacketVerdict::Invalid
                }
            };
            console.settle(alert_id, verdict);
        });
    }

    fn settle(&self, alert_id: AlertId, verdict: PacketVerdict) {
        let status = VerificationStatus::from(verdict);
        if let Some(record) = self.inner.alerts.write().records.get_mut(&alert_id) {
            record.verification = status;
        }
        metrics::counter!("sahayak_alerts_verified_total", "outcome" => status.as_str()).increment(1);
        match status {
            VerificationStatus::Verified => tracing::info!(%alert_id, "emergency signature verified"),
            _ => tracing::warn!(%alert_id, %status, "emergency signature not verified"),
        }
        self.inner.settled.notify_waiters();
    }

    /// Wait until the alert's verification has finished.
    pub async fn wait_settled(&self, alert_id: AlertId) -> Result<VerificationStatus, JurisdictionError> {
        loop {
            let notified = self.inner.settled.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            let status = self
                .alert(&alert_id)
                .ok_or(JurisdictionError::AlertNotFound(alert_id))?
                .verification;
            if status.is_settled() {
                return Ok(status);
            }
            notified.await;
        }
    }

    /// One alert by id.
    pub fn alert(&self, alert_id: &AlertId) -> Option<AlertRecord> {
        self.inner.alerts.read().records.get(alert_id).cloned()
    }

    /// All alerts in arrival order.
    pub fn alerts(&self) -> Vec<AlertRecord> {
        let book = self.inner.alerts.read();
        book.order
            .iter()
            .filter_map(|(id, _)| book.records.get(id).cloned())
            .collect()
    }

    /// Use route-progress assignment for `trip_id` when updates carry an index.
    pub fn register_route(&self, trip_id: TripId, segments: RouteSegments) {
        tracing::debug!(%trip_id, nodes = segments.segments().len(), "route segments registered");
        let max = self.inner.limits.max_tracked_trips;
        self.inner.streams.lock().touch(trip_id, max).route = Some(segments);
    }

    /// Assign a position of a tracked trip and report any hand-off.
    pub fn locate(
        &self,
        trip_id: TripId,
        location: Coordinate,
        route_index: Option<usize>,
    ) -> Result<LocationReport, JurisdictionError> {
        let mut book = self.inner.streams.lock();
        let segment = match (book.streams.get(&trip_id).and_then(|s| s.route.as_ref()), route_index) {
            (Some(route), Some(index)) => Some(route.assign(index)),
            _ => None,
        };
        // A failed lookup must not create a stream.
        let jurisdiction = match segment {
            Some(segment) => Jurisdiction::Segment(segment),
            None => Jurisdiction::Nearest(self.resolve(&location)?),
        };
        let stream = book.touch(trip_id, self.inner.limits.max_tracked_trips);
        let handoff = stream.tracker.observe(&jurisdiction);
        if let Some(h) = &handoff {
            tracing::info!(%trip_id, from = %h.from, to = %h.to, "jurisdiction hand-off");
        }
        Ok(LocationReport {
            trip_id,
            jurisdiction,
            handoff,
        })
    }

    /// Forget a trip's tracker. Returns whether one existed.
    pub fn end_tracking(&self, trip_id: &TripId) -> bool {
        self.inner.streams.lock().streams.remove(trip_id).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sahayak_core::EmergencyPayload;
    use sahayak_crypto::{seal, TripKeyPair};

    use crate::stations::Station;
    use sahayak_core::StationId;

    fn coord(lat: f64, lng: f64) -> Coordinate {
        Coordinate::new(lat, lng).unwrap()
    }

    fn console() -> AlertConsole {
        let registry = StationRegistry::new(vec![
            Station::new(StationId::new("ps_001").unwrap(), "Cubbon Park", coord(12.9763, 77.5929)),
            Station::new(StationId::new("ps_002").unwrap(), "Indiranagar", coord(12.9784, 77.6408)),
        ])
        .unwrap();
        AlertConsole::new(registry, JurisdictionPolicy::default())
    }

    fn payload() -> EmergencyPayload {
        EmergencyPayload::new(
            TripId::new(),
            coord(12.9716, 77.6046),
            Timestamp::from_millis(1_760_000_000_000).unwrap(),
            Severity::High,
        )
    }

    #[tokio::test]
    async fn test_signed_packet_pending_then_verified() {
        let console = console();
        let key = TripKeyPair::generate();
        let submission = console.submit(seal(Some(&key), payload())).unwrap();
        assert_eq!(submission.verification, VerificationStatus::Pending);
        assert!(!submission.duplicate);
        assert_eq!(
            submission.jurisdiction.unwrap().station_id.as_str(),
            "ps_001"
        );
        assert_eq!(
            console.wait_settled(submission.alert_id).await.unwrap(),
            VerificationStatus::Verified
        );
    }

    #[tokio::test]
    async fn test_unsigned_classified_immediately() {
        let console = console();
        let submission = console.submit(seal(None, payload())).unwrap();
        assert_eq!(submission.verification, VerificationStatus::Unsigned);
        assert_eq!(
            console.wait_settled(submission.alert_id).await.unwrap(),
            VerificationStatus::Unsigned
        );
    }

    #[tokio::test]
    async fn test_tampered_packet_is_invalid() {
        let console = console();
        let key = TripKeyPair::generate();
        let good = seal(Some(&key), payload());
        let mut forged = good.payload().clone();
        forged.location = coord(12.9, 77.5);
        let tampered = SignedPacket::new(forged, good.signature().to_vec(), good.public_key().to_vec());
        let submission = console.submit(tampered).unwrap();
        assert_eq!(
            console.wait_settled(submission.alert_id).await.unwrap(),
            VerificationStatus::Invalid
        );
    }

    #[tokio::test]
    async fn test_replayed_packet_is_shown_once() {
        let console = console();
        let key = TripKeyPair::generate();
        let packet = seal(Some(&key), payload());
        let first = console.submit(packet.clone()).unwrap();
        let second = console.submit(packet).unwrap();
        assert!(second.duplicate);
        assert_eq!(first.alert_id, second.alert_id);

        let alerts = console.alerts();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].deliveries, 2);
    }

    #[test]
    fn test_verifies_inline_without_runtime() {
        let console = console();
        let key = TripKeyPair::generate();
        let submission = console.submit(seal(Some(&key), payload())).unwrap();
        assert_eq!(
            console.alert(&submission.alert_id).unwrap().verification,
            VerificationStatus::Verified
        );
    }

    #[test]
    fn test_location_stream_reports_handoff() {
        let console = console();
        let trip_id = TripId::new();
        let first = console.locate(trip_id, coord(12.9716, 77.5946), None).unwrap();
        assert!(first.handoff.is_none());
        assert!(console.locate(trip_id, coord(12.9720, 77.5950), None).unwrap().handoff.is_none());

        let moved = console.locate(trip_id, coord(12.9780, 77.6400), None).unwrap();
        let handoff = moved.handoff.unwrap();
        assert_eq!(handoff.from.as_str(), "ps_001");
        assert_eq!(handoff.to.as_str(), "ps_002");
        assert!(console.end_tracking(&trip_id));
    }

    #[test]
    fn test_route_segments_used_when_index_present() {
        let console = console();
        let trip_id = TripId::new();
        let ids = vec![StationId::new("ps_001").unwrap(), StationId::new("ps_002").unwrap()];
        console.register_route(trip_id, RouteSegments::partition(20, ids).unwrap());

        let event = TransportEvent::LocationUpdate {
            trip_id,
            location: coord(12.9716, 77.5946),
            route_index: Some(15),
        };
        match console.ingest(event).unwrap() {
            Ingested::Location(report) => {
                assert!(matches!(report.jurisdiction, Jurisdiction::Segment(_)));
                assert_eq!(report.jurisdiction.station_id().as_str(), "ps_002");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_empty_registry_cannot_resolve() {
        let console = AlertConsole::new(StationRegistry::default(), JurisdictionPolicy::default());
        assert!(matches!(
            console.resolve(&coord(12.0, 77.0)),
            Err(JurisdictionError::NoStations)
        ));
        let submission = console.submit(seal(None, payload())).unwrap();
        assert!(submission.jurisdiction.is_none());
    }

    #[test]
    fn test_failed_lookup_leaves_no_stream() {
        let console = AlertConsole::new(StationRegistry::default(), JurisdictionPolicy::default());
        let trip_id = TripId::new();
        assert!(matches!(
            console.locate(trip_id, coord(12.97, 77.59), None),
            Err(JurisdictionError::NoStations)
        ));
        assert!(!console.end_tracking(&trip_id));
    }

    #[test]
    fn test_undecodable_signature_recorded_invalid() {
        let console = console();
        let mut wire = WirePacket::from(&seal(Some(&TripKeyPair::generate()), payload()));
        wire.signature = "zz".repeat(64);
        let submission = console.submit_wire(wire.clone()).unwrap();
        assert_eq!(submission.verification, VerificationStatus::Invalid);
        assert_eq!(submission.jurisdiction.unwrap().station_id.as_str(), "ps_001");

        let again = console.submit_wire(wire).unwrap();
        assert!(again.duplicate);
        let record = console.alert(&submission.alert_id).unwrap();
        assert_eq!(record.deliveries, 2);
        assert_eq!(record.packet.signature, "zz".repeat(64));
    }

    #[test]
    fn test_decodable_wire_packet_verifies() {
        let console = console();
        let packet = seal(Some(&TripKeyPair::generate()), payload());
        let submission = console.submit_wire(WirePacket::from(&packet)).unwrap();
        assert_eq!(
            console.alert(&submission.alert_id).unwrap().verification,
            VerificationStatus::Verified
        );
        assert!(console.submit(packet).unwrap().duplicate);
    }

    #[test]
    fn test_oldest_alert_evicted_at_capacity() {
        let limits = ConsoleLimits {
            max_alerts: 2,
            ..ConsoleLimits::default()
        };
        let console = AlertConsole::with_limits(StationRegistry::default(), JurisdictionPolicy::default(), limits);
        let packets: Vec<_> = (0..3).map(|_| seal(None, payload())).collect();
        let ids: Vec<_> = packets
            .iter()
            .map(|p| console.submit(p.clone()).unwrap().alert_id)
            .collect();

        let kept: Vec<_> = console.alerts().iter().map(|r| r.alert_id).collect();
        assert_eq!(kept, vec![ids[1], ids[2]]);
        assert!(console.alert(&ids[0]).is_none());
        assert!(!console.submit(packets[0].clone()).unwrap().duplicate);
    }

    #[test]
    fn test_least_recently_seen_stream_evicted() {
        let limits = ConsoleLimits {
            max_tracked_trips: 2,
            ..ConsoleLimits::default()
        };
        let console = AlertConsole::with_limits(console().registry().clone(), JurisdictionPolicy::default(), limits);
        let trips: Vec<_> = (0..3).map(|_| TripId::new()).collect();
        for trip_id in &trips {
            console.locate(*trip_id, coord(12.9716, 77.5946), None).unwrap();
        }
        assert!(!console.end_tracking(&trips[0]));
        assert!(console.end_tracking(&trips[1]));
        assert!(console.end_tracking(&trips[2]));
    }
}
