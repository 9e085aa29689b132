#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use sahayak_core::{Coordinate, SignedPacket, TransportEvent};
use sahayak_monitor::{
    spawn_monitor, EmergencyChannel, FixedDiscovery, MonitorConfig, MonitorError, MonitorHandle,
    QueueChannel, SessionSnapshot,
};
use tokio::sync::mpsc;

pub const START: (f64, f64) = (12.9716, 77.5946);
pub const DESTINATION: (f64, f64) = (12.99, 77.62);

pub fn coordinate((lat, lng): (f64, f64)) -> Coordinate {
    Coordinate::new(lat, lng).unwrap()
}

/// Tick `i` of the alternating ±0.01° longitude pattern around the start.
pub fn alternating(i: usize) -> (f64, f64) {
    let sign = if i % 2 == 0 { 1.0 } else { -1.0 };
    (START.0, START.1 + sign * 0.01)
}

pub fn monitor(relay_nodes: usize) -> (MonitorHandle, mpsc::UnboundedReceiver<TransportEvent>) {
    let (channel, rx) = QueueChannel::unbounded();
    let handle = spawn_monitor(
        MonitorConfig::default(),
        Arc::new(channel),
        Arc::new(FixedDiscovery(relay_nodes)),
    );
    (handle, rx)
}

/// Queue channel that refuses its first `failures` sends.
pub struct FlakyChannel {
    failures: AtomicUsize,
    inner: QueueChannel,
}

impl EmergencyChannel for FlakyChannel {
    fn send(&self, event: TransportEvent) -> Result<(), MonitorError> {
        let refused = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if refused {
            return Err(MonitorError::ChannelClosed);
        }
        self.inner.send(event)
    }
}

pub fn flaky_monitor(
    relay_nodes: usize,
    failures: usize,
) -> (MonitorHandle, mpsc::UnboundedReceiver<TransportEvent>) {
    let (inner, rx) = QueueChannel::unbounded();
    let channel = FlakyChannel {
        failures: AtomicUsize::new(failures),
        inner,
    };
    let handle = spawn_monitor(
        MonitorConfig::default(),
        Arc::new(channel),
        Arc::new(FixedDiscovery(relay_nodes)),
    );
    (handle, rx)
}

/// Poll snapshots until `pred` holds. Yields instead of sleeping so paused
/// time never auto-advances while waiting on the blocking pool.
pub async fn wait_for(
    handle: &MonitorHandle,
    what: &str,
    pred: impl Fn(&SessionSnapshot) -> bool,
) -> SessionSnapshot {
    for _ in 0..100_000 {
        let snapshot = handle.snapshot().await.unwrap();
        if pred(&snapshot) {
            return snapshot;
        }
        tokio::task::yield_now().await;
    }
    panic!("timed out waiting for {what}");
}

pub async fn start_trip_with_key(handle: &MonitorHandle) {
    handle
        .start_trip(coordinate(START), Some(coordinate(DESTINATION)))
        .await
        .unwrap();
    wait_for(handle, "trip key", |s| {
        s.trip.as_ref().is_some_and(|t| t.key_ready)
    })
    .await;
}

pub fn drain(rx: &mut mpsc::UnboundedReceiver<TransportEvent>) -> Vec<SignedPacket> {
    let mut packets = Vec::new();
    while let Ok(event) = rx.try_recv() {
        match event {
            TransportEvent::Emergency { packet } => packets.push(packet),
            other => panic!("unexpected event {other:?}"),
        }
    }
    packets
}
