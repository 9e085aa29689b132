//! # Transport Availability
//!
//! [`TransportMonitor`] tracks the binary connectivity signal and reports
//! the one transition that matters: Offline → Online, which triggers the
//! reconnect replay of any queued packet.
//!
//! [`EmergencyChannel`] is the outbound link. It carries
//! [`TransportEvent`]s and returns no acknowledgement.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use sahayak_core::TransportEvent;

use crate::error::MonitorError;

/// Connectivity state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Connectivity {
    /// Transport reachable.
    Online,
    /// Transport unreachable.
    Offline,
}

impl Connectivity {
    /// The other state.
    pub fn toggled(self) -> Self {
        match self {
            Self::Online => Self::Offline,
            Self::Offline => Self::Online,
        }
    }
}

/// A connectivity change that happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityChange {
    /// Online → Offline.
    WentOffline,
    /// Offline → Online; flush any pending packet.
    Reconnected,
}

/// Binary connectivity tracker.
#[derive(Debug, Clone)]
pub struct TransportMonitor {
    state: Connectivity,
}

impl Default for TransportMonitor {
    fn default() -> Self {
        Self::new(Connectivity::Online)
    }
}

impl TransportMonitor {
    /// Start in `initial`.
    pub fn new(initial: Connectivity) -> Self {
        Self { state: initial }
    }

    /// Current state.
    pub fn state(&self) -> Connectivity {
        self.state
    }

    /// Whether the transport is reachable.
    pub fn is_online(&self) -> bool {
        self.state == Connectivity::Online
    }

    /// Apply a connectivity signal. Repeated signals of the current state
    /// report nothing.
    pub fn set(&mut self, to: Connectivity) -> Option<ConnectivityChange> {
        if to == self.state {
            return None;
        }
        self.state = to;
        tracing::info!(connectivity = ?to, "transport connectivity changed");
        Some(match to {
            Connectivity::Online => ConnectivityChange::Reconnected,
            Connectivity::Offline => ConnectivityChange::WentOffline,
        })
    }

    /// Flip the state on demand.
    pub fn toggle(&mut self) -> Option<ConnectivityChange> {
        self.set(self.state.toggled())
    }
}

/// Outbound event link to the monitoring party.
pub trait EmergencyChannel: Send + Sync {
    /// Transmit one event. No acknowledgement is awaited.
    fn send(&self, event: TransportEvent) -> Result<(), MonitorError>;
}

/// [`EmergencyChannel`] backed by an in-process queue.
#[derive(Debug, Clone)]
pub struct QueueChannel {
    tx: mpsc::UnboundedSender<TransportEvent>,
}

impl QueueChannel {
    /// A channel and the receiving end of its queue.
    pub fn unbounded() -> (Self, mpsc::UnboundedReceiver<TransportEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl EmergencyChannel for QueueChannel {
    fn send(&self, event: TransportEvent) -> Result<(), MonitorError> {
        self.tx.send(event).map_err(|_| MonitorError::ChannelClosed)
    }
}
