//! # sahayak-monitor — Trip Monitoring Session
//!
//! Drives the state machines of `sahayak-state` from a live position
//! stream and delivers the resulting emergency over a transport that may be
//! down at the critical moment.
//!
//! ## Data Flow
//!
//! ```text
//! tick ─▶ corridor ─▶ risk ─▶ latch ─▶ seal (blocking pool)
//!                                          │
//!                     online ◀─────────────┴─────────────▶ offline
//!                       │                                     │
//!                 channel.send                 relay: scanning → connecting → queued
//!                                                             │
//!                                               reconnect ─▶ replay once
//! ```
//!
//! ## Key Design Principles
//!
//! 1. **One task owns the session.** [`MonitorHandle`] only sends commands;
//!    the task applies them in order. No locks guard trip state.
//! 2. **Latch before sign.** The payload is produced by the one-shot latch
//!    on the tick that crosses the threshold; signing starts afterwards, so
//!    a tick arriving mid-sign cannot fire it again.
//! 3. **Cancellable timing.** Relay phase delays are a single deadline owned
//!    by the task plus an episode number. Ending a trip clears both.
//! 4. **Key per trip.** The [`TripKeyPair`](sahayak_crypto::TripKeyPair) is
//!    generated when the trip starts and dropped when it ends.

pub mod config;
pub mod discovery;
pub mod error;
pub mod runtime;
pub mod session;
pub mod transport;

pub use config::{MonitorConfig, RelayTiming};
pub use discovery::{FixedDiscovery, RelayDiscovery, SimulatedDiscovery};
pub use error::{MonitorError, PositionError};
pub use runtime::{spawn_monitor, MonitorHandle, SessionSnapshot};
pub use session::{TickReport, TripSession, TripView};
pub use transport::{
    Connectivity, ConnectivityChange, EmergencyChannel, QueueChannel, TransportMonitor,
};
