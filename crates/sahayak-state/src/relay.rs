//! # Relay Queue Protocol
//!
//! ```text
//! Idle ──begin──▶ Scanning ──advance──▶ Connecting ──advance──▶ Queued
//!  ▲                 │                      │                     │
//!  └──────────────── flush (reconnect replay) / cancel (trip end) ┘
//! ```
//!
//! One relay episode per offline emission. The pending packet is taken into
//! the single slot at `begin` and released only by `flush` or dropped by
//! `cancel`. A `begin` while an episode is in flight is a no-op, so a
//! second critical event can never displace the first packet.
//!
//! Each episode has a number. Timers armed by the driver carry it, and
//! [`RelayState::advance`] rejects a timer from an episode that has already
//! been flushed or cancelled.

use serde::{Deserialize, Serialize};

use sahayak_core::{Coordinate, RelayNodeId, SignedPacket};

use crate::error::TransitionError;

/// Relay protocol phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelayPhase {
    /// No episode in flight.
    #[default]
    Idle,
    /// Looking for nearby relay peers.
    Scanning,
    /// Handshaking with the first peer.
    Connecting,
    /// Packet held for replay on reconnect.
    Queued,
}

impl RelayPhase {
    /// Canonical phase name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "IDLE",
            Self::Scanning => "SCANNING",
            Self::Connecting => "CONNECTING",
            Self::Queued => "QUEUED",
        }
    }
}

impl std::fmt::Display for RelayPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A simulated relay peer. Lives for one episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayNode {
    /// Ephemeral peer identifier.
    pub id: RelayNodeId,
    /// Where the peer was discovered.
    pub location: Coordinate,
}

/// Outcome of [`RelayState::begin`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayStart {
    /// A new episode started; arm timers with this number.
    Started {
        /// Episode number.
        episode: u64,
    },
    /// An episode was already in flight. The offered packet was dropped.
    AlreadyActive {
        /// Phase of the episode in flight.
        phase: RelayPhase,
    },
}

/// Relay state owned by one monitoring session.
#[derive(Debug, Clone, Default)]
pub struct RelayState {
    phase: RelayPhase,
    nodes: Vec<RelayNode>,
    pending: Option<SignedPacket>,
    hop_count: usize,
    episode: u64,
}

impl RelayState {
    /// Idle, empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current phase.
    pub fn phase(&self) -> RelayPhase {
        self.phase
    }

    /// Peers discovered in the current episode.
    pub fn nodes(&self) -> &[RelayNode] {
        &self.nodes
    }

    /// Hop count reported for the current episode.
    pub fn hop_count(&self) -> usize {
        self.hop_count
    }

    /// Number of the current (or most recent) episode.
    pub fn episode(&self) -> u64 {
        self.episode
    }

    /// The packet held in the slot, if any.
    pub fn pending_packet(&self) -> Option<&SignedPacket> {
        self.pending.as_ref()
    }

    /// Whether a packet is waiting for reconnect replay.
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// `Idle → Scanning` with `packet` in the slot. A no-op (the packet is
    /// dropped) unless idle.
    pub fn begin(&mut self, packet: SignedPacket) -> RelayStart {
        if self.phase() != RelayPhase::Idle {
            tracing::warn!(
                phase = self.phase().name(),
                episode = self.episode,
                trip_id = %packet.payload().trip_id,
                "relay episode already in flight, dropping packet"
            );
            return RelayStart::AlreadyActive {
                phase: self.phase(),
            };
        }
        self.episode += 1;
        self.nodes.clear();
        self.hop_count = 0;
        self.pending = Some(packet);
        self.set_phase(RelayPhase::Scanning);
        RelayStart::Started {
            episode: self.episode,
        }
    }

    /// Record the peers found while scanning. Ignored outside `Scanning` or
    /// for another episode.
    pub fn discovered(&mut self, episode: u64, nodes: Vec<RelayNode>) {
        if episode == self.episode && self.phase() == RelayPhase::Scanning {
            tracing::debug!(episode, count = nodes.len(), "relay peers discovered");
            self.nodes = nodes;
        }
    }

    /// Advance one phase on a timer for `episode`:
    /// `Scanning → Connecting` (hop count 1), then
    /// `Connecting → Queued` (hop count = discovered peers).
    ///
    /// # Errors
    ///
    /// [`TransitionError::StaleEpisode`] for a timer from an earlier episode;
    /// [`TransitionError::InvalidTransition`] from `Idle` or `Queued`.
    pub fn advance(&mut self, episode: u64) -> Result<RelayPhase, TransitionError> {
        if episode != self.episode {
            return Err(TransitionError::StaleEpisode {
                fired: episode,
                current: self.episode,
            });
        }
        match self.phase() {
            RelayPhase::Scanning => {
                self.hop_count = 1;
                self.set_phase(RelayPhase::Connecting);
            }
            RelayPhase::Connecting => {
                self.hop_count = self.nodes.len();
                self.set_phase(RelayPhase::Queued);
            }
            phase @ (RelayPhase::Idle | RelayPhase::Queued) => {
                return Err(TransitionError::InvalidTransition {
                    machine: "relay",
                    from: phase.name().to_string(),
                    to: "next".to_string(),
                });
            }
        }
        Ok(self.phase())
    }

    /// Release the pending packet for direct transmission and return to
    /// `Idle`. Returns `None` when nothing is held.
    pub fn flush(&mut self) -> Option<SignedPacket> {
        let packet = self.pending.take()?;
        tracing::info!(
            from = self.phase().name(),
            episode = self.episode,
            hop_count = self.hop_count,
            "relay flushed for reconnect replay"
        );
        self.clear();
        Some(packet)
    }

    /// Abandon the episode and drop any pending packet. Timers armed for the
    /// abandoned episode become stale.
    pub fn cancel(&mut self) {
        if self.phase() != RelayPhase::Idle || self.pending.is_some() {
            tracing::info!(
                from = self.phase().name(),
                episode = self.episode,
                "relay episode cancelled"
            );
        }
        self.pending = None;
        self.clear();
        self.episode += 1;
    }

    fn clear(&mut self) {
        self.nodes.clear();
        self.hop_count = 0;
        self.set_phase(RelayPhase::Idle);
    }

    fn set_phase(&mut self, to: RelayPhase) {
        if to != self.phase() {
            tracing::info!(
                from = self.phase().name(),
                to = to.name(),
                episode = self.episode,
                "relay phase changed"
            );
        }
        self.phase = to;
    }
}
