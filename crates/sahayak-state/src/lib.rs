//! # sahayak-state — Trip, Risk and Relay State Machines
//!
//! The three state machines a monitoring session owns. They are plain values
//! mutated through explicit transition methods; none of them spawns tasks,
//! sleeps, or performs I/O. Timing and scheduling belong to
//! `sahayak-monitor`, which drives these machines from a single serialized
//! command stream.
//!
//! ## State Machines
//!
//! - **Trip** (`trip.rs`): `Active → Alert → Completed`, with
//!   `Active → Completed` directly. Alert is one-way. Every transition is
//!   appended to an ordered log.
//!
//! - **Risk** (`risk.rs`): score in `[0, 100]`, consecutive-outside counter,
//!   and the one-shot emission latch. The level (`Safe`, `Warning`,
//!   `Critical`) is derived from the score, never stored.
//!
//! - **Relay** (`relay.rs`): `Idle → Scanning → Connecting → Queued → Idle`
//!   with a single pending packet slot and an episode counter that
//!   invalidates timers from a cancelled episode.
//!
//! ## Crate Policy
//!
//! - Invalid transitions return [`TransitionError`]; they never panic.
//! - The emission latch has exactly one authority: [`RiskState::try_emit`]
//!   and its manual counterpart share the same guard.

pub mod error;
pub mod relay;
pub mod risk;
pub mod trip;

pub use error::TransitionError;

// ─── Trip re-exports ────────────────────────────────────────────────

pub use trip::{Trip, TripStatus, TripTransitionRecord};

// ─── Risk re-exports ────────────────────────────────────────────────

pub use risk::{RiskLevel, RiskPolicy, RiskState};

// ─── Relay re-exports ───────────────────────────────────────────────

pub use relay::{RelayNode, RelayPhase, RelayStart, RelayState};
