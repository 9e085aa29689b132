//! # sahayak-core — Foundational Types for the Trip Safety Engine
//!
//! This crate is the leaf of the Sahayak workspace. It defines the value
//! types that travel between the rider's device and the police console, and
//! the canonicalization pipeline every signature is computed over.
//!
//! ## Key Design Principles
//!
//! 1. **Validated coordinates.** A [`Coordinate`] cannot hold NaN, infinity,
//!    or out-of-range degrees. Position-source garbage is rejected at the
//!    boundary, before it can reach risk state.
//!
//! 2. **`CanonicalBytes` newtype.** Signatures and packet digests are computed
//!    only over `CanonicalBytes::new()` output (JCS, sorted keys, no floats).
//!    Locations enter the canonical form as integer microdegrees.
//!
//! 3. **Wire data lives here, operations live elsewhere.** [`EmergencyPayload`],
//!    [`SignedPacket`] and [`TransportEvent`] are pure data; signing is in
//!    `sahayak-crypto`, state machines in `sahayak-state`.
//!
//! 4. **Millisecond UTC timestamps.** [`Timestamp`] serializes as epoch
//!    milliseconds so it stays an integer in canonical form.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `sahayak-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod canonical;
pub mod coordinate;
pub mod digest;
pub mod error;
pub mod event;
pub mod identity;
pub mod payload;
pub mod temporal;

pub use canonical::CanonicalBytes;
pub use coordinate::{Coordinate, KM_PER_DEGREE};
pub use digest::{sha256_digest, ContentDigest};
pub use error::{CanonicalizationError, CoordinateError, CoreError};
pub use event::{ArrivalKind, TransportEvent};
pub use identity::{AlertId, RelayNodeId, StationId, TripId};
pub use payload::{EmergencyPayload, Severity, SignedPacket, WirePacket};
pub use temporal::Timestamp;
