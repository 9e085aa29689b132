//! # sahayak-jurisdiction — Receiver-Side Jurisdiction and Alert Console
//!
//! Everything that happens after an emergency leaves the rider's device:
//! deciding which police station is responsible for a position, tracking
//! that responsibility as the position moves, and recording incoming
//! packets with their signature classification.
//!
//! ## Assignment Policies
//!
//! - **Nearest authority** ([`StationRegistry::nearest`]): minimum
//!   great-circle distance over the station dataset, flagged
//!   `inside_radius` within [`JurisdictionPolicy::radius_km`].
//! - **Route progress** ([`RouteSegments::assign`]): the route is split into
//!   equal index ranges, one per node; indices past the end clamp to the
//!   last node.
//!
//! Both are pure functions of their input. [`JurisdictionTracker`] turns a
//! stream of assignments into hand-off events.
//!
//! ## Crate Policy
//!
//! - Verification outcomes are data ([`VerificationStatus`]), never errors.
//! - Recording an alert never waits on verification.
//! - Locks are `parking_lot` and are not held across `.await`.

pub mod console;
pub mod error;
pub mod segments;
pub mod stations;
pub mod tracker;

pub use console::{
    AlertConsole, AlertRecord, ConsoleLimits, Ingested, LocationReport, Submission, VerificationStatus,
    DEFAULT_MAX_ALERTS, DEFAULT_MAX_TRACKED_TRIPS,
};
pub use error::JurisdictionError;
pub use segments::{RouteSegment, RouteSegments, SegmentAssignment};
pub use stations::{Assignment, JurisdictionPolicy, Station, StationRegistry, DEFAULT_RADIUS_KM};
pub use tracker::{Handoff, Jurisdiction, JurisdictionTracker};
