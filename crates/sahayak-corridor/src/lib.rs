//! # sahayak-corridor — Safety Corridor Geometry
//!
//! - **Corridor** (`corridor.rs`): the tolerance band around a planned route.
//!   Built from full route geometry when available, otherwise a straight
//!   line between start and destination, otherwise a circle around a single
//!   point. Containment and distance-from-route are computed per tick.
//!
//! - **Route** (`route.rs`): route geometry as delivered by a routing
//!   service (`[lng, lat]` pairs plus total distance and duration),
//!   validated before it may replace a fallback corridor.
//!
//! ## Crate Policy
//!
//! - A `Corridor` is immutable once built. Upgrading to route geometry builds
//!   a new one; callers swap it whole, so a tick never sees half of each.
//! - Malformed geometry is an error value, never a panic.

pub mod corridor;
pub mod error;
pub mod route;

pub use corridor::{Corridor, CorridorInput, CorridorKind, CorridorPolicy};
pub use error::CorridorError;
pub use route::RouteGeometry;
