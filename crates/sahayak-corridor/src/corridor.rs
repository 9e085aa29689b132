//! # Corridor
//!
//! A corridor is a polyline plus a buffer radius. A point is inside when its
//! distance to the nearest segment is within the buffer.
//!
//! Distance is computed in a local planar frame (km) centred on the query
//! point: every vertex is projected with the equirectangular approximation
//! and `geo` measures point-to-linestring distance in that frame. At corridor
//! scale (hundreds of metres) the projection error is far below GPS noise.

use geo::{Coord, EuclideanDistance, LineString, Point};
use serde::{Deserialize, Serialize};

use sahayak_core::Coordinate;

use crate::error::CorridorError;
use crate::route::RouteGeometry;

/// Corridor tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorridorPolicy {
    /// Buffer radius around the route, km.
    pub buffer_km: f64,
}

impl Default for CorridorPolicy {
    fn default() -> Self {
        Self { buffer_km: 0.3 }
    }
}

/// What a corridor was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorridorKind {
    /// Full route geometry from a routing service.
    Route,
    /// Straight chord between start and destination.
    StraightLine,
    /// Start and destination coincide; a circle of the buffer radius.
    Point,
}

/// Inputs from which a corridor may be built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CorridorInput {
    /// Planned route, if known.
    pub route: Vec<Coordinate>,
    /// Trip start.
    pub start: Option<Coordinate>,
    /// Trip destination.
    pub destination: Option<Coordinate>,
}

impl CorridorInput {
    /// Endpoints only.
    pub fn endpoints(start: Coordinate, destination: Coordinate) -> Self {
        Self {
            route: Vec::new(),
            start: Some(start),
            destination: Some(destination),
        }
    }
}

/// An immutable safety corridor.
#[derive(Debug, Clone, PartialEq)]
pub struct Corridor {
    kind: CorridorKind,
    vertices: Vec<Coordinate>,
    buffer_km: f64,
}

impl Corridor {
    /// Build the best corridor the input allows: the route when it has at
    /// least two points, else the straight line between start and
    /// destination (a circle if they coincide). `None` when neither exists.
    pub fn build(input: &CorridorInput, policy: &CorridorPolicy) -> Option<Self> {
        if input.route.len() >= 2 {
            return Some(Self::with_buffer(
                CorridorKind::Route,
                input.route.clone(),
                policy.buffer_km,
            ));
        }
        match (input.start, input.destination) {
            (Some(start), Some(destination)) => {
                Some(Self::straight_line(start, destination, policy))
            }
            _ => None,
        }
    }

    /// Corridor along full route geometry.
    ///
    /// # Errors
    ///
    /// [`CorridorError::TooFewPoints`] for fewer than two points.
    pub fn from_route(route: &RouteGeometry, policy: &CorridorPolicy) -> Result<Self, CorridorError> {
        if route.points.len() < 2 {
            return Err(CorridorError::TooFewPoints(route.points.len()));
        }
        Ok(Self::with_buffer(
            CorridorKind::Route,
            route.points.clone(),
            policy.buffer_km,
        ))
    }

    /// Straight-line fallback. Identical endpoints give a circle.
    pub fn straight_line(start: Coordinate, destination: Coordinate, policy: &CorridorPolicy) -> Self {
        if start == destination {
            Self::with_buffer(CorridorKind::Point, vec![start], policy.buffer_km)
        } else {
            Self::with_buffer(
                CorridorKind::StraightLine,
                vec![start, destination],
                policy.buffer_km,
            )
        }
    }

    fn with_buffer(kind: CorridorKind, vertices: Vec<Coordinate>, buffer_km: f64) -> Self {
        let buffer_km = if buffer_km.is_finite() && buffer_km > 0.0 {
            buffer_km
        } else {
            tracing::warn!(buffer_km, "invalid corridor buffer, using default");
            CorridorPolicy::default().buffer_km
        };
        Self {
            kind,
            vertices,
            buffer_km,
        }
    }

    /// What the corridor was built from.
    pub fn kind(&self) -> CorridorKind {
        self.kind
    }

    /// Polyline vertices in route order.
    pub fn vertices(&self) -> &[Coordinate] {
        &self.vertices
    }

    /// Buffer radius, km.
    pub fn buffer_km(&self) -> f64 {
        self.buffer_km
    }

    /// Distance from `point` to the nearest point on the corridor's
    /// centreline, km.
    pub fn distance_km(&self, point: &Coordinate) -> f64 {
        match self.vertices.as_slice() {
            [] => f64::INFINITY,
            [only] => point.distance_km(only),
            vertices => {
                let line: LineString<f64> = vertices
                    .iter()
                    .map(|v| {
                        let (east, north) = v.to_local_km(point);
                        Coord { x: east, y: north }
                    })
                    .collect();
                Point::new(0.0, 0.0).euclidean_distance(&line)
            }
        }
    }

    /// Whether `point` lies within the buffer.
    pub fn contains(&self, point: &Coordinate) -> bool {
        self.distance_km(point) <= self.buffer_km
    }
}
