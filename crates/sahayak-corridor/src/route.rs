//! # Route Geometry
//!
//! Routing services return geometry as `[lng, lat]` pairs (GeoJSON order)
//! together with total distance and duration. [`RouteGeometry::from_lng_lat`]
//! validates that shape; a rejected geometry leaves the caller on its
//! fallback corridor.

use serde::{Deserialize, Serialize};

use sahayak_core::Coordinate;

use crate::error::CorridorError;

/// Validated route geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteGeometry {
    /// Ordered route vertices.
    pub points: Vec<Coordinate>,
    /// Total route distance, metres.
    pub distance_m: f64,
    /// Expected travel time, seconds.
    pub duration_s: f64,
}

impl RouteGeometry {
    /// Assemble and validate.
    ///
    /// # Errors
    ///
    /// [`CorridorError::TooFewPoints`] for fewer than two points and
    /// [`CorridorError::InvalidMetrics`] for negative or non-finite totals.
    pub fn new(points: Vec<Coordinate>, distance_m: f64, duration_s: f64) -> Result<Self, CorridorError> {
        if points.len() < 2 {
            return Err(CorridorError::TooFewPoints(points.len()));
        }
        let valid = |v: f64| v.is_finite() && v >= 0.0;
        if !valid(distance_m) || !valid(duration_s) {
            return Err(CorridorError::InvalidMetrics {
                distance_m,
                duration_s,
            });
        }
        Ok(Self {
            points,
            distance_m,
            duration_s,
        })
    }

    /// Parse `[lng, lat]` pairs.
    pub fn from_lng_lat(pairs: &[[f64; 2]], distance_m: f64, duration_s: f64) -> Result<Self, CorridorError> {
        let points = pairs
            .iter()
            .enumerate()
            .map(|(index, [lng, lat])| {
                Coordinate::new(*lat, *lng).map_err(|source| CorridorError::InvalidVertex { index, source })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(points, distance_m, duration_s)
    }

    /// Number of vertices; the route length used for segment partitioning.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false for a validated geometry.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Index of the vertex nearest to `position`.
    pub fn nearest_index(&self, position: &Coordinate) -> Option<usize> {
        self.points
            .iter()
            .enumerate()
            .map(|(i, p)| (i, p.distance_km(position)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i)
    }
}
