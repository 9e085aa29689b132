//! # Route-Progress Segments
//!
//! A known route of `L` points is split into `N` consecutive index ranges,
//! one per owning node. The first `N - 1` segments have `L / N` points; the
//! last absorbs the remainder. A tracked index past the end of the route is
//! clamped to the last node.

use sahayak_core::StationId;
use serde::{Deserialize, Serialize};

use crate::error::JurisdictionError;

/// One node's inclusive index range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteSegment {
    /// Owning node.
    pub station_id: StationId,
    /// First route index owned.
    pub start_index: usize,
    /// Last route index owned (inclusive).
    pub end_index: usize,
}

impl RouteSegment {
    /// Whether `index` falls inside this segment.
    pub fn contains(&self, index: usize) -> bool {
        (self.start_index..=self.end_index).contains(&index)
    }
}

/// Result of a route-progress lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentAssignment {
    /// Owning node.
    pub station_id: StationId,
    /// Position of the segment in the partition.
    pub segment: usize,
    /// First route index of the segment.
    pub start_index: usize,
    /// Last route index of the segment.
    pub end_index: usize,
    /// The queried index lay past the end of the route.
    pub clamped: bool,
}

/// Partition of a route among its owning nodes. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteSegments {
    route_length: usize,
    segments: Vec<RouteSegment>,
}

impl RouteSegments {
    /// Split `route_length` points evenly among `nodes`, in order.
    ///
    /// # Errors
    ///
    /// [`JurisdictionError::InvalidSegmentation`] when there are no nodes or
    /// fewer route points than nodes.
    pub fn partition(route_length: usize, nodes: Vec<StationId>) -> Result<Self, JurisdictionError> {
        let n = nodes.len();
        if n == 0 || route_length < n {
            return Err(JurisdictionError::InvalidSegmentation {
                route_length,
                nodes: n,
            });
        }
        let size = route_length / n;
        let segments = nodes
            .into_iter()
            .enumerate()
            .map(|(i, station_id)| RouteSegment {
                station_id,
                start_index: i * size,
                end_index: if i + 1 == n {
                    route_length - 1
                } else {
                    (i + 1) * size - 1
                },
            })
            .collect();
        Ok(Self {
            route_length,
            segments,
        })
    }

    /// Number of route points covered.
    pub fn route_length(&self) -> usize {
        self.route_length
    }

    /// Segments in route order.
    pub fn segments(&self) -> &[RouteSegment] {
        &self.segments
    }

    /// The node owning route index `index`.
    pub fn assign(&self, index: usize) -> SegmentAssignment {
        let clamped = index >= self.route_length;
        let last = self.segments.len() - 1;
        let position = if clamped {
            last
        } else {
            self.segments
                .iter()
                .position(|s| s.contains(index))
                .unwrap_or(last)
        };
        let segment = &self.segments[position];
        SegmentAssignment {
            station_id: segment.station_id.clone(),
            segment: position,
            start_index: segment.start_index,
            end_index: segment.end_index,
            clamped,
        }
    }
}
