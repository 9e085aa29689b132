//! Relay peer discovery. Peers are simulated: their count and placement are
//! cosmetic and never gate the relay state machine.

use rand::Rng;

use sahayak_core::{Coordinate, RelayNodeId};
use sahayak_state::RelayNode;

/// Finds relay peers near a position.
pub trait RelayDiscovery: Send + Sync {
    /// Peers near `near`. May be empty.
    fn discover(&self, near: Coordinate) -> Vec<RelayNode>;
}

/// 1 to 3 peers scattered within `radius_km`.
#[derive(Debug, Clone)]
pub struct SimulatedDiscovery {
    /// Scatter radius, km.
    pub radius_km: f64,
}

impl Default for SimulatedDiscovery {
    fn default() -> Self {
        Self { radius_km: 0.5 }
    }
}

impl RelayDiscovery for SimulatedDiscovery {
    fn discover(&self, near: Coordinate) -> Vec<RelayNode> {
        let mut rng = rand::thread_rng();
        let radius = if self.radius_km.is_finite() {
            self.radius_km.abs()
        } else {
            0.0
        };
        let count = rng.gen_range(1..=3);
        (0..count)
            .filter_map(|_| {
                let north = rng.gen_range(-radius..=radius);
                let east = rng.gen_range(-radius..=radius);
                near.offset_km(north, east).ok().map(|location| RelayNode {
                    id: RelayNodeId::random(),
                    location,
                })
            })
            .collect()
    }
}

/// Always exactly `count` peers at the query position.
#[derive(Debug, Clone, Copy)]
pub struct FixedDiscovery(pub usize);

impl RelayDiscovery for FixedDiscovery {
    fn discover(&self, near: Coordinate) -> Vec<RelayNode> {
        (0..self.0)
            .map(|_| RelayNode {
                id: RelayNodeId::random(),
                location: near,
            })
            .collect()
    }
}
