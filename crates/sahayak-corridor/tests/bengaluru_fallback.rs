//! Straight-line fallback corridor for the MG Road → Indiranagar trip,
//! checked against hand-computed distances.

use sahayak_core::Coordinate;
use sahayak_corridor::{Corridor, CorridorInput, CorridorKind, CorridorPolicy, RouteGeometry};

fn start() -> Coordinate {
    Coordinate::new(12.9716, 77.5946).unwrap()
}

fn destination() -> Coordinate {
    Coordinate::new(12.99, 77.62).unwrap()
}

#[test]
fn alternating_longitude_ticks_are_outside() {
    let corridor =
        Corridor::build(&CorridorInput::endpoints(start(), destination()), &CorridorPolicy::default())
            .unwrap();
    assert_eq!(corridor.kind(), CorridorKind::StraightLine);

    let east = Coordinate::new(12.9716, 77.6046).unwrap();
    let west = Coordinate::new(12.9716, 77.5846).unwrap();

    // East tick projects onto the chord; west tick is behind the start.
    assert!((corridor.distance_km(&east) - 0.647).abs() < 0.01);
    assert!((corridor.distance_km(&west) - 1.085).abs() < 0.01);
    assert!(!corridor.contains(&east));
    assert!(!corridor.contains(&west));
    assert!(corridor.contains(&start()));
    assert!(corridor.contains(&destination()));
}

#[test]
fn route_upgrade_replaces_fallback_whole() {
    let policy = CorridorPolicy::default();
    let fallback = Corridor::straight_line(start(), destination(), &policy);
    let route = RouteGeometry::from_lng_lat(
        &[
            [77.5946, 12.9716],
            [77.6046, 12.9716],
            [77.6100, 12.9800],
            [77.6200, 12.9900],
        ],
        4100.0,
        540.0,
    )
    .unwrap();
    let routed = Corridor::from_route(&route, &policy).unwrap();

    let east = Coordinate::new(12.9716, 77.6046).unwrap();
    assert!(!fallback.contains(&east));
    assert!(routed.contains(&east));
    assert_eq!(routed.vertices().len(), 4);
}
