//! Trip and risk machines driven together the way a session drives them:
//! status flips on the first outside tick, the latch fires once per trip,
//! and a fresh trip re-arms it.

use sahayak_core::{Coordinate, Severity, Timestamp};
use sahayak_state::{RiskLevel, RiskPolicy, RiskState, Trip, TripStatus};

fn ts(ms: i64) -> Timestamp {
    Timestamp::from_millis(1_760_000_000_000 + ms).unwrap()
}

/// Feed `n` outside ticks at `distance_km`, returning the number of payloads.
fn drive(trip: &mut Trip, risk: &mut RiskState, policy: &RiskPolicy, n: usize, distance_km: f64) -> usize {
    let mut payloads = 0;
    for i in 0..n {
        let p = Coordinate::new(12.98, 77.60 + i as f64 * 0.001).unwrap();
        trip.record_position(p).unwrap();
        trip.raise_alert(ts(i as i64)).unwrap();
        risk.observe_outside(policy, distance_km);
        if let Some(payload) = risk.try_emit(policy, trip.id, p, ts(i as i64)) {
            assert_eq!(payload.severity, Severity::High);
            assert_eq!(payload.trip_id, trip.id);
            payloads += 1;
        }
    }
    payloads
}

#[test]
fn one_emission_per_trip_and_rearmed_by_new_trip() {
    let policy = RiskPolicy::default();
    let start = Coordinate::new(12.9716, 77.5946).unwrap();

    let mut trip = Trip::start(start, ts(0));
    let mut risk = RiskState::new();
    assert_eq!(drive(&mut trip, &mut risk, &policy, 20, 1.0), 1);
    assert_eq!(trip.status(), TripStatus::Alert);
    assert_eq!(risk.level(&policy), RiskLevel::Critical);
    assert_eq!(trip.path().len(), 21);

    trip.complete(ts(100)).unwrap();
    risk.reset();

    let mut next = Trip::start(start, ts(200));
    assert_ne!(next.id, trip.id);
    assert_eq!(drive(&mut next, &mut risk, &policy, 20, 1.0), 1);
}

#[test]
fn risk_survives_active_to_alert() {
    let policy = RiskPolicy::default();
    let mut trip = Trip::start(Coordinate::new(12.9716, 77.5946).unwrap(), ts(0));
    let mut risk = RiskState::new();

    risk.observe_outside(&policy, 0.5);
    let before = risk.clone();
    assert!(trip.raise_alert(ts(1)).unwrap());
    assert_eq!(risk, before);
    assert_eq!(risk.consecutive_ticks_outside(), 1);
}
