//! # Risk Score and Emission Latch
//!
//! Per tick, inside the corridor:
//!
//! ```text
//! consecutive := 0
//! score       := max(0, score - DECAY)
//! ```
//!
//! outside the corridor:
//!
//! ```text
//! consecutive += 1
//! increase     = min(CAP, BASE + consecutive * TIME_FACTOR + distance_km * DIST_FACTOR)
//! score        = min(100, score + increase)
//! ```
//!
//! The level is derived from the score against two thresholds. The latch
//! flips at most once per trip and is the only way an [`EmergencyPayload`]
//! is produced.

use serde::{Deserialize, Serialize};

use sahayak_core::{Coordinate, EmergencyPayload, Severity, Timestamp, TripId};

/// Upper bound of the risk score.
pub const MAX_SCORE: f64 = 100.0;

/// Tunable risk constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskPolicy {
    /// Score removed per inside tick.
    pub decay: f64,
    /// Fixed part of every outside increase.
    pub base: f64,
    /// Increase per consecutive outside tick.
    pub time_factor: f64,
    /// Increase per km of distance from the route.
    pub dist_factor: f64,
    /// Ceiling on a single tick's increase.
    pub cap: f64,
    /// Score at which the level becomes `Warning`.
    pub warning_threshold: f64,
    /// Score at which the level becomes `Critical` and emission fires.
    pub critical_threshold: f64,
}

impl Default for RiskPolicy {
    fn default() -> Self {
        Self {
            decay: 4.0,
            base: 5.0,
            time_factor: 0.8,
            dist_factor: 12.0,
            cap: 30.0,
            warning_threshold: 30.0,
            critical_threshold: 70.0,
        }
    }
}

impl RiskPolicy {
    /// Score increase for one outside tick.
    pub fn increase(&self, consecutive_ticks_outside: u32, distance_km: f64) -> f64 {
        let distance_km = if distance_km.is_finite() {
            distance_km.max(0.0)
        } else {
            0.0
        };
        let raw = self.base
            + f64::from(consecutive_ticks_outside) * self.time_factor
            + distance_km * self.dist_factor;
        raw.min(self.cap)
    }

    /// Level for a score.
    pub fn level(&self, score: f64) -> RiskLevel {
        if score >= self.critical_threshold {
            RiskLevel::Critical
        } else if score >= self.warning_threshold {
            RiskLevel::Warning
        } else {
            RiskLevel::Safe
        }
    }
}

/// Risk level derived from the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    /// Below the warning threshold.
    Safe,
    /// Between the thresholds.
    Warning,
    /// At or above the critical threshold.
    Critical,
}

impl RiskLevel {
    /// Canonical name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Safe => "SAFE",
            Self::Warning => "WARNING",
            Self::Critical => "CRITICAL",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Mutable risk state of one trip.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskState {
    score: f64,
    consecutive_ticks_outside: u32,
    emitted: bool,
}

impl RiskState {
    /// Zeroed state for a new trip.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current score in `[0, 100]`.
    pub fn score(&self) -> f64 {
        self.score
    }

    /// Outside ticks since the last inside tick.
    pub fn consecutive_ticks_outside(&self) -> u32 {
        self.consecutive_ticks_outside
    }

    /// Whether the latch has fired this trip.
    pub fn emitted(&self) -> bool {
        self.emitted
    }

    /// Derived level.
    pub fn level(&self, policy: &RiskPolicy) -> RiskLevel {
        policy.level(self.score)
    }

    /// Apply an inside tick.
    pub fn observe_inside(&mut self, policy: &RiskPolicy) {
        self.consecutive_ticks_outside = 0;
        self.score = (self.score - policy.decay).max(0.0);
    }

    /// Apply an outside tick `distance_km` from the route. Returns the
    /// increase that was applied.
    pub fn observe_outside(&mut self, policy: &RiskPolicy, distance_km: f64) -> f64 {
        self.consecutive_ticks_outside = self.consecutive_ticks_outside.saturating_add(1);
        let increase = policy.increase(self.consecutive_ticks_outside, distance_km);
        self.score = (self.score + increase).clamp(0.0, MAX_SCORE);
        increase
    }

    /// Fire the latch if the score is critical and it has not fired yet.
    ///
    /// Returns the payload to sign exactly once per trip. The latch is set
    /// before this returns, so no later call can observe it unset.
    pub fn try_emit(
        &mut self,
        policy: &RiskPolicy,
        trip_id: TripId,
        location: Coordinate,
        at: Timestamp,
    ) -> Option<EmergencyPayload> {
        if self.level(policy) != RiskLevel::Critical {
            return None;
        }
        self.latch(trip_id, location, at)
    }

    /// Fire the latch regardless of score (manual panic trigger). Subject to
    /// the same once-per-trip guard as [`try_emit`](Self::try_emit).
    pub fn try_emit_manual(
        &mut self,
        trip_id: TripId,
        location: Coordinate,
        at: Timestamp,
    ) -> Option<EmergencyPayload> {
        self.latch(trip_id, location, at)
    }

    /// Zero everything. Called only at trip start and trip end.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn latch(
        &mut self,
        trip_id: TripId,
        location: Coordinate,
        at: Timestamp,
    ) -> Option<EmergencyPayload> {
        if self.emitted {
            return None;
        }
        self.emitted = true;
        tracing::warn!(
            %trip_id,
            score = self.score,
            %location,
            "emergency latch fired"
        );
        Some(EmergencyPayload::new(trip_id, location, at, Severity::High))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn here() -> Coordinate {
        Coordinate::new(12.9716, 77.5946).unwrap()
    }

    fn at() -> Timestamp {
        Timestamp::from_millis(1_760_000_000_000).unwrap()
    }

    #[test]
    fn test_default_policy_constants() {
        let p = RiskPolicy::default();
        assert_eq!(p.decay, 4.0);
        assert_eq!(p.base, 5.0);
        assert_eq!(p.time_factor, 0.8);
        assert_eq!(p.dist_factor, 12.0);
        assert_eq!(p.cap, 30.0);
        assert_eq!(p.warning_threshold, 30.0);
        assert_eq!(p.critical_threshold, 70.0);
    }

    #[test]
    fn test_increase_formula_and_cap() {
        let p = RiskPolicy::default();
        assert!((p.increase(1, 0.5) - 11.8).abs() < 1e-9);
        assert_eq!(p.increase(1, 10.0), 30.0);
        assert!((p.increase(1, f64::NAN) - 5.8).abs() < 1e-9);
        assert!((p.increase(1, -3.0) - 5.8).abs() < 1e-9);
    }

    #[test]
    fn test_levels() {
        let p = RiskPolicy::default();
        assert_eq!(p.level(0.0), RiskLevel::Safe);
        assert_eq!(p.level(29.99), RiskLevel::Safe);
        assert_eq!(p.level(30.0), RiskLevel::Warning);
        assert_eq!(p.level(69.99), RiskLevel::Warning);
        assert_eq!(p.level(70.0), RiskLevel::Critical);
    }

    #[test]
    fn test_inside_resets_counter_and_decays() {
        let p = RiskPolicy::default();
        let mut r = RiskState::new();
        r.observe_outside(&p, 1.0);
        r.observe_outside(&p, 1.0);
        assert_eq!(r.consecutive_ticks_outside(), 2);
        let before = r.score();
        r.observe_inside(&p);
        assert_eq!(r.consecutive_ticks_outside(), 0);
        assert!((r.score() - (before - 4.0)).abs() < 1e-9);
    }

    #[test]
    fn test_score_floor_at_zero() {
        let p = RiskPolicy::default();
        let mut r = RiskState::new();
        r.observe_inside(&p);
        assert_eq!(r.score(), 0.0);
    }

    #[test]
    fn test_score_ceiling() {
        let p = RiskPolicy::default();
        let mut r = RiskState::new();
        for _ in 0..20 {
            r.observe_outside(&p, 50.0);
        }
        assert_eq!(r.score(), 100.0);
    }

    #[test]
    fn test_latch_fires_once() {
        let p = RiskPolicy::default();
        let mut r = RiskState::new();
        let trip = TripId::new();
        assert!(r.try_emit(&p, trip, here(), at()).is_none());
        while r.level(&p) != RiskLevel::Critical {
            r.observe_outside(&p, 2.0);
        }
        let payload = r.try_emit(&p, trip, here(), at()).expect("first emission");
        assert_eq!(payload.severity, Severity::High);
        assert_eq!(payload.trip_id, trip);
        assert!(r.emitted());
        r.observe_outside(&p, 2.0);
        assert!(r.try_emit(&p, trip, here(), at()).is_none());
        assert!(r.try_emit_manual(trip, here(), at()).is_none());
    }

    #[test]
    fn test_latch_survives_decay_below_threshold() {
        let p = RiskPolicy::default();
        let mut r = RiskState::new();
        let trip = TripId::new();
        while r.level(&p) != RiskLevel::Critical {
            r.observe_outside(&p, 2.0);
        }
        assert!(r.try_emit(&p, trip, here(), at()).is_some());
        for _ in 0..30 {
            r.observe_inside(&p);
        }
        while r.level(&p) != RiskLevel::Critical {
            r.observe_outside(&p, 2.0);
        }
        assert!(r.try_emit(&p, trip, here(), at()).is_none());
    }

    #[test]
    fn test_manual_emission_shares_latch() {
        let p = RiskPolicy::default();
        let mut r = RiskState::new();
        let trip = TripId::new();
        assert!(r.try_emit_manual(trip, here(), at()).is_some());
        while r.level(&p) != RiskLevel::Critical {
            r.observe_outside(&p, 2.0);
        }
        assert!(r.try_emit(&p, trip, here(), at()).is_none());
    }

    #[test]
    fn test_reset_rearms_latch() {
        let mut r = RiskState::new();
        let trip = TripId::new();
        assert!(r.try_emit_manual(trip, here(), at()).is_some());
        r.reset();
        assert_eq!(r, RiskState::new());
        assert!(r.try_emit_manual(trip, here(), at()).is_some());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone)]
        enum Obs {
            Inside,
            Outside(f64),
        }

        fn obs() -> impl Strategy<Value = Obs> {
            prop_oneof![
                Just(Obs::Inside),
                (0.0f64..20.0).prop_map(Obs::Outside),
            ]
        }

        proptest! {
            #[test]
            fn score_always_within_bounds(seq in proptest::collection::vec(obs(), 0..200)) {
                let p = RiskPolicy::default();
                let mut r = RiskState::new();
                for o in seq {
                    match o {
                        Obs::Inside => r.observe_inside(&p),
                        Obs::Outside(d) => { r.observe_outside(&p, d); }
                    }
                    prop_assert!((0.0..=100.0).contains(&r.score()));
                }
            }

            #[test]
            fn inside_strictly_decreases_positive_score(d in 0.0f64..5.0, n in 1usize..10) {
                let p = RiskPolicy::default();
                let mut r = RiskState::new();
                for _ in 0..n {
                    r.observe_outside(&p, d);
                }
                let before = r.score();
                r.observe_inside(&p);
                prop_assert!(r.score() < before);
            }

            #[test]
            fn increase_non_decreasing_in_consecutive(d in 0.0f64..5.0, k in 0u32..1000) {
                let p = RiskPolicy::default();
                prop_assert!(p.increase(k + 1, d) >= p.increase(k, d));
            }

            #[test]
            fn at_most_one_emission(seq in proptest::collection::vec(obs(), 0..200)) {
                let p = RiskPolicy::default();
                let mut r = RiskState::new();
                let trip = TripId::new();
                let loc = Coordinate::new(12.9716, 77.5946).unwrap();
                let ts = Timestamp::from_millis(0).unwrap();
                let mut emitted = 0;
                for o in seq {
                    match o {
                        Obs::Inside => r.observe_inside(&p),
                        Obs::Outside(d) => { r.observe_outside(&p, d); }
                    }
                    if r.try_emit(&p, trip, loc, ts).is_some() {
                        emitted += 1;
                    }
                }
                prop_assert!(emitted <= 1);
            }
        }
    }
}
