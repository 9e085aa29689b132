//! # Monitor Configuration
//!
//! Every policy value is a default, overridable from YAML:
//!
//! ```yaml
//! corridor:
//!   buffer_km: 0.3
//! risk:
//!   decay: 4
//!   critical_threshold: 70
//! relay:
//!   scanning_ms: 2000
//!   connecting_ms: 1500
//! ```
//!
//! Omitted keys keep their defaults.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use sahayak_corridor::CorridorPolicy;
use sahayak_state::RiskPolicy;

use crate::error::MonitorError;

/// Relay phase delays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayTiming {
    /// Time spent in `Scanning` before `Connecting`.
    pub scanning_ms: u64,
    /// Time spent in `Connecting` before `Queued`.
    pub connecting_ms: u64,
}

impl Default for RelayTiming {
    fn default() -> Self {
        Self {
            scanning_ms: 2000,
            connecting_ms: 1500,
        }
    }
}

impl RelayTiming {
    /// Scanning delay.
    pub fn scanning(&self) -> Duration {
        Duration::from_millis(self.scanning_ms)
    }

    /// Connecting delay.
    pub fn connecting(&self) -> Duration {
        Duration::from_millis(self.connecting_ms)
    }
}

/// Full configuration of a monitoring session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Corridor buffer.
    pub corridor: CorridorPolicy,
    /// Risk constants and thresholds.
    pub risk: RiskPolicy,
    /// Relay phase delays.
    pub relay: RelayTiming,
}

impl MonitorConfig {
    /// Parse from a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, MonitorError> {
        let config: Self =
            serde_yaml::from_str(yaml).map_err(|e| MonitorError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a YAML file.
    pub fn load(path: &Path) -> Result<Self, MonitorError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| MonitorError::Config(format!("{}: {e}", path.display())))?;
        Self::from_yaml_str(&content)
    }

    /// Reject values that would make the machines meaningless.
    pub fn validate(&self) -> Result<(), MonitorError> {
        let positive = |v: f64| v.is_finite() && v > 0.0;
        if !positive(self.corridor.buffer_km) {
            return Err(MonitorError::Config(format!(
                "corridor.buffer_km must be positive, got {}",
                self.corridor.buffer_km
            )));
        }
        let r = &self.risk;
        if !(0.0..=100.0).contains(&r.warning_threshold)
            || !(0.0..=100.0).contains(&r.critical_threshold)
            || r.warning_threshold > r.critical_threshold
        {
            return Err(MonitorError::Config(format!(
                "risk thresholds must satisfy 0 <= warning ({}) <= critical ({}) <= 100",
                r.warning_threshold, r.critical_threshold
            )));
        }
        if [r.decay, r.base, r.time_factor, r.dist_factor, r.cap]
            .iter()
            .any(|v| !v.is_finite() || *v < 0.0)
        {
            return Err(MonitorError::Config(
                "risk constants must be finite and non-negative".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let c = MonitorConfig::default();
        assert_eq!(c.corridor.buffer_km, 0.3);
        assert_eq!(c.risk, RiskPolicy::default());
        assert_eq!(c.relay.scanning(), Duration::from_millis(2000));
        assert_eq!(c.relay.connecting(), Duration::from_millis(1500));
        c.validate().unwrap();
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let c = MonitorConfig::from_yaml_str("risk:\n  decay: 6\nrelay:\n  scanning_ms: 10\n").unwrap();
        assert_eq!(c.risk.decay, 6.0);
        assert_eq!(c.risk.base, 5.0);
        assert_eq!(c.relay.scanning_ms, 10);
        assert_eq!(c.relay.connecting_ms, 1500);
        assert_eq!(c.corridor.buffer_km, 0.3);
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(MonitorConfig::from_yaml_str("{}").unwrap(), MonitorConfig::default());
    }

    #[test]
    fn test_rejects_inverted_thresholds() {
        let err = MonitorConfig::from_yaml_str("risk:\n  warning_threshold: 80\n").unwrap_err();
        assert!(matches!(err, MonitorError::Config(_)));
    }

    #[test]
    fn test_rejects_zero_buffer() {
        assert!(MonitorConfig::from_yaml_str("corridor:\n  buffer_km: 0\n").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("monitor.yaml");
        std::fs::write(&path, "corridor:\n  buffer_km: 0.5\n").unwrap();
        let c = MonitorConfig::load(&path).unwrap();
        assert_eq!(c.corridor.buffer_km, 0.5);
        assert!(MonitorConfig::load(&dir.path().join("missing.yaml")).is_err());
    }
}
