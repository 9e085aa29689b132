//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers via
//! the `State` extractor. The [`AlertConsole`] already carries its own
//! synchronization, so the state is a cheap clone of a few handles.

use std::path::PathBuf;

use metrics_exporter_prometheus::PrometheusHandle;
use sahayak_jurisdiction::{AlertConsole, JurisdictionPolicy, StationRegistry, DEFAULT_RADIUS_KM};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// Server configuration read from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// `PORT`, default 8080.
    pub port: u16,
    /// `STATIONS_FILE`, the scraper's JSON dataset. Absent means no stations.
    pub stations_file: Option<PathBuf>,
    /// `JURISDICTION_RADIUS_KM`, default 2.0.
    pub radius_km: f64,
    /// `LOG_FORMAT` (`json` or `text`).
    pub log_format: LogFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            stations_file: None,
            radius_km: DEFAULT_RADIUS_KM,
            log_format: LogFormat::Text,
        }
    }
}

impl AppConfig {
    /// Read configuration from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`. Unparseable values fall back to
    /// their defaults with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let port = match lookup("PORT") {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                tracing::warn!(value = %raw, "ignoring invalid PORT");
                defaults.port
            }),
            None => defaults.port,
        };
        let radius_km = match lookup("JURISDICTION_RADIUS_KM") {
            Some(raw) => match raw.parse::<f64>() {
                Ok(r) if r.is_finite() && r > 0.0 => r,
                _ => {
                    tracing::warn!(value = %raw, "ignoring invalid JURISDICTION_RADIUS_KM");
                    defaults.radius_km
                }
            },
            None => defaults.radius_km,
        };
        let log_format = match lookup("LOG_FORMAT").as_deref() {
            Some(f) if f.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Text,
        };
        Self {
            port,
            stations_file: lookup("STATIONS_FILE").map(PathBuf::from),
            radius_km,
            log_format,
        }
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Alert intake and jurisdiction tracking.
    pub console: AlertConsole,
    /// Prometheus render handle; `None` when no recorder is installed.
    pub metrics: Option<PrometheusHandle>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("console", &self.console)
            .field("metrics", &self.metrics.is_some())
            .finish()
    }
}

impl AppState {
    /// State around an existing console, without a metrics endpoint.
    pub fn new(console: AlertConsole) -> Self {
        Self {
            console,
            metrics: None,
        }
    }

    /// Build the console from configuration, loading the station dataset.
    pub fn from_config(config: &AppConfig) -> Result<Self, sahayak_jurisdiction::JurisdictionError> {
        let policy = JurisdictionPolicy::with_radius(config.radius_km)?;
        let registry = match &config.stations_file {
            Some(path) => StationRegistry::load(path)?,
            None => {
                tracing::warn!("STATIONS_FILE not set, jurisdiction lookups will be unavailable");
                StationRegistry::default()
            }
        };
        Ok(Self::new(AlertConsole::new(registry, policy)))
    }

    /// Attach a Prometheus handle for `GET /metrics`.
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_environment() {
        assert_eq!(AppConfig::from_lookup(|_| None), AppConfig::default());
    }

    #[test]
    fn reads_all_variables() {
        let config = AppConfig::from_lookup(lookup(&[
            ("PORT", "9090"),
            ("STATIONS_FILE", "/data/stations.json"),
            ("JURISDICTION_RADIUS_KM", "3.5"),
            ("LOG_FORMAT", "JSON"),
        ]));
        assert_eq!(config.port, 9090);
        assert_eq!(config.stations_file, Some(PathBuf::from("/data/stations.json")));
        assert_eq!(config.radius_km, 3.5);
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn invalid_values_fall_back() {
        let config = AppConfig::from_lookup(lookup(&[
            ("PORT", "eighty"),
            ("JURISDICTION_RADIUS_KM", "-1"),
        ]));
        assert_eq!(config.port, 8080);
        assert_eq!(config.radius_km, DEFAULT_RADIUS_KM);
    }

    #[test]
    fn missing_dataset_file_is_an_error() {
        let config = AppConfig {
            stations_file: Some(PathBuf::from("/nonexistent/stations.json")),
            ..AppConfig::default()
        };
        assert!(AppState::from_config(&config).is_err());
    }
}
