//! # Station Dataset and Nearest-Authority Assignment
//!
//! Stations load from the JSON array the dataset scraper writes:
//!
//! ```json
//! [{"id": "ps_001", "name": "...", "address": "...", "phone": "...",
//!   "lat": 12.97, "lng": 77.59, "area": "Bangalore Central"}]
//! ```
//!
//! Geocoding misses leave entries without usable coordinates. Those are
//! skipped with a warning; the rest of the dataset still loads. Duplicate
//! ids are a hard error because assignment results name stations by id.

use std::collections::HashSet;
use std::path::Path;

use sahayak_core::{Coordinate, StationId};
use serde::{Deserialize, Serialize};

use crate::error::JurisdictionError;

/// Default coverage radius around a station, in kilometres.
pub const DEFAULT_RADIUS_KM: f64 = 2.0;

/// Nearest-authority policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JurisdictionPolicy {
    /// Distance within which a position counts as inside a station's area.
    pub radius_km: f64,
}

impl Default for JurisdictionPolicy {
    fn default() -> Self {
        Self {
            radius_km: DEFAULT_RADIUS_KM,
        }
    }
}

impl JurisdictionPolicy {
    /// Policy with a custom radius.
    pub fn with_radius(radius_km: f64) -> Result<Self, JurisdictionError> {
        let policy = Self { radius_km };
        policy.validate()?;
        Ok(policy)
    }

    /// Reject non-finite or non-positive radii.
    pub fn validate(&self) -> Result<(), JurisdictionError> {
        if !self.radius_km.is_finite() || self.radius_km <= 0.0 {
            return Err(JurisdictionError::InvalidRadius(self.radius_km));
        }
        Ok(())
    }
}

/// A police station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    /// Dataset identifier (`ps_001`).
    pub id: StationId,
    /// Display name.
    pub name: String,
    /// Postal address.
    #[serde(default)]
    pub address: String,
    /// Contact number.
    #[serde(default)]
    pub phone: String,
    /// Geocoded position.
    pub location: Coordinate,
    /// Administrative area.
    #[serde(default)]
    pub area: String,
}

impl Station {
    /// A station with only the fields assignment needs.
    pub fn new(id: StationId, name: impl Into<String>, location: Coordinate) -> Self {
        Self {
            id,
            name: name.into(),
            address: String::new(),
            phone: String::new(),
            location,
            area: String::new(),
        }
    }
}

/// Scraper output row. Coordinates are optional because geocoding can miss.
#[derive(Debug, Deserialize)]
struct DatasetRow {
    id: String,
    name: String,
    #[serde(default)]
    address: String,
    #[serde(default)]
    phone: String,
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    lng: Option<f64>,
    #[serde(default)]
    area: String,
}

/// Result of a nearest-authority lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    /// Owning station.
    pub station_id: StationId,
    /// Station display name.
    pub station_name: String,
    /// Great-circle distance from the position to the station.
    pub distance_km: f64,
    /// Whether the distance is within the policy radius.
    pub inside_radius: bool,
}

/// Immutable set of stations with unique ids.
#[derive(Debug, Clone, Default)]
pub struct StationRegistry {
    stations: Vec<Station>,
}

impl StationRegistry {
    /// Build a registry, rejecting duplicate ids.
    pub fn new(stations: Vec<Station>) -> Result<Self, JurisdictionError> {
        let mut seen = HashSet::with_capacity(stations.len());
        for station in &stations {
            if !seen.insert(station.id.clone()) {
                return Err(JurisdictionError::DuplicateStation(station.id.clone()));
            }
        }
        Ok(Self { stations })
    }

    /// Parse the scraper's JSON array.
    pub fn from_json(json: &str) -> Result<Self, JurisdictionError> {
        let rows: Vec<DatasetRow> = serde_json::from_str(json)?;
        let total = rows.len();
        let mut stations = Vec::with_capacity(total);
        for row in rows {
            let id = match StationId::new(row.id.clone()) {
                Ok(id) => id,
                Err(e) => {
                    tracing::warn!(id = %row.id, error = %e, "skipping station with invalid id");
                    continue;
                }
            };
            let (Some(lat), Some(lng)) = (row.lat, row.lng) else {
                tracing::warn!(%id, "skipping station without coordinates");
                continue;
            };
            let location = match Coordinate::new(lat, lng) {
                Ok(c) => c,
                Err(e) => {
                    tracing::warn!(%id, error = %e, "skipping station with invalid coordinates");
                    continue;
                }
            };
            stations.push(Station {
                id,
                name: row.name,
                address: row.address,
                phone: row.phone,
                location,
                area: row.area,
            });
        }
        let registry = Self::new(stations)?;
        tracing::info!(loaded = registry.len(), skipped = total - registry.len(), "station dataset loaded");
        Ok(registry)
    }

    /// Read and parse a dataset file.
    pub fn load(path: &Path) -> Result<Self, JurisdictionError> {
        let json = std::fs::read_to_string(path).map_err(|source| JurisdictionError::DatasetIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Number of stations.
    pub fn len(&self) -> usize {
        self.stations.len()
    }

    /// Whether the registry has no stations.
    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    /// All stations in dataset order.
    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    /// Look up a station by id.
    pub fn get(&self, id: &StationId) -> Option<&Station> {
        self.stations.iter().find(|s| &s.id == id)
    }

    /// The closest station to `position`.
    ///
    /// Ties go to the station listed first, so a stationary point always
    /// gets the same answer. `None` when the registry is empty.
    pub fn nearest(&self, position: &Coordinate, policy: &JurisdictionPolicy) -> Option<Assignment> {
        let mut best: Option<(&Station, f64)> = None;
        for station in &self.stations {
            let d = position.distance_km(&station.location);
            if best.map_or(true, |(_, best_d)| d < best_d) {
                best = Some((station, d));
            }
        }
        best.map(|(station, distance_km)| Assignment {
            station_id: station.id.clone(),
            station_name: station.name.clone(),
            distance_km,
            inside_radius: distance_km <= policy.radius_km,
        })
    }
}
