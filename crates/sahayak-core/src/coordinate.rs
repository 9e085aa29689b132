//! # Coordinates
//!
//! WGS84 positions as delivered by the position source, validated at
//! construction.
//!
//! Two representations exist:
//!
//! - the natural `{lat, lng}` float form used by the position source, the
//!   route geometry and the HTTP API;
//! - the integer microdegree form (`{lat_e6, lng_e6}`) used inside signed
//!   payloads, because canonical bytes reject floats. Six decimals is about
//!   11 cm at the equator, well below position-source noise.

use geo::{HaversineDistance, Point};
use serde::{Deserialize, Serialize};

use crate::error::CoordinateError;

/// Kilometres per degree of latitude (and of longitude at the equator).
pub const KM_PER_DEGREE: f64 = 111.32;

const MICRO: f64 = 1_000_000.0;

/// A validated WGS84 position in degrees.
///
/// Immutable value type. Deserialization runs the same validation as
/// [`Coordinate::new()`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCoordinate")]
pub struct Coordinate {
    lat: f64,
    lng: f64,
}

#[derive(Deserialize)]
struct RawCoordinate {
    lat: f64,
    lng: f64,
}

impl TryFrom<RawCoordinate> for Coordinate {
    type Error = CoordinateError;

    fn try_from(raw: RawCoordinate) -> Result<Self, Self::Error> {
        Coordinate::new(raw.lat, raw.lng)
    }
}

impl Coordinate {
    /// Create a coordinate, rejecting non-finite or out-of-range degrees.
    pub fn new(lat: f64, lng: f64) -> Result<Self, CoordinateError> {
        if !lat.is_finite() || !lng.is_finite() {
            return Err(CoordinateError::NonFinite { lat, lng });
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(CoordinateError::LatitudeOutOfRange(lat));
        }
        if !(-180.0..=180.0).contains(&lng) {
            return Err(CoordinateError::LongitudeOutOfRange(lng));
        }
        Ok(Self { lat, lng })
    }

    /// Latitude in degrees.
    pub fn lat(&self) -> f64 {
        self.lat
    }

    /// Longitude in degrees.
    pub fn lng(&self) -> f64 {
        self.lng
    }

    /// Great-circle distance to `other` in kilometres.
    pub fn distance_km(&self, other: &Coordinate) -> f64 {
        self.to_point().haversine_distance(&other.to_point()) / 1000.0
    }

    /// Position displaced by the given distances (km) north and east.
    ///
    /// Uses the local equirectangular approximation, accurate for the few
    /// hundred metres relay nodes are scattered over.
    pub fn offset_km(&self, north_km: f64, east_km: f64) -> Result<Self, CoordinateError> {
        let dlat = north_km / KM_PER_DEGREE;
        let dlng = east_km / (KM_PER_DEGREE * self.lat.to_radians().cos().max(1e-9));
        Self::new(self.lat + dlat, self.lng + dlng)
    }

    /// Project into a local planar frame (km) centred on `origin`.
    ///
    /// Returns `(east_km, north_km)`. Distances in this frame are accurate to
    /// well under a metre for the corridor scales used here.
    pub fn to_local_km(&self, origin: &Coordinate) -> (f64, f64) {
        let scale = origin.lat.to_radians().cos();
        let east = (self.lng - origin.lng) * KM_PER_DEGREE * scale;
        let north = (self.lat - origin.lat) * KM_PER_DEGREE;
        (east, north)
    }

    /// Integer microdegrees `(lat_e6, lng_e6)`, rounded to nearest.
    pub fn to_microdegrees(&self) -> (i64, i64) {
        (
            (self.lat * MICRO).round() as i64,
            (self.lng * MICRO).round() as i64,
        )
    }

    /// Build a coordinate from integer microdegrees.
    pub fn from_microdegrees(lat_e6: i64, lng_e6: i64) -> Result<Self, CoordinateError> {
        Self::new(lat_e6 as f64 / MICRO, lng_e6 as f64 / MICRO)
    }

    /// This coordinate rounded to microdegree precision.
    ///
    /// A quantized coordinate survives a trip through the microdegree wire
    /// form unchanged, which keeps signed payloads reproducible.
    pub fn quantized(&self) -> Self {
        let (lat_e6, lng_e6) = self.to_microdegrees();
        Self {
            lat: lat_e6 as f64 / MICRO,
            lng: lng_e6 as f64 / MICRO,
        }
    }

    /// Convert to a `geo` point (x = longitude, y = latitude).
    pub fn to_point(&self) -> Point<f64> {
        Point::new(self.lng, self.lat)
    }
}

impl From<Coordinate> for Point<f64> {
    fn from(c: Coordinate) -> Self {
        c.to_point()
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lng)
    }
}

/// Serde adapter writing a [`Coordinate`] as `{"lat_e6": i64, "lng_e6": i64}`.
///
/// Use with `#[serde(with = "sahayak_core::coordinate::microdegrees")]` on
/// any field that participates in canonical bytes.
pub mod microdegrees {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::Coordinate;

    #[derive(Serialize, Deserialize)]
    struct Repr {
        lat_e6: i64,
        lng_e6: i64,
    }

    /// Serialize as integer microdegrees.
    pub fn serialize<S: Serializer>(c: &Coordinate, serializer: S) -> Result<S::Ok, S::Error> {
        let (lat_e6, lng_e6) = c.to_microdegrees();
        Repr { lat_e6, lng_e6 }.serialize(serializer)
    }

    /// Deserialize from integer microdegrees, validating the result.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Coordinate, D::Error> {
        let repr = Repr::deserialize(deserializer)?;
        Coordinate::from_microdegrees(repr.lat_e6, repr.lng_e6).map_err(D::Error::custom)
    }
}
