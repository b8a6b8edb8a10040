//! Coordinate type definitions

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Valid latitude range
pub const MIN_LAT: f64 = -90.0;
pub const MAX_LAT: f64 = 90.0;

/// Valid longitude range
pub const MIN_LON: f64 = -180.0;
pub const MAX_LON: f64 = 180.0;

/// A WGS84 position in degrees.
///
/// Construct through [`Coordinate::new`] to get range and finiteness checks.
/// Values that arrive through deserialization should be passed through
/// [`Coordinate::validate`] before use.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude in degrees, positive north
    pub latitude: f64,
    /// Longitude in degrees, positive east
    pub longitude: f64,
}

impl Coordinate {
    /// Creates a validated coordinate.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoordError> {
        Self {
            latitude,
            longitude,
        }
        .validate()
    }

    /// Checks that both components are finite and within range.
    pub fn validate(self) -> Result<Self, CoordError> {
        if !self.latitude.is_finite() || !(MIN_LAT..=MAX_LAT).contains(&self.latitude) {
            return Err(CoordError::InvalidLatitude(self.latitude));
        }
        if !self.longitude.is_finite() || !(MIN_LON..=MAX_LON).contains(&self.longitude) {
            return Err(CoordError::InvalidLongitude(self.longitude));
        }
        Ok(self)
    }

    /// Returns true if this coordinate passes [`Coordinate::validate`].
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Rounds both components to `decimals` decimal places.
    ///
    /// Four decimals is roughly 11 m at the equator.
    pub fn rounded(&self, decimals: u32) -> (i64, i64) {
        let scale = 10f64.powi(decimals as i32);
        (
            (self.latitude * scale).round() as i64,
            (self.longitude * scale).round() as i64,
        )
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6},{:.6}", self.latitude, self.longitude)
    }
}

impl std::str::FromStr for Coordinate {
    type Err = CoordError;

    /// Parses `"lat,lon"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (lat, lon) = s
            .split_once(',')
            .ok_or_else(|| CoordError::Unparseable(s.to_string()))?;
        let lat: f64 = lat
            .trim()
            .parse()
            .map_err(|_| CoordError::Unparseable(s.to_string()))?;
        let lon: f64 = lon
            .trim()
            .parse()
            .map_err(|_| CoordError::Unparseable(s.to_string()))?;
        Coordinate::new(lat, lon)
    }
}

/// Errors for coordinate validation and parsing.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordError {
    /// Latitude is not finite or outside -90..=90
    #[error("Invalid latitude: {0} (must be between -90 and 90)")]
    InvalidLatitude(f64),

    /// Longitude is not finite or outside -180..=180
    #[error("Invalid longitude: {0} (must be between -180 and 180)")]
    InvalidLongitude(f64),

    /// Text could not be parsed as `lat,lon`
    #[error("Cannot parse coordinate from '{0}' (expected 'lat,lon')")]
    Unparseable(String),
}
