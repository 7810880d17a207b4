//! Geographic coordinates and great-circle distance.

use serde::{Deserialize, Serialize};

/// Mean Earth radius used for haversine distances, in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Validation errors for [`GeoPoint`].
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum GeoPointError {
    /// Latitude outside `[-90, 90]` or not finite.
    #[error("latitude {0} is out of range")]
    Latitude(f64),
    /// Longitude outside `[-180, 180]` or not finite.
    #[error("longitude {0} is out of range")]
    Longitude(f64),
}

/// A WGS84 latitude/longitude pair.
///
/// Holding both coordinates in one value keeps a user's location either fully
/// set or fully absent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    lat: f64,
    lon: f64,
}

impl GeoPoint {
    /// Validate and build a point.
    ///
    /// # Errors
    /// Returns [`GeoPointError`] when either coordinate is out of range.
    ///
    /// # Examples
    /// ```
    /// use librecash::domain::GeoPoint;
    ///
    /// let nyc = GeoPoint::new(40.7128, -74.0060).expect("valid point");
    /// assert_eq!(nyc.lat(), 40.7128);
    /// assert!(GeoPoint::new(91.0, 0.0).is_err());
    /// ```
    pub fn new(lat: f64, lon: f64) -> Result<Self, GeoPointError> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(GeoPointError::Latitude(lat));
        }
        if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
            return Err(GeoPointError::Longitude(lon));
        }
        Ok(Self { lat, lon })
    }

    /// Latitude in degrees.
    #[must_use]
    pub const fn lat(self) -> f64 {
        self.lat
    }

    /// Longitude in degrees.
    #[must_use]
    pub const fn lon(self) -> f64 {
        self.lon
    }

    /// Great-circle distance to `other` in kilometres.
    #[must_use]
    pub fn distance_km(self, other: Self) -> f64 {
        haversine_km(self, other)
    }
}

/// Haversine distance between two points in kilometres.
///
/// The intermediate term is clamped to `[0, 1]` so rounding near antipodal
/// points never produces `NaN`.
#[must_use]
#[expect(clippy::float_arithmetic, reason = "great-circle distance is floating-point maths")]
pub fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lon = (b.lon - a.lon).to_radians();

    let raw = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    let h = raw.clamp(0.0, 1.0);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_KM * c
}

/// Round a distance to whole kilometres for display.
#[must_use]
pub const fn rounded_km(distance_km: f64) -> i64 {
    #[expect(clippy::cast_possible_truncation, reason = "value is bounded by ~20,015")]
    let rounded = distance_km.round() as i64;
    rounded
}
