use serde::{Deserialize, Serialize};

/// WGS84 semi-major axis (meters).
pub const WGS84_A: f64 = 6_378_137.0;
/// Equatorial circumference on the WGS84 ellipsoid (meters).
pub const EARTH_CIRCUMFERENCE_M: f64 = 2.0 * std::f64::consts::PI * WGS84_A;

/// Geographic position: degrees longitude/latitude, meters above the ellipsoid.
#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GeoPoint {
    pub longitude: f64,
    pub latitude: f64,
    #[serde(default)]
    pub altitude: f64,
}

impl GeoPoint {
    pub fn new(longitude: f64, latitude: f64, altitude: f64) -> Self {
        Self {
            longitude,
            latitude,
            altitude,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.longitude.is_finite() && self.latitude.is_finite() && self.altitude.is_finite()
    }
}

/// Wrap a longitude into `[-180, 180)`.
pub fn wrap_longitude_deg(lon: f64) -> f64 {
    (lon + 180.0).rem_euclid(360.0) - 180.0
}
