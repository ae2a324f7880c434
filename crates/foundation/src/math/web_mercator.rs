//! Web-Mercator "common" space.
//!
//! The world spans `TILE_SIZE` units at zoom 0 (x east, y north, origin at
//! 180°W / 85.05°S). Each zoom level doubles the number of screen pixels per
//! unit, matching the standard slippy-map tile pyramid.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

use super::EARTH_CIRCUMFERENCE_M;

/// Width of the world in common units at zoom 0.
pub const TILE_SIZE: f64 = 512.0;

/// Latitude at which the square Mercator world is cut off.
pub const MAX_LATITUDE_DEG: f64 = 85.051_128_78;

/// Screen pixels per common unit at `zoom`.
pub fn zoom_scale(zoom: f64) -> f64 {
    2f64.powf(zoom)
}

pub fn is_mercator_lat_valid(lat_deg: f64) -> bool {
    lat_deg.is_finite() && (-MAX_LATITUDE_DEG..=MAX_LATITUDE_DEG).contains(&lat_deg)
}

/// Longitude/latitude (degrees) to common units. Latitude is clamped to the
/// Mercator band.
pub fn lng_lat_to_common(lng_deg: f64, lat_deg: f64) -> (f64, f64) {
    let lambda = lng_deg.to_radians();
    let phi = lat_deg.clamp(-MAX_LATITUDE_DEG, MAX_LATITUDE_DEG).to_radians();
    let k = TILE_SIZE / (2.0 * PI);
    let x = k * (lambda + PI);
    let y = k * (PI + (FRAC_PI_4 + 0.5 * phi).tan().ln());
    (x, y)
}

/// Common units to longitude/latitude (degrees). Longitude is not wrapped.
pub fn common_to_lng_lat(x: f64, y: f64) -> (f64, f64) {
    let k = 2.0 * PI / TILE_SIZE;
    let lambda = x * k - PI;
    let phi = 2.0 * (y * k - PI).exp().atan() - FRAC_PI_2;
    (lambda.to_degrees(), phi.to_degrees())
}

/// Common units per meter at `lat_deg` (Mercator scale factor).
pub fn units_per_meter(lat_deg: f64) -> f64 {
    let lat = lat_deg.clamp(-MAX_LATITUDE_DEG, MAX_LATITUDE_DEG).to_radians();
    TILE_SIZE / (EARTH_CIRCUMFERENCE_M * lat.cos())
}

#[cfg(test)]
mod tests {
    use super::{
        MAX_LATITUDE_DEG, TILE_SIZE, common_to_lng_lat, lng_lat_to_common, units_per_meter,
        zoom_scale,
    };
    use crate::math::EARTH_CIRCUMFERENCE_M;

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn null_island_is_world_center() {
        let (x, y) = lng_lat_to_common(0.0, 0.0);
        assert_close(x, TILE_SIZE / 2.0, 1e-12);
        assert_close(y, TILE_SIZE / 2.0, 1e-12);
    }

    #[test]
    fn world_edges() {
        let (x0, y0) = lng_lat_to_common(-180.0, -MAX_LATITUDE_DEG);
        let (x1, y1) = lng_lat_to_common(180.0, MAX_LATITUDE_DEG);
        assert_close(x0, 0.0, 1e-9);
        assert_close(x1, TILE_SIZE, 1e-9);
        assert_close(y0, 0.0, 1e-6);
        assert_close(y1, TILE_SIZE, 1e-6);
    }

    #[test]
    fn north_is_positive_y() {
        let (_, y_south) = lng_lat_to_common(0.0, -10.0);
        let (_, y_north) = lng_lat_to_common(0.0, 10.0);
        assert!(y_north > y_south);
    }

    #[test]
    fn lng_lat_round_trip() {
        let (x, y) = lng_lat_to_common(-122.4194, 37.7749);
        let (lng, lat) = common_to_lng_lat(x, y);
        assert_close(lng, -122.4194, 1e-9);
        assert_close(lat, 37.7749, 1e-9);
    }

    #[test]
    fn units_per_meter_at_equator() {
        assert_close(units_per_meter(0.0), TILE_SIZE / EARTH_CIRCUMFERENCE_M, 1e-18);
        assert!(units_per_meter(60.0) > units_per_meter(0.0) * 1.99);
    }

    #[test]
    fn each_zoom_doubles_scale() {
        assert_eq!(zoom_scale(0.0), 1.0);
        assert_eq!(zoom_scale(3.0), 8.0);
        assert_eq!(zoom_scale(4.0) / zoom_scale(3.0), 2.0);
    }
}
