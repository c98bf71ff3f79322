#[cfg(test)]
#[path = "geo_test.rs"]
mod geo_test;

use serde::{Deserialize, Serialize};

use crate::consts::{EARTH_RADIUS_M, FULL_TURN_DEG, HALF_TURN_DEG};

/// A WGS84 coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LatLon {
    pub latitude: f64,
    pub longitude: f64,
}

impl LatLon {
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

/// Axis-aligned query box given by its southwest and northeast corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub southwest: LatLon,
    pub northeast: LatLon,
}

impl Bounds {
    #[must_use]
    pub fn new(southwest: LatLon, northeast: LatLon) -> Self {
        Self { southwest, northeast }
    }

    /// Box enclosing a circle of `radius_m` meters around `center`.
    ///
    /// Latitude is clamped to the poles. Longitude span widens with latitude so
    /// the box stays roughly square on the ground.
    #[must_use]
    pub fn around(center: LatLon, radius_m: f64) -> Self {
        let dlat = (radius_m / EARTH_RADIUS_M).to_degrees();
        let cos_lat = center.latitude.to_radians().cos().abs().max(f64::EPSILON);
        let dlon = (dlat / cos_lat).min(HALF_TURN_DEG);

        Self {
            southwest: LatLon::new((center.latitude - dlat).max(-90.0), center.longitude - dlon),
            northeast: LatLon::new((center.latitude + dlat).min(90.0), center.longitude + dlon),
        }
    }
}

/// Initial great-circle bearing (degrees, `[0, 360)`, 0 = north) and haversine
/// distance in meters from `from` to `to`.
#[must_use]
pub fn bearing_and_distance(from: LatLon, to: LatLon) -> (f64, f64) {
    let phi1 = from.latitude.to_radians();
    let phi2 = to.latitude.to_radians();
    let dphi = phi2 - phi1;
    let dlambda = (to.longitude - from.longitude).to_radians();

    let y = dlambda.sin() * phi2.cos();
    let x = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * dlambda.cos();
    let bearing = y.atan2(x).to_degrees().rem_euclid(FULL_TURN_DEG);

    let h = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    let distance = 2.0 * EARTH_RADIUS_M * h.sqrt().min(1.0).asin();

    (bearing, distance)
}

/// Signed angle from `heading` to `bearing`, folded into `(-180, 180]`.
///
/// Non-finite inputs are returned unfolded.
#[must_use]
pub fn normalize_bearing_diff(bearing: f64, heading: f64) -> f64 {
    let diff = bearing - heading;
    if !diff.is_finite() {
        return diff;
    }
    let folded = (diff + HALF_TURN_DEG).rem_euclid(FULL_TURN_DEG) - HALF_TURN_DEG;
    if folded <= -HALF_TURN_DEG { folded + FULL_TURN_DEG } else { folded }
}
