//! Great-circle math on a spherical Earth.
//!
//! Everything here is pure: no state, no I/O, same answer for the same input.

use serde::{Deserialize, Serialize};

use crate::location::{Coordinate, KAABA, LocationComponent};

/// Mean Earth radius in kilometers
pub const EARTH_RADIUS_KM: f64 = 6371.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
/// Direction and distance from an observer to the Kaaba
pub struct BearingResult {
    /// Initial bearing, degrees clockwise from true north, 0 to 360 (exclusive)
    pub qibla_bearing_degrees: f64,
    /// Great-circle distance in kilometers
    pub distance_km: f64,
}

/// Normalize an angle in degrees into 0..360
pub fn wrap_360(degrees: f64) -> f64 {
    // Adding 0.0 turns -0.0 into 0.0
    let wrapped = degrees.rem_euclid(360.0) + 0.0;
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// Haversine distance between two coordinates in kilometers.
pub fn calculate_distance(from: &Coordinate, to: &Coordinate) -> f64 {
    let lat1 = from.lat.to_radians();
    let lat2 = to.lat.to_radians();
    let d_lat = (to.lat - from.lat).to_radians();
    let d_long = (to.long - from.long).to_radians();

    let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_long / 2.0).sin().powi(2);
    let a = a.clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Initial (forward azimuth) bearing from `from` to `to` in degrees, 0..360.
///
/// When both points are the same this yields 0.
pub fn calculate_bearing(from: &Coordinate, to: &Coordinate) -> f64 {
    let lat1 = from.lat.to_radians();
    let lat2 = to.lat.to_radians();
    let d_long = (to.long - from.long).to_radians();

    let y = d_long.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * d_long.cos();

    let bearing: LocationComponent = y.atan2(x).to_degrees();
    wrap_360(bearing)
}

/// Bearing and distance from `observer` to the Kaaba
pub fn qibla(observer: &Coordinate) -> BearingResult {
    BearingResult::between(observer, &KAABA)
}

impl BearingResult {
    pub fn between(observer: &Coordinate, target: &Coordinate) -> Self {
        Self {
            qibla_bearing_degrees: calculate_bearing(observer, target),
            distance_km: calculate_distance(observer, target),
        }
    }
}
