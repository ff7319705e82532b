use anyhow::bail;
use serde::{Deserialize, Serialize};

use crate::prelude::*;

/// A "part" of a coordinate
pub type LocationComponent = f64;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(try_from = "RawCoordinate")]
/// Some point on the globe as gotten from a Geolocation API, in degrees
pub struct Coordinate {
    /// Latitude, -90 to 90
    pub lat: LocationComponent,
    /// Longitude, -180 to 180
    pub long: LocationComponent,
}

#[derive(Deserialize)]
/// Unchecked form of [Coordinate] as it comes off the wire
struct RawCoordinate {
    lat: LocationComponent,
    long: LocationComponent,
}

impl TryFrom<RawCoordinate> for Coordinate {
    type Error = anyhow::Error;

    fn try_from(value: RawCoordinate) -> Result<Self> {
        Self::new(value.lat, value.long)
    }
}

/// The Kaaba in Mecca, the point every Qibla bearing is computed towards
pub const KAABA: Coordinate = Coordinate {
    lat: 21.4225,
    long: 39.8262,
};

impl Coordinate {
    /// Create a coordinate, rejecting anything outside of the valid latitude/longitude ranges
    pub fn new(lat: LocationComponent, long: LocationComponent) -> Result<Self> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            bail!("Latitude {lat} is outside of -90..=90");
        }
        if !long.is_finite() || !(-180.0..=180.0).contains(&long) {
            bail!("Longitude {long} is outside of -180..=180");
        }
        Ok(Self { lat, long })
    }

    pub fn is_valid(&self) -> bool {
        Self::new(self.lat, self.long).is_ok()
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.4}, {:.4})", self.lat, self.long)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
/// Location permission as reported by the platform
pub enum PermissionState {
    /// Never asked, or the platform can't tell yet
    #[default]
    Unknown,
    /// The user declined, asking again is allowed
    Denied,
    /// The user declined and asked not to be prompted again
    DeniedForever,
    Granted,
}

/// Platform location access. Every call may suspend until the OS responds.
pub trait LocationService {
    /// Whether location services are switched on at the OS level
    fn is_location_service_enabled(&self) -> impl Future<Output = bool>;
    /// Check the current permission without prompting the user
    fn check_permission(&self) -> impl Future<Output = PermissionState>;
    /// Prompt the user for permission
    fn request_permission(&self) -> impl Future<Output = PermissionState>;
    /// Get a one-shot position fix
    fn get_current_position(&self) -> impl Future<Output = Result<Coordinate>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_bounds() {
        assert!(Coordinate::new(90.0, 180.0).is_ok());
        assert!(Coordinate::new(-90.0, -180.0).is_ok());
        assert!(Coordinate::new(90.5, 0.0).is_err());
        assert!(Coordinate::new(0.0, -180.1).is_err());
        assert!(Coordinate::new(f64::NAN, 0.0).is_err());
        assert!(Coordinate::new(0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_deserialize_validates() {
        let c: Coordinate = serde_json::from_str(r#"{"lat":21.3891,"long":39.8579}"#)
            .expect("Failed to parse valid coordinate");
        assert_eq!(c, Coordinate::new(21.3891, 39.8579).unwrap());

        assert!(serde_json::from_str::<Coordinate>(r#"{"lat":500.0,"long":0.0}"#).is_err());
        assert!(serde_json::from_str::<Coordinate>(r#"{"lat":0.0,"long":-181.0}"#).is_err());
    }

    #[test]
    fn test_kaaba_is_valid() {
        assert!(KAABA.is_valid());
    }

    #[test]
    fn test_coordinate_display() {
        let c = Coordinate::new(21.3891, 39.8579).unwrap();
        assert_eq!(c.to_string(), "(21.3891, 39.8579)");
    }
}
