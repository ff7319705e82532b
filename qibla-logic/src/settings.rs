use serde::{Deserialize, Serialize};

use crate::location::{Coordinate, KAABA};

const KM_PER_MILE: f64 = 1.609344;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
/// Unit distances are shown in, calculations always happen in kilometers
pub enum DistanceUnit {
    #[default]
    Kilometers,
    Miles,
}

impl DistanceUnit {
    pub fn convert_km(&self, km: f64) -> f64 {
        match self {
            Self::Kilometers => km,
            Self::Miles => km / KM_PER_MILE,
        }
    }

    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Kilometers => "km",
            Self::Miles => "mi",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
/// User facing settings for the compass screen
pub struct CompassSettings {
    /// The point the compass points towards, the Kaaba unless overridden
    pub target: Coordinate,
    /// Unit to display the distance to the target in
    pub distance_unit: DistanceUnit,
}

impl Default for CompassSettings {
    fn default() -> Self {
        Self {
            target: KAABA,
            distance_unit: DistanceUnit::Kilometers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_conversion() {
        assert_eq!(DistanceUnit::Kilometers.convert_km(12.5), 12.5);
        assert!((DistanceUnit::Miles.convert_km(KM_PER_MILE * 3.0) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_invalid_target() {
        let res = serde_json::from_str::<CompassSettings>(r#"{"target":{"lat":500.0,"long":0.0}}"#);
        assert!(res.is_err());

        let settings = serde_json::from_str::<CompassSettings>(r#"{"distance_unit":"Miles"}"#)
            .expect("Failed to parse settings");
        assert_eq!(settings.target, KAABA);
        assert_eq!(settings.distance_unit, DistanceUnit::Miles);
    }

    #[test]
    fn test_default_targets_kaaba() {
        let settings = CompassSettings::default();
        assert_eq!(settings.target, KAABA);
        assert_eq!(settings.distance_unit, DistanceUnit::Kilometers);
    }
}
