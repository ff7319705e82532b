use std::path::Path;

use qibla_logic::{CompassSettings, Coordinate, PermissionState};
use serde::{Deserialize, Serialize};

use crate::prelude::*;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
/// A heading reading to push into the session at some point
pub struct ScriptedHeading {
    /// Milliseconds to wait after the previous event
    #[serde(default)]
    pub after_ms: u64,
    pub heading: f64,
    /// Bearing to the target as computed by the compass backend, if it does that
    #[serde(default)]
    pub target_bearing: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
/// Something that happens during a scripted run
pub enum ScenarioEvent {
    Heading(ScriptedHeading),
    /// The user taps "retry" after `0` milliseconds
    Retry(u64),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
/// Describes how the platform behaves for one simulated compass session
pub struct Scenario {
    pub settings: CompassSettings,
    /// Whether location services are on at the OS level
    pub service_enabled: bool,
    /// What checking permission reports
    pub permission: PermissionState,
    /// Successive answers to permission prompts, [PermissionState::Denied] once exhausted
    pub request_answers: Vec<PermissionState>,
    /// The position fix, [Option::None] makes the fetch fail
    pub position: Option<Coordinate>,
    /// How long the position fetch takes
    pub position_delay_ms: u64,
    pub sensor_supported: bool,
    pub events: Vec<ScenarioEvent>,
    /// How long to keep the session open after the last event
    pub linger_ms: u64,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            settings: CompassSettings::default(),
            service_enabled: true,
            permission: PermissionState::Granted,
            request_answers: vec![],
            position: None,
            position_delay_ms: 0,
            sensor_supported: true,
            events: vec![],
            linger_ms: 100,
        }
    }
}

impl Scenario {
    pub fn parse(raw: &str) -> Result<Self> {
        let scenario: Self = serde_json::from_str(raw).context("Failed to parse scenario")?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario at {}", path.display()))?;
        Self::parse(&raw)
    }

    fn validate(&self) -> Result {
        if !self.settings.target.is_valid() {
            bail!("Target {:?} is not a valid coordinate", self.settings.target);
        }
        if let Some(position) = self.position {
            Coordinate::new(position.lat, position.long).context("Invalid scenario position")?;
        }
        Ok(())
    }
}
