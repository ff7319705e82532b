use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::{
    geodesic::BearingResult,
    heading::HeadingSample,
    location::Coordinate,
    settings::{CompassSettings, DistanceUnit},
};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
/// Why the compass can't get a location
pub enum DenialReason {
    /// Location services are switched off at the OS level
    ServiceDisabled,
    /// The user declined the permission prompt
    Denied,
    /// The user declined and asked to never be prompted again
    DeniedForever,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
/// Which branch the compass screen should be rendering
pub enum CompassPhase {
    /// Waiting on the location permission check / prompt
    AwaitingPermission,
    /// Permission granted, waiting on the one-shot position fix
    AwaitingPosition,
    /// We have a position, bearing and distance are available
    Active,
    /// No location access, stays here until the user retries
    PermissionDenied(DenialReason),
    /// The device has no compass, nothing can be done about it
    SensorUnavailable,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
/// Snapshot of everything the compass screen needs to render
pub struct CompassUiState {
    pub phase: CompassPhase,
    pub target: Coordinate,
    /// The position the bearing was computed from
    pub observer: Option<Coordinate>,
    pub bearing: Option<BearingResult>,
    /// Distance to the target in [CompassUiState::distance_unit]
    pub distance: Option<f64>,
    pub distance_unit: DistanceUnit,
    /// Set when the position fetch failed after permission was granted
    pub position_unavailable: bool,
    /// Whether a manual retry would do anything right now
    pub can_retry: bool,
    /// Rotation for the indicator pointing at the target
    pub qibla_rotation_degrees: Option<f64>,
    /// Rotation for the indicator showing the device heading relative to north
    pub north_rotation_degrees: Option<f64>,
}

#[derive(Debug, Clone)]
/// State machine backing a compass screen, all transitions are synchronous
pub struct CompassState {
    phase: CompassPhase,
    settings: CompassSettings,
    /// Latest position fix
    observer: Option<Coordinate>,
    /// Derived from [CompassState::observer], replaced on every fix
    bearing: Option<BearingResult>,
    /// Latest heading reading, each new one replaces the last
    heading: Option<HeadingSample>,
    position_unavailable: bool,
}

impl CompassState {
    pub fn new(settings: CompassSettings) -> Self {
        Self {
            phase: CompassPhase::AwaitingPermission,
            settings,
            observer: None,
            bearing: None,
            heading: None,
            position_unavailable: false,
        }
    }

    pub fn phase(&self) -> CompassPhase {
        self.phase
    }

    pub fn bearing(&self) -> Option<BearingResult> {
        self.bearing
    }

    pub fn heading(&self) -> Option<HeadingSample> {
        self.heading
    }

    pub fn observer(&self) -> Option<Coordinate> {
        self.observer
    }

    pub fn settings(&self) -> &CompassSettings {
        &self.settings
    }

    pub fn position_unavailable(&self) -> bool {
        self.position_unavailable
    }

    fn set_phase(&mut self, phase: CompassPhase) {
        if self.phase != phase {
            debug!("Compass phase {:?} -> {:?}", self.phase, phase);
            self.phase = phase;
        }
    }

    /// The compass hardware is missing, this can't be left
    pub fn mark_sensor_unavailable(&mut self) {
        self.set_phase(CompassPhase::SensorUnavailable);
    }

    /// Permission was granted, returns false if we weren't waiting on permission
    pub fn grant(&mut self) -> bool {
        if self.phase != CompassPhase::AwaitingPermission {
            return false;
        }
        self.set_phase(CompassPhase::AwaitingPosition);
        true
    }

    /// Location access was refused, returns false if we weren't waiting on permission
    pub fn deny(&mut self, reason: DenialReason) -> bool {
        if self.phase != CompassPhase::AwaitingPermission {
            return false;
        }
        info!("Location access unavailable: {reason:?}");
        self.set_phase(CompassPhase::PermissionDenied(reason));
        true
    }

    /// Got a position fix, recomputes the bearing from it. Ignored unless we have location
    /// access.
    pub fn set_position(&mut self, observer: Coordinate) -> bool {
        if !matches!(
            self.phase,
            CompassPhase::AwaitingPosition | CompassPhase::Active
        ) {
            return false;
        }
        self.bearing = Some(BearingResult::between(&observer, &self.settings.target));
        self.observer = Some(observer);
        self.position_unavailable = false;
        self.set_phase(CompassPhase::Active);
        true
    }

    /// The position fetch failed, bearing and distance stay empty
    pub fn position_failed(&mut self) -> bool {
        if self.phase != CompassPhase::AwaitingPosition {
            return false;
        }
        warn!("Position unavailable, bearing can't be computed yet");
        self.position_unavailable = true;
        true
    }

    pub fn can_retry(&self) -> bool {
        match self.phase {
            CompassPhase::PermissionDenied(_) => true,
            CompassPhase::AwaitingPosition => self.position_unavailable,
            _ => false,
        }
    }

    /// User asked to try again, go back to checking permission
    pub fn begin_retry(&mut self) -> bool {
        if !self.can_retry() {
            return false;
        }
        self.position_unavailable = false;
        self.set_phase(CompassPhase::AwaitingPermission);
        true
    }

    /// Replace the current heading with `sample`, returns whether anything changed
    pub fn push_heading(&mut self, sample: HeadingSample) -> bool {
        if self.phase == CompassPhase::SensorUnavailable {
            return false;
        }
        match sample.normalized() {
            Some(sample) => {
                self.heading = Some(sample);
                true
            }
            None => false,
        }
    }

    pub fn as_ui_state(&self) -> CompassUiState {
        let unit = self.settings.distance_unit;
        let qibla_rotation = self
            .bearing
            .map(|b| b.qibla_bearing_degrees)
            .or_else(|| self.heading.and_then(|h| h.target_bearing_degrees));

        CompassUiState {
            phase: self.phase,
            target: self.settings.target,
            observer: self.observer,
            bearing: self.bearing,
            distance: self.bearing.map(|b| unit.convert_km(b.distance_km)),
            distance_unit: unit,
            position_unavailable: self.position_unavailable,
            can_retry: self.can_retry(),
            qibla_rotation_degrees: qibla_rotation,
            north_rotation_degrees: self.heading.map(|h| h.heading_degrees),
        }
    }
}
