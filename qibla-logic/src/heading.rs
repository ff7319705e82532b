use chrono::Utc;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{compass::UtcDT, geodesic::wrap_360, location::Coordinate};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
/// One reading from the device's orientation sensor
pub struct HeadingSample {
    /// Direction the device is facing, degrees clockwise from north, 0..360
    pub heading_degrees: f64,
    /// Some compass backends compute the bearing to the target themselves and deliver it
    /// alongside the heading
    pub target_bearing_degrees: Option<f64>,
    pub timestamp: UtcDT,
}

impl HeadingSample {
    pub fn new(heading_degrees: f64) -> Self {
        Self::at(heading_degrees, Utc::now())
    }

    pub fn at(heading_degrees: f64, timestamp: UtcDT) -> Self {
        Self {
            heading_degrees: wrap_360(heading_degrees),
            target_bearing_degrees: None,
            timestamp,
        }
    }

    pub fn with_target_bearing(mut self, bearing: f64) -> Self {
        self.target_bearing_degrees = Some(wrap_360(bearing));
        self
    }

    /// Clamp whatever the sensor gave us into range, a non-finite heading is dropped
    pub(crate) fn normalized(self) -> Option<Self> {
        if !self.heading_degrees.is_finite() {
            return None;
        }
        Some(Self {
            heading_degrees: wrap_360(self.heading_degrees),
            target_bearing_degrees: self
                .target_bearing_degrees
                .filter(|b| b.is_finite())
                .map(wrap_360),
            timestamp: self.timestamp,
        })
    }
}

/// A compass / magnetometer backend that pushes heading readings
pub trait HeadingService {
    /// Whether the device has the hardware at all, checked once when a session starts
    fn sensor_supported(&self) -> bool;
    /// Begin delivering readings. `target` is handed over for backends that compute the
    /// bearing to it themselves.
    fn subscribe(&self, target: Coordinate);
    /// Stop delivering readings, must be safe to call more than once
    fn unsubscribe(&self);
    /// Wait for the next batch of readings, oldest first. [Option::None] means the stream
    /// has ended and won't produce anything else.
    fn receive_headings(&self) -> impl Future<Output = Option<impl Iterator<Item = HeadingSample>>>;
}

/// Owning handle for an active heading subscription, unsubscribes when dropped
pub struct HeadingSubscription<'a, H: HeadingService> {
    service: &'a H,
    active: bool,
}

impl<'a, H: HeadingService> HeadingSubscription<'a, H> {
    pub fn acquire(service: &'a H, target: Coordinate) -> Self {
        debug!("Subscribing to heading updates (target {target})");
        service.subscribe(target);
        Self {
            service,
            active: true,
        }
    }

    /// Receive the next batch, or [Option::None] if the subscription is gone
    pub async fn receive(&self) -> Option<impl Iterator<Item = HeadingSample>> {
        if !self.active {
            return None;
        }
        self.service.receive_headings().await
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Explicitly stop the subscription
    pub fn release(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if self.active {
            debug!("Unsubscribing from heading updates");
            self.service.unsubscribe();
            self.active = false;
        }
    }
}

impl<H: HeadingService> Drop for HeadingSubscription<'_, H> {
    fn drop(&mut self) {
        self.stop();
    }
}
