use std::{
    collections::VecDeque,
    sync::{
        Mutex as StdMutex,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use log::debug;
use qibla_logic::{
    Coordinate, HeadingSample, HeadingService, LocationService, PermissionState,
    StateUpdateSender,
};
use tokio::sync::{Mutex, mpsc};

use crate::{prelude::*, scenario::Scenario};

/// Location service that answers from a [Scenario]
pub struct ScriptedLocation {
    service_enabled: bool,
    permission: PermissionState,
    request_answers: StdMutex<VecDeque<PermissionState>>,
    position: Option<Coordinate>,
    position_delay: Duration,
}

impl ScriptedLocation {
    pub fn from_scenario(scenario: &Scenario) -> Self {
        Self {
            service_enabled: scenario.service_enabled,
            permission: scenario.permission,
            request_answers: StdMutex::new(scenario.request_answers.iter().copied().collect()),
            position: scenario.position,
            position_delay: Duration::from_millis(scenario.position_delay_ms),
        }
    }
}

impl LocationService for ScriptedLocation {
    async fn is_location_service_enabled(&self) -> bool {
        self.service_enabled
    }

    async fn check_permission(&self) -> PermissionState {
        self.permission
    }

    async fn request_permission(&self) -> PermissionState {
        let answer = self
            .request_answers
            .lock()
            .ok()
            .and_then(|mut answers| answers.pop_front());
        // Running out of scripted answers means the user keeps saying no
        let answer = answer.unwrap_or(PermissionState::Denied);
        debug!("Permission prompt answered with {answer:?}");
        answer
    }

    async fn get_current_position(&self) -> Result<Coordinate> {
        tokio::time::sleep(self.position_delay).await;
        self.position.context("Scenario has no position fix")
    }
}

/// Compass backed by a channel, readings sent into the paired sender are delivered in order
pub struct ChannelCompass {
    supported: bool,
    subscribed: AtomicBool,
    rx: Mutex<mpsc::Receiver<HeadingSample>>,
}

impl ChannelCompass {
    pub fn create(supported: bool) -> (mpsc::Sender<HeadingSample>, Self) {
        let (tx, rx) = mpsc::channel(32);
        let compass = Self {
            supported,
            subscribed: AtomicBool::new(false),
            rx: Mutex::new(rx),
        };
        (tx, compass)
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscribed.load(Ordering::SeqCst)
    }
}

impl HeadingService for ChannelCompass {
    fn sensor_supported(&self) -> bool {
        self.supported
    }

    fn subscribe(&self, target: Coordinate) {
        debug!("Compass subscribed, target {target}");
        self.subscribed.store(true, Ordering::SeqCst);
    }

    fn unsubscribe(&self) {
        debug!("Compass unsubscribed");
        self.subscribed.store(false, Ordering::SeqCst);
    }

    async fn receive_headings(&self) -> Option<impl Iterator<Item = HeadingSample>> {
        let mut rx = self.rx.lock().await;
        let mut buf = Vec::with_capacity(16);
        let received = rx.recv_many(&mut buf, 16).await;
        (received > 0).then(|| buf.into_iter())
    }
}

/// Forwards update notifications over a channel so they can be handled asynchronously
pub struct ChannelSender(mpsc::UnboundedSender<()>);

impl ChannelSender {
    pub fn create() -> (Self, mpsc::UnboundedReceiver<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self(tx), rx)
    }
}

impl StateUpdateSender for ChannelSender {
    fn send_update(&self) {
        // Receiver is gone once the run is over, nothing left to notify
        self.0.send(()).ok();
    }
}

#[cfg(test)]
mod tests {
    use qibla_logic::{HeadingSubscription, KAABA};
    use tokio::test;

    use super::*;

    #[test]
    async fn test_compass_subscription_lifecycle() {
        let (tx, compass) = ChannelCompass::create(true);
        assert!(!compass.is_subscribed());

        let sub = HeadingSubscription::acquire(&compass, KAABA);
        assert!(compass.is_subscribed());

        tx.send(HeadingSample::new(30.0)).await.unwrap();
        tx.send(HeadingSample::new(45.0)).await.unwrap();
        let batch = sub
            .receive()
            .await
            .expect("Stream ended")
            .map(|s| s.heading_degrees)
            .collect::<Vec<_>>();
        assert_eq!(batch, vec![30.0, 45.0]);

        drop(tx);
        assert!(sub.receive().await.is_none());

        sub.release();
        assert!(!compass.is_subscribed());
    }

    #[test]
    async fn test_scripted_requests_run_out_to_denied() {
        let scenario = Scenario {
            request_answers: vec![PermissionState::Granted],
            ..Default::default()
        };
        let location = ScriptedLocation::from_scenario(&scenario);
        assert_eq!(location.request_permission().await, PermissionState::Granted);
        assert_eq!(location.request_permission().await, PermissionState::Denied);
        assert!(location.get_current_position().await.is_err());
    }
}
