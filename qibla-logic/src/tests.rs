use std::{
    collections::VecDeque,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering},
    },
};

use anyhow::anyhow;
use tokio::{
    sync::{Mutex, Notify, mpsc},
    task::yield_now,
};

use crate::{
    Coordinate, HeadingSample, HeadingService, LocationService, PermissionState,
    StateUpdateSender, prelude::*,
};

pub struct MockLocation {
    pub service_enabled: AtomicBool,
    /// Answer to [LocationService::check_permission]
    pub checked: std::sync::Mutex<PermissionState>,
    /// Answers to successive [LocationService::request_permission] calls, the last one repeats
    pub requested: std::sync::Mutex<VecDeque<PermissionState>>,
    /// [Option::None] makes the position fetch fail
    pub position: std::sync::Mutex<Option<Coordinate>>,
    /// When set the position fetch waits until notified
    pub position_gate: Option<Arc<Notify>>,
    pub request_calls: AtomicU32,
    pub position_calls: AtomicU32,
}

impl MockLocation {
    pub fn granted(position: Coordinate) -> Self {
        Self::new(true, PermissionState::Granted, &[], Some(position))
    }

    pub fn new(
        service_enabled: bool,
        checked: PermissionState,
        requested: &[PermissionState],
        position: Option<Coordinate>,
    ) -> Self {
        Self {
            service_enabled: AtomicBool::new(service_enabled),
            checked: std::sync::Mutex::new(checked),
            requested: std::sync::Mutex::new(requested.iter().copied().collect()),
            position: std::sync::Mutex::new(position),
            position_gate: None,
            request_calls: AtomicU32::new(0),
            position_calls: AtomicU32::new(0),
        }
    }

    pub fn with_gate(mut self, gate: Arc<Notify>) -> Self {
        self.position_gate = Some(gate);
        self
    }

    pub fn set_checked(&self, permission: PermissionState) {
        *self.checked.lock().unwrap() = permission;
    }

    pub fn set_position(&self, position: Option<Coordinate>) {
        *self.position.lock().unwrap() = position;
    }
}

impl LocationService for MockLocation {
    async fn is_location_service_enabled(&self) -> bool {
        self.service_enabled.load(Ordering::SeqCst)
    }

    async fn check_permission(&self) -> PermissionState {
        *self.checked.lock().unwrap()
    }

    async fn request_permission(&self) -> PermissionState {
        self.request_calls.fetch_add(1, Ordering::SeqCst);
        let mut answers = self.requested.lock().unwrap();
        let answer = if answers.len() > 1 {
            answers.pop_front()
        } else {
            answers.front().copied()
        };
        answer.unwrap_or(PermissionState::Denied)
    }

    async fn get_current_position(&self) -> Result<Coordinate> {
        self.position_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = self.position_gate.as_ref() {
            gate.notified().await;
        }
        let position = *self.position.lock().unwrap();
        position.ok_or_else(|| anyhow!("No fix"))
    }
}

pub struct MockCompass {
    supported: bool,
    rx: Mutex<mpsc::Receiver<HeadingSample>>,
    subscribed: AtomicBool,
    pub subscribe_calls: AtomicU32,
    pub unsubscribe_calls: AtomicU32,
    pub target: std::sync::Mutex<Option<Coordinate>>,
}

impl MockCompass {
    pub fn create(supported: bool) -> (mpsc::Sender<HeadingSample>, Arc<Self>) {
        let (tx, rx) = mpsc::channel(64);
        let compass = Self {
            supported,
            rx: Mutex::new(rx),
            subscribed: AtomicBool::new(false),
            subscribe_calls: AtomicU32::new(0),
            unsubscribe_calls: AtomicU32::new(0),
            target: std::sync::Mutex::new(None),
        };
        (tx, Arc::new(compass))
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscribed.load(Ordering::SeqCst)
    }
}

impl HeadingService for MockCompass {
    fn sensor_supported(&self) -> bool {
        self.supported
    }

    fn subscribe(&self, target: Coordinate) {
        self.subscribe_calls.fetch_add(1, Ordering::SeqCst);
        self.subscribed.store(true, Ordering::SeqCst);
        *self.target.lock().unwrap() = Some(target);
    }

    fn unsubscribe(&self) {
        self.unsubscribe_calls.fetch_add(1, Ordering::SeqCst);
        self.subscribed.store(false, Ordering::SeqCst);
    }

    async fn receive_headings(&self) -> Option<impl Iterator<Item = HeadingSample>> {
        let mut rx = self.rx.lock().await;
        let mut buf = Vec::with_capacity(32);
        if rx.recv_many(&mut buf, 32).await == 0 {
            None
        } else {
            Some(buf.into_iter())
        }
    }
}

#[derive(Clone, Default)]
pub struct CountingSender(Arc<AtomicUsize>);

impl CountingSender {
    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

impl StateUpdateSender for CountingSender {
    fn send_update(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

/// Give the session loop a chance to process whatever is pending
pub async fn settle() {
    for _ in 0..20 {
        yield_now().await;
    }
}
