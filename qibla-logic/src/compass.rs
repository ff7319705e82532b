use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{info, warn};
use tokio::sync::{Notify, RwLock};
use tokio_util::sync::CancellationToken;

use crate::{
    compass_state::{CompassPhase, CompassState, CompassUiState, DenialReason},
    heading::{HeadingService, HeadingSubscription},
    location::{LocationService, PermissionState},
    settings::CompassSettings,
};

/// Convenience alias for UTC DT
pub type UtcDT = DateTime<Utc>;

/// Notifies the UI that it should re-render from [CompassSession::get_ui_state]
pub trait StateUpdateSender {
    fn send_update(&self);
}

/// Struct representing an open compass screen. Gets permission and a one-shot position fix
/// through [LocationService], listens to the device heading through [HeadingService] and keeps
/// a [CompassState] up to date for the UI.
pub struct CompassSession<L: LocationService, H: HeadingService, S: StateUpdateSender> {
    state: RwLock<CompassState>,
    location: L,
    heading: Arc<H>,
    state_update_sender: S,
    retry: Notify,
    cancel: CancellationToken,
}

impl<L: LocationService, H: HeadingService, S: StateUpdateSender> CompassSession<L, H, S> {
    pub fn new(
        settings: CompassSettings,
        location: L,
        heading: Arc<H>,
        state_update_sender: S,
    ) -> Self {
        Self {
            state: RwLock::new(CompassState::new(settings)),
            location,
            heading,
            state_update_sender,
            retry: Notify::new(),
            cancel: CancellationToken::new(),
        }
    }

    pub async fn get_ui_state(&self) -> CompassUiState {
        self.state.read().await.as_ui_state()
    }

    pub async fn clone_settings(&self) -> CompassSettings {
        self.state.read().await.settings().clone()
    }

    /// User requested another attempt at getting location access. Returns false (and does
    /// nothing) if the current state has nothing to retry or the session is closed.
    pub async fn retry(&self) -> bool {
        if self.cancel.is_cancelled() {
            return false;
        }
        let mut state = self.state.write().await;
        if state.begin_retry() {
            drop(state);
            self.retry.notify_one();
            self.state_update_sender.send_update();
            true
        } else {
            false
        }
    }

    /// Tear the session down, [CompassSession::main_loop] will release the heading
    /// subscription and return.
    pub fn close(&self) {
        self.cancel.cancel();
    }

    async fn request_access(&self) -> Result<(), DenialReason> {
        if !self.location.is_location_service_enabled().await {
            return Err(DenialReason::ServiceDisabled);
        }

        let mut permission = self.location.check_permission().await;

        if matches!(permission, PermissionState::Denied | PermissionState::Unknown) {
            permission = self.location.request_permission().await;
        }

        match permission {
            PermissionState::Granted => Ok(()),
            PermissionState::DeniedForever => Err(DenialReason::DeniedForever),
            PermissionState::Denied | PermissionState::Unknown => Err(DenialReason::Denied),
        }
    }

    /// Run the permission check and the one-shot position fetch, moving the state along as we
    /// go. The state lock is never held across a call into [LocationService].
    async fn acquire_position(&self) {
        if let Err(reason) = self.request_access().await {
            self.state.write().await.deny(reason);
            self.state_update_sender.send_update();
            return;
        }

        self.state.write().await.grant();
        self.state_update_sender.send_update();

        let res = self.location.get_current_position().await;

        let mut state = self.state.write().await;
        match res {
            Ok(observer) if observer.is_valid() => {
                info!("Got position fix at {observer}");
                state.set_position(observer);
            }
            Ok(observer) => {
                warn!("Location service returned an invalid position: {observer:?}");
                state.position_failed();
            }
            Err(why) => {
                warn!("Failed to get position: {why:?}");
                state.position_failed();
            }
        }
        drop(state);

        self.state_update_sender.send_update();
    }

    /// Main loop of the compass screen, runs until [CompassSession::close] is called and
    /// returns the final UI state.
    pub async fn main_loop(&self) -> CompassUiState {
        if !self.heading.sensor_supported() {
            info!("No compass sensor on this device");
            self.state.write().await.mark_sensor_unavailable();
            self.state_update_sender.send_update();
            self.cancel.cancel();
            return self.get_ui_state().await;
        }

        let target = self.state.read().await.settings().target;
        let subscription = HeadingSubscription::acquire(self.heading.as_ref(), target);

        let acquire = self.acquire_position();
        tokio::pin!(acquire);
        let mut acquiring = true;
        let mut stream_open = true;

        self.state_update_sender.send_update();

        loop {
            tokio::select! {
                biased;

                _ = self.cancel.cancelled() => {
                    break;
                }

                _ = &mut acquire, if acquiring => {
                    acquiring = false;
                }

                _ = self.retry.notified(), if !acquiring => {
                    if self.state.read().await.phase() == CompassPhase::AwaitingPermission {
                        acquire.set(self.acquire_position());
                        acquiring = true;
                    }
                }

                readings = subscription.receive(), if stream_open => {
                    match readings {
                        Some(readings) => {
                            let mut state = self.state.write().await;
                            let mut changed = false;
                            for sample in readings {
                                changed |= state.push_heading(sample);
                            }
                            drop(state);
                            if changed {
                                self.state_update_sender.send_update();
                            }
                        }
                        None => {
                            info!("Heading stream ended");
                            stream_open = false;
                        }
                    }
                }
            }
        }

        subscription.release();
        // Nothing is left to act on a retry
        self.cancel.cancel();

        self.get_ui_state().await
    }
}
