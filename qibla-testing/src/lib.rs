mod providers;
mod scenario;
mod wander;

use std::{sync::Arc, time::Duration};

use log::info;
use qibla_logic::{CompassSession, CompassUiState, HeadingSample};
use tokio::sync::mpsc;

pub use providers::{ChannelCompass, ChannelSender, ScriptedLocation};
pub use scenario::{Scenario, ScenarioEvent, ScriptedHeading};
pub use wander::{MAX_STEP_DEGREES, random_walk};

pub mod prelude {
    pub use anyhow::{Context, anyhow, bail};
    pub type Result<T = (), E = anyhow::Error> = std::result::Result<T, E>;
}

pub use prelude::*;

pub type SimSession = CompassSession<ScriptedLocation, ChannelCompass, ChannelSender>;

impl From<&ScriptedHeading> for HeadingSample {
    fn from(value: &ScriptedHeading) -> Self {
        let sample = HeadingSample::new(value.heading);
        match value.target_bearing {
            Some(bearing) => sample.with_target_bearing(bearing),
            None => sample,
        }
    }
}

/// Play back the events of a scenario against a running session, then close it
async fn play_events(
    session: &SimSession,
    headings: mpsc::Sender<HeadingSample>,
    events: &[ScenarioEvent],
    linger: Duration,
) {
    let script = async {
        for event in events {
            match event {
                ScenarioEvent::Heading(heading) => {
                    tokio::time::sleep(Duration::from_millis(heading.after_ms)).await;
                    if headings.send(heading.into()).await.is_err() {
                        break;
                    }
                }
                ScenarioEvent::Retry(after_ms) => {
                    tokio::time::sleep(Duration::from_millis(*after_ms)).await;
                    if !session.retry().await {
                        info!("Retry requested but there was nothing to retry");
                    }
                }
            }
        }
        tokio::time::sleep(linger).await;
    };

    tokio::select! {
        _ = script => {}
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted");
        }
    }

    session.close();
}

/// Run a full compass session as described by `scenario`, calling `report` with a fresh UI
/// state every time the session signals an update. Returns the final state.
pub async fn run_scenario(
    scenario: Scenario,
    mut report: impl FnMut(&CompassUiState),
) -> CompassUiState {
    let location = ScriptedLocation::from_scenario(&scenario);
    let (headings, compass) = ChannelCompass::create(scenario.sensor_supported);
    let (sender, mut updates) = ChannelSender::create();
    let session = SimSession::new(scenario.settings.clone(), location, Arc::new(compass), sender);

    let linger = Duration::from_millis(scenario.linger_ms);
    let run = async {
        let main = session.main_loop();
        let play = play_events(&session, headings, &scenario.events, linger);
        tokio::pin!(main, play);

        // The session can end on its own (no sensor), the rest of the script is dropped then
        tokio::select! {
            end = &mut main => end,
            _ = &mut play => main.await,
        }
    };
    tokio::pin!(run);

    loop {
        tokio::select! {
            biased;

            Some(()) = updates.recv() => {
                report(&session.get_ui_state().await);
            }

            end = &mut run => {
                break end;
            }
        }
    }
}
