use qibla_logic::wrap_360;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

use crate::scenario::{ScenarioEvent, ScriptedHeading};

/// Largest change in heading between two readings, in degrees
pub const MAX_STEP_DEGREES: f64 = 15.0;

/// Generate a reproducible random walk of heading readings, like someone slowly turning around
/// with their phone.
pub fn random_walk(seed: u64, samples: u32, interval_ms: u64) -> Vec<ScenarioEvent> {
    let mut rand = ChaCha20Rng::seed_from_u64(seed);
    let mut heading = rand.random_range(0.0..360.0);

    (0..samples)
        .map(|_| {
            heading = wrap_360(heading + rand.random_range(-MAX_STEP_DEGREES..=MAX_STEP_DEGREES));
            ScenarioEvent::Heading(ScriptedHeading {
                after_ms: interval_ms,
                heading,
                target_bearing: None,
            })
        })
        .collect()
}
