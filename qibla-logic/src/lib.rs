mod compass;
mod compass_state;
mod geodesic;
mod heading;
mod location;
mod settings;
#[cfg(test)]
mod tests;

pub use compass::{CompassSession, StateUpdateSender, UtcDT};
pub use compass_state::{CompassPhase, CompassState, CompassUiState, DenialReason};
pub use geodesic::{
    BearingResult, EARTH_RADIUS_KM, calculate_bearing, calculate_distance, qibla, wrap_360,
};
pub use heading::{HeadingSample, HeadingService, HeadingSubscription};
pub use location::{Coordinate, KAABA, LocationComponent, LocationService, PermissionState};
pub use settings::{CompassSettings, DistanceUnit};

pub mod prelude {
    use anyhow::Error as AnyhowError;
    use std::result::Result as StdResult;
    pub type Result<T = (), E = AnyhowError> = StdResult<T, E>;
    pub use anyhow::Context;
}
