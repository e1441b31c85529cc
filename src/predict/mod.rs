mod brightness;
mod ground_station;
mod look_angles;
mod pass_finder;
mod swath;
mod transitions;
mod types;

pub use brightness::{apparent_magnitude, observer_eci_km, phase_angle_rad};
pub use ground_station::GroundStation;
pub use look_angles::look_angles;
pub use pass_finder::{find_elevation_passes, ElevationSearch, SearchOutcome, MAX_PERIOD_MINUTES};
pub use swath::{find_swath_passes, ground_track_distance_km, SwathSearch};
pub use transitions::{find_transitions, DEFAULT_TRANSITION_STEP_S};
pub use types::{EclipseTransition, LookAngles, Pass, SearchStats};
