mod elements;
mod error;
mod frames;
mod sample;

pub use elements::{ElementSet, ElementSetCache};
pub use error::PropagationError;
pub use frames::{ecef_to_enu, ecef_to_geodetic, ecef_to_teme, gmst_rad, teme_to_ecef_position};
pub use sample::{propagate_state, sample_at, Geodetic, PositionSample, SatState};

pub const EARTH_EQUATORIAL_RADIUS_KM: f64 = 6378.137;
pub const EARTH_MEAN_RADIUS_KM: f64 = 6371.0;
/// WGS-84 first eccentricity squared.
pub const WGS84_E2: f64 = 0.00669437999014;
pub const AU_KM: f64 = 1.495_978_707e8;
