use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Look angles of an object as seen from one ground station.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LookAngles {
    pub elevation_deg: f64,
    pub azimuth_deg: f64,
    pub range_km: f64,
}

/// An illumination-state flip inside a pass. The state is binary: the
/// object is either inside the shadow cylinder or it is not.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EclipseTransition {
    pub time: DateTime<Utc>,
    pub from_shadow: bool,
    pub to_shadow: bool,
}

/// A predicted visibility window.
///
/// Elevation searches use the maximum elevation as the apex; swath
/// searches additionally report the minimum ground-track distance and
/// track their apex on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pass {
    pub norad_id: u64,
    pub satellite: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub apex_time: Option<DateTime<Utc>>,
    pub max_elevation_deg: f64,
    pub azimuth_start_deg: f64,
    pub azimuth_apex_deg: f64,
    pub azimuth_end_deg: f64,
    pub duration_seconds: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_ground_track_km: Option<f64>,
    pub eclipse_transitions: Vec<EclipseTransition>,
}

/// Timing breakdown of one search, for performance diagnostics only.
/// The transition figure includes the propagation and eclipse time spent
/// inside the scan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchStats {
    pub total_ms: f64,
    pub propagation_ms: f64,
    pub propagation_calls: u64,
    pub geometry_ms: f64,
    pub eclipse_ms: f64,
    pub transition_ms: f64,
    pub iterations: u64,
    pub passes_found: usize,
}
