use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::elements::ElementSet;
use super::frames::{ecef_to_geodetic, gmst_rad, teme_to_ecef_position};

/// Geodetic coordinates of a subsatellite point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Geodetic {
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub height_km: f64,
}

/// One propagated state, in both frames the callers need.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionSample {
    pub timestamp: DateTime<Utc>,
    pub position_eci_km: [f64; 3],
    pub position_ecef_km: [f64; 3],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geodetic: Option<Geodetic>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub velocity_eci_km_s: Option<[f64; 3]>,
}

/// Raw propagated state used inside the search loops, where only the
/// vectors matter and failures are skipped rather than surfaced.
#[derive(Debug, Clone, Copy)]
pub struct SatState {
    pub position_eci_km: [f64; 3],
    pub velocity_eci_km_s: [f64; 3],
    pub gmst: f64,
}

impl SatState {
    pub fn position_ecef_km(&self) -> [f64; 3] {
        teme_to_ecef_position(self.position_eci_km, self.gmst)
    }
}

/// Propagate to `t`. Returns `None` when the propagator rejects the input
/// (degenerate elements, time too far from epoch); callers skip the sample.
pub fn propagate_state(sat: &ElementSet, t: DateTime<Utc>) -> Option<SatState> {
    let minutes = match sat
        .elements
        .datetime_to_minutes_since_epoch(&t.naive_utc())
    {
        Ok(m) => m,
        Err(e) => {
            log::trace!("propagation rejected timestamp {t}: {e}");
            return None;
        }
    };

    let prediction = match sat.constants.propagate(minutes) {
        Ok(p) => p,
        Err(e) => {
            log::trace!("propagation failed at {t}: {e}");
            return None;
        }
    };

    let state = SatState {
        position_eci_km: prediction.position,
        velocity_eci_km_s: prediction.velocity,
        gmst: gmst_rad(t),
    };
    if state.position_eci_km.iter().any(|v| !v.is_finite()) {
        log::trace!("propagation produced non-finite position at {t}");
        return None;
    }
    Some(state)
}

/// Full sample for callers outside the search loop.
pub fn sample_at(sat: &ElementSet, t: DateTime<Utc>, with_geodetic: bool) -> Option<PositionSample> {
    let state = propagate_state(sat, t)?;
    let ecef = state.position_ecef_km();
    let geodetic = with_geodetic.then(|| {
        let (latitude_deg, longitude_deg, height_km) = ecef_to_geodetic(ecef);
        Geodetic {
            latitude_deg,
            longitude_deg,
            height_km,
        }
    });
    Some(PositionSample {
        timestamp: t,
        position_eci_km: state.position_eci_km,
        position_ecef_km: ecef,
        geodetic,
        velocity_eci_km_s: Some(state.velocity_eci_km_s),
    })
}
