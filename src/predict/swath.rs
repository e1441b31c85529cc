use std::time::Instant;

use chrono::{DateTime, Duration, Utc};

use super::ground_station::GroundStation;
use super::pass_finder::{observe, SearchOutcome, MAX_PERIOD_MINUTES};
use super::transitions::scan_transitions;
use super::types::{Pass, SearchStats};
use crate::eclipse::EclipseClassifier;
use crate::propagation::{ecef_to_geodetic, ElementSet, EARTH_MEAN_RADIUS_KM};

// Distance-margin regimes, measured from the swath half-width.
const STEP_COARSE_S: i64 = 240;
const STEP_MEDIUM_S: i64 = 60;
const STEP_FINE_S: i64 = 10;
const STEP_FINEST_S: i64 = 2;
const STEP_IN_PASS_S: i64 = 5;
const STEP_DEGENERATE_S: i64 = 60;

const MARGIN_COARSE_KM: f64 = 5000.0;
const MARGIN_MEDIUM_KM: f64 = 2000.0;
const MARGIN_FINE_KM: f64 = 500.0;

const EPOCH_CLAMP: Duration = Duration::hours(1);

#[derive(Debug, Clone)]
pub struct SwathSearch {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub swath_km: f64,
    pub max_passes: usize,
    pub transition_step_s: f64,
}

struct OpenSwathPass {
    start: DateTime<Utc>,
    azimuth_start: f64,
    min_distance: f64,
    apex_time: DateTime<Utc>,
    azimuth_apex: f64,
    max_elevation: f64,
}

/// Swath passes: the visibility criterion is the great-circle distance of
/// the subsatellite point from the station being strictly inside half the
/// swath width. Same state-machine shape as the elevation search, with
/// the apex tracked on minimum ground distance and the adaptive step
/// keyed off the distance margin and trend.
pub fn find_swath_passes(
    sat: &ElementSet,
    station: &GroundStation,
    classifier: &mut EclipseClassifier,
    search: &SwathSearch,
) -> SearchOutcome {
    let total = Instant::now();
    let mut stats = SearchStats::default();
    let mut passes: Vec<Pass> = Vec::new();

    let period_minutes = match sat.period_minutes() {
        Some(p) if p <= MAX_PERIOD_MINUTES => p,
        _ => {
            log::debug!(
                "norad {}: period outside pass-search range, returning no passes",
                sat.norad_id()
            );
            stats.total_ms = total.elapsed().as_secs_f64() * 1e3;
            return SearchOutcome { passes, stats };
        }
    };
    let half_width = search.swath_km / 2.0;
    if search.max_passes == 0 || !(half_width > 0.0) {
        stats.total_ms = total.elapsed().as_secs_f64() * 1e3;
        return SearchOutcome { passes, stats };
    }

    let half_period = Duration::milliseconds((period_minutes * 30_000.0) as i64);
    let floor = sat.epoch() - EPOCH_CLAMP;
    let mut cursor = if search.start < floor {
        floor
    } else {
        search.start
    };

    let mut prev_distance: Option<f64> = None;
    let mut open: Option<OpenSwathPass> = None;

    while cursor <= search.end {
        stats.iterations += 1;

        let Some(obs) = observe(sat, station, cursor, &mut stats) else {
            prev_distance = None;
            cursor += Duration::seconds(STEP_DEGENERATE_S);
            continue;
        };
        let timer = Instant::now();
        let distance = ground_track_distance_km(station, obs.ecef);
        stats.geometry_ms += timer.elapsed().as_secs_f64() * 1e3;
        let inside = distance < half_width;

        if inside {
            match open {
                Some(ref mut pass) => {
                    if distance < pass.min_distance {
                        pass.min_distance = distance;
                        pass.apex_time = cursor;
                        pass.azimuth_apex = obs.look.azimuth_deg;
                    }
                    if obs.look.elevation_deg > pass.max_elevation {
                        pass.max_elevation = obs.look.elevation_deg;
                    }
                }
                None => {
                    log::trace!("swath pass opens at {cursor} ({distance:.0} km)");
                    open = Some(OpenSwathPass {
                        start: cursor,
                        azimuth_start: obs.look.azimuth_deg,
                        min_distance: distance,
                        apex_time: cursor,
                        azimuth_apex: obs.look.azimuth_deg,
                        max_elevation: obs.look.elevation_deg,
                    });
                }
            }
            cursor += Duration::seconds(STEP_IN_PASS_S);
        } else if let Some(closing) = open.take() {
            let finished = close_pass(
                closing,
                cursor,
                obs.look.azimuth_deg,
                sat,
                classifier,
                search.transition_step_s,
                &mut stats,
            );
            passes.push(finished);
            if passes.len() >= search.max_passes {
                break;
            }
            // Trend resets across the jump.
            cursor += half_period;
            prev_distance = None;
            continue;
        } else if prev_distance.is_some_and(|prev| distance > prev) {
            // Ground track receding; jump to the next orbit.
            cursor += half_period;
            prev_distance = None;
            continue;
        } else {
            cursor += search_step(distance - half_width);
        }

        prev_distance = Some(distance);
    }

    if let Some(pass) = open.take() {
        if search.end > pass.start && passes.len() < search.max_passes {
            let azimuth_end = observe(sat, station, search.end, &mut stats)
                .map(|obs| obs.look.azimuth_deg)
                .unwrap_or(pass.azimuth_apex);
            passes.push(close_pass(
                pass,
                search.end,
                azimuth_end,
                sat,
                classifier,
                search.transition_step_s,
                &mut stats,
            ));
        }
    }

    stats.passes_found = passes.len();
    stats.total_ms = total.elapsed().as_secs_f64() * 1e3;
    SearchOutcome { passes, stats }
}

fn search_step(margin_km: f64) -> Duration {
    let seconds = if margin_km > MARGIN_COARSE_KM {
        STEP_COARSE_S
    } else if margin_km > MARGIN_MEDIUM_KM {
        STEP_MEDIUM_S
    } else if margin_km > MARGIN_FINE_KM {
        STEP_FINE_S
    } else {
        STEP_FINEST_S
    };
    Duration::seconds(seconds)
}

fn close_pass(
    open: OpenSwathPass,
    end: DateTime<Utc>,
    azimuth_end: f64,
    sat: &ElementSet,
    classifier: &mut EclipseClassifier,
    transition_step_s: f64,
    stats: &mut SearchStats,
) -> Pass {
    let timer = Instant::now();
    let eclipse_transitions =
        scan_transitions(sat, classifier, open.start, end, transition_step_s, stats);
    stats.transition_ms += timer.elapsed().as_secs_f64() * 1e3;

    Pass {
        norad_id: sat.norad_id(),
        satellite: sat.elements.object_name.clone(),
        start: open.start,
        end,
        apex_time: Some(open.apex_time),
        max_elevation_deg: open.max_elevation,
        azimuth_start_deg: open.azimuth_start,
        azimuth_apex_deg: open.azimuth_apex,
        azimuth_end_deg: azimuth_end,
        duration_seconds: (end - open.start).num_seconds(),
        min_ground_track_km: Some(open.min_distance),
        eclipse_transitions,
    }
}

/// Great-circle distance between the subsatellite point and the station.
pub fn ground_track_distance_km(station: &GroundStation, sat_ecef_km: [f64; 3]) -> f64 {
    let (sat_lat, sat_lon, _) = ecef_to_geodetic(sat_ecef_km);
    haversine_km(
        station.latitude_deg,
        station.longitude_deg,
        sat_lat,
        sat_lon,
    )
}

fn haversine_km(lat1_deg: f64, lon1_deg: f64, lat2_deg: f64, lon2_deg: f64) -> f64 {
    let lat1 = lat1_deg.to_radians();
    let lat2 = lat2_deg.to_radians();
    let dlat = (lat2_deg - lat1_deg).to_radians();
    let dlon = (lon2_deg - lon1_deg).to_radians();

    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_MEAN_RADIUS_KM * a.sqrt().asin()
}
