use std::time::Instant;

use chrono::{DateTime, Duration, Utc};

use super::ground_station::GroundStation;
use super::look_angles::look_angles;
use super::transitions::scan_transitions;
use super::types::{LookAngles, Pass, SearchStats};
use crate::eclipse::EclipseClassifier;
use crate::propagation::{propagate_state, ElementSet};

/// Objects with longer derived periods do not produce discrete passes
/// under this elevation model and are short-circuited to an empty result.
pub const MAX_PERIOD_MINUTES: f64 = 600.0;

// Step-size regimes for the adaptive loop. Far below the horizon the clock
// jumps minutes at a time; approaching the threshold it tightens so the
// crossing is caught within a couple of seconds.
const STEP_COARSE_S: i64 = 240;
const STEP_MEDIUM_S: i64 = 60;
const STEP_FINE_S: i64 = 10;
const STEP_FINEST_S: i64 = 2;
const STEP_IN_PASS_S: i64 = 5;
const STEP_DEGENERATE_S: i64 = 60;

/// The search never propagates earlier than this far before the element
/// epoch; future-dated element sets are clamped rather than scanned.
const EPOCH_CLAMP: Duration = Duration::hours(1);

#[derive(Debug, Clone)]
pub struct ElevationSearch {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub min_elevation_deg: f64,
    pub max_passes: usize,
    pub transition_step_s: f64,
}

#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub passes: Vec<Pass>,
    pub stats: SearchStats,
}

pub(crate) struct Observation {
    pub ecef: [f64; 3],
    pub look: LookAngles,
}

/// Propagate and reduce to look angles; `None` skips the sample.
pub(crate) fn observe(
    sat: &ElementSet,
    station: &GroundStation,
    t: DateTime<Utc>,
    stats: &mut SearchStats,
) -> Option<Observation> {
    let timer = Instant::now();
    let state = propagate_state(sat, t);
    stats.propagation_ms += timer.elapsed().as_secs_f64() * 1e3;
    stats.propagation_calls += 1;
    let state = state?;

    let timer = Instant::now();
    let ecef = state.position_ecef_km();
    let look = look_angles(station, ecef);
    stats.geometry_ms += timer.elapsed().as_secs_f64() * 1e3;

    look.map(|look| Observation { ecef, look })
}

struct OpenPass {
    start: DateTime<Utc>,
    azimuth_start: f64,
    max_elevation: f64,
    apex_time: DateTime<Utc>,
    azimuth_apex: f64,
}

/// Locate elevation passes with an adaptive time step.
///
/// The loop moves through four implied states: searching below the
/// threshold, rising inside a pass, tracking the apex while still above,
/// and closing once the elevation drops back below. A sample exactly at
/// the threshold counts as below: the comparison is strictly greater-than.
pub fn find_elevation_passes(
    sat: &ElementSet,
    station: &GroundStation,
    classifier: &mut EclipseClassifier,
    search: &ElevationSearch,
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
    if search.max_passes == 0 {
        stats.total_ms = total.elapsed().as_secs_f64() * 1e3;
        return SearchOutcome { passes, stats };
    }

    let half_period = Duration::milliseconds((period_minutes * 30_000.0) as i64);
    let floor = sat.epoch() - EPOCH_CLAMP;
    let mut cursor = if search.start < floor {
        log::debug!(
            "norad {}: window start clamped to element epoch - 1h",
            sat.norad_id()
        );
        floor
    } else {
        search.start
    };

    let mut prev_elevation: Option<f64> = None;
    let mut open: Option<OpenPass> = None;

    while cursor <= search.end {
        stats.iterations += 1;

        let Some(obs) = observe(sat, station, cursor, &mut stats) else {
            prev_elevation = None;
            cursor += Duration::seconds(STEP_DEGENERATE_S);
            continue;
        };
        let elevation = obs.look.elevation_deg;
        let above = elevation > search.min_elevation_deg;

        if above {
            match open {
                Some(ref mut pass) => {
                    if elevation > pass.max_elevation {
                        pass.max_elevation = elevation;
                        pass.apex_time = cursor;
                        pass.azimuth_apex = obs.look.azimuth_deg;
                    }
                }
                None => {
                    log::trace!("pass opens at {cursor} ({elevation:.2} deg)");
                    open = Some(OpenPass {
                        start: cursor,
                        azimuth_start: obs.look.azimuth_deg,
                        max_elevation: elevation,
                        apex_time: cursor,
                        azimuth_apex: obs.look.azimuth_deg,
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
            // Skip the tail of this orbit before searching again. The
            // trend resets: comparing across the jump is meaningless.
            cursor += half_period;
            prev_elevation = None;
            continue;
        } else if prev_elevation.is_some_and(|prev| elevation < prev) {
            // Setting; nothing to find until the next orbit.
            cursor += half_period;
            prev_elevation = None;
            continue;
        } else {
            cursor += search_step(elevation);
        }

        prev_elevation = Some(elevation);
    }

    // A pass still open at the window edge is truncated there.
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
    log::debug!(
        "norad {}: {} passes in {:.1} ms ({} iterations)",
        sat.norad_id(),
        passes.len(),
        stats.total_ms,
        stats.iterations
    );
    SearchOutcome { passes, stats }
}

fn search_step(elevation_deg: f64) -> Duration {
    let seconds = if elevation_deg < -20.0 {
        STEP_COARSE_S
    } else if elevation_deg < -5.0 {
        STEP_MEDIUM_S
    } else if elevation_deg < -1.0 {
        STEP_FINE_S
    } else {
        STEP_FINEST_S
    };
    Duration::seconds(seconds)
}

fn close_pass(
    open: OpenPass,
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
        min_ground_track_km: None,
        eclipse_transitions,
    }
}
