use std::time::Instant;

use chrono::{DateTime, Duration, Utc};

use super::types::{EclipseTransition, SearchStats};
use crate::eclipse::EclipseClassifier;
use crate::propagation::{propagate_state, ElementSet};

pub const DEFAULT_TRANSITION_STEP_S: f64 = 30.0;

/// Fixed-step scan for illumination flips over `[start, end]`.
///
/// Intended for an already-identified pass window, which is short enough
/// that a fixed step is fine. Samples the propagator rejects are skipped;
/// the previous state carries across the gap.
pub fn find_transitions(
    sat: &ElementSet,
    classifier: &mut EclipseClassifier,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    step_seconds: f64,
) -> Vec<EclipseTransition> {
    let mut scratch = SearchStats::default();
    scan_transitions(sat, classifier, start, end, step_seconds, &mut scratch)
}

pub(crate) fn scan_transitions(
    sat: &ElementSet,
    classifier: &mut EclipseClassifier,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    step_seconds: f64,
    stats: &mut SearchStats,
) -> Vec<EclipseTransition> {
    let step = Duration::milliseconds((step_seconds.max(1.0) * 1000.0) as i64);
    let mut transitions = Vec::new();
    let mut previous: Option<bool> = None;
    let mut cursor = start;

    while cursor <= end {
        let timer = Instant::now();
        let state = propagate_state(sat, cursor);
        stats.propagation_ms += timer.elapsed().as_secs_f64() * 1e3;
        stats.propagation_calls += 1;

        if let Some(state) = state {
            let timer = Instant::now();
            let shadowed = classifier.classify(sat.norad_id(), cursor, state.position_eci_km);
            stats.eclipse_ms += timer.elapsed().as_secs_f64() * 1e3;

            if let Some(prev) = previous {
                if prev != shadowed {
                    transitions.push(EclipseTransition {
                        time: cursor,
                        from_shadow: prev,
                        to_shadow: shadowed,
                    });
                }
            }
            previous = Some(shadowed);
        }
        cursor += step;
    }

    transitions
}
