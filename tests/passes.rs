use chrono::{TimeZone, Utc};

use satpass::eclipse::EclipseClassifier;
use satpass::predict::{
    find_elevation_passes, find_swath_passes, find_transitions, ElevationSearch, GroundStation,
    Pass, SwathSearch, DEFAULT_TRANSITION_STEP_S,
};
use satpass::propagation::ElementSet;

const ISS_TLE: &str = "ISS (ZARYA)
1 25544U 98067A   19343.69339541  .00001764  00000-0  40967-4 0  9998
2 25544  51.6439 211.2001 0007417  17.6667  85.6398 15.50103472202482";

fn iss() -> ElementSet {
    ElementSet::from_tle_text(ISS_TLE).unwrap()
}

/// Geosynchronous-period element set, built from OMM fields so the test
/// does not depend on a hand-computed TLE checksum.
fn geo() -> ElementSet {
    let elements: sgp4::Elements = serde_json::from_str(
        r#"{
            "OBJECT_NAME": "GEO TEST",
            "OBJECT_ID": "2019-001A",
            "EPOCH": "2019-12-09T00:00:00.000000",
            "MEAN_MOTION": 1.00271,
            "ECCENTRICITY": 0.0002,
            "INCLINATION": 0.05,
            "RA_OF_ASC_NODE": 90.0,
            "ARG_OF_PERICENTER": 0.0,
            "MEAN_ANOMALY": 0.0,
            "EPHEMERIS_TYPE": 0,
            "CLASSIFICATION_TYPE": "U",
            "NORAD_CAT_ID": 99999,
            "ELEMENT_SET_NO": 999,
            "REV_AT_EPOCH": 100,
            "BSTAR": 0.0,
            "MEAN_MOTION_DOT": 0.0,
            "MEAN_MOTION_DDOT": 0.0
        }"#,
    )
    .unwrap();
    ElementSet::new(elements).unwrap()
}

fn station() -> GroundStation {
    GroundStation {
        latitude_deg: 47.5,
        longitude_deg: 8.2,
        altitude_m: 400.0,
    }
}

fn elevation_search(days: i64, min_elevation_deg: f64) -> ElevationSearch {
    let start = Utc.with_ymd_and_hms(2019, 12, 10, 0, 0, 0).unwrap();
    ElevationSearch {
        start,
        end: start + chrono::Duration::days(days),
        min_elevation_deg,
        max_passes: 1000,
        transition_step_s: DEFAULT_TRANSITION_STEP_S,
    }
}

fn assert_pass_invariants(pass: &Pass, min_elevation_deg: f64) {
    assert!(pass.end > pass.start);
    assert_eq!(
        pass.duration_seconds,
        (pass.end - pass.start).num_seconds()
    );
    assert!(pass.max_elevation_deg > min_elevation_deg);
    assert!(pass.max_elevation_deg <= 90.0);
    for &az in &[
        pass.azimuth_start_deg,
        pass.azimuth_apex_deg,
        pass.azimuth_end_deg,
    ] {
        assert!((0.0..360.0).contains(&az), "azimuth out of range: {az}");
    }
    if let Some(apex) = pass.apex_time {
        assert!(apex >= pass.start && apex <= pass.end);
    }
    for pair in pass.eclipse_transitions.windows(2) {
        assert!(pair[0].time < pair[1].time);
        assert_eq!(pair[0].to_shadow, pair[1].from_shadow);
    }
    for transition in &pass.eclipse_transitions {
        assert_eq!(transition.from_shadow, !transition.to_shadow);
        assert!(transition.time >= pass.start && transition.time <= pass.end);
    }
}

#[test]
fn two_week_window_yields_dozens_of_passes() {
    let sat = iss();
    let mut classifier = EclipseClassifier::new();
    let search = elevation_search(14, 5.0);
    let outcome = find_elevation_passes(&sat, &station(), &mut classifier, &search);

    let count = outcome.passes.len();
    assert!(
        (50..=150).contains(&count),
        "expected tens of passes, got {count}"
    );
    for pass in &outcome.passes {
        assert_pass_invariants(pass, 5.0);
    }
    assert_eq!(outcome.stats.passes_found, count);
    assert!(outcome.stats.propagation_calls > 0);
}

#[test]
fn passes_are_time_ordered_and_disjoint() {
    let sat = iss();
    let mut classifier = EclipseClassifier::new();
    let search = elevation_search(3, 5.0);
    let outcome = find_elevation_passes(&sat, &station(), &mut classifier, &search);

    assert!(outcome.passes.len() >= 2);
    for pair in outcome.passes.windows(2) {
        assert!(pair[0].end < pair[1].start);
    }
}

#[test]
fn raising_the_threshold_never_finds_more_passes() {
    let sat = iss();
    let mut counts = Vec::new();
    for threshold in [0.0, 5.0, 20.0, 40.0] {
        let mut classifier = EclipseClassifier::new();
        let search = elevation_search(7, threshold);
        counts.push(
            find_elevation_passes(&sat, &station(), &mut classifier, &search)
                .passes
                .len(),
        );
    }
    for pair in counts.windows(2) {
        assert!(pair[1] <= pair[0], "counts not monotonic: {counts:?}");
    }
    // A 40-degree cutoff at mid-latitude still leaves a LEO object visible
    // occasionally, but far less often than the open horizon.
    assert!(counts[0] > counts[3]);
}

#[test]
fn geosynchronous_period_short_circuits() {
    let sat = geo();
    assert!(sat.period_minutes().unwrap() > 600.0);
    let mut classifier = EclipseClassifier::new();
    let outcome = find_elevation_passes(&sat, &station(), &mut classifier, &elevation_search(14, 0.0));
    assert!(outcome.passes.is_empty());
    // Short-circuited before any propagation.
    assert_eq!(outcome.stats.propagation_calls, 0);
}

#[test]
fn max_passes_caps_the_result() {
    let sat = iss();
    let mut classifier = EclipseClassifier::new();
    let mut search = elevation_search(14, 5.0);
    search.max_passes = 3;
    let outcome = find_elevation_passes(&sat, &station(), &mut classifier, &search);
    assert_eq!(outcome.passes.len(), 3);
}

#[test]
fn search_start_is_clamped_to_element_epoch() {
    let sat = iss();
    let epoch = sat.epoch();
    let mut classifier = EclipseClassifier::new();
    let search = ElevationSearch {
        start: epoch - chrono::Duration::days(30),
        end: epoch + chrono::Duration::days(1),
        min_elevation_deg: 0.0,
        max_passes: 1000,
        transition_step_s: DEFAULT_TRANSITION_STEP_S,
    };
    let outcome = find_elevation_passes(&sat, &station(), &mut classifier, &search);
    assert!(!outcome.passes.is_empty());
    let floor = epoch - chrono::Duration::hours(1);
    for pass in &outcome.passes {
        assert!(pass.start >= floor, "pass before epoch clamp: {}", pass.start);
    }
}

#[test]
fn six_hour_scan_finds_alternating_eclipse_transitions() {
    let sat = iss();
    let mut classifier = EclipseClassifier::new();
    let start = Utc.with_ymd_and_hms(2019, 12, 10, 0, 0, 0).unwrap();
    let end = start + chrono::Duration::hours(6);
    let transitions = find_transitions(&sat, &mut classifier, start, end, 60.0);

    // Roughly one entry and one exit per ~93-minute orbit.
    assert!(transitions.len() >= 4, "got {} transitions", transitions.len());
    for transition in &transitions {
        assert_eq!(transition.from_shadow, !transition.to_shadow);
    }
    for pair in transitions.windows(2) {
        assert!(pair[0].time < pair[1].time);
        assert_eq!(pair[0].to_shadow, pair[1].from_shadow);
    }
}

#[test]
fn swath_passes_track_minimum_ground_distance() {
    let sat = iss();
    let mut classifier = EclipseClassifier::new();
    let start = Utc.with_ymd_and_hms(2019, 12, 10, 0, 0, 0).unwrap();
    let search = SwathSearch {
        start,
        end: start + chrono::Duration::days(3),
        swath_km: 2000.0,
        max_passes: 1000,
        transition_step_s: DEFAULT_TRANSITION_STEP_S,
    };
    let outcome = find_swath_passes(&sat, &station(), &mut classifier, &search);

    assert!(!outcome.passes.is_empty());
    for pass in &outcome.passes {
        assert!(pass.end > pass.start);
        assert_eq!(
            pass.duration_seconds,
            (pass.end - pass.start).num_seconds()
        );
        let closest = pass.min_ground_track_km.unwrap();
        assert!(
            closest < 1000.0,
            "closest approach outside half swath: {closest}"
        );
    }
}

#[test]
fn wider_swath_never_finds_fewer_passes() {
    let sat = iss();
    let start = Utc.with_ymd_and_hms(2019, 12, 10, 0, 0, 0).unwrap();
    let mut counts = Vec::new();
    for swath_km in [4000.0, 2000.0, 500.0] {
        let mut classifier = EclipseClassifier::new();
        let search = SwathSearch {
            start,
            end: start + chrono::Duration::days(3),
            swath_km,
            max_passes: 1000,
            transition_step_s: DEFAULT_TRANSITION_STEP_S,
        };
        counts.push(
            find_swath_passes(&sat, &station(), &mut classifier, &search)
                .passes
                .len(),
        );
    }
    assert!(counts[0] >= counts[1]);
    assert!(counts[1] >= counts[2]);
}
