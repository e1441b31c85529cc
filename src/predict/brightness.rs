use chrono::{DateTime, Utc};

use super::ground_station::GroundStation;
use crate::propagation::{ecef_to_teme, gmst_rad};

/// Station position rotated into the inertial frame, for phase-angle
/// geometry against satellite and sun vectors.
pub fn observer_eci_km(station: &GroundStation, t: DateTime<Utc>) -> [f64; 3] {
    ecef_to_teme(station.position_ecef_km(), gmst_rad(t))
}

/// Phase angle at the satellite between the directions to the sun and to
/// the observer, in radians.
pub fn phase_angle_rad(
    sat_eci_km: [f64; 3],
    sun_eci_km: [f64; 3],
    observer_eci_km: [f64; 3],
) -> f64 {
    let to_sun = [
        sun_eci_km[0] - sat_eci_km[0],
        sun_eci_km[1] - sat_eci_km[1],
        sun_eci_km[2] - sat_eci_km[2],
    ];
    let to_observer = [
        observer_eci_km[0] - sat_eci_km[0],
        observer_eci_km[1] - sat_eci_km[1],
        observer_eci_km[2] - sat_eci_km[2],
    ];
    angle_between(to_sun, to_observer)
}

/// Apparent magnitude from the intrinsic magnitude, range and phase angle.
///
/// Diffuse-sphere photometry: the intrinsic magnitude is referenced at
/// 1000 km range and quarter phase, so
/// `m = m0 + 5 log10(range / 1000 km) - 2.5 log10(sin phi + (pi - phi) cos phi)`.
/// Returns `None` for degenerate geometry (zero range, or phase so close
/// to pi that no illuminated surface faces the observer).
pub fn apparent_magnitude(std_mag: f64, range_km: f64, phase_angle_rad: f64) -> Option<f64> {
    if !(range_km > 0.0) || !phase_angle_rad.is_finite() {
        return None;
    }
    let phi = phase_angle_rad.clamp(0.0, std::f64::consts::PI);
    let phase_term = phi.sin() + (std::f64::consts::PI - phi) * phi.cos();
    if !(phase_term > 0.0) {
        return None;
    }
    Some(std_mag + 5.0 * (range_km / 1000.0).log10() - 2.5 * phase_term.log10())
}

fn angle_between(a: [f64; 3], b: [f64; 3]) -> f64 {
    let dot = a[0] * b[0] + a[1] * b[1] + a[2] * b[2];
    let mag_a = (a[0] * a[0] + a[1] * a[1] + a[2] * a[2]).sqrt();
    let mag_b = (b[0] * b[0] + b[1] * b[1] + b[2] * b[2]).sqrt();
    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }
    (dot / (mag_a * mag_b)).clamp(-1.0, 1.0).acos()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn quarter_phase_at_reference_range_is_intrinsic() {
        let mag = apparent_magnitude(4.0, 1000.0, FRAC_PI_2).unwrap();
        assert!((mag - 4.0).abs() < 1e-12);
    }

    #[test]
    fn full_phase_is_brighter_than_quarter() {
        let full = apparent_magnitude(4.0, 1000.0, 0.0).unwrap();
        let quarter = apparent_magnitude(4.0, 1000.0, FRAC_PI_2).unwrap();
        assert!(full < quarter);
    }

    #[test]
    fn farther_is_fainter() {
        let near = apparent_magnitude(4.0, 500.0, FRAC_PI_2).unwrap();
        let far = apparent_magnitude(4.0, 2000.0, FRAC_PI_2).unwrap();
        assert!(far > near);
    }

    #[test]
    fn degenerate_geometry_is_absent() {
        assert!(apparent_magnitude(4.0, 0.0, FRAC_PI_2).is_none());
        assert!(apparent_magnitude(4.0, 1000.0, PI).is_none());
    }

    #[test]
    fn observer_vector_preserves_station_radius() {
        use chrono::TimeZone;
        let station = GroundStation {
            latitude_deg: 47.5,
            longitude_deg: 8.2,
            altitude_m: 0.0,
        };
        let t = chrono::Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let eci = observer_eci_km(&station, t);
        let ecef = station.position_ecef_km();
        let norm = |v: [f64; 3]| (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
        assert!((norm(eci) - norm(ecef)).abs() < 1e-9);
        // z is untouched by the rotation about the pole.
        assert!((eci[2] - ecef[2]).abs() < 1e-12);
    }

    #[test]
    fn phase_angle_geometry() {
        let sun = [1.5e8, 0.0, 0.0];

        // Observer between sun and satellite: fully lit face, angle ~0.
        assert!(phase_angle_rad([-7000.0, 0.0, 0.0], sun, [-6378.0, 0.0, 0.0]) < 1e-6);

        // Satellite between sun and observer: backlit, angle ~pi.
        let backlit = phase_angle_rad([7000.0, 0.0, 0.0], sun, [6378.0, 0.0, 0.0]);
        assert!((backlit - PI).abs() < 1e-3);

        // Observer under a satellite at the terminator: quarter phase.
        let quarter = phase_angle_rad([0.0, 0.0, 7000.0], sun, [0.0, 0.0, 6378.0]);
        assert!((quarter - FRAC_PI_2).abs() < 1e-3);
    }
}
