use chrono::{DateTime, Utc};

use crate::propagation::AU_KM;

/// Collaborator interface supplying the sun's geocentric position for the
/// shadow test. The engine only needs the direction and rough distance, so
/// a low-precision ephemeris is the default.
pub trait SunEphemeris: Send {
    fn position_eci_km(&self, t: DateTime<Utc>) -> [f64; 3];
}

/// Low-precision analytic solar ephemeris (Astronomical Almanac series).
/// Accurate to about 0.01 degrees, which is far below the angular width of
/// the shadow cylinder seen from any Earth orbit.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnalyticSun;

impl SunEphemeris for AnalyticSun {
    fn position_eci_km(&self, t: DateTime<Utc>) -> [f64; 3] {
        let d = days_since_j2000(t);

        let mean_longitude = (280.460 + 0.985_647_4 * d).rem_euclid(360.0);
        let mean_anomaly = (357.528 + 0.985_600_3 * d).rem_euclid(360.0).to_radians();

        let ecliptic_longitude = (mean_longitude
            + 1.915 * mean_anomaly.sin()
            + 0.020 * (2.0 * mean_anomaly).sin())
        .to_radians();
        let distance_au =
            1.00014 - 0.01671 * mean_anomaly.cos() - 0.00014 * (2.0 * mean_anomaly).cos();
        let obliquity = (23.439 - 0.000_000_4 * d).to_radians();

        let r = distance_au * AU_KM;
        [
            r * ecliptic_longitude.cos(),
            r * obliquity.cos() * ecliptic_longitude.sin(),
            r * obliquity.sin() * ecliptic_longitude.sin(),
        ]
    }
}

fn days_since_j2000(t: DateTime<Utc>) -> f64 {
    const J2000_MS: i64 = 946_728_000_000; // 2000-01-01T12:00:00Z
    (t.timestamp_millis() - J2000_MS) as f64 / 86_400_000.0
}
