mod sun;

pub use sun::{AnalyticSun, SunEphemeris};

use chrono::{DateTime, Utc};

use crate::cache::BoundedCache;
use crate::propagation::EARTH_EQUATORIAL_RADIUS_KM;

const ECLIPSE_CACHE_CAPACITY: usize = 50_000;
/// Queries within the same bucket reuse the cached classification.
const ECLIPSE_BUCKET_MS: i64 = 10_000;

/// Cylindrical shadow test. The body's shadow is modelled as an infinite
/// tube of constant radius pointing away from the sun; the sun's finite
/// angular size is ignored. Kept deliberately simple for numerical parity
/// with the classification this replaces — do not upgrade to a cone here.
pub fn in_shadow(sat_eci_km: [f64; 3], sun_eci_km: [f64; 3], body_radius_km: f64) -> bool {
    let sun_distance = (sun_eci_km[0] * sun_eci_km[0]
        + sun_eci_km[1] * sun_eci_km[1]
        + sun_eci_km[2] * sun_eci_km[2])
        .sqrt();
    if sun_distance <= 0.0 {
        return false;
    }
    let sun_dir = [
        sun_eci_km[0] / sun_distance,
        sun_eci_km[1] / sun_distance,
        sun_eci_km[2] / sun_distance,
    ];

    let along = sat_eci_km[0] * sun_dir[0] + sat_eci_km[1] * sun_dir[1] + sat_eci_km[2] * sun_dir[2];
    if along >= 0.0 {
        // Sunward side of the body.
        return false;
    }

    let perp = [
        sat_eci_km[0] - along * sun_dir[0],
        sat_eci_km[1] - along * sun_dir[1],
        sat_eci_km[2] - along * sun_dir[2],
    ];
    let perp_distance = (perp[0] * perp[0] + perp[1] * perp[1] + perp[2] * perp[2]).sqrt();

    perp_distance < body_radius_km
}

/// Shadow classification with a bounded memo, keyed by object identity and
/// time bucket. Repeated queries at nearly identical times dominate
/// interactive stepping, which is what the bucket width is sized for.
pub struct EclipseClassifier {
    sun: Box<dyn SunEphemeris>,
    cache: BoundedCache<(u64, i64), bool>,
    body_radius_km: f64,
}

impl EclipseClassifier {
    pub fn new() -> Self {
        Self::with_sun(Box::new(AnalyticSun))
    }

    pub fn with_sun(sun: Box<dyn SunEphemeris>) -> Self {
        Self {
            sun,
            cache: BoundedCache::new(ECLIPSE_CACHE_CAPACITY),
            body_radius_km: EARTH_EQUATORIAL_RADIUS_KM,
        }
    }

    pub fn classify(&mut self, norad_id: u64, t: DateTime<Utc>, sat_eci_km: [f64; 3]) -> bool {
        let key = (norad_id, t.timestamp_millis().div_euclid(ECLIPSE_BUCKET_MS));
        if let Some(&cached) = self.cache.get(&key) {
            return cached;
        }
        let sun = self.sun.position_eci_km(t);
        let shadowed = in_shadow(sat_eci_km, sun, self.body_radius_km);
        self.cache.insert(key, shadowed);
        shadowed
    }

    pub fn clear(&mut self) {
        self.cache.clear();
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }
}

impl Default for EclipseClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const SUN: [f64; 3] = [1.5e8, 0.0, 0.0];

    #[test]
    fn antisolar_point_inside_tube_is_shadowed() {
        assert!(in_shadow([-7000.0, 0.0, 0.0], SUN, 6378.137));
        assert!(in_shadow([-42164.0, 3000.0, -2000.0], SUN, 6378.137));
    }

    #[test]
    fn sunward_side_is_lit() {
        assert!(!in_shadow([7000.0, 0.0, 0.0], SUN, 6378.137));
    }

    #[test]
    fn outside_tube_is_lit() {
        assert!(!in_shadow([-7000.0, 6500.0, 0.0], SUN, 6378.137));
        assert!(!in_shadow([0.0, 7000.0, 0.0], SUN, 6378.137));
    }

    #[test]
    fn boundary_uses_strict_comparison() {
        assert!(!in_shadow([-7000.0, 6378.137, 0.0], SUN, 6378.137));
    }

    #[test]
    fn classification_is_cached_per_bucket() {
        struct FixedSun;
        impl SunEphemeris for FixedSun {
            fn position_eci_km(&self, _t: DateTime<Utc>) -> [f64; 3] {
                SUN
            }
        }

        let mut classifier = EclipseClassifier::with_sun(Box::new(FixedSun));
        let t = Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap();
        let first = classifier.classify(1, t, [-7000.0, 0.0, 0.0]);
        assert!(first);
        assert_eq!(classifier.cache_len(), 1);

        // Same bucket, different position: the memo answers.
        let t2 = t + chrono::Duration::seconds(3);
        assert!(classifier.classify(1, t2, [7000.0, 0.0, 0.0]));
        assert_eq!(classifier.cache_len(), 1);

        // Different object id misses.
        assert!(!classifier.classify(2, t2, [7000.0, 0.0, 0.0]));
        assert_eq!(classifier.cache_len(), 2);
    }
}
