use chrono::{DateTime, Utc};

use super::{EARTH_EQUATORIAL_RADIUS_KM, WGS84_E2};

/// Greenwich mean sidereal time in radians at the given instant.
pub fn gmst_rad(t: DateTime<Utc>) -> f64 {
    sgp4::iau_epoch_to_sidereal_time(sgp4::julian_years_since_j2000(&t.naive_utc()))
}

pub fn teme_to_ecef_position(pos_teme: [f64; 3], gmst: f64) -> [f64; 3] {
    let cos_gmst = gmst.cos();
    let sin_gmst = gmst.sin();
    [
        pos_teme[0] * cos_gmst + pos_teme[1] * sin_gmst,
        -pos_teme[0] * sin_gmst + pos_teme[1] * cos_gmst,
        pos_teme[2],
    ]
}

/// Inverse rotation of `teme_to_ecef_position`.
pub fn ecef_to_teme(pos_ecef: [f64; 3], gmst: f64) -> [f64; 3] {
    let cos_gmst = gmst.cos();
    let sin_gmst = gmst.sin();
    [
        pos_ecef[0] * cos_gmst - pos_ecef[1] * sin_gmst,
        pos_ecef[0] * sin_gmst + pos_ecef[1] * cos_gmst,
        pos_ecef[2],
    ]
}

/// Rotate an ECEF-frame offset vector into local east/north/up components.
pub fn ecef_to_enu(dr: [f64; 3], lat_rad: f64, lon_rad: f64) -> (f64, f64, f64) {
    let sin_lat = lat_rad.sin();
    let cos_lat = lat_rad.cos();
    let sin_lon = lon_rad.sin();
    let cos_lon = lon_rad.cos();

    let east = -sin_lon * dr[0] + cos_lon * dr[1];
    let north = -sin_lat * cos_lon * dr[0] - sin_lat * sin_lon * dr[1] + cos_lat * dr[2];
    let up = cos_lat * cos_lon * dr[0] + cos_lat * sin_lon * dr[1] + sin_lat * dr[2];
    (east, north, up)
}

/// ECEF position to WGS-84 geodetic latitude, longitude (degrees) and
/// height (km), using Bowring's closed-form approximation.
pub fn ecef_to_geodetic(ecef_km: [f64; 3]) -> (f64, f64, f64) {
    let a = EARTH_EQUATORIAL_RADIUS_KM;
    let e2 = WGS84_E2;
    let b = a * (1.0 - e2).sqrt();
    let ep2 = (a * a - b * b) / (b * b);

    let [x, y, z] = ecef_km;
    let p = (x * x + y * y).sqrt();
    let lon = y.atan2(x);

    if p < 1e-9 {
        // On the polar axis the longitude is arbitrary.
        let lat = if z >= 0.0 {
            std::f64::consts::FRAC_PI_2
        } else {
            -std::f64::consts::FRAC_PI_2
        };
        return (lat.to_degrees(), 0.0, z.abs() - b);
    }

    let theta = (z * a).atan2(p * b);
    let sin_theta = theta.sin();
    let cos_theta = theta.cos();
    let lat = (z + ep2 * b * sin_theta.powi(3)).atan2(p - e2 * a * cos_theta.powi(3));

    let sin_lat = lat.sin();
    let n = a / (1.0 - e2 * sin_lat * sin_lat).sqrt();
    let height = p / lat.cos() - n;

    (lat.to_degrees(), lon.to_degrees(), height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn teme_ecef_identity_at_zero_gmst() {
        let pos = [7000.0, 100.0, -50.0];
        let out = teme_to_ecef_position(pos, 0.0);
        assert_eq!(pos, out);
    }

    #[test]
    fn teme_ecef_round_trip() {
        let pos = [6524.0, 1327.0, 3000.0];
        let gmst = 1.234;
        let back = ecef_to_teme(teme_to_ecef_position(pos, gmst), gmst);
        for i in 0..3 {
            assert!((pos[i] - back[i]).abs() < 1e-9);
        }
    }

    #[test]
    fn geodetic_round_trip_mid_latitude() {
        // Forward conversion for lat 47.5, lon 8.2, height 0.4 km.
        let lat = 47.5_f64.to_radians();
        let lon = 8.2_f64.to_radians();
        let h = 0.4;
        let n = EARTH_EQUATORIAL_RADIUS_KM / (1.0 - WGS84_E2 * lat.sin().powi(2)).sqrt();
        let ecef = [
            (n + h) * lat.cos() * lon.cos(),
            (n + h) * lat.cos() * lon.sin(),
            (n * (1.0 - WGS84_E2) + h) * lat.sin(),
        ];

        let (lat_out, lon_out, h_out) = ecef_to_geodetic(ecef);
        assert!((lat_out - 47.5).abs() < 1e-6);
        assert!((lon_out - 8.2).abs() < 1e-9);
        assert!((h_out - 0.4).abs() < 1e-3);
    }

    #[test]
    fn enu_up_along_local_vertical() {
        // Station at the equator, prime meridian; +x offset points straight up.
        let (e, n, u) = ecef_to_enu([100.0, 0.0, 0.0], 0.0, 0.0);
        assert!(e.abs() < 1e-12);
        assert!(n.abs() < 1e-12);
        assert!((u - 100.0).abs() < 1e-12);
    }
}
