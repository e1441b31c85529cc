use super::ground_station::GroundStation;
use super::types::LookAngles;
use crate::propagation::ecef_to_enu;

/// Elevation, azimuth and range of an Earth-fixed position as seen from a
/// ground station. Pure; returns `None` for non-finite or degenerate
/// inputs so search loops can skip the sample instead of aborting.
pub fn look_angles(station: &GroundStation, sat_ecef_km: [f64; 3]) -> Option<LookAngles> {
    if !station.is_finite() || sat_ecef_km.iter().any(|v| !v.is_finite()) {
        return None;
    }

    let sta_ecef = station.position_ecef_km();
    let dr = [
        sat_ecef_km[0] - sta_ecef[0],
        sat_ecef_km[1] - sta_ecef[1],
        sat_ecef_km[2] - sta_ecef[2],
    ];
    let range_km = (dr[0] * dr[0] + dr[1] * dr[1] + dr[2] * dr[2]).sqrt();
    if !(range_km > 0.0) {
        return None;
    }

    let (east, north, up) = ecef_to_enu(dr, station.lat_rad(), station.lon_rad());
    let azimuth_deg = east.atan2(north).to_degrees().rem_euclid(360.0);
    let elevation_deg = (up / range_km).asin().to_degrees();

    if !azimuth_deg.is_finite() || !elevation_deg.is_finite() {
        return None;
    }

    Some(LookAngles {
        elevation_deg,
        azimuth_deg,
        range_km,
    })
}
