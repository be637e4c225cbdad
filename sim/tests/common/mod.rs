//! Shared scenario-building helpers for the end-to-end tests below.
//! Not a test module itself — `tests/common/mod.rs` keeps cargo from
//! treating it as its own integration-test binary.

use leo_geodesy::{propagate, transforms::ecef_to_geodetic, OrbitParams};

/// A near-circular LEO orbit at the given altitude/inclination/RAAN,
/// starting at the given mean anomaly. Fixed argument of perigee and a
/// small eccentricity — plenty for geometry-driven tests that don't
/// care about elliptical effects.
pub fn orbit(altitude_km: f64, inclination_deg: f64, raan_deg: f64, initial_angle_deg: f64) -> OrbitParams {
    OrbitParams {
        semi_major_axis_km: leo_geodesy::EARTH_RADIUS_KM + altitude_km,
        eccentricity: 0.001,
        inclination_deg,
        raan_deg,
        arg_perigee_deg: 0.0,
        mean_anomaly_epoch_deg: initial_angle_deg,
    }
}

/// The ground point directly below `sat` at virtual time `at_t` — used
/// to place a ground station so a specific satellite is its nearest
/// neighbour at a known instant.
pub fn ground_point_under(sat: &OrbitParams, at_t: f64) -> (f64, f64) {
    let pos = propagate(sat, at_t);
    let geo = ecef_to_geodetic(&pos);
    (geo.latitude_deg, geo.longitude_deg)
}
