//! Orbital Mechanics Library
//!
//! Keplerian propagation and ECEF/geodetic coordinate transforms for the
//! LEO constellation simulator. Propagation is a closed-form Newton-Raphson
//! Kepler solver over a spherical Earth — not SGP4, not a WGS84 ellipsoid.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug)]
pub enum OrbitalError {
    #[error("invalid orbital parameters: {0}")]
    InvalidParams(String),
    #[error("invalid coordinates: {0}")]
    InvalidCoordinates(String),
    /// Kepler solver did not reach tolerance within the bounded iteration
    /// count (§7 solver-nonconvergence). Non-fatal: `propagate` still
    /// returns a position using the last iterate, and only logs this.
    #[error("Kepler solver failed to converge after {iterations} iterations (last delta {last_delta:e})")]
    SolverNonConvergence { iterations: usize, last_delta: f64 },
}

pub type Result<T> = std::result::Result<T, OrbitalError>;

/// Gravitational parameter of Earth, km^3/s^2.
pub const MU_EARTH: f64 = 398600.4418;
/// Earth's sidereal rotation rate, rad/s.
pub const EARTH_ROTATION_RATE: f64 = 7.2921159e-5;
/// Speed of light, km/s.
pub const SPEED_OF_LIGHT_KM_S: f64 = 299792.458;
/// Spherical-Earth radius used throughout this crate (explicit simplification).
pub const EARTH_RADIUS_KM: f64 = 6371.0;

const KEPLER_MAX_ITERATIONS: usize = 10;
const KEPLER_CONVERGENCE_TOL: f64 = 1e-10;

/// Keplerian orbital elements. Angles in degrees, `semi_major_axis_km` in km.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrbitParams {
    pub semi_major_axis_km: f64,
    pub eccentricity: f64,
    pub inclination_deg: f64,
    pub raan_deg: f64,
    pub arg_perigee_deg: f64,
    /// Mean anomaly at epoch (t=0), degrees. Fixed interpretation per spec:
    /// always mean anomaly, never true anomaly.
    pub mean_anomaly_epoch_deg: f64,
}

impl OrbitParams {
    pub fn validate(&self) -> Result<()> {
        if self.semi_major_axis_km <= 0.0 {
            return Err(OrbitalError::InvalidParams(format!(
                "semi_major_axis_km must be positive, got {}",
                self.semi_major_axis_km
            )));
        }
        if !(0.0..1.0).contains(&self.eccentricity) {
            return Err(OrbitalError::InvalidParams(format!(
                "eccentricity must be in [0, 1), got {}",
                self.eccentricity
            )));
        }
        Ok(())
    }

    /// Mean motion n = sqrt(mu / a^3), rad/s.
    pub fn mean_motion(&self) -> f64 {
        (MU_EARTH / self.semi_major_axis_km.powi(3)).sqrt()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EcefPosition {
    pub x_km: f64,
    pub y_km: f64,
    pub z_km: f64,
}

impl EcefPosition {
    pub fn distance_to(&self, other: &EcefPosition) -> f64 {
        let dx = self.x_km - other.x_km;
        let dy = self.y_km - other.y_km;
        let dz = self.z_km - other.z_km;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeodeticPosition {
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub altitude_km: f64,
}

/// Solve Kepler's equation M = E - e*sin(E) for E via Newton-Raphson.
/// Bounded at 10 iterations, deliberately deterministic (see propagation::kepler module notes).
/// At e = 0 the equation is already satisfied by E0 = M, so the first iterate matches exactly.
///
/// Should not fail to converge for e <= 0.1 (§7); if it does, a
/// `tracing::warn!` is emitted and the loop's last iterate is returned
/// rather than treating this as fatal.
pub fn solve_kepler(mean_anomaly_rad: f64, eccentricity: f64) -> f64 {
    let mut e = mean_anomaly_rad;
    let mut last_delta = f64::INFINITY;
    for _ in 0..KEPLER_MAX_ITERATIONS {
        let f = e - eccentricity * e.sin() - mean_anomaly_rad;
        let f_prime = 1.0 - eccentricity * e.cos();
        let delta = f / f_prime;
        e -= delta;
        last_delta = delta;
        if delta.abs() < KEPLER_CONVERGENCE_TOL {
            return e;
        }
    }
    warn!(
        eccentricity,
        last_delta,
        iterations = KEPLER_MAX_ITERATIONS,
        "{}",
        OrbitalError::SolverNonConvergence { iterations: KEPLER_MAX_ITERATIONS, last_delta }
    );
    e
}

/// Propagate a satellite's orbit to ECEF position at virtual time `t` seconds.
///
/// Pure and time-reentrant: reads no state besides the constants above.
pub fn propagate(params: &OrbitParams, t: f64) -> EcefPosition {
    let n = params.mean_motion();
    let m0_rad = params.mean_anomaly_epoch_deg.to_radians();
    let m = m0_rad + n * t;

    let e_anom = solve_kepler(m, params.eccentricity);

    let true_anomaly = (1.0 - params.eccentricity * params.eccentricity)
        .sqrt()
        .mul_add(e_anom.sin(), 0.0)
        .atan2(e_anom.cos() - params.eccentricity);

    let r = params.semi_major_axis_km * (1.0 - params.eccentricity * e_anom.cos());
    let u = true_anomaly + params.arg_perigee_deg.to_radians();

    let x_orbit = r * u.cos();
    let y_orbit = r * u.sin();

    let raan = params.raan_deg.to_radians();
    let inc = params.inclination_deg.to_radians();

    let (sin_raan, cos_raan) = raan.sin_cos();
    let (sin_inc, cos_inc) = inc.sin_cos();

    let x_eci = x_orbit * cos_raan - y_orbit * sin_raan * cos_inc;
    let y_eci = x_orbit * sin_raan + y_orbit * cos_raan * cos_inc;
    let z_eci = y_orbit * sin_inc;

    let theta = EARTH_ROTATION_RATE * t;
    let (sin_theta, cos_theta) = theta.sin_cos();

    EcefPosition {
        x_km: x_eci * cos_theta + y_eci * sin_theta,
        y_km: -x_eci * sin_theta + y_eci * cos_theta,
        z_km: z_eci,
    }
}

pub mod transforms {
    use super::*;

    /// ECEF -> geodetic using a spherical Earth of radius 6371 km.
    pub fn ecef_to_geodetic(pos: &EcefPosition) -> GeodeticPosition {
        let r = (pos.x_km * pos.x_km + pos.y_km * pos.y_km + pos.z_km * pos.z_km).sqrt();
        let longitude_deg = pos.y_km.atan2(pos.x_km).to_degrees();
        let latitude_deg = (pos.z_km / r).asin().to_degrees();
        GeodeticPosition {
            latitude_deg,
            longitude_deg,
            altitude_km: r - EARTH_RADIUS_KM,
        }
    }

    /// Geodetic -> ECEF using the same spherical-Earth model.
    pub fn geodetic_to_ecef(pos: &GeodeticPosition) -> EcefPosition {
        let r = EARTH_RADIUS_KM + pos.altitude_km;
        let lat = pos.latitude_deg.to_radians();
        let lon = pos.longitude_deg.to_radians();
        EcefPosition {
            x_km: r * lat.cos() * lon.cos(),
            y_km: r * lat.cos() * lon.sin(),
            z_km: r * lat.sin(),
        }
    }
}
