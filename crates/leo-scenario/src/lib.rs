//! Scenario Configuration Library
//!
//! Parses the `.ini`-style scenario file into a typed [`ScenarioConfig`]
//! resolved once at startup, replacing any dynamic/reflective parameter
//! lookup. Unknown keys, out-of-range values, and topology edges that
//! reference a nonexistent satellite are reported as [`ScenarioError`]
//! and are fatal to the run.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScenarioError {
    #[error("io error reading scenario file: {0}")]
    Io(#[from] std::io::Error),
    #[error("unknown key '{0}' in section [{1}]")]
    UnknownKey(String, String),
    #[error("out-of-range value for '{0}': {1}")]
    OutOfRange(String, String),
    #[error("malformed line {0}: {1:?}")]
    Malformed(usize, String),
    #[error("topology edge references nonexistent satellite id {0}")]
    UnknownSatelliteInTopology(u32),
    #[error("duplicate satellite id {0}")]
    DuplicateSatelliteId(u32),
    #[error("duplicate ground station address {0}")]
    DuplicateGroundStationAddress(u32),
    #[error("satellite id {0} collides with a ground station address")]
    IdCollision(u32),
}

pub type Result<T> = std::result::Result<T, ScenarioError>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SatelliteConfig {
    pub satellite_id: u32,
    pub altitude_km: f64,
    pub inclination_deg: f64,
    pub raan_deg: f64,
    pub arg_perigee_deg: f64,
    /// Treated as mean anomaly at epoch (§9 open question resolved this way).
    pub initial_angle_deg: f64,
    pub eccentricity: f64,
    pub max_isl_range_km: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroundStationConfig {
    pub address: u32,
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub altitude_km: f64,
    pub max_range_km: f64,
    pub send_interval_s: f64,
    pub packet_size_bytes: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TopologyEdge {
    pub satellite_a: u32,
    pub satellite_b: u32,
    pub datarate_bps: f64,
}

pub const DEFAULT_TOPOLOGY_DATARATE_BPS: f64 = 10.0e9;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    pub satellites: Vec<SatelliteConfig>,
    pub ground_stations: Vec<GroundStationConfig>,
    pub topology: Vec<TopologyEdge>,
    pub sim_time_limit_s: f64,
    pub seed: u64,
}

impl ScenarioConfig {
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Parse the line-oriented `.ini`-style format: `[section]` headers
    /// followed by `key = value` lines. `[satellite]`, `[groundstation]`
    /// and `[topology]` may repeat — each new header of the same name
    /// starts a fresh entity.
    pub fn parse(text: &str) -> Result<Self> {
        let mut satellites = Vec::new();
        let mut ground_stations = Vec::new();
        let mut topology = Vec::new();
        let mut sim_time_limit_s = None;
        let mut seed = None;

        let mut section = String::new();
        let mut fields: std::collections::HashMap<String, String> = std::collections::HashMap::new();

        let mut flush = |section: &str, fields: &mut std::collections::HashMap<String, String>| -> Result<()> {
            match section {
                "" => Ok(()),
                "satellite" => {
                    satellites.push(parse_satellite(fields)?);
                    Ok(())
                }
                "groundstation" => {
                    ground_stations.push(parse_ground_station(fields)?);
                    Ok(())
                }
                "topology" => {
                    topology.push(parse_topology_edge(fields)?);
                    Ok(())
                }
                "global" => {
                    reject_unknown_keys(fields, "global", GLOBAL_KEYS)?;
                    if let Some(v) = fields.get("sim-time-limit") {
                        sim_time_limit_s = Some(parse_f64("sim-time-limit", v)?);
                    }
                    if let Some(v) = fields.get("seed") {
                        seed = Some(parse_u64("seed", v)?);
                    }
                    Ok(())
                }
                other => Err(ScenarioError::UnknownKey("<section>".into(), other.into())),
            }
        };

        for (lineno, raw_line) in text.lines().enumerate() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }
            if line.starts_with('[') && line.ends_with(']') {
                flush(&section, &mut fields)?;
                fields.clear();
                section = line[1..line.len() - 1].trim().to_string();
                continue;
            }
            let (key, value) = line
                .split_once('=')
                .ok_or_else(|| ScenarioError::Malformed(lineno + 1, raw_line.to_string()))?;
            fields.insert(key.trim().to_string(), value.trim().to_string());
        }
        flush(&section, &mut fields)?;

        let config = ScenarioConfig {
            satellites,
            ground_stations,
            topology,
            sim_time_limit_s: sim_time_limit_s
                .ok_or_else(|| ScenarioError::UnknownKey("sim-time-limit".into(), "global".into()))?,
            seed: seed.unwrap_or(42),
        };
        config.validate()?;
        Ok(config)
    }

    /// Fatal-at-startup checks: duplicate ids, id collisions between the two
    /// address spaces, and topology edges referencing unknown satellites.
    pub fn validate(&self) -> Result<()> {
        let mut sat_ids = HashSet::new();
        for sat in &self.satellites {
            if !sat_ids.insert(sat.satellite_id) {
                return Err(ScenarioError::DuplicateSatelliteId(sat.satellite_id));
            }
        }
        let mut gs_addrs = HashSet::new();
        for gs in &self.ground_stations {
            if !gs_addrs.insert(gs.address) {
                return Err(ScenarioError::DuplicateGroundStationAddress(gs.address));
            }
            if sat_ids.contains(&gs.address) {
                return Err(ScenarioError::IdCollision(gs.address));
            }
        }
        for edge in &self.topology {
            if !sat_ids.contains(&edge.satellite_a) {
                return Err(ScenarioError::UnknownSatelliteInTopology(edge.satellite_a));
            }
            if !sat_ids.contains(&edge.satellite_b) {
                return Err(ScenarioError::UnknownSatelliteInTopology(edge.satellite_b));
            }
        }
        Ok(())
    }
}

fn parse_f64(key: &str, value: &str) -> Result<f64> {
    value
        .parse::<f64>()
        .map_err(|_| ScenarioError::OutOfRange(key.to_string(), value.to_string()))
}

fn parse_u64(key: &str, value: &str) -> Result<u64> {
    value
        .parse::<u64>()
        .map_err(|_| ScenarioError::OutOfRange(key.to_string(), value.to_string()))
}

fn parse_u32(key: &str, value: &str) -> Result<u32> {
    value
        .parse::<u32>()
        .map_err(|_| ScenarioError::OutOfRange(key.to_string(), value.to_string()))
}

fn required<'a>(
    fields: &'a std::collections::HashMap<String, String>,
    section: &str,
    key: &str,
) -> Result<&'a str> {
    fields
        .get(key)
        .map(String::as_str)
        .ok_or_else(|| ScenarioError::UnknownKey(key.to_string(), section.to_string()))
}

/// Reject any key in `fields` that isn't in `recognized` — every section's
/// key set is closed, per §7's "unknown key" scenario-error.
fn reject_unknown_keys(
    fields: &std::collections::HashMap<String, String>,
    section: &str,
    recognized: &[&str],
) -> Result<()> {
    for key in fields.keys() {
        if !recognized.contains(&key.as_str()) {
            return Err(ScenarioError::UnknownKey(key.clone(), section.to_string()));
        }
    }
    Ok(())
}

const SATELLITE_KEYS: &[&str] = &[
    "satelliteId",
    "altitude",
    "inclination",
    "raan",
    "argPerigee",
    "initialAngle",
    "eccentricity",
    "maxISLRange",
];
const GROUNDSTATION_KEYS: &[&str] = &[
    "address",
    "latitude",
    "longitude",
    "altitude",
    "maxRange",
    "sendInterval",
    "packetSize",
];
const TOPOLOGY_KEYS: &[&str] = &["satelliteA", "satelliteB", "datarate"];
const GLOBAL_KEYS: &[&str] = &["sim-time-limit", "seed"];

fn parse_satellite(fields: &std::collections::HashMap<String, String>) -> Result<SatelliteConfig> {
    reject_unknown_keys(fields, "satellite", SATELLITE_KEYS)?;

    let eccentricity = parse_f64("eccentricity", required(fields, "satellite", "eccentricity")?)?;
    if !(0.0..1.0).contains(&eccentricity) {
        return Err(ScenarioError::OutOfRange(
            "eccentricity".into(),
            eccentricity.to_string(),
        ));
    }
    let altitude_km = parse_f64("altitude", required(fields, "satellite", "altitude")?)?;
    if altitude_km <= 0.0 {
        return Err(ScenarioError::OutOfRange("altitude".into(), altitude_km.to_string()));
    }
    Ok(SatelliteConfig {
        satellite_id: parse_u32("satelliteId", required(fields, "satellite", "satelliteId")?)?,
        altitude_km,
        inclination_deg: parse_f64("inclination", required(fields, "satellite", "inclination")?)?,
        raan_deg: parse_f64("raan", required(fields, "satellite", "raan")?)?,
        arg_perigee_deg: parse_f64("argPerigee", required(fields, "satellite", "argPerigee")?)?,
        initial_angle_deg: parse_f64("initialAngle", required(fields, "satellite", "initialAngle")?)?,
        eccentricity,
        max_isl_range_km: parse_f64("maxISLRange", required(fields, "satellite", "maxISLRange")?)?,
    })
}

fn parse_ground_station(
    fields: &std::collections::HashMap<String, String>,
) -> Result<GroundStationConfig> {
    reject_unknown_keys(fields, "groundstation", GROUNDSTATION_KEYS)?;

    Ok(GroundStationConfig {
        address: parse_u32("address", required(fields, "groundstation", "address")?)?,
        latitude_deg: parse_f64("latitude", required(fields, "groundstation", "latitude")?)?,
        longitude_deg: parse_f64("longitude", required(fields, "groundstation", "longitude")?)?,
        altitude_km: parse_f64("altitude", required(fields, "groundstation", "altitude")?)?,
        max_range_km: parse_f64("maxRange", required(fields, "groundstation", "maxRange")?)?,
        send_interval_s: parse_f64(
            "sendInterval",
            required(fields, "groundstation", "sendInterval")?,
        )?,
        packet_size_bytes: parse_u64(
            "packetSize",
            required(fields, "groundstation", "packetSize")?,
        )?,
    })
}

fn parse_topology_edge(
    fields: &std::collections::HashMap<String, String>,
) -> Result<TopologyEdge> {
    reject_unknown_keys(fields, "topology", TOPOLOGY_KEYS)?;

    let datarate_bps = match fields.get("datarate") {
        Some(v) => parse_f64("datarate", v)?,
        None => DEFAULT_TOPOLOGY_DATARATE_BPS,
    };
    Ok(TopologyEdge {
        satellite_a: parse_u32("satelliteA", required(fields, "topology", "satelliteA")?)?,
        satellite_b: parse_u32("satelliteB", required(fields, "topology", "satelliteB")?)?,
        datarate_bps,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[global]
sim-time-limit = 60
seed = 42

[satellite]
satelliteId = 1
altitude = 550
inclination = 53
raan = 0
argPerigee = 0
initialAngle = 0
eccentricity = 0.001
maxISLRange = 2000

[satellite]
satelliteId = 2
altitude = 550
inclination = 53
raan = 10
argPerigee = 0
initialAngle = 30
eccentricity = 0.001
maxISLRange = 2000

[topology]
satelliteA = 1
satelliteB = 2
datarate = 1000000000

[groundstation]
address = 99
latitude = 0
longitude = 0
altitude = 0
maxRange = 1500
sendInterval = 1
packetSize = 1024
"#;

    #[test]
    fn parses_full_scenario() {
        let config = ScenarioConfig::parse(SAMPLE).unwrap();
        assert_eq!(config.satellites.len(), 2);
        assert_eq!(config.ground_stations.len(), 1);
        assert_eq!(config.topology.len(), 1);
        assert_eq!(config.sim_time_limit_s, 60.0);
        assert_eq!(config.seed, 42);
    }

    #[test]
    fn rejects_topology_referencing_unknown_satellite() {
        let bad = SAMPLE.replace("satelliteB = 2", "satelliteB = 99");
        let err = ScenarioConfig::parse(&bad).unwrap_err();
        assert!(matches!(err, ScenarioError::UnknownSatelliteInTopology(99)));
    }

    #[test]
    fn rejects_out_of_range_eccentricity() {
        let bad = SAMPLE.replace("eccentricity = 0.001", "eccentricity = 1.5");
        assert!(ScenarioConfig::parse(&bad).is_err());
    }

    #[test]
    fn rejects_unknown_key_inside_known_section() {
        let bad = SAMPLE.replace("eccentricity = 0.001", "eccentricty = 0.001");
        let err = ScenarioConfig::parse(&bad).unwrap_err();
        assert!(matches!(err, ScenarioError::UnknownKey(key, section) if key == "eccentricty" && section == "satellite"));
    }

    #[test]
    fn default_datarate_applied_when_absent() {
        let without_rate = SAMPLE.replace("datarate = 1000000000\n", "");
        let config = ScenarioConfig::parse(&without_rate).unwrap();
        assert_eq!(config.topology[0].datarate_bps, DEFAULT_TOPOLOGY_DATARATE_BPS);
    }
}
