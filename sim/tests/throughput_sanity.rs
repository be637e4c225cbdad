//! Two ground stations at opposite ends of a 3-hop ISL chain exchange
//! traffic for a full minute: delivered throughput must never exceed the
//! 4 Gb/s ground-link bottleneck, and every delivered packet crosses
//! exactly 3 satellite forwards — the only path through the chain.

mod common;

use common::{ground_point_under, orbit};
use leo_scenario::ScenarioConfig;
use leo_sim::node::NodeKind;
use leo_sim::Simulation;

const GS_LINK_DATARATE_BPS: f64 = 4.0e9;

#[test]
fn chain_of_four_satellites_bounds_throughput_at_the_ground_link() {
    let sat1 = orbit(550.0, 53.0, 0.0, 0.0);
    let sat4 = orbit(550.0, 53.0, 0.0, 6.0);

    let (lat_a, lon_a) = ground_point_under(&sat1, 1.0);
    let (lat_b, lon_b) = ground_point_under(&sat4, 1.0);

    let text = format!(
        r#"
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
raan = 0
argPerigee = 0
initialAngle = 2
eccentricity = 0.001
maxISLRange = 2000

[satellite]
satelliteId = 3
altitude = 550
inclination = 53
raan = 0
argPerigee = 0
initialAngle = 4
eccentricity = 0.001
maxISLRange = 2000

[satellite]
satelliteId = 4
altitude = 550
inclination = 53
raan = 0
argPerigee = 0
initialAngle = 6
eccentricity = 0.001
maxISLRange = 2000

[topology]
satelliteA = 1
satelliteB = 2

[topology]
satelliteA = 2
satelliteB = 3

[topology]
satelliteA = 3
satelliteB = 4

[groundstation]
address = 101
latitude = {lat_a}
longitude = {lon_a}
altitude = 0
maxRange = 3000
sendInterval = 0.001
packetSize = 1024

[groundstation]
address = 102
latitude = {lat_b}
longitude = {lon_b}
altitude = 0
maxRange = 3000
sendInterval = 0.001
packetSize = 1024
"#
    );

    let config = ScenarioConfig::parse(&text).expect("scenario parses and validates");
    let mut sim = Simulation::from_scenario(&config).expect("scenario parses and validates");
    sim.run();

    let gs_b = match &sim.nodes()[&102] {
        NodeKind::GroundStation(gs) => gs,
        _ => panic!("102 should be a ground station"),
    };

    assert!(gs_b.stats.packets_received > 0, "a minute at 1 packet/ms should deliver plenty of traffic");
    assert!(
        gs_b.stats.throughput_bps() <= GS_LINK_DATARATE_BPS * 1.01,
        "delivered throughput cannot exceed the ground-link bottleneck"
    );
    for &hops in &gs_b.stats.hop_counts {
        assert_eq!(hops, 3, "the only path across a 4-satellite chain is exactly 3 forwards");
    }
}
