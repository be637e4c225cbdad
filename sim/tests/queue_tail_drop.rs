//! A sender whose outbound link drains far slower than packets arrive
//! must tail-drop once its transmit queue fills to capacity, and never
//! hold more than capacity at once.

mod common;

use common::ground_point_under;
use leo_scenario::ScenarioConfig;
use leo_sim::node::NodeKind;
use leo_sim::Simulation;

#[test]
fn overflowing_sender_queue_tail_drops_at_capacity() {
    let sat1 = leo_geodesy::OrbitParams {
        semi_major_axis_km: leo_geodesy::EARTH_RADIUS_KM + 550.0,
        eccentricity: 0.001,
        inclination_deg: 53.0,
        raan_deg: 0.0,
        arg_perigee_deg: 0.0,
        mean_anomaly_epoch_deg: 0.0,
    };
    let (lat_a, lon_a) = ground_point_under(&sat1, 1.0);

    // A 10 MB packet over the fixed 4 Gb/s ground-to-satellite link takes
    // 20ms to transmit; a 10us send interval arrives 2000x faster than the
    // link can drain, so the sender's own queue fills and stays full.
    let text = format!(
        r#"
[global]
sim-time-limit = 1.05
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

[groundstation]
address = 101
latitude = {lat_a}
longitude = {lon_a}
altitude = 0
maxRange = 3000
sendInterval = 0.00001
packetSize = 10000000

[groundstation]
address = 102
latitude = 0
longitude = 0
altitude = 0
maxRange = 1
sendInterval = 1000
packetSize = 1024
"#
    );

    let config = ScenarioConfig::parse(&text).expect("scenario parses and validates");
    let mut sim = Simulation::from_scenario(&config).expect("scenario parses and validates");
    sim.run();

    let gs_a = match &sim.nodes()[&101] {
        NodeKind::GroundStation(gs) => gs,
        _ => panic!("101 should be a ground station"),
    };

    assert_eq!(gs_a.queue.capacity(), leo_sim_core::DEFAULT_QUEUE_CAPACITY);
    assert_eq!(gs_a.queue.len(), gs_a.queue.capacity(), "queue should be pinned at capacity");
    assert!(gs_a.queue.drop_count() > 0, "arrivals far outpace drain rate, so tail drops must occur");
}
