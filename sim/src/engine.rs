//! The simulation driver (C9): builds nodes and static ISL links from
//! a [`ScenarioConfig`], wires up the initial event set, and drains the
//! event queue until the configured horizon.

use crate::event::Event;
use crate::node::{GroundStation, NodeKind, OutboundGate, QueuedMessage, Satellite, GS_LINK_DATARATE_BPS};
use leo_geodesy::{propagate, transforms::geodetic_to_ecef, EcefPosition, OrbitParams, SPEED_OF_LIGHT_KM_S};
use leo_scenario::{ScenarioConfig, ScenarioError};
use leo_sim_core::{Link, Scheduler};
use leo_topology::handover::{find_nearest, HandoverAction};
use leo_topology::{HandoverState, IslMesh, RoutingAdvertisement};
use leo_traffic::{DataPacket, TrafficRole};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashMap;
use tracing::debug;

/// Earth radius used to turn scenario altitudes into semi-major axes,
/// matching `leo_geodesy`'s spherical-Earth model.
const EARTH_RADIUS_KM: f64 = leo_geodesy::EARTH_RADIUS_KM;
/// Topology/handover ticks run at 1 Hz of virtual time (§4.5, §4.7).
const TICK_PERIOD_S: f64 = 1.0;
/// One-way processing delay folded into every recomputed link delay
/// (§4.5: `d/c + 1 ms`).
const LINK_PROCESSING_DELAY_S: f64 = 0.001;

pub struct Simulation {
    nodes: HashMap<u32, NodeKind>,
    satellite_orbits: HashMap<u32, OrbitParams>,
    satellite_max_isl_range: HashMap<u32, f64>,
    ground_positions: HashMap<u32, EcefPosition>,
    ground_max_range: HashMap<u32, f64>,
    next_gs_gate_idx: HashMap<u32, usize>,
    scheduler: Scheduler<Event>,
    rng: StdRng,
    horizon_s: f64,
}

impl Simulation {
    /// Builds the simulation from a validated scenario. Still re-validates
    /// each satellite's resolved `OrbitParams` — an out-of-range value is a
    /// fatal scenario-error (§7), never something to log and continue past
    /// with an orbit whose `mean_motion()` would be NaN.
    pub fn from_scenario(config: &ScenarioConfig) -> Result<Self, ScenarioError> {
        let mut nodes = HashMap::new();
        let mut satellite_orbits = HashMap::new();
        let mut satellite_max_isl_range = HashMap::new();
        let mut ground_positions = HashMap::new();
        let mut ground_max_range = HashMap::new();
        let mut isl_mesh = IslMesh::new();
        let mut scheduler: Scheduler<Event> = Scheduler::new();

        for sat in &config.satellites {
            let orbit = OrbitParams {
                semi_major_axis_km: EARTH_RADIUS_KM + sat.altitude_km,
                eccentricity: sat.eccentricity,
                inclination_deg: sat.inclination_deg,
                raan_deg: sat.raan_deg,
                arg_perigee_deg: sat.arg_perigee_deg,
                mean_anomaly_epoch_deg: sat.initial_angle_deg,
            };
            if let Err(err) = orbit.validate() {
                return Err(ScenarioError::OutOfRange(
                    format!("satellite {} orbit", sat.satellite_id),
                    err.to_string(),
                ));
            }
            satellite_orbits.insert(sat.satellite_id, orbit);
            satellite_max_isl_range.insert(sat.satellite_id, sat.max_isl_range_km);
            isl_mesh.ensure_satellite(sat.satellite_id);
            nodes.insert(sat.satellite_id, NodeKind::Satellite(Satellite::new(sat.satellite_id)));
        }

        for edge in &config.topology {
            isl_mesh.add_edge(edge.satellite_a, edge.satellite_b, edge.datarate_bps);
        }

        // Static ISL gates get a real propagation delay from t=0 positions
        // rather than starting at 0.0 — the first topology tick that would
        // otherwise correct it does not fire until t=1.0s, and a packet
        // sent before then (§8 scenario 1) needs the right delay already.
        // The construction-time delay is pure d/c: the processing-delay
        // term only enters through the topology tick's own recompute
        // (§4.5 step 2), which is what the scenario 1 arithmetic assumes.
        for sat in &config.satellites {
            let my_pos = propagate(&satellite_orbits[&sat.satellite_id], 0.0);
            let peers = isl_mesh
                .physical_peers(sat.satellite_id)
                .expect("satellite was just registered in the mesh");
            if let Some(NodeKind::Satellite(state)) = nodes.get_mut(&sat.satellite_id) {
                for (peer_id, datarate_bps) in peers {
                    let peer_pos = propagate(&satellite_orbits[&peer_id], 0.0);
                    let delay_s = my_pos.distance_to(&peer_pos) / SPEED_OF_LIGHT_KM_S;
                    state
                        .gates
                        .insert(peer_id, OutboundGate { link: Link::new(datarate_bps, delay_s), connected: true });
                }
            }
        }

        // Role assignment (§4.8): the scenario format carries no explicit
        // role key, so the lowest ground-station address is treated as
        // the hub and every other address as a leaf sending to it —
        // the relationship the spec's own example (99 hub, 101..110
        // leaves) describes. See DESIGN.md.
        let hub_addr = config.ground_stations.iter().map(|gs| gs.address).min();

        for gs in &config.ground_stations {
            let position = geodetic_to_ecef(&leo_geodesy::GeodeticPosition {
                latitude_deg: gs.latitude_deg,
                longitude_deg: gs.longitude_deg,
                altitude_km: gs.altitude_km,
            });
            ground_positions.insert(gs.address, position);
            ground_max_range.insert(gs.address, gs.max_range_km);

            let role = if Some(gs.address) == hub_addr {
                let leaves = config
                    .ground_stations
                    .iter()
                    .map(|g| g.address)
                    .filter(|&addr| Some(addr) != hub_addr)
                    .collect();
                TrafficRole::Hub { leaves }
            } else {
                TrafficRole::Leaf { hub: hub_addr.expect("hub exists whenever a non-hub ground station does") }
            };

            nodes.insert(
                gs.address,
                NodeKind::GroundStation(GroundStation::new(gs.address, role, gs.packet_size_bytes, gs.send_interval_s)),
            );
        }

        for sat in &config.satellites {
            scheduler
                .schedule_at(TICK_PERIOD_S, Event::SatellitePositionTick(sat.satellite_id))
                .expect("t=1.0 is never before now=0.0");
        }
        for gs in &config.ground_stations {
            scheduler
                .schedule_at(TICK_PERIOD_S, Event::GroundHandoverTick(gs.address))
                .expect("t=1.0 is never before now=0.0");
            scheduler
                .schedule_at(gs.send_interval_s, Event::TrafficTick(gs.address))
                .expect("sendInterval is validated positive at scenario load");
        }

        Ok(Self {
            nodes,
            satellite_orbits,
            satellite_max_isl_range,
            ground_positions,
            ground_max_range,
            next_gs_gate_idx: HashMap::new(),
            scheduler,
            rng: StdRng::seed_from_u64(config.seed),
            horizon_s: config.sim_time_limit_s,
        })
    }

    pub fn nodes(&self) -> &HashMap<u32, NodeKind> {
        &self.nodes
    }

    pub fn run(&mut self) {
        while let Some((t, event)) = self.scheduler.pop() {
            if t > self.horizon_s {
                break;
            }
            self.dispatch(event);
        }
    }

    fn dispatch(&mut self, event: Event) {
        match event {
            Event::SatellitePositionTick(id) => self.on_satellite_tick(id),
            Event::GroundHandoverTick(id) => self.on_handover_tick(id),
            Event::TrafficTick(id) => self.on_traffic_tick(id),
            Event::LinkArrival { to, packet } => self.on_link_arrival(to, packet),
            Event::AdvertisementArrival { to, from, advertisement } => {
                self.on_advertisement_arrival(to, from, advertisement)
            }
            Event::SelfWake(id) => {
                self.set_wake_pending(id, false);
                self.process_tx_queue(id);
            }
        }
    }

    fn position_of(&self, peer_id: u32, now: f64) -> EcefPosition {
        if let Some(orbit) = self.satellite_orbits.get(&peer_id) {
            propagate(orbit, now)
        } else {
            self.ground_positions[&peer_id]
        }
    }

    /// C5 + C6 broadcast, run every 1s for each satellite.
    fn on_satellite_tick(&mut self, sat_id: u32) {
        let now = self.scheduler.now();
        let my_pos = propagate(&self.satellite_orbits[&sat_id], now);
        let my_range = self.satellite_max_isl_range[&sat_id];

        // Immutable phase: snapshot peer distances before mutating `sat`,
        // since peers live in the same `nodes` map.
        let mut peer_distances: Vec<(u32, f64, bool)> = Vec::new();
        if let Some(NodeKind::Satellite(sat)) = self.nodes.get(&sat_id) {
            for (&peer_id, gate) in sat.gates.iter() {
                if !gate.connected {
                    continue;
                }
                let is_satellite = self.satellite_orbits.contains_key(&peer_id);
                let peer_pos = self.position_of(peer_id, now);
                peer_distances.push((peer_id, my_pos.distance_to(&peer_pos), is_satellite));
            }
        }

        let mut neighbours = Vec::with_capacity(peer_distances.len());
        if let Some(NodeKind::Satellite(sat)) = self.nodes.get_mut(&sat_id) {
            sat.position = my_pos;
            for &(peer_id, distance, is_satellite) in &peer_distances {
                if is_satellite {
                    if let Some(gate) = sat.gates.get_mut(&peer_id) {
                        gate.link.set_delay(distance / SPEED_OF_LIGHT_KM_S + LINK_PROCESSING_DELAY_S);
                    }
                    if distance <= my_range {
                        neighbours.push((peer_id, distance));
                    }
                } else {
                    // Ground-station peer: always a current neighbour
                    // while attached (§4.5 step 2); its link delay was
                    // fixed at attach time (§4.7) and is not refreshed
                    // here — only the routing cost is.
                    neighbours.push((peer_id, distance));
                }
            }
            sat.neighbours = neighbours.clone();
            sat.routing.local_update(&neighbours);
        }

        if let Some(NodeKind::Satellite(sat)) = self.nodes.get(&sat_id) {
            let advertisement = sat.routing.build_advertisement(sat_id);
            for (peer_id, _distance) in &neighbours {
                self.scheduler
                    .schedule_at(now, Event::AdvertisementArrival { to: *peer_id, from: sat_id, advertisement: advertisement.clone() })
                    .expect("advertisements are scheduled at the current tick time");
            }
        }

        self.scheduler
            .schedule_at(now + TICK_PERIOD_S, Event::SatellitePositionTick(sat_id))
            .expect("periodic ticks always schedule strictly into the future");
    }

    fn on_advertisement_arrival(&mut self, to: u32, from: u32, advertisement: RoutingAdvertisement) {
        if let Some(NodeKind::Satellite(sat)) = self.nodes.get_mut(&to) {
            let link_cost = sat
                .neighbours
                .iter()
                .find(|&&(id, _)| id == from)
                .map(|&(_, d)| d)
                .unwrap_or(f64::INFINITY);
            sat.routing.receive(to, link_cost, &advertisement);
        }
    }

    /// C7, run every 1s for each ground station.
    fn on_handover_tick(&mut self, gs_addr: u32) {
        let now = self.scheduler.now();
        let gs_pos = self.ground_positions[&gs_addr];
        let max_range = self.ground_max_range[&gs_addr];

        let candidates: Vec<(u32, EcefPosition)> = self
            .satellite_orbits
            .iter()
            .map(|(&id, orbit)| (id, propagate(orbit, now)))
            .collect();
        let best = find_nearest(&gs_pos, candidates, max_range);

        let action = match self.nodes.get_mut(&gs_addr) {
            Some(NodeKind::GroundStation(gs)) => gs.handover.decide(best),
            _ => return,
        };

        match action {
            HandoverAction::NoChange => {}
            HandoverAction::Detach { satellite_id, .. } => {
                self.tear_down_link(gs_addr, satellite_id);
                if let Some(NodeKind::GroundStation(gs)) = self.nodes.get_mut(&gs_addr) {
                    gs.handover = HandoverState::Unattached;
                }
                debug!(ground_station = gs_addr, satellite_id, "handover: detached");
            }
            HandoverAction::Attach { satellite_id } => {
                self.wire_attach(gs_addr, satellite_id, now);
                debug!(ground_station = gs_addr, satellite_id, "handover: attached");
            }
            HandoverAction::Reattach { old_satellite_id, new_satellite_id, .. } => {
                self.tear_down_link(gs_addr, old_satellite_id);
                self.wire_attach(gs_addr, new_satellite_id, now);
                debug!(ground_station = gs_addr, old_satellite_id, new_satellite_id, "handover: reattached");
            }
        }

        self.scheduler
            .schedule_at(now + TICK_PERIOD_S, Event::GroundHandoverTick(gs_addr))
            .expect("periodic ticks always schedule strictly into the future");
    }

    fn tear_down_link(&mut self, gs_addr: u32, satellite_id: u32) {
        if let Some(NodeKind::GroundStation(gs)) = self.nodes.get_mut(&gs_addr) {
            gs.gates.remove(&satellite_id);
        }
        if let Some(NodeKind::Satellite(sat)) = self.nodes.get_mut(&satellite_id) {
            sat.gates.remove(&gs_addr);
            sat.neighbours.retain(|&(id, _)| id != gs_addr);
        }
    }

    fn wire_attach(&mut self, gs_addr: u32, satellite_id: u32, now: f64) {
        let sat_pos = propagate(&self.satellite_orbits[&satellite_id], now);
        let distance = self.ground_positions[&gs_addr].distance_to(&sat_pos);
        let delay_s = distance / SPEED_OF_LIGHT_KM_S + LINK_PROCESSING_DELAY_S;

        let gate_idx = {
            let counter = self.next_gs_gate_idx.entry(satellite_id).or_insert(0);
            let idx = *counter;
            *counter += 1;
            idx
        };

        if let Some(NodeKind::Satellite(sat)) = self.nodes.get_mut(&satellite_id) {
            sat.gates
                .insert(gs_addr, OutboundGate { link: Link::new(GS_LINK_DATARATE_BPS, delay_s), connected: true });
        }
        if let Some(NodeKind::GroundStation(gs)) = self.nodes.get_mut(&gs_addr) {
            gs.gates
                .insert(satellite_id, OutboundGate { link: Link::new(GS_LINK_DATARATE_BPS, delay_s), connected: true });
            gs.handover = HandoverState::Attached { satellite_id, gate_idx };
        }
    }

    /// C8, run every `sendInterval` for each ground station.
    fn on_traffic_tick(&mut self, gs_addr: u32) {
        let now = self.scheduler.now();
        let (send_interval, enqueued) = match self.nodes.get_mut(&gs_addr) {
            Some(NodeKind::GroundStation(gs)) => {
                let destination = gs.role.pick_destination(&mut self.rng);
                let packet = DataPacket {
                    source: gs_addr,
                    destination,
                    packet_id: gs.packet_gen.next(),
                    hop_count: 0,
                    creation_time: now,
                    bit_length: gs.packet_bit_length,
                };
                gs.stats.record_sent();
                match gs.serving_satellite() {
                    None => {
                        gs.stats.record_dropped();
                        debug!(ground_station = gs_addr, "drop: no-serving-satellite");
                        (gs.send_interval_s, None)
                    }
                    Some(satellite_id) => {
                        if gs.queue.enqueue(QueuedMessage { next_hop: satellite_id, packet }) {
                            (gs.send_interval_s, Some(()))
                        } else {
                            gs.stats.record_dropped();
                            debug!(ground_station = gs_addr, "drop: queue-overflow");
                            (gs.send_interval_s, None)
                        }
                    }
                }
            }
            _ => return,
        };

        self.scheduler
            .schedule_at(now + send_interval, Event::TrafficTick(gs_addr))
            .expect("periodic ticks always schedule strictly into the future");

        if enqueued.is_some() {
            self.process_tx_queue(gs_addr);
        }
    }

    fn on_link_arrival(&mut self, to: u32, packet: DataPacket) {
        let now = self.scheduler.now();
        match self.nodes.get_mut(&to) {
            Some(NodeKind::GroundStation(gs)) => {
                gs.stats.record_received(&packet, now);
            }
            Some(NodeKind::Satellite(sat)) => {
                match sat.routing.lookup(packet.destination) {
                    None => {
                        sat.stats.record_dropped();
                        sat.stats.record_forward_failure();
                        debug!(satellite_id = to, destination = packet.destination, "drop: no-route");
                    }
                    Some(entry) => {
                        let forwarded = packet.forwarded();
                        if !sat.queue.enqueue(QueuedMessage { next_hop: entry.next_hop, packet: forwarded }) {
                            sat.stats.record_dropped();
                            sat.stats.record_forward_failure();
                            debug!(satellite_id = to, "drop: queue-overflow");
                        }
                    }
                }
                self.process_tx_queue(to);
            }
            None => {}
        }
    }

    fn set_wake_pending(&mut self, node_id: u32, pending: bool) {
        match self.nodes.get_mut(&node_id) {
            Some(NodeKind::Satellite(s)) => s.wake_pending = pending,
            Some(NodeKind::GroundStation(g)) => g.wake_pending = pending,
            None => {}
        }
    }

    /// C4: drain as much of `node_id`'s transmit queue as the link
    /// discipline allows. Runs the same loop for satellites and ground
    /// stations; only satellites bump the forward/forward-failure
    /// counters, since they alone act as routers (§3).
    fn process_tx_queue(&mut self, node_id: u32) {
        let now = self.scheduler.now();
        let mut to_schedule: Vec<(f64, Event)> = Vec::new();

        {
            let (queue, gates, wake_pending, stats, is_satellite) = match self.nodes.get_mut(&node_id) {
                Some(NodeKind::Satellite(s)) => (&mut s.queue, &mut s.gates, &mut s.wake_pending, &mut s.stats, true),
                Some(NodeKind::GroundStation(g)) => (&mut g.queue, &mut g.gates, &mut g.wake_pending, &mut g.stats, false),
                None => return,
            };

            loop {
                let Some(msg) = queue.peek() else { break };
                let next_hop = msg.next_hop;
                match gates.get_mut(&next_hop) {
                    None => {
                        queue.pop();
                        stats.record_dropped();
                        if is_satellite {
                            stats.record_forward_failure();
                        }
                    }
                    Some(gate) if !gate.connected => {
                        queue.pop();
                        stats.record_dropped();
                        if is_satellite {
                            stats.record_forward_failure();
                        }
                    }
                    Some(gate) => {
                        if gate.link.is_busy(now) {
                            if !*wake_pending {
                                *wake_pending = true;
                                to_schedule.push((gate.link.busy_until, Event::SelfWake(node_id)));
                            }
                            break;
                        }
                        let msg = queue.pop().expect("just peeked");
                        let arrival = gate
                            .link
                            .try_transmit(now, msg.packet.bit_length)
                            .expect("link was just confirmed free");
                        if is_satellite {
                            stats.record_forwarded(&msg.packet, now);
                        }
                        to_schedule.push((arrival, Event::LinkArrival { to: next_hop, packet: msg.packet }));
                    }
                }
            }
        }

        for (t, ev) in to_schedule {
            self.scheduler
                .schedule_at(t, ev)
                .expect("arrivals and wakes are always scheduled strictly into the future");
        }
    }
}
