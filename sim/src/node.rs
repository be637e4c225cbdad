//! Per-node runtime state for satellites and ground stations.
//!
//! Both node kinds share the same outbound-gate/transmit-queue shape
//! (C3/C4); what differs is what drives their gates (the static ISL
//! mesh plus 1 Hz topology ticks for satellites, the handover state
//! machine for ground stations) and what they do with an arriving
//! data packet (route it onward, or treat it as delivered).

use leo_geodesy::EcefPosition;
use leo_sim_core::{Link, TxQueue, DEFAULT_QUEUE_CAPACITY};
use leo_topology::{HandoverState, RoutingTable};
use leo_traffic::{DataPacket, NodeStats, PacketIdGenerator, TrafficRole};
use std::collections::HashMap;

/// Datarate used for every ground-to-satellite dynamic link (§4.7).
pub const GS_LINK_DATARATE_BPS: f64 = 4.0e9;

/// A data packet sitting in a node's transmit queue, already resolved
/// to the peer it will leave on. Resolution happens once, at enqueue
/// time (route lookup or "my one serving satellite"); if the gate
/// disappears before the packet reaches the head of the queue, that's
/// a gate-disconnected drop (§4.4, §7).
#[derive(Debug, Clone)]
pub struct QueuedMessage {
    pub next_hop: u32,
    pub packet: DataPacket,
}

/// One outbound half-link (§3 Link). `connected` tracks whether the
/// peer is currently reachable at all; a satellite ISL gate stays
/// `connected` even when the peer drifts out of `maxISLRange` — that
/// only removes it from the *routing* neighbour set (§4.5), it does
/// not tear down the physical channel.
#[derive(Debug, Clone)]
pub struct OutboundGate {
    pub link: Link,
    pub connected: bool,
}

#[derive(Debug)]
pub struct Satellite {
    pub id: u32,
    /// Cached for introspection/metrics only; always re-derivable from
    /// the orbit parameters and the current virtual time (§4.1).
    pub position: EcefPosition,
    /// Keyed by peer id (satellite id or ground-station address) —
    /// the two address spaces are disjoint by scenario validation, so
    /// one map serves both the static ISL gates and any ground
    /// stations currently attached to this satellite.
    pub gates: HashMap<u32, OutboundGate>,
    /// Current routing neighbours and their distance, rebuilt every
    /// topology tick (§4.5 step 3).
    pub neighbours: Vec<(u32, f64)>,
    pub routing: RoutingTable,
    pub queue: TxQueue<QueuedMessage>,
    pub wake_pending: bool,
    pub stats: NodeStats,
}

impl Satellite {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            position: EcefPosition { x_km: 0.0, y_km: 0.0, z_km: 0.0 },
            gates: HashMap::new(),
            neighbours: Vec::new(),
            routing: RoutingTable::new(),
            queue: TxQueue::new(DEFAULT_QUEUE_CAPACITY),
            wake_pending: false,
            stats: NodeStats::new(),
        }
    }
}

#[derive(Debug)]
pub struct GroundStation {
    pub address: u32,
    pub handover: HandoverState,
    /// At most one entry: the link to the currently-serving satellite,
    /// if any. Recreated from scratch on every handover (§4.7).
    pub gates: HashMap<u32, OutboundGate>,
    pub queue: TxQueue<QueuedMessage>,
    pub wake_pending: bool,
    pub stats: NodeStats,
    pub role: TrafficRole,
    pub packet_gen: PacketIdGenerator,
    pub packet_bit_length: f64,
    pub send_interval_s: f64,
}

impl GroundStation {
    pub fn new(address: u32, role: TrafficRole, packet_size_bytes: u64, send_interval_s: f64) -> Self {
        Self {
            address,
            handover: HandoverState::Unattached,
            gates: HashMap::new(),
            queue: TxQueue::new(DEFAULT_QUEUE_CAPACITY),
            wake_pending: false,
            stats: NodeStats::new(),
            role,
            packet_gen: PacketIdGenerator::default(),
            packet_bit_length: (packet_size_bytes * 8) as f64,
            send_interval_s,
        }
    }

    /// The satellite currently serving this ground station, if attached.
    pub fn serving_satellite(&self) -> Option<u32> {
        match self.handover {
            HandoverState::Attached { satellite_id, .. } => Some(satellite_id),
            HandoverState::Unattached => None,
        }
    }
}

pub enum NodeKind {
    Satellite(Satellite),
    GroundStation(GroundStation),
}
