//! Traffic generation and delivery statistics (C8).
//!
//! Each ground station generates one [`DataPacket`] every `sendInterval`
//! according to its [`TrafficRole`]; [`NodeStats`] accumulates what every
//! node (satellite or ground station) needs to report at the end of a run.

use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DataPacket {
    pub source: u32,
    pub destination: u32,
    pub packet_id: u64,
    pub hop_count: u32,
    pub creation_time: f64,
    pub bit_length: f64,
}

impl DataPacket {
    pub fn forwarded(self) -> Self {
        Self {
            hop_count: self.hop_count + 1,
            ..self
        }
    }
}

/// Role-based source/destination selection (§4.8): the hub sends to a
/// uniformly chosen leaf; every leaf always sends to the hub.
#[derive(Debug, Clone)]
pub enum TrafficRole {
    Hub { leaves: Vec<u32> },
    Leaf { hub: u32 },
}

impl TrafficRole {
    pub fn pick_destination(&self, rng: &mut impl Rng) -> u32 {
        match self {
            TrafficRole::Hub { leaves } => {
                let idx = rng.gen_range(0..leaves.len());
                leaves[idx]
            }
            TrafficRole::Leaf { hub } => *hub,
        }
    }
}

/// Monotonic per-source packet-id generator.
#[derive(Debug, Default)]
pub struct PacketIdGenerator(u64);

impl PacketIdGenerator {
    pub fn next(&mut self) -> u64 {
        let id = self.0;
        self.0 += 1;
        id
    }
}

/// Per-node delivery/forwarding statistics (§6 outputs).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeStats {
    pub packets_sent: u64,
    pub packets_received: u64,
    pub packets_dropped: u64,
    pub packets_forwarded: u64,
    pub forward_failures: u64,
    bits_received: f64,
    forwarded_bits: f64,
    first_receive_time: Option<f64>,
    last_receive_time: Option<f64>,
    first_forward_time: Option<f64>,
    last_forward_time: Option<f64>,
    pub end_to_end_delays: Vec<f64>,
    pub hop_counts: Vec<u32>,
}

impl NodeStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_sent(&mut self) {
        self.packets_sent += 1;
    }

    pub fn record_dropped(&mut self) {
        self.packets_dropped += 1;
    }

    /// Record a final-destination delivery.
    pub fn record_received(&mut self, packet: &DataPacket, now: f64) {
        self.packets_received += 1;
        self.bits_received += packet.bit_length;
        self.end_to_end_delays.push(now - packet.creation_time);
        self.hop_counts.push(packet.hop_count);
        self.first_receive_time.get_or_insert(now);
        self.last_receive_time = Some(now);
    }

    /// Record a successful forward — this node was an intermediate hop,
    /// not the final destination.
    pub fn record_forwarded(&mut self, packet: &DataPacket, now: f64) {
        self.packets_forwarded += 1;
        self.forwarded_bits += packet.bit_length;
        self.first_forward_time.get_or_insert(now);
        self.last_forward_time = Some(now);
    }

    pub fn record_forward_failure(&mut self) {
        self.forward_failures += 1;
    }

    /// total_bits_received / (last - first); 0 until at least two
    /// distinct-time deliveries have been recorded.
    pub fn throughput_bps(&self) -> f64 {
        match (self.first_receive_time, self.last_receive_time) {
            (Some(first), Some(last)) if last > first => self.bits_received / (last - first),
            _ => 0.0,
        }
    }

    pub fn forward_throughput_bps(&self) -> f64 {
        match (self.first_forward_time, self.last_forward_time) {
            (Some(first), Some(last)) if last > first => self.forwarded_bits / (last - first),
            _ => 0.0,
        }
    }

    /// total_success / (total_success + drops); 1.0 if the node never saw
    /// any traffic at all.
    pub fn packet_delivery_ratio(&self) -> f64 {
        let success = self.packets_received;
        let total = success + self.packets_dropped;
        if total == 0 {
            1.0
        } else {
            success as f64 / total as f64
        }
    }

    pub fn forward_success_rate(&self) -> f64 {
        let total = self.packets_forwarded + self.forward_failures;
        if total == 0 {
            1.0
        } else {
            self.packets_forwarded as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn leaf_always_targets_hub() {
        let role = TrafficRole::Leaf { hub: 99 };
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..5 {
            assert_eq!(role.pick_destination(&mut rng), 99);
        }
    }

    #[test]
    fn hub_targets_one_of_its_leaves() {
        let leaves = vec![101, 102, 103];
        let role = TrafficRole::Hub { leaves: leaves.clone() };
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..20 {
            assert!(leaves.contains(&role.pick_destination(&mut rng)));
        }
    }

    #[test]
    fn packet_id_generator_is_monotonic() {
        let mut gen = PacketIdGenerator::default();
        assert_eq!(gen.next(), 0);
        assert_eq!(gen.next(), 1);
        assert_eq!(gen.next(), 2);
    }

    #[test]
    fn idle_node_has_perfect_delivery_ratio() {
        let stats = NodeStats::new();
        assert_eq!(stats.packet_delivery_ratio(), 1.0);
        assert_eq!(stats.forward_success_rate(), 1.0);
        assert_eq!(stats.throughput_bps(), 0.0);
    }

    #[test]
    fn throughput_derived_from_span_between_first_and_last() {
        let mut stats = NodeStats::new();
        let packet = DataPacket {
            source: 1,
            destination: 2,
            packet_id: 0,
            hop_count: 1,
            creation_time: 0.0,
            bit_length: 8192.0,
        };
        stats.record_received(&packet, 1.0);
        stats.record_received(&packet, 2.0);
        assert!((stats.throughput_bps() - (8192.0 * 2.0 / 1.0)).abs() < 1e-9);
    }

    #[test]
    fn delivery_ratio_counts_drops_against_successes() {
        let mut stats = NodeStats::new();
        let packet = DataPacket {
            source: 1,
            destination: 2,
            packet_id: 0,
            hop_count: 0,
            creation_time: 0.0,
            bit_length: 1024.0,
        };
        stats.record_received(&packet, 1.0);
        stats.record_dropped();
        stats.record_dropped();
        assert!((stats.packet_delivery_ratio() - (1.0 / 3.0)).abs() < 1e-9);
    }
}
