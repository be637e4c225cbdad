//! Result scalar/vector collection and emission (C12, §6 Outputs).
//!
//! `RunMetrics` is the typed record built from every node's
//! [`NodeStats`] at the end of a run. It is emitted two ways: a plain
//! tabular `Display` impl for humans, and a `serde_json` dump for
//! programmatic consumers — mirroring the dual text/JSON preference
//! already established in this workspace's `candidate-selector` crate.

use crate::engine::Simulation;
use crate::node::NodeKind;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Serialize)]
pub struct NodeScalars {
    pub node_id: u32,
    pub kind: &'static str,
    pub packets_sent: u64,
    pub packets_received: u64,
    pub packets_dropped: u64,
    pub packets_forwarded: u64,
    pub throughput_bps: f64,
    pub forward_throughput_bps: f64,
    pub packet_delivery_ratio: f64,
    pub forward_success_rate: f64,
    pub end_to_end_delay: Vec<f64>,
    pub hop_count: Vec<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunMetrics {
    pub nodes: Vec<NodeScalars>,
}

impl RunMetrics {
    pub fn from_simulation(sim: &Simulation) -> Self {
        let mut nodes: Vec<NodeScalars> = sim
            .nodes()
            .iter()
            .map(|(&id, node)| {
                let (kind, stats) = match node {
                    NodeKind::Satellite(s) => ("satellite", &s.stats),
                    NodeKind::GroundStation(g) => ("ground-station", &g.stats),
                };
                NodeScalars {
                    node_id: id,
                    kind,
                    packets_sent: stats.packets_sent,
                    packets_received: stats.packets_received,
                    packets_dropped: stats.packets_dropped,
                    packets_forwarded: stats.packets_forwarded,
                    throughput_bps: stats.throughput_bps(),
                    forward_throughput_bps: stats.forward_throughput_bps(),
                    packet_delivery_ratio: stats.packet_delivery_ratio(),
                    forward_success_rate: stats.forward_success_rate(),
                    end_to_end_delay: stats.end_to_end_delays.clone(),
                    hop_count: stats.hop_counts.clone(),
                }
            })
            .collect();
        nodes.sort_by_key(|n| n.node_id);
        Self { nodes }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for RunMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<8}{:<16}{:>10}{:>10}{:>10}{:>12}{:>16}{:>16}{:>10}{:>10}",
            "node", "kind", "sent", "recv", "dropped", "forwarded", "thpt_bps", "fwd_thpt_bps", "pdr", "fsr"
        )?;
        for n in &self.nodes {
            writeln!(
                f,
                "{:<8}{:<16}{:>10}{:>10}{:>10}{:>12}{:>16.1}{:>16.1}{:>10.3}{:>10.3}",
                n.node_id,
                n.kind,
                n.packets_sent,
                n.packets_received,
                n.packets_dropped,
                n.packets_forwarded,
                n.throughput_bps,
                n.forward_throughput_bps,
                n.packet_delivery_ratio,
                n.forward_success_rate,
            )?;
        }
        Ok(())
    }
}
