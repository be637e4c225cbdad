//! Constellation topology, distance-vector routing, and ground-station
//! handover.
//!
//! The physical inter-satellite-link mesh ([`IslMesh`]) is built once at
//! scenario construction. Everything else here — neighbour-set
//! recomputation, the distance-vector table, and the ground-station
//! handover state machine — runs every topology tick (nominally 1 Hz of
//! virtual time) as the constellation moves.

use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use std::collections::HashMap;
use thiserror::Error;

pub mod handover;
pub mod routing;

pub use handover::{HandoverState, NearestSatellite};
pub use routing::{RoutingAdvertisement, RoutingEntry, RoutingTable};

#[derive(Error, Debug)]
pub enum TopologyError {
    #[error("satellite {0} is not present in the ISL mesh")]
    UnknownSatellite(u32),
}

pub type Result<T> = std::result::Result<T, TopologyError>;

/// The static physical ISL mesh: which satellite pairs have a laser
/// link and at what datarate. Built once from the scenario's topology
/// section and never mutated afterward — range-based disabling at
/// runtime (§4.5) only affects whether a link counts as a *routing*
/// neighbour, not whether the physical edge exists.
pub struct IslMesh {
    graph: UnGraph<u32, f64>,
    index: HashMap<u32, NodeIndex>,
}

impl IslMesh {
    pub fn new() -> Self {
        Self {
            graph: UnGraph::new_undirected(),
            index: HashMap::new(),
        }
    }

    pub fn ensure_satellite(&mut self, satellite_id: u32) -> NodeIndex {
        *self
            .index
            .entry(satellite_id)
            .or_insert_with(|| self.graph.add_node(satellite_id))
    }

    pub fn add_edge(&mut self, a: u32, b: u32, datarate_bps: f64) {
        let a_idx = self.ensure_satellite(a);
        let b_idx = self.ensure_satellite(b);
        self.graph.add_edge(a_idx, b_idx, datarate_bps);
    }

    /// All physical ISL peers of `satellite_id`, regardless of current
    /// range — the static mesh, not the dynamic neighbour set.
    pub fn physical_peers(&self, satellite_id: u32) -> Result<Vec<(u32, f64)>> {
        let idx = self
            .index
            .get(&satellite_id)
            .copied()
            .ok_or(TopologyError::UnknownSatellite(satellite_id))?;
        Ok(self
            .graph
            .edges(idx)
            .map(|e| {
                let other = if e.source() == idx { e.target() } else { e.source() };
                (self.graph[other], *e.weight())
            })
            .collect())
    }

    pub fn satellite_count(&self) -> usize {
        self.graph.node_count()
    }
}

impl Default for IslMesh {
    fn default() -> Self {
        Self::new()
    }
}
