//! Distance-vector routing engine (C6).
//!
//! A minimal DV protocol with no split-horizon and no count-to-infinity
//! mitigation (§4.6, §9). Each topology tick refreshes the direct-neighbour
//! entries only; entries for farther destinations persist across ticks and
//! are only ever replaced by a strictly cheaper route learned via
//! `receive`. This is what "the topology refresh fully rebuilds local
//! entries" (§4.6) means in practice — "local" as in direct, not the whole
//! table — and it's what makes multi-hop routes converge at all: a node's
//! broadcast always reflects whatever indirect knowledge it has accumulated
//! since the last tick, not just its direct neighbours.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoutingEntry {
    pub next_hop: u32,
    pub cost: f64,
}

/// `{source, [(destination, cost)]}` including a self-entry with cost 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingAdvertisement {
    pub source: u32,
    pub entries: Vec<(u32, f64)>,
}

/// destination -> (next-hop, cost). At most one entry per destination.
#[derive(Debug, Clone, Default)]
pub struct RoutingTable {
    entries: HashMap<u32, RoutingEntry>,
}

impl RoutingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&self, destination: u32) -> Option<RoutingEntry> {
        self.entries.get(&destination).copied()
    }

    pub fn entries(&self) -> impl Iterator<Item = (u32, RoutingEntry)> + '_ {
        self.entries.iter().map(|(dest, entry)| (*dest, *entry))
    }

    /// Refresh the direct-neighbour entries against the current
    /// neighbour set: each neighbour gets a direct entry at its measured
    /// distance, overwriting whatever was there before. Entries for
    /// destinations that are not current neighbours are left untouched —
    /// this does not clear the table, so routes learned indirectly via
    /// `receive` survive across ticks. Run after every topology tick,
    /// before advertisements are sent.
    pub fn local_update(&mut self, neighbours: &[(u32, f64)]) {
        for &(peer, distance) in neighbours {
            self.entries.insert(
                peer,
                RoutingEntry {
                    next_hop: peer,
                    cost: distance,
                },
            );
        }
    }

    /// Build the advertisement to broadcast to all current neighbours:
    /// every (destination, cost) in the table, plus a self-entry.
    pub fn build_advertisement(&self, self_address: u32) -> RoutingAdvertisement {
        let mut entries: Vec<(u32, f64)> = self
            .entries
            .iter()
            .map(|(dest, e)| (*dest, e.cost))
            .collect();
        entries.push((self_address, 0.0));
        RoutingAdvertisement {
            source: self_address,
            entries,
        }
    }

    /// Process an advertisement received from `advertisement.source`,
    /// reached over a link of cost `link_cost`. Strictly-less-than
    /// replacement only — ties keep the older route, avoiding
    /// oscillation (§4.6).
    pub fn receive(&mut self, self_address: u32, link_cost: f64, advertisement: &RoutingAdvertisement) {
        let source = advertisement.source;
        for &(dest, cost_at_source) in &advertisement.entries {
            if dest == self_address {
                continue;
            }
            let total = cost_at_source + link_cost;
            match self.entries.get(&dest) {
                Some(existing) if total < existing.cost => {
                    self.entries.insert(dest, RoutingEntry { next_hop: source, cost: total });
                }
                None => {
                    self.entries.insert(dest, RoutingEntry { next_hop: source, cost: total });
                }
                _ => {}
            }
        }
    }
}
