//! Event payloads dispatched by the global scheduler (§4.2, §9).
//!
//! A tagged variant over a small closed set, not subclassing — exactly
//! what §9's "Message polymorphism" note asks for. `Event` carries the
//! target node implicitly through the variant's own fields rather than
//! as a separate field, since every variant already names the node(s)
//! it applies to.

use leo_topology::RoutingAdvertisement;
use leo_traffic::DataPacket;

#[derive(Debug, Clone)]
pub enum Event {
    /// Recurring every 1s starting at t=1.0 (§4.9): recompute position,
    /// refresh neighbours/link delays, run local routing update, and
    /// broadcast an advertisement (C5+C6).
    SatellitePositionTick(u32),
    /// Recurring every 1s starting at t=1.0 (§4.9): re-run nearest-
    /// satellite selection and apply the resulting handover action (C7).
    GroundHandoverTick(u32),
    /// Recurring every `sendInterval` seconds starting at t=sendInterval
    /// (§4.9): generate one data packet (C8).
    TrafficTick(u32),
    /// A data packet reaching the head of a transmission that has now
    /// completed propagation; delivered to `to` (C3/C4 arrival).
    LinkArrival { to: u32, packet: DataPacket },
    /// A routing advertisement delivered to `to` from `from`. Modelled
    /// as instantaneous and out of band from the bandwidth-limited
    /// transmit queue (see DESIGN.md) — only data packets contend for
    /// link capacity.
    AdvertisementArrival { to: u32, from: u32, advertisement: RoutingAdvertisement },
    /// A node's link became free while its queue was non-empty; retry
    /// `process_tx_queue` (C4). At most one outstanding per node.
    SelfWake(u32),
}
