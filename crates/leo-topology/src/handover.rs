//! Ground-station handover state machine (C7).
//!
//! Nearest-satellite selection is pure (see [`find_nearest`]); the
//! attach/detach transition itself ([`HandoverState::decide`]) only
//! decides *what* must change. Gate allocation on the serving satellite
//! and link construction are driven externally, since both mutate state
//! (the satellite's gate array) that this module does not own.

use leo_geodesy::EcefPosition;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandoverState {
    Unattached,
    Attached { satellite_id: u32, gate_idx: usize },
}

impl Default for HandoverState {
    fn default() -> Self {
        HandoverState::Unattached
    }
}

/// A candidate serving satellite and its distance to the ground station.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearestSatellite {
    pub satellite_id: u32,
    pub distance_km: f64,
}

/// What a handover tick requires the caller to do. The caller applies
/// these side effects (tearing down/creating links, allocating gate
/// indices) and then updates the ground station's [`HandoverState`]
/// accordingly — this module never mutates satellite state directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandoverAction {
    /// `best == current`; nothing to do.
    NoChange,
    /// Currently attached to a satellite that is no longer the nearest
    /// (or no longer in range), and no replacement is in range either.
    Detach { satellite_id: u32, gate_idx: usize },
    /// Not currently attached, and a satellite is now in range.
    Attach { satellite_id: u32 },
    /// Currently attached to one satellite but a different one is now
    /// the nearest in-range satellite: tear down the old link, then
    /// attach to the new one.
    Reattach { old_satellite_id: u32, old_gate_idx: usize, new_satellite_id: u32 },
}

/// Scan all satellites, keep the one at minimum ECEF distance that is
/// within `max_range_km`. Ties broken by satellite id for determinism.
pub fn find_nearest<I>(ground_station: &EcefPosition, satellites: I, max_range_km: f64) -> Option<NearestSatellite>
where
    I: IntoIterator<Item = (u32, EcefPosition)>,
{
    satellites
        .into_iter()
        .map(|(satellite_id, pos)| NearestSatellite {
            satellite_id,
            distance_km: ground_station.distance_to(&pos),
        })
        .filter(|candidate| candidate.distance_km <= max_range_km)
        .min_by(|a, b| {
            a.distance_km
                .partial_cmp(&b.distance_km)
                .unwrap()
                .then_with(|| a.satellite_id.cmp(&b.satellite_id))
        })
}

impl HandoverState {
    /// Decide the action for this tick given the currently-nearest
    /// in-range satellite (`None` if none is in range).
    pub fn decide(&self, best: Option<NearestSatellite>) -> HandoverAction {
        match (*self, best) {
            (HandoverState::Unattached, None) => HandoverAction::NoChange,
            (HandoverState::Unattached, Some(best)) => HandoverAction::Attach {
                satellite_id: best.satellite_id,
            },
            (HandoverState::Attached { satellite_id, .. }, Some(best)) if satellite_id == best.satellite_id => {
                HandoverAction::NoChange
            }
            (HandoverState::Attached { satellite_id, gate_idx }, Some(best)) => HandoverAction::Reattach {
                old_satellite_id: satellite_id,
                old_gate_idx: gate_idx,
                new_satellite_id: best.satellite_id,
            },
            (HandoverState::Attached { satellite_id, gate_idx }, None) => HandoverAction::Detach {
                satellite_id,
                gate_idx,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(x: f64) -> EcefPosition {
        EcefPosition { x_km: x, y_km: 0.0, z_km: 0.0 }
    }

    #[test]
    fn nearest_picks_closest_in_range() {
        let gs = pos(0.0);
        let sats = vec![(1, pos(2000.0)), (2, pos(500.0)), (3, pos(10_000.0))];
        let nearest = find_nearest(&gs, sats, 3000.0).unwrap();
        assert_eq!(nearest.satellite_id, 2);
    }

    #[test]
    fn nearest_excludes_out_of_range() {
        let gs = pos(0.0);
        let sats = vec![(1, pos(5000.0))];
        assert!(find_nearest(&gs, sats, 1000.0).is_none());
    }

    #[test]
    fn unattached_with_candidate_attaches() {
        let state = HandoverState::Unattached;
        let action = state.decide(Some(NearestSatellite { satellite_id: 7, distance_km: 100.0 }));
        assert_eq!(action, HandoverAction::Attach { satellite_id: 7 });
    }

    #[test]
    fn attached_to_current_best_is_no_change() {
        let state = HandoverState::Attached { satellite_id: 7, gate_idx: 0 };
        let action = state.decide(Some(NearestSatellite { satellite_id: 7, distance_km: 100.0 }));
        assert_eq!(action, HandoverAction::NoChange);
    }

    #[test]
    fn attached_with_no_candidate_detaches() {
        let state = HandoverState::Attached { satellite_id: 7, gate_idx: 2 };
        let action = state.decide(None);
        assert_eq!(action, HandoverAction::Detach { satellite_id: 7, gate_idx: 2 });
    }

    #[test]
    fn attached_with_better_candidate_reattaches() {
        let state = HandoverState::Attached { satellite_id: 7, gate_idx: 2 };
        let action = state.decide(Some(NearestSatellite { satellite_id: 9, distance_km: 50.0 }));
        assert_eq!(
            action,
            HandoverAction::Reattach { old_satellite_id: 7, old_gate_idx: 2, new_satellite_id: 9 }
        );
    }
}
