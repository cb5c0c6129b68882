//! Observation encoding.
//!
//! Exactly one encoding is active per environment instance; the builder
//! produces values whose size always matches the declared observation space.

use std::collections::BTreeMap;

use crate::env::config::ObservationEncoding;
use crate::roadnet::NetworkTopology;
use crate::LaneId;

/// A single observation, in the instance's active encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observation {
    /// Per-lane waiting counts in topology lane order, then the last
    /// commanded phase per controllable intersection.
    Flat(Vec<u32>),
    /// Values keyed by `"{intersection}_phase"` and
    /// `"{intersection}_{lane}_{running|waiting}_vehicle_count"`.
    Keyed(BTreeMap<String, u32>),
}

impl Observation {
    /// Number of scalar components.
    pub fn len(&self) -> usize {
        match self {
            Observation::Flat(v) => v.len(),
            Observation::Keyed(m) => m.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The flat vector, when the flat encoding is active.
    pub fn as_flat(&self) -> Option<&[u32]> {
        match self {
            Observation::Flat(v) => Some(v),
            Observation::Keyed(_) => None,
        }
    }

    /// The keyed map, when the keyed encoding is active.
    pub fn as_keyed(&self) -> Option<&BTreeMap<String, u32>> {
        match self {
            Observation::Flat(_) => None,
            Observation::Keyed(m) => Some(m),
        }
    }
}

/// Builds observations from freshly read per-lane metrics and the
/// adapter-tracked phase state.
pub struct ObservationBuilder;

impl ObservationBuilder {
    /// Builds an observation in the given encoding.
    ///
    /// Lanes missing from an engine map read as zero; lane identity comes
    /// from the topology, never from engine iteration order.
    pub fn build(
        encoding: ObservationEncoding,
        topology: &NetworkTopology,
        waiting: &BTreeMap<LaneId, u32>,
        totals: &BTreeMap<LaneId, u32>,
        phases: &[usize],
    ) -> Observation {
        match encoding {
            ObservationEncoding::Flat => {
                let mut values = Vec::with_capacity(topology.total_lanes() + phases.len());
                for lane in &topology.lane_order {
                    values.push(waiting.get(lane).copied().unwrap_or(0));
                }
                for &phase in phases {
                    values.push(phase as u32);
                }
                Observation::Flat(values)
            }
            ObservationEncoding::Keyed => {
                let mut map = BTreeMap::new();
                for (i, id) in topology.controllable.iter().enumerate() {
                    map.insert(format!("{}_phase", id), phases[i] as u32);
                    for lane in &topology.incoming_lanes[i] {
                        let wait = waiting.get(lane).copied().unwrap_or(0);
                        let total = totals.get(lane).copied().unwrap_or(0);
                        map.insert(
                            format!("{}_{}_running_vehicle_count", id, lane),
                            total.saturating_sub(wait),
                        );
                        map.insert(format!("{}_{}_waiting_vehicle_count", id, lane), wait);
                    }
                }
                Observation::Keyed(map)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roadnet::tests::two_intersection_topology;

    fn counts(pairs: &[(&str, u32)]) -> BTreeMap<LaneId, u32> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), *v))
            .collect()
    }

    #[test]
    fn flat_layout_is_lanes_then_phases() {
        let topo = two_intersection_topology();
        let waiting = counts(&[
            ("r_in_a_0", 4),
            ("r_in_a_1", 1),
            ("r_a_b_0", 0),
            ("r_a_b_1", 2),
            ("r_out_b_0", 7),
        ]);
        let obs = ObservationBuilder::build(
            ObservationEncoding::Flat,
            &topo,
            &waiting,
            &waiting,
            &[2, 1],
        );
        assert_eq!(obs.as_flat().unwrap(), &[4, 1, 0, 2, 7, 2, 1]);
    }

    #[test]
    fn flat_length_matches_space_shape() {
        let topo = two_intersection_topology();
        let obs = ObservationBuilder::build(
            ObservationEncoding::Flat,
            &topo,
            &BTreeMap::new(),
            &BTreeMap::new(),
            &[0, 0],
        );
        assert_eq!(obs.len(), topo.total_lanes() + topo.n_controllable());
    }

    #[test]
    fn keyed_running_is_total_minus_waiting() {
        let topo = two_intersection_topology();
        let waiting = counts(&[("r_in_a_0", 3)]);
        let totals = counts(&[("r_in_a_0", 5)]);
        let obs = ObservationBuilder::build(
            ObservationEncoding::Keyed,
            &topo,
            &waiting,
            &totals,
            &[1, 0],
        );
        let map = obs.as_keyed().unwrap();
        assert_eq!(map["a_phase"], 1);
        assert_eq!(map["b_phase"], 0);
        assert_eq!(map["a_r_in_a_0_waiting_vehicle_count"], 3);
        assert_eq!(map["a_r_in_a_0_running_vehicle_count"], 2);
        // Absent lanes read as zero.
        assert_eq!(map["a_r_in_a_1_waiting_vehicle_count"], 0);
    }
}
