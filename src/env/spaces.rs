//! Observation and action space descriptors.
//!
//! Spaces are derived once at construction from the network topology and a
//! one-time snapshot of the engine's per-lane state, and are fixed
//! thereafter.

use std::collections::BTreeMap;

use crate::env::config::{EnvConfig, ObservationEncoding, PhasePolicy};
use crate::error::{EnvError, Result};
use crate::roadnet::NetworkTopology;
use crate::LaneId;

/// Multi-discrete action space: one dimension per controllable intersection.
///
/// `nvec[i]` is the number of selectable values of dimension `i`. Under the
/// sentinel phase policy that is `phase_counts[i] + 1` (the extra value is
/// the keep-current-phase signal); under the strict policy it is
/// `phase_counts[i]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionSpace {
    nvec: Vec<usize>,
}

impl ActionSpace {
    pub fn new(nvec: Vec<usize>) -> Self {
        Self { nvec }
    }

    /// Number of dimensions (= number of controllable intersections).
    pub fn len(&self) -> usize {
        self.nvec.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nvec.is_empty()
    }

    /// Per-dimension cardinality.
    pub fn nvec(&self) -> &[usize] {
        &self.nvec
    }

    /// Whether an action vector is inside the space.
    pub fn contains(&self, action: &[usize]) -> bool {
        action.len() == self.nvec.len()
            && action.iter().zip(&self.nvec).all(|(a, n)| a < n)
    }
}

/// Observation space descriptor, matching the instance's encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObservationSpace {
    /// Bounded integer vector of fixed length.
    Box { low: u32, high: u32, shape: usize },
    /// One bounded integer sub-range per key, in key order.
    Keyed { bounds: BTreeMap<String, u32> },
}

impl ObservationSpace {
    /// Number of scalar components.
    pub fn len(&self) -> usize {
        match self {
            ObservationSpace::Box { shape, .. } => *shape,
            ObservationSpace::Keyed { bounds } => bounds.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Builds both spaces from topology, configuration, and an engine snapshot.
pub struct SpaceBuilder<'a> {
    topology: &'a NetworkTopology,
    config: &'a EnvConfig,
}

impl<'a> SpaceBuilder<'a> {
    pub fn new(topology: &'a NetworkTopology, config: &'a EnvConfig) -> Self {
        Self { topology, config }
    }

    /// Derives `(observation_space, action_space)`.
    ///
    /// `lane_snapshot` is the engine's per-lane waiting-count map at
    /// construction time; it must agree with the topology's lane set.
    ///
    /// # Errors
    ///
    /// `EnvError::Configuration` when the engine reports zero lanes or a
    /// lane set inconsistent with the topology.
    pub fn build(
        &self,
        lane_snapshot: &BTreeMap<LaneId, u32>,
    ) -> Result<(ObservationSpace, ActionSpace)> {
        if lane_snapshot.is_empty() {
            return Err(EnvError::Configuration(
                "engine reports zero lanes; cannot build an observation space".to_string(),
            ));
        }
        if lane_snapshot.len() != self.topology.total_lanes() {
            return Err(EnvError::Configuration(format!(
                "engine reports {} lanes but the road network declares {}",
                lane_snapshot.len(),
                self.topology.total_lanes()
            )));
        }

        let action = ActionSpace::new(
            self.topology
                .phase_counts
                .iter()
                .map(|&pc| match self.config.phase_policy {
                    PhasePolicy::Sentinel => pc + 1,
                    PhasePolicy::Strict => pc,
                })
                .collect(),
        );

        let observation = match self.config.observation_encoding {
            ObservationEncoding::Flat => ObservationSpace::Box {
                low: 0,
                high: self.config.lane_capacity,
                shape: self.topology.total_lanes() + self.topology.n_controllable(),
            },
            ObservationEncoding::Keyed => {
                let mut bounds = BTreeMap::new();
                for (i, id) in self.topology.controllable.iter().enumerate() {
                    let max_phase = (self.topology.phase_counts[i] - 1) as u32;
                    bounds.insert(format!("{}_phase", id), max_phase);
                    for lane in &self.topology.incoming_lanes[i] {
                        bounds.insert(
                            format!("{}_{}_running_vehicle_count", id, lane),
                            self.config.lane_capacity,
                        );
                        bounds.insert(
                            format!("{}_{}_waiting_vehicle_count", id, lane),
                            self.config.lane_capacity,
                        );
                    }
                }
                ObservationSpace::Keyed { bounds }
            }
        };

        Ok((observation, action))
    }
}
