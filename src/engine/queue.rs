//! Deterministic queueing engine for demos and tests.
//!
//! [`QueueEngine`] is a minimal [`TrafficEngine`] implementation: vehicles
//! arrive on lanes by a seeded Bernoulli process, queue until the phase
//! serving their lane is active, cross in one tick, and leave. It exists so
//! the adapter and its property tests have a deterministic engine to drive;
//! it is not a simulation product.
//!
//! Every `set_tl_phase` call is recorded, which is what the phase-change
//! minimality tests inspect.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::roadnet::NetworkTopology;
use crate::{IntersectionId, LaneId};

use super::TrafficEngine;

/// Tuning knobs for the queueing model.
#[derive(Debug, Clone)]
pub struct QueueEngineConfig {
    /// Probability of one vehicle arriving on a lane per tick.
    pub arrival_rate: f64,
    /// Maximum vehicles discharged per served lane per tick.
    pub saturation_flow: u32,
    /// Speed of a moving vehicle, in m/s.
    pub free_speed: f64,
}

impl Default for QueueEngineConfig {
    fn default() -> Self {
        Self {
            arrival_rate: 0.3,
            saturation_flow: 2,
            free_speed: 11.11,
        }
    }
}

/// Per-lane traffic state.
#[derive(Debug, Clone, Copy, Default)]
struct LaneState {
    waiting: u32,
    running: u32,
}

/// A lane is served when the active phase index matches its position among
/// the intersection's incoming lanes, modulo the phase count.
#[derive(Debug, Clone)]
struct ControlledIntersection {
    id: IntersectionId,
    phase_count: usize,
    incoming: Vec<LaneId>,
}

/// Seeded queueing implementation of [`TrafficEngine`].
pub struct QueueEngine {
    config: QueueEngineConfig,
    lanes: Vec<LaneId>,
    states: BTreeMap<LaneId, LaneState>,
    controlled: Vec<ControlledIntersection>,
    phases: BTreeMap<IntersectionId, usize>,
    rng: StdRng,
    seed: u64,
    tick: u64,
    vehicles_entered: u64,
    present_vehicle_ticks: f64,
    phase_commands: Vec<(IntersectionId, usize)>,
    save_replay: bool,
    replay: Option<BufWriter<File>>,
    replay_error: Option<String>,
}

impl QueueEngine {
    /// Builds an engine over the given topology with a fixed RNG seed.
    pub fn new(topology: &NetworkTopology, config: QueueEngineConfig, seed: u64) -> Self {
        let states = topology
            .lane_order
            .iter()
            .map(|lane| (lane.clone(), LaneState::default()))
            .collect();
        let controlled = topology
            .controllable
            .iter()
            .enumerate()
            .map(|(i, id)| ControlledIntersection {
                id: id.clone(),
                phase_count: topology.phase_counts[i],
                incoming: topology.incoming_lanes[i].clone(),
            })
            .collect::<Vec<_>>();
        let phases = controlled.iter().map(|c| (c.id.clone(), 0)).collect();

        Self {
            config,
            lanes: topology.lane_order.clone(),
            states,
            controlled,
            phases,
            rng: StdRng::seed_from_u64(seed),
            seed,
            tick: 0,
            vehicles_entered: 0,
            present_vehicle_ticks: 0.0,
            phase_commands: Vec::new(),
            save_replay: false,
            replay: None,
            replay_error: None,
        }
    }

    /// All `set_tl_phase` calls received since construction, in order.
    ///
    /// The log survives `reset()`: it is instrumentation, not traffic state.
    pub fn phase_commands(&self) -> &[(IntersectionId, usize)] {
        &self.phase_commands
    }

    /// Clears the recorded command log.
    pub fn clear_phase_commands(&mut self) {
        self.phase_commands.clear();
    }

    /// Last replay-file open failure, if any.
    pub fn replay_error(&self) -> Option<&str> {
        self.replay_error.as_deref()
    }

    fn total_present(&self) -> u64 {
        self.states
            .values()
            .map(|s| u64::from(s.waiting + s.running))
            .sum()
    }

    fn write_replay_line(&mut self) {
        if self.replay.is_none() {
            return;
        }
        let mut line = format!("t={}", self.tick);
        for lane in &self.lanes {
            let s = self.states.get(lane).copied().unwrap_or_default();
            line.push_str(&format!(" {}:w{}:r{}", lane, s.waiting, s.running));
        }
        let failed = match self.replay.as_mut() {
            Some(writer) => writeln!(writer, "{}", line).is_err(),
            None => false,
        };
        if failed {
            self.replay = None;
        }
    }
}

impl TrafficEngine for QueueEngine {
    fn next_step(&mut self) {
        self.tick += 1;

        // Vehicles that crossed last tick leave the network.
        for state in self.states.values_mut() {
            state.running = 0;
        }

        // Arrivals, in stable lane order.
        for lane in &self.lanes {
            if self.rng.gen::<f64>() < self.config.arrival_rate {
                if let Some(state) = self.states.get_mut(lane) {
                    state.waiting = state.waiting.saturating_add(1);
                    self.vehicles_entered += 1;
                }
            }
        }

        // Discharge served lanes up to the saturation flow.
        for ci in &self.controlled {
            let phase = self.phases[&ci.id];
            for (slot, lane) in ci.incoming.iter().enumerate() {
                if slot % ci.phase_count == phase {
                    if let Some(state) = self.states.get_mut(lane) {
                        let moved = state.waiting.min(self.config.saturation_flow);
                        state.waiting -= moved;
                        state.running += moved;
                    }
                }
            }
        }

        self.present_vehicle_ticks += self.total_present() as f64;
        self.write_replay_line();
    }

    fn reset(&mut self) {
        for state in self.states.values_mut() {
            *state = LaneState::default();
        }
        for phase in self.phases.values_mut() {
            *phase = 0;
        }
        self.rng = StdRng::seed_from_u64(self.seed);
        self.tick = 0;
        self.vehicles_entered = 0;
        self.present_vehicle_ticks = 0.0;
    }

    fn set_tl_phase(&mut self, intersection_id: &str, phase_index: usize) {
        self.phase_commands
            .push((intersection_id.to_string(), phase_index));
        if let Some(phase) = self.phases.get_mut(intersection_id) {
            *phase = phase_index;
        }
    }

    fn lane_waiting_vehicle_counts(&self) -> BTreeMap<LaneId, u32> {
        self.states
            .iter()
            .map(|(lane, s)| (lane.clone(), s.waiting))
            .collect()
    }

    fn lane_vehicle_counts(&self) -> BTreeMap<LaneId, u32> {
        self.states
            .iter()
            .map(|(lane, s)| (lane.clone(), s.waiting + s.running))
            .collect()
    }

    fn vehicle_speeds(&self) -> BTreeMap<String, f64> {
        let mut speeds = BTreeMap::new();
        for (lane, state) in &self.states {
            for i in 0..state.waiting {
                speeds.insert(format!("{}#w{}", lane, i), 0.0);
            }
            for i in 0..state.running {
                speeds.insert(format!("{}#r{}", lane, i), self.config.free_speed);
            }
        }
        speeds
    }

    fn average_travel_time(&self) -> f64 {
        if self.vehicles_entered == 0 {
            return 0.0;
        }
        self.present_vehicle_ticks / self.vehicles_entered as f64
    }

    fn set_replay_file(&mut self, path: &Path) {
        if let Some(mut old) = self.replay.take() {
            let _ = old.flush();
        }
        if !self.save_replay {
            return;
        }
        match File::create(path) {
            Ok(file) => {
                self.replay = Some(BufWriter::new(file));
                self.replay_error = None;
            }
            Err(err) => {
                self.replay_error = Some(format!("{}: {}", path.display(), err));
            }
        }
    }

    fn set_save_replay(&mut self, enabled: bool) {
        self.save_replay = enabled;
        if !enabled {
            if let Some(mut old) = self.replay.take() {
                let _ = old.flush();
            }
        }
    }
}
