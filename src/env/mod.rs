//! The RL environment adapter.
//!
//! [`TrafficSignalEnv`] owns a simulation engine and exposes the standard
//! RL surface: `reset` / `step` / `observation_space` / `action_space` /
//! `render`. It is the only place where simulation semantics (intersections,
//! lanes, phases, vehicle counts, travel time) become a well-formed RL
//! problem.
//!
//! # Lifecycle
//!
//! 1. Build a [`TrafficSignalEnv`] from a parsed roadnet, an engine, and an
//!    [`EnvConfig`].
//! 2. Call [`reset`](TrafficSignalEnv::reset) before the first step of every
//!    episode, including the first.
//! 3. Repeatedly call [`step`](TrafficSignalEnv::step) until `terminated`.
//! 4. Inspect [`StepResult`] for the observation, reward, and episode status.

pub mod charts;
pub mod config;
pub mod episode;
pub mod observation;
pub mod reward;
pub mod spaces;

pub use charts::{ChartRow, ChartWriter};
pub use config::{EnvConfig, ObservationEncoding, PhasePolicy};
pub use episode::{EpisodeTracker, ReplayManager};
pub use observation::{Observation, ObservationBuilder};
pub use reward::{mean_speed, RewardPolicy, RewardTracker, StepMetrics};
pub use spaces::{ActionSpace, ObservationSpace, SpaceBuilder};

use crate::engine::TrafficEngine;
use crate::error::{EnvError, Result};
use crate::roadnet::{NetworkTopology, Roadnet};

/// Result of a single environment step.
#[derive(Debug, Clone)]
pub struct StepResult {
    pub observation: Observation,
    pub reward: f64,
    /// Episode horizon reached.
    pub terminated: bool,
    /// Always false; no external truncation source exists at this layer.
    pub truncated: bool,
    pub info: StepInfo,
}

/// Auxiliary debug metrics. Never carries control data.
#[derive(Debug, Clone, Default)]
pub struct StepInfo {
    /// Seed passed to the originating `reset`, echoed back.
    pub seed: Option<u64>,
    pub average_travel_time: f64,
    pub vehicle_count: u32,
    pub waiting_vehicle_count: u32,
    /// Phase-change commands issued to the engine during this step.
    pub phase_changes: u32,
}

/// Environment adapter over a traffic simulation engine.
///
/// The engine is exclusively owned; the adapter is single-threaded and not
/// reentrant. Stored phases mirror the engine by construction: phase
/// commands are issued only through [`step`](Self::step), which pre-filters
/// against the adapter-tracked state.
pub struct TrafficSignalEnv<E: TrafficEngine> {
    engine: E,
    config: EnvConfig,
    topology: NetworkTopology,
    episodes: EpisodeTracker,
    replays: ReplayManager,
    charts: Option<ChartWriter>,
    observation_space: ObservationSpace,
    action_space: ActionSpace,
    reward: RewardTracker,
    /// Last commanded phase per controllable intersection, topology order.
    phases: Vec<usize>,
    last_action: Vec<usize>,
    last_reward: f64,
}

impl<E: TrafficEngine> TrafficSignalEnv<E> {
    /// Builds the environment: derives the topology, queries the engine once
    /// for its lane set, and fixes both spaces.
    ///
    /// # Errors
    ///
    /// `Configuration` for an invalid config or roadnet, `Io` when the
    /// replay/chart directory cannot be created.
    pub fn new(roadnet: &Roadnet, mut engine: E, config: EnvConfig) -> Result<Self> {
        config.validate()?;
        let topology = NetworkTopology::from_roadnet(roadnet)?;

        let snapshot = engine.lane_waiting_vehicle_counts();
        let (observation_space, action_space) =
            SpaceBuilder::new(&topology, &config).build(&snapshot)?;

        let replays = ReplayManager::new(
            &config.replay_root,
            &config.env_name,
            config.save_replay,
            config.chart_log,
        )?;
        let charts = match replays.run_dir() {
            Some(dir) if config.chart_log => Some(ChartWriter::create(&dir.join("charts.txt"))?),
            _ => None,
        };

        engine.set_save_replay(config.save_replay);
        replays.direct_engine(&mut engine, 0);

        let n = topology.n_controllable();
        let reward = RewardTracker::new(config.reward_policy);
        Ok(Self {
            engine,
            episodes: EpisodeTracker::new(config.max_timesteps),
            replays,
            charts,
            observation_space,
            action_space,
            reward,
            phases: vec![0; n],
            last_action: Vec::new(),
            last_reward: 0.0,
            topology,
            config,
        })
    }

    /// Static observation space descriptor.
    pub fn observation_space(&self) -> &ObservationSpace {
        &self.observation_space
    }

    /// Static action space descriptor.
    pub fn action_space(&self) -> &ActionSpace {
        &self.action_space
    }

    pub fn topology(&self) -> &NetworkTopology {
        &self.topology
    }

    pub fn config(&self) -> &EnvConfig {
        &self.config
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Episodes started so far; 0 until the first `reset`.
    pub fn episode_index(&self) -> u64 {
        self.episodes.episode_index
    }

    /// Steps completed in the current episode.
    pub fn current_timestep(&self) -> u32 {
        self.episodes.current_timestep
    }

    /// Replay path of the current episode, when replay output is enabled.
    pub fn replay_path(&self) -> Option<std::path::PathBuf> {
        self.replays.replay_path(self.episodes.episode_index)
    }

    /// Begins a new episode.
    ///
    /// Resets the engine's world state, bumps the episode index, zeroes the
    /// timestep and reward state, re-points the replay recorder, and returns
    /// a freshly built observation.
    pub fn reset(&mut self, seed: Option<u64>) -> Result<(Observation, StepInfo)> {
        self.engine.reset();
        self.episodes.start_episode();
        self.reward.reset();
        // Engine reset restores default phases; keep the mirror in lockstep.
        self.phases.iter_mut().for_each(|p| *p = 0);
        self.replays
            .direct_engine(&mut self.engine, self.episodes.episode_index);

        let observation = self.build_observation();
        let info = StepInfo {
            seed,
            ..StepInfo::default()
        };
        Ok((observation, info))
    }

    /// Applies an action, advances the engine by the configured tick batch,
    /// and scores the step.
    ///
    /// # Errors
    ///
    /// `Contract` on action arity mismatch, or on an out-of-range phase
    /// under [`PhasePolicy::Strict`]. Rejection happens before any engine
    /// mutation, so adapter and engine state are unchanged on error.
    pub fn step(&mut self, action: &[usize]) -> Result<StepResult> {
        let n = self.topology.n_controllable();
        if action.len() != n {
            return Err(EnvError::Contract(format!(
                "action has {} entries but the network has {} controllable intersections",
                action.len(),
                n
            )));
        }
        if self.config.phase_policy == PhasePolicy::Strict {
            for (i, &a) in action.iter().enumerate() {
                if a >= self.topology.phase_counts[i] {
                    return Err(EnvError::Contract(format!(
                        "phase {} out of range for intersection '{}' ({} phases)",
                        a, self.topology.controllable[i], self.topology.phase_counts[i]
                    )));
                }
            }
        }

        // Apply, comparing against adapter-tracked state. A redundant phase
        // never reaches the engine.
        let mut phase_changes = 0u32;
        for (i, &a) in action.iter().enumerate() {
            let is_real_phase = match self.config.phase_policy {
                PhasePolicy::Sentinel => a < self.topology.phase_counts[i],
                PhasePolicy::Strict => true,
            };
            if is_real_phase && a != self.phases[i] {
                self.engine.set_tl_phase(&self.topology.controllable[i], a);
                self.phases[i] = a;
                phase_changes += 1;
            }
        }

        // Advance the tick batch, accumulating the per-tick reward term.
        let ticks = self.config.ticks_per_step;
        let mut tick_speed_sum = 0.0;
        for _ in 0..ticks {
            self.engine.next_step();
            let tick_speed = mean_speed(&self.engine.vehicle_speeds());
            tick_speed_sum += tick_speed;
            self.record_chart_row(tick_speed)?;
        }

        let waiting = self.engine.lane_waiting_vehicle_counts();
        let totals = self.engine.lane_vehicle_counts();
        let total_waiting: u32 = waiting.values().sum();
        let total_vehicles: u32 = totals.values().sum();
        let average_travel_time = self.engine.average_travel_time();

        let timestep = self.episodes.advance();
        let reward = self.reward.compute(
            &StepMetrics {
                average_travel_time,
                total_waiting_vehicles: total_waiting,
                mean_tick_speed: tick_speed_sum / f64::from(ticks),
            },
            timestep,
        );

        let observation = ObservationBuilder::build(
            self.config.observation_encoding,
            &self.topology,
            &waiting,
            &totals,
            &self.phases,
        );

        self.last_action = action.to_vec();
        self.last_reward = reward;
        if self.config.terminal_logs {
            self.render("terminal");
        }

        Ok(StepResult {
            observation,
            reward,
            terminated: self.episodes.terminated(),
            truncated: false,
            info: StepInfo {
                seed: None,
                average_travel_time,
                vehicle_count: total_vehicles,
                waiting_vehicle_count: total_waiting,
                phase_changes,
            },
        })
    }

    /// Terminal-only diagnostic dump of the last action and reward. No side
    /// effect on simulation state; unknown modes print nothing.
    pub fn render(&self, mode: &str) {
        if mode != "terminal" {
            return;
        }
        println!("{}", "-".repeat(20));
        println!("Current timestep: {}", self.episodes.current_timestep);
        println!("Action: {:?}", self.last_action);
        println!("Reward: {}", self.last_reward);
        println!("{}", "-".repeat(20));
    }

    /// Flushes pending chart output. Replay files are owned by the engine
    /// and close with it.
    pub fn close(&mut self) -> Result<()> {
        if let Some(charts) = self.charts.as_mut() {
            charts.flush()?;
        }
        Ok(())
    }

    fn build_observation(&self) -> Observation {
        let waiting = self.engine.lane_waiting_vehicle_counts();
        let totals = self.engine.lane_vehicle_counts();
        ObservationBuilder::build(
            self.config.observation_encoding,
            &self.topology,
            &waiting,
            &totals,
            &self.phases,
        )
    }

    fn record_chart_row(&mut self, tick_speed: f64) -> Result<()> {
        let Some(charts) = self.charts.as_mut() else {
            return Ok(());
        };
        let waiting: u32 = self
            .engine
            .lane_waiting_vehicle_counts()
            .values()
            .sum();
        let vehicles: u32 = self.engine.lane_vehicle_counts().values().sum();
        charts.record(&ChartRow {
            average_travel_time: self.engine.average_travel_time(),
            average_speed: tick_speed,
            vehicles,
            waiting_vehicles: waiting,
            running_vehicles: vehicles.saturating_sub(waiting),
        })
    }
}
