//! Reward policies.
//!
//! Exactly one policy is active per instance. All policies are functions of
//! engine-reported metrics at the time of the call; only the running-mean
//! policy carries per-episode state, which resets on `reset()`.

use std::collections::BTreeMap;

/// Selectable reward policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewardPolicy {
    /// Mean of all vehicle speeds, averaged over the step's tick batch.
    /// Zero vehicles on a tick contribute 0.0 (defined fallback, not a
    /// division fault).
    AverageSpeed,
    /// `-avg_travel_time - 0.2 * total_waiting_vehicles`.
    WeightedPenalty,
    /// Sign-relative to the episode's own history:
    /// `running_mean - avg_travel_time`, after which the running mean folds
    /// in the current value with weight `1/timestep` (1-based incremental
    /// mean).
    RunningMeanRelative,
}

/// Engine metrics a reward computation consumes, read after the tick batch.
#[derive(Debug, Clone, Copy)]
pub struct StepMetrics {
    pub average_travel_time: f64,
    pub total_waiting_vehicles: u32,
    /// Mean over the batch of per-tick mean vehicle speeds.
    pub mean_tick_speed: f64,
}

/// Per-instance reward state.
#[derive(Debug, Clone)]
pub struct RewardTracker {
    policy: RewardPolicy,
    running_mean_travel_time: f64,
}

impl RewardTracker {
    pub fn new(policy: RewardPolicy) -> Self {
        Self {
            policy,
            running_mean_travel_time: 0.0,
        }
    }

    pub fn policy(&self) -> RewardPolicy {
        self.policy
    }

    /// Clears episode state. Called on every environment reset.
    pub fn reset(&mut self) {
        self.running_mean_travel_time = 0.0;
    }

    /// Computes the step reward. `timestep` is the 1-based index of the step
    /// being scored within the episode.
    pub fn compute(&mut self, metrics: &StepMetrics, timestep: u32) -> f64 {
        match self.policy {
            RewardPolicy::AverageSpeed => metrics.mean_tick_speed,
            RewardPolicy::WeightedPenalty => {
                -metrics.average_travel_time - 0.2 * f64::from(metrics.total_waiting_vehicles)
            }
            RewardPolicy::RunningMeanRelative => {
                let current = metrics.average_travel_time;
                let reward = self.running_mean_travel_time - current;
                self.running_mean_travel_time +=
                    (current - self.running_mean_travel_time) / f64::from(timestep.max(1));
                reward
            }
        }
    }
}

/// Mean of a speed map; 0.0 when empty.
pub fn mean_speed(speeds: &BTreeMap<String, f64>) -> f64 {
    if speeds.is_empty() {
        return 0.0;
    }
    speeds.values().sum::<f64>() / speeds.len() as f64
}
