//! Environment configuration.
//!
//! The source system grew several incompatible environment variants; here
//! every behavioral variant is a selectable mode of one adapter. All fields
//! are per-instance and set only at construction.

use std::path::PathBuf;

use crate::env::reward::RewardPolicy;
use crate::error::{EnvError, Result};

/// Which observation encoding the instance produces.
///
/// The two encodings are not interchangeable; the choice is fixed per
/// instance and must match the paired observation space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObservationEncoding {
    /// Flat integer vector: per-lane waiting counts in topology lane order,
    /// then the last commanded phase per controllable intersection.
    Flat,
    /// Map keyed by `"{intersection}_phase"` and
    /// `"{intersection}_{lane}_{running|waiting}_vehicle_count"`.
    Keyed,
}

/// How out-of-range phase values in an action are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhasePolicy {
    /// Action dimension `i` ranges over `[0, phase_counts[i]]` inclusive; a
    /// value `>= phase_counts[i]` is the reserved "keep current phase"
    /// signal, not an error.
    Sentinel,
    /// Action dimension `i` ranges over `[0, phase_counts[i] - 1]`; an
    /// out-of-range value is a contract violation, rejected before any
    /// engine mutation.
    Strict,
}

/// Per-instance environment configuration.
#[derive(Debug, Clone)]
pub struct EnvConfig {
    /// Instance name; first path component under the replay root.
    pub env_name: String,
    /// Steps per episode; `terminated` once the step counter reaches this.
    pub max_timesteps: u32,
    /// Engine ticks advanced per `step` call (1, or a fixed batch).
    pub ticks_per_step: u32,
    /// Whether the engine records a replay file per episode.
    pub save_replay: bool,
    /// Whether per-tick metrics are appended to `charts.txt`.
    pub chart_log: bool,
    /// Print a render line after every step.
    pub terminal_logs: bool,
    /// Root directory for replay/chart output.
    pub replay_root: PathBuf,
    /// Upper bound on per-lane vehicle counts in the observation space.
    pub lane_capacity: u32,
    pub observation_encoding: ObservationEncoding,
    pub phase_policy: PhasePolicy,
    pub reward_policy: RewardPolicy,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            env_name: "env".to_string(),
            max_timesteps: 3600,
            ticks_per_step: 10,
            save_replay: false,
            chart_log: false,
            terminal_logs: false,
            replay_root: PathBuf::from("replay_files"),
            lane_capacity: 1000,
            observation_encoding: ObservationEncoding::Flat,
            phase_policy: PhasePolicy::Sentinel,
            reward_policy: RewardPolicy::AverageSpeed,
        }
    }
}

impl EnvConfig {
    /// Validates field ranges.
    pub fn validate(&self) -> Result<()> {
        if self.env_name.is_empty() {
            return Err(EnvError::Configuration("env_name is empty".to_string()));
        }
        if self.max_timesteps == 0 {
            return Err(EnvError::Configuration(
                "max_timesteps must be at least 1".to_string(),
            ));
        }
        if self.ticks_per_step == 0 {
            return Err(EnvError::Configuration(
                "ticks_per_step must be at least 1".to_string(),
            ));
        }
        if self.lane_capacity == 0 {
            return Err(EnvError::Configuration(
                "lane_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let cfg = EnvConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.phase_policy, PhasePolicy::Sentinel);
        assert_eq!(cfg.observation_encoding, ObservationEncoding::Flat);
    }

    #[test]
    fn zero_timesteps_rejected() {
        let cfg = EnvConfig {
            max_timesteps: 0,
            ..EnvConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(EnvError::Configuration(_))
        ));
    }

    #[test]
    fn zero_tick_batch_rejected() {
        let cfg = EnvConfig {
            ticks_per_step: 0,
            ..EnvConfig::default()
        };
        assert!(cfg.validate().is_err());
    }
}
