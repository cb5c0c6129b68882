//! Episode counters and per-episode replay bookkeeping.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::engine::TrafficEngine;
use crate::error::Result;

/// Episode counters.
///
/// `episode_index` is monotone across the life of the instance; only
/// `current_timestep` resets on episode boundaries.
#[derive(Debug, Clone)]
pub struct EpisodeTracker {
    pub episode_index: u64,
    pub current_timestep: u32,
    pub max_timesteps: u32,
}

impl EpisodeTracker {
    pub fn new(max_timesteps: u32) -> Self {
        Self {
            episode_index: 0,
            current_timestep: 0,
            max_timesteps,
        }
    }

    /// Begins a new episode: bumps the episode index, zeroes the timestep.
    pub fn start_episode(&mut self) {
        self.episode_index += 1;
        self.current_timestep = 0;
    }

    /// Counts one completed step and returns the new (1-based) timestep.
    pub fn advance(&mut self) -> u32 {
        self.current_timestep += 1;
        self.current_timestep
    }

    pub fn terminated(&self) -> bool {
        self.current_timestep >= self.max_timesteps
    }
}

/// Owns the per-run replay directory and per-episode replay paths.
///
/// Path naming is deterministic: within one run directory the episode index
/// is the only varying component, so replays never collide and sort in
/// episode order.
#[derive(Debug, Clone)]
pub struct ReplayManager {
    run_dir: Option<PathBuf>,
    save_replay: bool,
}

impl ReplayManager {
    /// Creates `replay_root/{env_name}/{run_timestamp}/` when any file output
    /// is enabled. Directory creation failures surface immediately.
    pub fn new(
        replay_root: &Path,
        env_name: &str,
        save_replay: bool,
        chart_log: bool,
    ) -> Result<Self> {
        let run_dir = if save_replay || chart_log {
            let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
            let dir = replay_root.join(env_name).join(timestamp);
            fs::create_dir_all(&dir)?;
            Some(dir)
        } else {
            None
        };
        Ok(Self {
            run_dir,
            save_replay,
        })
    }

    /// The run directory, when file output is enabled.
    pub fn run_dir(&self) -> Option<&Path> {
        self.run_dir.as_deref()
    }

    /// Replay path for an episode: `{run_dir}/replay_{episode}.txt`.
    pub fn replay_path(&self, episode_index: u64) -> Option<PathBuf> {
        self.run_dir
            .as_ref()
            .map(|dir| dir.join(format!("replay_{}.txt", episode_index)))
    }

    /// Points the engine's replay recorder at the episode's file.
    pub fn direct_engine<E: TrafficEngine>(&self, engine: &mut E, episode_index: u64) {
        if !self.save_replay {
            return;
        }
        if let Some(path) = self.replay_path(episode_index) {
            engine.set_replay_file(&path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn episode_counters_follow_reset_contract() {
        let mut tracker = EpisodeTracker::new(3);
        assert_eq!(tracker.episode_index, 0);
        assert_eq!(tracker.current_timestep, 0);

        tracker.start_episode();
        assert_eq!(tracker.episode_index, 1);

        assert_eq!(tracker.advance(), 1);
        assert!(!tracker.terminated());
        tracker.advance();
        tracker.advance();
        assert!(tracker.terminated());

        tracker.start_episode();
        assert_eq!(tracker.episode_index, 2);
        assert_eq!(tracker.current_timestep, 0);
        assert!(!tracker.terminated());
    }

    #[test]
    fn replay_paths_are_deterministic_and_distinct() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ReplayManager::new(dir.path(), "demo", true, false).unwrap();
        let run_dir = manager.run_dir().unwrap().to_path_buf();
        assert!(run_dir.starts_with(dir.path().join("demo")));
        assert!(run_dir.is_dir());

        let p1 = manager.replay_path(1).unwrap();
        let p2 = manager.replay_path(2).unwrap();
        assert_eq!(p1, run_dir.join("replay_1.txt"));
        assert_eq!(p2, run_dir.join("replay_2.txt"));
        assert_ne!(p1, p2);
        // Asking again yields the identical path.
        assert_eq!(manager.replay_path(1).unwrap(), p1);
    }

    #[test]
    fn no_output_enabled_creates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ReplayManager::new(dir.path(), "demo", false, false).unwrap();
        assert!(manager.run_dir().is_none());
        assert!(manager.replay_path(1).is_none());
        assert!(!dir.path().join("demo").exists());
    }

    #[test]
    fn unwritable_root_is_io_error() {
        // A file used as the root directory cannot contain subdirectories.
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("occupied");
        std::fs::write(&blocker, b"x").unwrap();
        let err = ReplayManager::new(&blocker, "demo", true, false).unwrap_err();
        assert!(matches!(err, crate::error::EnvError::Io(_)));
    }
}
