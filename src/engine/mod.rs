//! Simulation engine interface.
//!
//! The environment adapter never owns simulation logic; it drives an engine
//! through [`TrafficEngine`] and reads metrics back. Any microscopic traffic
//! simulator exposing this capability set can sit behind the adapter.

use std::collections::BTreeMap;
use std::path::Path;

use crate::LaneId;

pub mod queue;

pub use queue::{QueueEngine, QueueEngineConfig};

/// Capability set the adapter requires of a traffic simulation engine.
///
/// Map-returning queries use [`BTreeMap`] so iteration order is deterministic
/// regardless of the engine's internal storage.
///
/// The engine is an exclusively-owned mutable resource: one engine per
/// environment instance, no concurrent calls.
pub trait TrafficEngine {
    /// Advance simulated time by one discrete tick.
    fn next_step(&mut self);

    /// Restore the engine to its initial configured state.
    fn reset(&mut self);

    /// Command a signal-phase change on an intersection.
    ///
    /// The adapter pre-filters redundant commands against its own tracked
    /// phase state, so implementations need not be idempotent.
    fn set_tl_phase(&mut self, intersection_id: &str, phase_index: usize);

    /// Waiting (queued) vehicles per lane.
    fn lane_waiting_vehicle_counts(&self) -> BTreeMap<LaneId, u32>;

    /// Total vehicles per lane, waiting and moving.
    fn lane_vehicle_counts(&self) -> BTreeMap<LaneId, u32>;

    /// Current speed of every vehicle in the network, keyed by vehicle id.
    ///
    /// May be empty when the network holds no vehicles.
    fn vehicle_speeds(&self) -> BTreeMap<String, f64>;

    /// Average travel time over vehicles seen so far, in simulated seconds.
    fn average_travel_time(&self) -> f64;

    /// Direct the engine's append-only replay recorder at a new output file.
    fn set_replay_file(&mut self, path: &Path);

    /// Enable or disable replay recording.
    fn set_save_replay(&mut self, enabled: bool);
}
