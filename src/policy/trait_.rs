//! Policy trait for the environment surface.

use crate::env::Observation;

/// Selects a phase-assignment action from an observation.
///
/// Action entry `i` addresses the `i`-th controllable intersection in
/// topology order, with the value range defined by the environment's action
/// space (including the keep-phase sentinel when that policy is active).
pub trait Policy: Send + Sync {
    /// Selects one phase value per controllable intersection.
    fn select_action(&mut self, observation: &Observation) -> Vec<usize>;

    /// Human-readable name for this policy.
    fn name(&self) -> &str;
}
