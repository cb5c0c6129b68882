//! Random policy for testing and baselines.

use rand::Rng;

use crate::env::{ActionSpace, Observation};

use super::trait_::Policy;

/// Uniformly random phase selection.
///
/// Each dimension independently samples from its action-space range. Used
/// for sanity checks and as a lower-bound baseline.
pub struct RandomPolicy {
    action_space: ActionSpace,
}

impl RandomPolicy {
    pub fn new(action_space: ActionSpace) -> Self {
        Self { action_space }
    }
}

impl Policy for RandomPolicy {
    fn select_action(&mut self, _observation: &Observation) -> Vec<usize> {
        let mut rng = rand::thread_rng();
        self.action_space
            .nvec()
            .iter()
            .map(|&n| rng.gen_range(0..n))
            .collect()
    }

    fn name(&self) -> &str {
        "random"
    }
}
