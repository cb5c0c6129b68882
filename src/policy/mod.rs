//! Baseline signal-control policies.
//!
//! These exist for sanity checks, lower-bound baselines, and replay
//! generation without a trained model. Learned policies live in the external
//! training collaborator and drive the environment through the same
//! `reset`/`step` surface.

pub mod fixed_cycle;
pub mod random;
pub mod trait_;

pub use fixed_cycle::FixedCyclePolicy;
pub use random::RandomPolicy;
pub use trait_::Policy;
