//! semaflow - traffic-signal control as a reinforcement-learning environment.
//!
//! Adapts a microscopic traffic-flow simulation engine to the standard RL
//! interface (`reset`/`step`/spaces/`render`) so an external training
//! algorithm can learn signal-control policies. The simulation engine is an
//! external collaborator consumed through the [`engine::TrafficEngine`]
//! trait; this crate owns only the adapter: topology loading, space
//! derivation, action-to-phase translation, reward computation, and
//! per-episode replay bookkeeping.

pub mod engine;
pub mod env;
pub mod error;
pub mod metrics;
pub mod policy;
pub mod roadnet;

pub use engine::{QueueEngine, QueueEngineConfig, TrafficEngine};
pub use env::{
    ActionSpace, EnvConfig, Observation, ObservationEncoding, ObservationSpace, PhasePolicy,
    RewardPolicy, StepInfo, StepResult, TrafficSignalEnv,
};
pub use error::{EnvError, Result};
pub use metrics::EvaluationMetrics;
pub use policy::{FixedCyclePolicy, Policy, RandomPolicy};
pub use roadnet::{NetworkTopology, Roadnet};

/// Identifier of an intersection in the road network.
pub type IntersectionId = String;

/// Identifier of a road in the road network.
pub type RoadId = String;

/// Fully-qualified lane identifier, `"{road_id}_{lane_index}"`.
pub type LaneId = String;
