// Demonstration: roll out baseline signal-control policies and compare them.
//
// Run from the repo root:
//   cargo run --example env_rollout -- --policy fixed --episodes 5
//   cargo run --example env_rollout -- --policy random --roadnet path/to/roadnet.json

use std::env;
use std::path::Path;

use semaflow::{
    EnvConfig, EvaluationMetrics, FixedCyclePolicy, NetworkTopology, Policy, QueueEngine,
    QueueEngineConfig, RandomPolicy, Roadnet, TrafficSignalEnv,
};

// A 1x1 grid: one controllable intersection fed by four boundary roads.
const DEMO_ROADNET: &str = include_str!("grid_1x1_roadnet.json");

fn main() {
    let args: Vec<String> = env::args().collect();
    let policy_name = arg_value(&args, "--policy").unwrap_or("fixed");
    let episodes: usize = arg_value(&args, "--episodes")
        .and_then(|s| s.parse().ok())
        .unwrap_or(5);
    let seed: u64 = arg_value(&args, "--seed")
        .and_then(|s| s.parse().ok())
        .unwrap_or(42);

    let roadnet = match arg_value(&args, "--roadnet") {
        Some(path) => Roadnet::from_path(Path::new(path)).unwrap_or_else(|err| {
            eprintln!("Failed to load roadnet '{}': {}", path, err);
            std::process::exit(2);
        }),
        None => Roadnet::from_json(DEMO_ROADNET).expect("built-in roadnet parses"),
    };

    let topology = NetworkTopology::from_roadnet(&roadnet).unwrap_or_else(|err| {
        eprintln!("Invalid roadnet: {}", err);
        std::process::exit(2);
    });
    let engine = QueueEngine::new(&topology, QueueEngineConfig::default(), seed);

    let config = EnvConfig {
        env_name: "env_rollout".to_string(),
        max_timesteps: 60,
        ..EnvConfig::default()
    };
    let mut env = TrafficSignalEnv::new(&roadnet, engine, config).unwrap_or_else(|err| {
        eprintln!("Failed to build environment: {}", err);
        std::process::exit(2);
    });

    let mut policy: Box<dyn Policy> = match policy_name {
        "random" => Box::new(RandomPolicy::new(env.action_space().clone())),
        "fixed" => Box::new(FixedCyclePolicy::new(
            env.topology().phase_counts.clone(),
            3,
        )),
        other => {
            eprintln!("Unknown --policy '{}'; expected 'fixed' or 'random'.", other);
            std::process::exit(2);
        }
    };

    match EvaluationMetrics::evaluate(&mut env, policy.as_mut(), episodes) {
        Ok(metrics) => {
            println!("Policy: {}", policy.name());
            println!("{}", metrics);
        }
        Err(err) => {
            eprintln!("Evaluation failed: {}", err);
            std::process::exit(1);
        }
    }
}

fn arg_value<'a>(args: &'a [String], key: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == key)
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str())
}
