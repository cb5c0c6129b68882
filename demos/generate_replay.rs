// Demonstration: run one recorded episode and report the replay location.
//
// Run from the repo root:
//   cargo run --example generate_replay -- --steps 120
//
// The engine writes replay_{episode}.txt under
// replay_files/generate_replay/{run_timestamp}/, next to charts.txt.

use std::env;
use std::path::Path;

use semaflow::{
    EnvConfig, FixedCyclePolicy, NetworkTopology, Policy, QueueEngine, QueueEngineConfig, Roadnet,
    TrafficSignalEnv,
};

const DEMO_ROADNET: &str = include_str!("grid_1x1_roadnet.json");

fn main() {
    let args: Vec<String> = env::args().collect();
    let steps: u32 = arg_value(&args, "--steps")
        .and_then(|s| s.parse().ok())
        .unwrap_or(60);
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

    let topology = NetworkTopology::from_roadnet(&roadnet).expect("roadnet is valid");
    let engine = QueueEngine::new(&topology, QueueEngineConfig::default(), seed);

    let config = EnvConfig {
        env_name: "generate_replay".to_string(),
        max_timesteps: steps,
        save_replay: true,
        chart_log: true,
        ..EnvConfig::default()
    };
    let mut env = TrafficSignalEnv::new(&roadnet, engine, config).unwrap_or_else(|err| {
        eprintln!("Failed to build environment: {}", err);
        std::process::exit(2);
    });

    let mut policy = FixedCyclePolicy::new(env.topology().phase_counts.clone(), 3);

    println!("Simulating...");
    let (mut observation, _) = env.reset(Some(seed)).expect("reset succeeds");
    loop {
        let action = policy.select_action(&observation);
        let result = env.step(&action).expect("step succeeds");
        observation = result.observation;
        if result.terminated || result.truncated {
            break;
        }
    }
    env.close().expect("chart flush succeeds");

    println!("Simulation complete.");
    if let Some(path) = env.replay_path() {
        println!("Replay file saved at: {}", path.display());
    }
}

fn arg_value<'a>(args: &'a [String], key: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == key)
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str())
}
