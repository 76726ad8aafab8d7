// Sample the local Docker daemon for a few ticks and print the resulting snapshot as JSON.
//
// Usage: cargo run --example dump_snapshot -- [TICKS] [INTERVAL_SECS]
//   TICKS          default: 3 (the first tick only records baselines)
//   INTERVAL_SECS  default: 1

use container_pulse::config::{DockerConfig, EngineConfig};
use container_pulse::docker_repo::DockerRepo;
use container_pulse::Engine;
use std::env;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();
    let ticks: u64 = args.get(1).and_then(|s| s.parse().ok()).unwrap_or(3);
    let interval: f64 = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(1.0);

    let config = EngineConfig {
        poll_interval_secs: interval,
        ..Default::default()
    };
    let repo = DockerRepo::connect(&DockerConfig::default())?
        .with_inspect_timeout(config.sample_timeout() / 2);
    let engine = Engine::start(config, Arc::new(repo))?;

    let mut rx = engine.subscribe();
    while rx.borrow_and_update().tick < ticks {
        rx.changed().await?;
    }

    let snapshot = engine.get_snapshot();
    println!("{}", serde_json::to_string_pretty(snapshot.as_ref())?);
    engine.stop().await;
    Ok(())
}
