//! Mock Session Demo
//!
//! Demonstrates the full polling stack against the built-in mock client.
//! This demo runs without requiring a maze server.
//!
//! Run with: cargo run --bin mock_session

use std::sync::{Arc, Mutex};
use std::time::Duration;

use api_client::{MazeApi, MockConfig, MockStateClient};
use config_loader::ConfigLoader;
use contracts::AvatarState;
use observability::PollMetricsAggregator;
use state_sync::PollEngine;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    tracing::info!("Starting Mock Session Demo");

    // ==== Stage 1: Use default config or load from file ====
    let blueprint = if let Some(path) = std::env::args().nth(1) {
        tracing::info!(path = %path, "Loading blueprint config");
        ConfigLoader::load_from_path(std::path::Path::new(&path))?
    } else {
        contracts::ClientBlueprint::default()
    };

    // ==== Stage 2: Establish the session (mock) ====
    let api = MockStateClient::with_config(MockConfig {
        states: wander(600),
        latency: Duration::from_millis(8),
        ..MockConfig::default()
    });

    let user_id = api.get_user_id().await?;
    tracing::info!(session_id = %user_id, "Session established");

    let maze = api.get_maze().await?;
    tracing::info!(
        width = maze.width(),
        height = maze.height(),
        walls = maze.walls.len(),
        "Maze layout fetched"
    );

    // ==== Stage 3: Build the poll engine ====
    let interval = Duration::from_millis(blueprint.server.position_update_interval_ms);
    let engine = PollEngine::with_interval(api, interval)?;

    let aggregator = Arc::new(Mutex::new(PollMetricsAggregator::new()));
    {
        let aggregator = Arc::clone(&aggregator);
        engine.add_listener(move |state: &AvatarState| {
            tracing::debug!(
                x = format!("{:.2}", state.position.x),
                y = format!("{:.2}", state.position.y),
                direction = format!("{:.1}", state.direction),
                "State applied"
            );
            aggregator.lock().unwrap().record_applied(state);
        });
    }

    // ==== Stage 4: Run the loop for a fixed window ====
    tracing::info!(interval_ms = interval.as_millis() as u64, "Polling...");
    engine.start();
    tokio::time::sleep(Duration::from_secs(5)).await;
    engine.stop();

    // ==== Stage 5: Report ====
    let stats = engine.stats();
    tracing::info!(
        poll_rate = format!("{:.2}", stats.average_request_per_second),
        avg_delay_ms = ?stats.average_network_delay_ms,
        "Engine health at shutdown"
    );

    print!("{}", aggregator.lock().unwrap().summary());

    Ok(())
}

/// Circle walk around the maze center, matching the mock server's motion
fn wander(steps: usize) -> Vec<AvatarState> {
    (0..steps)
        .map(|step| {
            let step = step as f64;
            let angle = (step * 0.3).to_radians();
            AvatarState::new(
                5.0 + angle.sin() * 4.0,
                5.0 + angle.cos() * 4.0,
                (step * 0.2) % 360.0,
            )
        })
        .collect()
}
