//! Live Session Demo
//!
//! Polls a running maze server and prints applied avatar states until
//! interrupted. Expects the server's API endpoint as the first argument,
//! defaulting to the local development server.
//!
//! Run with: cargo run --bin live_session -- http://127.0.0.1:5000/api

use std::time::Duration;

use api_client::{HttpApiClient, MazeApi};
use contracts::AvatarState;
use state_sync::PollEngine;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let base_url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "http://127.0.0.1:5000/api".to_string());
    tracing::info!(base_url = %base_url, "Starting Live Session Demo");

    let api = HttpApiClient::new(base_url);

    let user_id = api.get_user_id().await?;
    tracing::info!(session_id = %user_id, "Session established");

    let maze = api.get_maze().await?;
    tracing::info!(
        width = maze.width(),
        height = maze.height(),
        walls = maze.walls.len(),
        "Maze layout fetched"
    );

    let engine = PollEngine::with_interval(api, Duration::from_millis(100))?;
    engine.add_listener(|state: &AvatarState| {
        tracing::info!(
            x = format!("{:.2}", state.position.x),
            y = format!("{:.2}", state.position.y),
            direction = format!("{:.1}", state.direction),
            "State applied"
        );
    });

    // Seed the first state, then poll until Ctrl+C
    engine.update().await?;
    engine.start();

    tokio::signal::ctrl_c().await?;
    tracing::info!("Interrupted, stopping");
    engine.stop();

    let stats = engine.stats();
    tracing::info!(
        poll_rate = format!("{:.2}", stats.average_request_per_second),
        avg_delay_ms = ?stats.average_network_delay_ms,
        "Engine health at shutdown"
    );

    Ok(())
}
