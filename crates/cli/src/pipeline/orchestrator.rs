//! Session orchestrator - coordinates all components.
//!
//! Bootstraps a session the way the reference client does: establish the
//! session id, fetch the maze, seed the first state with a manual update,
//! subscribe the observers, then hand control to the poll loop.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use api_client::{HttpApiClient, MazeApi, MockConfig, MockStateClient};
use contracts::{AvatarState, ClientBlueprint};
use observability::PollMetricsAggregator;
use state_sync::PollEngine;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::{info, warn};

use super::{Companion, SessionStats};

/// Session configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// The client blueprint configuration
    pub blueprint: ClientBlueprint,

    /// Maximum number of applied updates (None = unlimited)
    pub max_updates: Option<u64>,

    /// Session timeout (None = no timeout)
    pub timeout: Option<Duration>,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// Why a session ended on its own
enum SessionEnd {
    CompanionMet,
    TargetReached,
}

/// Main session orchestrator
pub struct Session {
    config: SessionConfig,
}

impl Session {
    /// Create a new session with the given configuration
    pub fn new(config: SessionConfig) -> Self {
        Self { config }
    }

    /// Run against the real maze server
    pub async fn run(self) -> Result<SessionStats> {
        let api = HttpApiClient::new(self.config.blueprint.server.api_base_url.clone());
        self.run_with(api).await
    }

    /// Run against the built-in mock server (no network)
    pub async fn run_mock(self) -> Result<SessionStats> {
        let api = MockStateClient::with_config(MockConfig {
            states: wander_script(2000),
            latency: Duration::from_millis(5),
            ..MockConfig::default()
        });
        self.run_with(api).await
    }

    /// Run the session against any maze API implementation
    pub async fn run_with<A: MazeApi + 'static>(self, api: A) -> Result<SessionStats> {
        let started = Instant::now();
        let blueprint = &self.config.blueprint;

        // Initialize metrics (optional)
        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        // Establish session
        let user_id = api
            .get_user_id()
            .await
            .with_context(|| {
                format!(
                    "Failed to establish session at {}",
                    blueprint.server.api_base_url
                )
            })?;
        info!(session_id = %user_id, "Session established");

        // Fetch maze layout
        let maze = api.get_maze().await.context("Failed to fetch maze layout")?;
        info!(
            width = maze.width(),
            height = maze.height(),
            walls = maze.walls.len(),
            "Maze layout fetched"
        );

        let companion = Arc::new(Mutex::new(Companion::from_config(
            &blueprint.companion,
            &maze,
        )));
        let aggregator = Arc::new(Mutex::new(PollMetricsAggregator::new()));

        // The engine owns the API from here on; polling is its only use
        let interval = Duration::from_millis(blueprint.server.position_update_interval_ms);
        let engine = PollEngine::with_interval(api, interval)?;

        // Seed the first state before the loop starts
        let first = engine
            .update()
            .await
            .context("Initial position fetch failed")?;
        info!(
            x = first.position.x,
            y = first.position.y,
            direction = first.direction,
            "Initial avatar state"
        );
        aggregator.lock().unwrap().record_applied(&first);
        companion
            .lock()
            .unwrap()
            .check(first.position.x, first.position.y);

        // Subscribe observers
        let (end_tx, mut end_rx) = mpsc::unbounded_channel();
        let applied = Arc::new(AtomicU64::new(1));
        let max_updates = self.config.max_updates;
        {
            let aggregator = Arc::clone(&aggregator);
            let companion = Arc::clone(&companion);
            let applied = Arc::clone(&applied);
            engine.add_listener(move |state: &AvatarState| {
                observability::record_state_applied(state);
                aggregator.lock().unwrap().record_applied(state);

                let met = companion
                    .lock()
                    .unwrap()
                    .check(state.position.x, state.position.y);
                let count = applied.fetch_add(1, Ordering::SeqCst) + 1;

                if met {
                    let _ = end_tx.send(SessionEnd::CompanionMet);
                } else if max_updates.is_some_and(|max| count >= max) {
                    let _ = end_tx.send(SessionEnd::TargetReached);
                }
            });
        }

        // Start the poll loop
        engine.start();
        info!(interval_ms = interval.as_millis() as u64, "Poll loop started");

        // Wait for a session-ending condition
        let ended = async {
            match end_rx.recv().await {
                Some(SessionEnd::CompanionMet) => {
                    println!("Doge Doge!!!");
                    info!("Companion met, session complete");
                }
                Some(SessionEnd::TargetReached) => {
                    info!(max_updates = ?max_updates, "Update target reached");
                }
                None => warn!("Session end channel closed unexpectedly"),
            }
        };
        match self.config.timeout {
            Some(timeout) => tokio::select! {
                _ = ended => {}
                _ = sleep(timeout) => info!("Session timeout reached"),
            },
            None => ended.await,
        }

        engine.stop();

        let poll_metrics = aggregator.lock().unwrap().clone();
        let companion_met = companion.lock().unwrap().is_met();
        Ok(SessionStats {
            user_id,
            updates_applied: applied.load(Ordering::SeqCst),
            companion_met,
            duration: started.elapsed(),
            engine: Some(engine.stats()),
            poll_metrics,
        })
    }
}

/// Scripted wander matching the reference mock server: the avatar circles
/// the maze center while slowly spinning.
fn wander_script(steps: usize) -> Vec<AvatarState> {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wander_script_starts_at_top_of_circle() {
        let script = wander_script(10);
        assert_eq!(script.len(), 10);
        assert!((script[0].position.x - 5.0).abs() < 1e-9);
        assert!((script[0].position.y - 9.0).abs() < 1e-9);
        assert_eq!(script[0].direction, 0.0);
    }

    #[test]
    fn test_wander_script_passes_near_default_companion() {
        // The circle of radius 4 around (5,5) comes within 0.5 maze units
        // of the default companion cell (1.5, 2.5) at some step.
        let script = wander_script(2000);
        let companion = contracts::Position::new(1.5, 2.5);
        assert!(script
            .iter()
            .any(|s| s.position.distance_squared(&companion) < 0.25));
    }

    #[tokio::test]
    async fn test_session_against_mock_reaches_update_target() {
        let mut blueprint = ClientBlueprint::default();
        blueprint.server.position_update_interval_ms = 10;
        // Companion far outside the wander circle so only the target ends it
        blueprint.companion.position = Some([0.1, 9.9]);

        let session = Session::new(SessionConfig {
            blueprint,
            max_updates: Some(5),
            timeout: Some(Duration::from_secs(30)),
            metrics_port: None,
        });

        let stats = session.run_mock().await.unwrap();
        assert!(stats.updates_applied >= 5);
        assert!(!stats.companion_met);
        assert_eq!(stats.user_id, "mock-1");
    }
}
