//! Mock maze API client
//!
//! Scripted implementation for unit and integration tests. Supports
//! injectable per-call latency and failure scenarios.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use contracts::{AvatarState, ClientError, MazeLayout, StateSource, WallSegment};
use tokio::time::{sleep, Duration};
use tracing::instrument;

use crate::client::MazeApi;

/// Mock client configuration
#[derive(Debug, Clone)]
pub struct MockConfig {
    /// States returned by successive `fetch_state` calls; the last entry
    /// repeats once the script is exhausted
    pub states: Vec<AvatarState>,
    /// Simulated round-trip latency per call
    pub latency: Duration,
    /// 1-based `fetch_state` call numbers that fail with a transport error
    pub fail_calls: Vec<usize>,
    /// Maze layout served by `get_maze`
    pub maze: MazeLayout,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            states: vec![AvatarState::new(5.0, 5.0, 150.0)],
            latency: Duration::ZERO,
            fail_calls: Vec::new(),
            maze: boundary_maze(10, 10),
        }
    }
}

/// A maze with only its outer boundary walls
pub(crate) fn boundary_maze(width: u32, height: u32) -> MazeLayout {
    let (w, h) = (width as f64, height as f64);
    MazeLayout {
        size: [width, height],
        walls: vec![
            WallSegment { from: [0.0, 0.0], to: [0.0, h] },
            WallSegment { from: [0.0, h], to: [w, h] },
            WallSegment { from: [w, h], to: [w, 0.0] },
            WallSegment { from: [w, 0.0], to: [0.0, 0.0] },
        ],
    }
}

/// Mock maze API client
pub struct MockStateClient {
    config: MockConfig,
    /// `fetch_state` call counter
    position_calls: AtomicUsize,
    session: Mutex<Option<String>>,
}

impl MockStateClient {
    /// Create a mock with the default single-state script
    pub fn new() -> Self {
        Self::with_config(MockConfig::default())
    }

    /// Create a mock with a custom configuration
    pub fn with_config(config: MockConfig) -> Self {
        Self {
            config,
            position_calls: AtomicUsize::new(0),
            session: Mutex::new(None),
        }
    }

    /// Convenience: scripted states, everything else default
    pub fn with_states(states: Vec<AvatarState>) -> Self {
        Self::with_config(MockConfig {
            states,
            ..MockConfig::default()
        })
    }

    /// Number of `fetch_state` calls so far
    pub fn position_call_count(&self) -> usize {
        self.position_calls.load(Ordering::SeqCst)
    }

    fn ensure_session(&self) -> Result<(), ClientError> {
        if self.session.lock().unwrap().is_some() {
            Ok(())
        } else {
            Err(ClientError::SessionNotEstablished)
        }
    }
}

impl Default for MockStateClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MazeApi for MockStateClient {
    #[instrument(name = "mock_get_user_id", skip(self))]
    async fn get_user_id(&self) -> Result<String, ClientError> {
        let id = "mock-1".to_string();
        *self.session.lock().unwrap() = Some(id.clone());
        Ok(id)
    }

    #[instrument(name = "mock_get_maze", skip(self))]
    async fn get_maze(&self) -> Result<MazeLayout, ClientError> {
        self.ensure_session()?;
        Ok(self.config.maze.clone())
    }
}

impl StateSource for MockStateClient {
    async fn fetch_state(&self) -> Result<AvatarState, ClientError> {
        self.ensure_session()?;

        let call = self.position_calls.fetch_add(1, Ordering::SeqCst) + 1;
        let index = (call - 1).min(self.config.states.len().saturating_sub(1));
        let state = self
            .config
            .states
            .get(index)
            .copied()
            .ok_or_else(|| ClientError::transport("mock state script is empty"))?;

        if !self.config.latency.is_zero() {
            sleep(self.config.latency).await;
        }

        if self.config.fail_calls.contains(&call) {
            return Err(ClientError::transport("mock failure"));
        }
        Ok(state)
    }
}
