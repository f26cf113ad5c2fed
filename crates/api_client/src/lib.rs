//! # API Client
//!
//! Maze server API wrapper.
//!
//! Responsibilities:
//! - Speak the JSON POST protocol (`action` dispatch field, session id)
//! - Acquire and hold the session id (`getUserId`)
//! - Fetch the maze layout (`getMaze`) and avatar state (`getPosition`)
//! - Provide a mock implementation for engine and pipeline tests
//!
//! The real client and the mock both implement [`contracts::StateSource`],
//! so the poll engine never knows which one it is driving.

mod client;
mod http_client;
mod mock_client;
mod protocol;

pub use client::MazeApi;
pub use http_client::HttpApiClient;
pub use mock_client::{MockConfig, MockStateClient};

// Re-export contract types used on the public surface
pub use contracts::{AvatarState, ClientError, MazeLayout, StateSource};
