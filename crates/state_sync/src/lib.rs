//! # State Sync
//!
//! Periodic state-synchronization engine for the maze client.
//!
//! Responsibilities:
//! - Fixed-cadence polling of a [`contracts::StateSource`]
//! - Cycle-token supersession (overlapping responses never regress state)
//! - Online smoothing of poll interval and network delay
//! - Listener fan-out on every accepted state
//!
//! ## Usage
//!
//! ```ignore
//! use state_sync::PollEngine;
//! use std::time::Duration;
//!
//! let engine = PollEngine::new(client);
//! engine.set_interval(Duration::from_millis(100))?;
//! engine.add_listener(|state| {
//!     println!("avatar at ({}, {})", state.position.x, state.position.y);
//! });
//! engine.start();
//! ```

mod engine;
mod observable;
mod smoothing;

pub use engine::{EngineStats, PollEngine};
pub use observable::{Listener, ListenerId, ObservableState};
pub use smoothing::{smooth, SMOOTHING_ALPHA};

// Re-export contract types used on the public surface
pub use contracts::{AvatarState, ClientError, StateSource};
