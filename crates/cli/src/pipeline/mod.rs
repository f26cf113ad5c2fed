//! Session pipeline: orchestration, companion check, statistics.

mod companion;
mod orchestrator;
mod stats;

pub use companion::Companion;
pub use orchestrator::{Session, SessionConfig};
pub use stats::SessionStats;
