//! # Contracts
//!
//! Frozen interface contracts (ICD), defining inter-module data structures and traits.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Wall-clock instants come from the tokio clock (`Instant`); the contracts layer
//!   itself only carries millisecond scalars (f64)
//! - The avatar heading is in degrees, `[0, 360)` by server convention; the client
//!   never validates or wraps it

mod blueprint;
mod error;
mod source;
mod state;

pub use blueprint::*;
pub use error::*;
pub use source::StateSource;
pub use state::*;
