//! StateSource trait - remote avatar state abstraction
//!
//! Defines a unified interface for the authoritative state provider, decoupling
//! the poll engine from the concrete HTTP client. Supports unified handling of
//! the real maze API and mock sources in tests.

use std::future::Future;

use crate::{AvatarState, ClientError};

/// Remote avatar state source
///
/// One fetch resolves to a fresh snapshot or fails with a transport error.
/// Must be safely callable repeatedly; polling is assumed idempotent on the
/// server side.
///
/// # Example
///
/// ```ignore
/// let state = source.fetch_state().await?;
/// println!("avatar at ({}, {})", state.position.x, state.position.y);
/// ```
pub trait StateSource: Send + Sync {
    /// Fetch the latest authoritative avatar state
    fn fetch_state(&self) -> impl Future<Output = Result<AvatarState, ClientError>> + Send;
}
