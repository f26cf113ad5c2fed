//! Maze API abstraction
//!
//! Defines the session-level operations on top of [`StateSource`], so the
//! bootstrap pipeline can run against the real HTTP client or the mock
//! through one interface.

use std::future::Future;

use contracts::{ClientError, MazeLayout, StateSource};

/// Session-level maze API
///
/// `get_user_id` must be called before any session-scoped operation; the
/// client holds the id and attaches it to subsequent requests. Position
/// polling itself comes from the [`StateSource`] supertrait.
pub trait MazeApi: StateSource {
    /// Establish a session and return its id
    fn get_user_id(&self) -> impl Future<Output = Result<String, ClientError>> + Send;

    /// Fetch the maze layout for the current session
    fn get_maze(&self) -> impl Future<Output = Result<MazeLayout, ClientError>> + Send;
}
