//! HTTP maze API client built on reqwest.

use std::sync::Mutex;

use contracts::{AvatarState, ClientError, MazeLayout, StateSource};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::client::MazeApi;
use crate::protocol::{ApiRequest, MazeResponse, PositionResponse, UserIdResponse};

/// Maze server client speaking the JSON POST protocol
///
/// One client per session. The session id acquired by [`get_user_id`] is
/// held internally and attached to every session-scoped request.
///
/// [`get_user_id`]: MazeApi::get_user_id
pub struct HttpApiClient {
    base_url: String,
    http: reqwest::Client,
    session_id: Mutex<Option<String>>,
}

impl HttpApiClient {
    /// Create a client for the given API base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
            session_id: Mutex::new(None),
        }
    }

    /// Session id from the last successful `get_user_id`, if any
    pub fn session_id(&self) -> Option<String> {
        self.session_id.lock().unwrap().clone()
    }

    fn require_session(&self) -> Result<String, ClientError> {
        self.session_id
            .lock()
            .unwrap()
            .clone()
            .ok_or(ClientError::SessionNotEstablished)
    }

    /// POST one operation and decode the response body
    async fn post<T: DeserializeOwned>(
        &self,
        operation: &str,
        id: Option<&str>,
    ) -> Result<T, ClientError> {
        let request = ApiRequest {
            action: operation,
            id,
        };

        let response = self
            .http
            .post(&self.base_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ClientError::transport_with(format!("request '{operation}' failed"), e))?;

        let response = response.error_for_status().map_err(|e| {
            ClientError::transport_with(format!("request '{operation}' rejected by server"), e)
        })?;

        response
            .json::<T>()
            .await
            .map_err(|e| ClientError::malformed(operation, e.to_string()))
    }
}

impl MazeApi for HttpApiClient {
    #[instrument(name = "api_get_user_id", skip(self), fields(base_url = %self.base_url))]
    async fn get_user_id(&self) -> Result<String, ClientError> {
        let res: UserIdResponse = self.post("getUserId", None).await?;
        debug!(session_id = %res.id, "session established");
        *self.session_id.lock().unwrap() = Some(res.id.clone());
        Ok(res.id)
    }

    #[instrument(name = "api_get_maze", skip(self))]
    async fn get_maze(&self) -> Result<MazeLayout, ClientError> {
        let id = self.require_session()?;
        let res: MazeResponse = self.post("getMaze", Some(&id)).await?;
        debug!(size = ?res.size, walls = res.map.len(), "maze layout fetched");
        Ok(res.into())
    }
}

impl StateSource for HttpApiClient {
    async fn fetch_state(&self) -> Result<AvatarState, ClientError> {
        let id = self.require_session()?;
        let res: PositionResponse = self.post("getPosition", Some(&id)).await?;
        Ok(AvatarState::new(
            res.position[0].0,
            res.position[1].0,
            res.direction.0,
        ))
    }
}
