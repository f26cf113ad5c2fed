//! Layered error definitions
//!
//! Categorized by source: config / transport / session / sync

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ClientError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Transport Errors =====
    /// Network-level failure while talking to the maze server
    #[error("transport error: {message}")]
    Transport {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The server answered, but the payload could not be decoded
    #[error("malformed response for '{operation}': {message}")]
    MalformedResponse { operation: String, message: String },

    // ===== Session Errors =====
    /// A session-scoped operation was called before `getUserId`
    #[error("session not established: call get_user_id first")]
    SessionNotEstablished,

    // ===== Sync Errors =====
    /// Non-positive poll interval
    #[error("invalid update interval: {ms}ms (must be > 0)")]
    InvalidInterval { ms: u64 },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ClientError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create transport error without an underlying source
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            source: None,
        }
    }

    /// Create transport error wrapping an underlying cause
    pub fn transport_with(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Transport {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create malformed-response error
    pub fn malformed(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// True for errors raised by the transport layer (network or decode)
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. } | Self::MalformedResponse { .. }
        )
    }
}
