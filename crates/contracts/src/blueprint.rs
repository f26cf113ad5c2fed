//! ClientBlueprint - Config Loader output
//!
//! Describes the complete client configuration: server endpoint, poll cadence,
//! companion placement.

use serde::{Deserialize, Serialize};

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete client configuration blueprint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientBlueprint {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Maze server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Poll engine settings
    #[serde(default)]
    pub sync: SyncConfig,

    /// Companion ("doge") settings
    #[serde(default)]
    pub companion: CompanionConfig,
}

impl Default for ClientBlueprint {
    fn default() -> Self {
        Self {
            version: ConfigVersion::V1,
            server: ServerConfig::default(),
            sync: SyncConfig::default(),
            companion: CompanionConfig::default(),
        }
    }
}

/// Maze server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Base URL of the maze API
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Position poll interval in milliseconds, must be > 0
    #[serde(default = "default_position_update_interval_ms")]
    pub position_update_interval_ms: u64,
}

fn default_api_base_url() -> String {
    "http://127.0.0.1:5000/api".to_string()
}

fn default_position_update_interval_ms() -> u64 {
    100
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            position_update_interval_ms: default_position_update_interval_ms(),
        }
    }
}

/// Poll engine settings
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Fallback interval used when the engine is constructed without an
    /// explicit cadence, in milliseconds
    #[serde(default = "default_update_interval_ms")]
    pub default_interval_ms: u64,
}

fn default_update_interval_ms() -> u64 {
    500
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            default_interval_ms: default_update_interval_ms(),
        }
    }
}

/// Companion ("doge") settings
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CompanionConfig {
    /// Meet-circle radius in maze units, must be > 0
    #[serde(default = "default_companion_radius")]
    pub radius: f64,

    /// Fixed companion position; random cell center when absent
    #[serde(default)]
    pub position: Option<[f64; 2]>,
}

fn default_companion_radius() -> f64 {
    0.5
}

impl Default for CompanionConfig {
    fn default() -> Self {
        Self {
            radius: default_companion_radius(),
            position: None,
        }
    }
}
