//! Configuration validation module
//!
//! Validation rules:
//! - api_base_url non-empty with an http(s) scheme
//! - position_update_interval_ms > 0
//! - sync.default_interval_ms > 0
//! - companion.radius > 0 and finite
//! - companion.position coordinates finite when present

use contracts::{ClientBlueprint, ClientError};

/// Validate a ClientBlueprint configuration
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(blueprint: &ClientBlueprint) -> Result<(), ClientError> {
    validate_server(blueprint)?;
    validate_sync(blueprint)?;
    validate_companion(blueprint)?;
    Ok(())
}

fn validate_server(blueprint: &ClientBlueprint) -> Result<(), ClientError> {
    let url = blueprint.server.api_base_url.trim();
    if url.is_empty() {
        return Err(ClientError::config_validation(
            "server.api_base_url",
            "must not be empty",
        ));
    }
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ClientError::config_validation(
            "server.api_base_url",
            "must start with http:// or https://",
        ));
    }
    if blueprint.server.position_update_interval_ms == 0 {
        return Err(ClientError::config_validation(
            "server.position_update_interval_ms",
            "must be > 0",
        ));
    }
    Ok(())
}

fn validate_sync(blueprint: &ClientBlueprint) -> Result<(), ClientError> {
    if blueprint.sync.default_interval_ms == 0 {
        return Err(ClientError::config_validation(
            "sync.default_interval_ms",
            "must be > 0",
        ));
    }
    Ok(())
}

fn validate_companion(blueprint: &ClientBlueprint) -> Result<(), ClientError> {
    let radius = blueprint.companion.radius;
    if !radius.is_finite() || radius <= 0.0 {
        return Err(ClientError::config_validation(
            "companion.radius",
            "must be a positive finite number",
        ));
    }
    if let Some([x, y]) = blueprint.companion.position {
        if !x.is_finite() || !y.is_finite() {
            return Err(ClientError::config_validation(
                "companion.position",
                "coordinates must be finite",
            ));
        }
    }
    Ok(())
}
