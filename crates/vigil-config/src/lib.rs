//! Configuration parsing and validation for vigild
//!
//! Supports TOML configuration with:
//! - Versioned schema
//! - Check-interval, response-timeout, and action settings
//! - Validation with clear error messages
//! - A shared handle so settings can be reloaded without restarting

mod schema;
mod settings;
mod validation;

pub use schema::*;
pub use settings::*;
pub use validation::*;

use std::path::Path;
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation failed: {errors:?}")]
    ValidationFailed { errors: Vec<ValidationError> },

    #[error("Unsupported config version: {0}")]
    UnsupportedVersion(u32),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Load and validate settings from a TOML file.
///
/// A missing file yields the defaults; any other I/O failure is an error.
pub fn load_settings(path: impl AsRef<Path>) -> ConfigResult<Settings> {
    let content = match std::fs::read_to_string(path.as_ref()) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!(path = %path.as_ref().display(), "No config file, using defaults");
            return Ok(Settings::default());
        }
        Err(e) => return Err(e.into()),
    };
    parse_settings(&content)
}

/// Parse and validate settings from a TOML string
pub fn parse_settings(content: &str) -> ConfigResult<Settings> {
    let raw: RawSettings = toml::from_str(content)?;

    if raw.config_version != CURRENT_CONFIG_VERSION {
        return Err(ConfigError::UnsupportedVersion(raw.config_version));
    }

    let errors = validate_settings(&raw);
    if !errors.is_empty() {
        return Err(ConfigError::ValidationFailed { errors });
    }

    Ok(Settings::from_raw(raw))
}

/// Current supported config version
pub const CURRENT_CONFIG_VERSION: u32 = 1;
