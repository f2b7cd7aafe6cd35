//! Default paths for vigild components
//!
//! Provides centralized path defaults that all crates can use.
//! Paths are user-writable by default (no root required):
//! - Config: `$XDG_CONFIG_HOME/vigild/config.toml` or `~/.config/vigild/config.toml`
//! - Socket: `$XDG_RUNTIME_DIR/vigild/vigild.sock` or `/tmp/vigild-$USER/vigild.sock`
//! - Logs: `$XDG_STATE_HOME/vigild` or `~/.local/state/vigild`

use std::path::PathBuf;

/// Environment variable for overriding the socket path
pub const VIGIL_SOCKET_ENV: &str = "VIGILD_SOCKET";

/// Socket filename within the socket directory
const SOCKET_FILENAME: &str = "vigild.sock";

/// Application subdirectory name
const APP_DIR: &str = "vigild";

/// Get the default config file path.
///
/// `$XDG_CONFIG_HOME/vigild/config.toml` if XDG_CONFIG_HOME is set,
/// otherwise `~/.config/vigild/config.toml`.
pub fn default_config_path() -> PathBuf {
    if let Ok(config_home) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(config_home).join(APP_DIR).join("config.toml");
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".config")
            .join(APP_DIR)
            .join("config.toml");
    }

    PathBuf::from("/etc").join(APP_DIR).join("config.toml")
}

/// Get the default socket path.
///
/// Order of precedence:
/// 1. `$VIGILD_SOCKET` environment variable (if set)
/// 2. `$XDG_RUNTIME_DIR/vigild/vigild.sock` (if XDG_RUNTIME_DIR is set)
/// 3. `/tmp/vigild-$USER/vigild.sock` (fallback)
pub fn default_socket_path() -> PathBuf {
    if let Ok(path) = std::env::var(VIGIL_SOCKET_ENV) {
        return PathBuf::from(path);
    }

    socket_path_without_env()
}

/// Get the socket path without checking the VIGILD_SOCKET env var.
/// Used for default values in configs where the env var is checked separately.
pub fn socket_path_without_env() -> PathBuf {
    // Try XDG_RUNTIME_DIR first (typically /run/user/<uid>)
    if let Ok(runtime_dir) = std::env::var("XDG_RUNTIME_DIR") {
        return PathBuf::from(runtime_dir).join(APP_DIR).join(SOCKET_FILENAME);
    }

    // Fallback to /tmp with username
    let username = std::env::var("USER").unwrap_or_else(|_| "unknown".to_string());
    PathBuf::from(format!("/tmp/{}-{}", APP_DIR, username)).join(SOCKET_FILENAME)
}

/// Get the default log directory.
///
/// `$XDG_STATE_HOME/vigild` if XDG_STATE_HOME is set,
/// otherwise `~/.local/state/vigild`.
pub fn default_log_dir() -> PathBuf {
    if let Ok(state_home) = std::env::var("XDG_STATE_HOME") {
        return PathBuf::from(state_home).join(APP_DIR);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".local")
            .join("state")
            .join(APP_DIR);
    }

    PathBuf::from("/tmp").join(APP_DIR).join("logs")
}
