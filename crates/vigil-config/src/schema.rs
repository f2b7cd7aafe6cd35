//! Raw configuration schema (as parsed from TOML)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw configuration as parsed from TOML
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawSettings {
    /// Config schema version
    pub config_version: u32,

    /// Minutes between attentiveness checks
    #[serde(default = "default_check_interval_minutes")]
    pub check_interval_minutes: u64,

    /// Seconds the user has to answer a check before the action fires
    #[serde(default = "default_response_timeout_seconds")]
    pub response_timeout_seconds: u64,

    /// Power action taken on an unanswered check: "shutdown", "sleep", or "lock"
    #[serde(default = "default_action")]
    pub action: String,

    /// Whether the prompt should play an alert sound
    #[serde(default = "default_sound_enabled")]
    pub sound_enabled: bool,

    /// Register the daemon to start with the desktop session
    #[serde(default)]
    pub autostart: bool,

    /// Daemon-level settings
    #[serde(default)]
    pub daemon: RawDaemonConfig,
}

/// Daemon-level settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawDaemonConfig {
    /// IPC socket path (default: $XDG_RUNTIME_DIR/vigild/vigild.sock)
    pub socket_path: Option<PathBuf>,

    /// Log directory
    pub log_dir: Option<PathBuf>,
}

impl Default for RawSettings {
    fn default() -> Self {
        Self {
            config_version: crate::CURRENT_CONFIG_VERSION,
            check_interval_minutes: default_check_interval_minutes(),
            response_timeout_seconds: default_response_timeout_seconds(),
            action: default_action(),
            sound_enabled: default_sound_enabled(),
            autostart: false,
            daemon: RawDaemonConfig::default(),
        }
    }
}

fn default_check_interval_minutes() -> u64 {
    20
}

fn default_response_timeout_seconds() -> u64 {
    30
}

fn default_action() -> String {
    "shutdown".to_string()
}

fn default_sound_enabled() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_fields() {
        let raw: RawSettings = toml::from_str("config_version = 1").unwrap();
        assert_eq!(raw.check_interval_minutes, 20);
        assert_eq!(raw.response_timeout_seconds, 30);
        assert_eq!(raw.action, "shutdown");
        assert!(raw.sound_enabled);
        assert!(!raw.autostart);
        assert!(raw.daemon.socket_path.is_none());
    }
}
