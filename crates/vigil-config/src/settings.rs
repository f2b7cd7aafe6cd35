//! Validated settings used by the engine and daemon

use crate::schema::RawSettings;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use vigil_api::ActionKind;

/// Validated runtime settings
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Time between attentiveness checks
    pub check_interval: Duration,

    /// Time the user has to answer a check
    pub response_timeout: Duration,

    /// Action taken on an unanswered check
    pub action: ActionKind,

    /// Whether the prompt should play an alert sound
    pub sound_enabled: bool,

    /// Register the daemon to start with the desktop session
    pub autostart: bool,

    /// IPC socket path override
    pub socket_path: Option<PathBuf>,

    /// Log directory override
    pub log_dir: Option<PathBuf>,
}

impl Settings {
    /// Convert validated raw settings. Assumes `validate_settings` passed.
    pub fn from_raw(raw: RawSettings) -> Self {
        Self {
            check_interval: Duration::from_secs(raw.check_interval_minutes.saturating_mul(60)),
            response_timeout: Duration::from_secs(raw.response_timeout_seconds),
            action: raw.action.parse().unwrap_or(ActionKind::Shutdown),
            sound_enabled: raw.sound_enabled,
            autostart: raw.autostart,
            socket_path: raw.daemon.socket_path,
            log_dir: raw.daemon.log_dir,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_raw(RawSettings::default())
    }
}

/// Shared, reloadable view of the settings.
///
/// The engine snapshots this at the start of each wait cycle and when a
/// challenge opens; a reload takes effect on the next cycle, never mid-challenge.
#[derive(Debug, Clone, Default)]
pub struct SettingsHandle {
    inner: Arc<RwLock<Settings>>,
}

impl SettingsHandle {
    pub fn new(settings: Settings) -> Self {
        Self {
            inner: Arc::new(RwLock::new(settings)),
        }
    }

    /// Current settings by value
    pub fn snapshot(&self) -> Settings {
        self.inner.read().expect("settings lock poisoned").clone()
    }

    /// Swap in new settings, returning the previous ones
    pub fn replace(&self, settings: Settings) -> Settings {
        let mut guard = self.inner.write().expect("settings lock poisoned");
        std::mem::replace(&mut *guard, settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_raw_converts_units() {
        let settings = Settings::from_raw(RawSettings::default());
        assert_eq!(settings.check_interval, Duration::from_secs(20 * 60));
        assert_eq!(settings.response_timeout, Duration::from_secs(30));
        assert_eq!(settings.action, ActionKind::Shutdown);
        assert!(settings.sound_enabled);
    }

    #[test]
    fn handle_replace_is_visible_to_clones() {
        let handle = SettingsHandle::new(Settings::default());
        let other = handle.clone();

        let mut updated = Settings::default();
        updated.sound_enabled = false;
        handle.replace(updated);

        assert!(!other.snapshot().sound_enabled);
    }
}
