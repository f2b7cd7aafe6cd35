//! Shared types for the vigild API

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use vigil_util::ChallengeId;

/// Power action executed when a challenge times out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Shutdown,
    Sleep,
    Lock,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Shutdown => "shutdown",
            ActionKind::Sleep => "sleep",
            ActionKind::Lock => "lock",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ActionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "shutdown" => Ok(ActionKind::Shutdown),
            "sleep" | "suspend" => Ok(ActionKind::Sleep),
            "lock" => Ok(ActionKind::Lock),
            other => Err(format!("Unknown action: {}", other)),
        }
    }
}

/// Monitor phase tag as exposed to clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonitorPhase {
    Stopped,
    Waiting,
    Challenging,
}

/// Why a monitoring session stopped
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StopReason {
    /// User or shell requested stop
    UserStop,
    /// A challenge timed out and the configured action fired
    ActionFired { action: ActionKind },
    /// The challenge prompt could not be shown
    PromptUnavailable,
    /// Daemon shutting down
    DaemonShutdown,
}

/// Open challenge information for clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengeInfo {
    pub challenge_id: ChallengeId,
    /// Wall-clock deadline (for display)
    pub deadline: DateTime<Local>,
    /// Total response window of this challenge
    pub timeout: Duration,
    /// Whole seconds remaining, rounded up
    pub remaining_seconds: u64,
    /// Whether the low-time escalation has been reached
    pub low_time: bool,
    /// Whether the shell should alert audibly for this challenge
    pub sound: bool,
}

/// Full monitor state snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorSnapshot {
    pub api_version: u32,
    pub phase: MonitorPhase,
    /// Wall-clock time of the next check (Waiting only)
    pub next_check_at: Option<DateTime<Local>>,
    /// Duration until the next check (Waiting only)
    pub time_until_next_check: Option<Duration>,
    /// Open challenge (Challenging only)
    pub challenge: Option<ChallengeInfo>,
    /// Currently configured action
    pub action: ActionKind,
    pub check_interval: Duration,
    pub response_timeout: Duration,
}

/// Role for authorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientRole {
    /// Challenge dialog / tray shell - can start, stop, respond
    Shell,
    /// Local admin - can also reload config
    Admin,
    /// Read-only observer
    Observer,
}

impl ClientRole {
    pub fn can_start(&self) -> bool {
        matches!(self, ClientRole::Shell | ClientRole::Admin)
    }

    pub fn can_stop(&self) -> bool {
        matches!(self, ClientRole::Shell | ClientRole::Admin)
    }

    pub fn can_respond(&self) -> bool {
        matches!(self, ClientRole::Shell | ClientRole::Admin)
    }

    pub fn can_reload_config(&self) -> bool {
        matches!(self, ClientRole::Admin)
    }
}

/// Health status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub live: bool,
    pub ready: bool,
    pub settings_loaded: bool,
    /// Whether the host can perform the configured action
    pub action_supported: bool,
    /// Subscribed shell clients able to present a challenge
    pub prompt_clients: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_kind_round_trip() {
        for action in [ActionKind::Shutdown, ActionKind::Sleep, ActionKind::Lock] {
            let parsed: ActionKind = action.as_str().parse().unwrap();
            assert_eq!(parsed, action);
        }

        assert!("reboot".parse::<ActionKind>().is_err());
    }

    #[test]
    fn action_kind_serialization() {
        let json = serde_json::to_string(&ActionKind::Sleep).unwrap();
        assert_eq!(json, "\"sleep\"");

        let parsed: ActionKind = serde_json::from_str("\"lock\"").unwrap();
        assert_eq!(parsed, ActionKind::Lock);
    }

    #[test]
    fn stop_reason_serialization() {
        let reason = StopReason::ActionFired {
            action: ActionKind::Shutdown,
        };

        let json = serde_json::to_string(&reason).unwrap();
        assert!(json.contains("action_fired"));
        assert!(json.contains("shutdown"));
    }

    #[test]
    fn client_role_permissions() {
        assert!(ClientRole::Shell.can_respond());
        assert!(!ClientRole::Shell.can_reload_config());
        assert!(ClientRole::Admin.can_reload_config());
        assert!(!ClientRole::Observer.can_start());
    }
}
