//! Event types for vigild -> client streaming

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use vigil_util::ChallengeId;

use crate::{API_VERSION, ActionKind, MonitorSnapshot, StopReason};

/// Event envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub api_version: u32,
    pub timestamp: DateTime<Local>,
    pub payload: EventPayload,
}

impl Event {
    pub fn new(payload: EventPayload) -> Self {
        Self {
            api_version: API_VERSION,
            timestamp: vigil_util::now(),
            payload,
        }
    }
}

/// All possible events from the daemon to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventPayload {
    /// Full state snapshot (sent on subscribe and major changes)
    StateChanged(MonitorSnapshot),

    /// Monitoring has started; first check at `next_check_at`
    MonitoringStarted {
        next_check_at: DateTime<Local>,
    },

    /// Monitoring has stopped
    MonitoringStopped {
        reason: StopReason,
    },

    /// A challenge is open; the shell must present it
    ChallengeOpened {
        challenge_id: ChallengeId,
        deadline: DateTime<Local>,
        timeout: Duration,
        sound: bool,
    },

    /// Per-second countdown update for the open challenge
    ChallengeCountdown {
        challenge_id: ChallengeId,
        remaining_seconds: u64,
        /// True once remaining first reaches the escalation threshold
        low_time: bool,
    },

    /// The user answered the challenge in time
    ChallengeAnswered {
        challenge_id: ChallengeId,
        next_check_at: DateTime<Local>,
    },

    /// The challenge expired; the configured action was attempted
    ChallengeTimedOut {
        challenge_id: ChallengeId,
        action: ActionKind,
        action_ok: bool,
    },

    /// Configuration was reloaded (applies from the next cycle)
    ConfigReloaded,

    /// Daemon is shutting down
    Shutdown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_serialization() {
        let event = Event::new(EventPayload::ChallengeOpened {
            challenge_id: ChallengeId::new(),
            deadline: vigil_util::now(),
            timeout: Duration::from_secs(30),
            sound: true,
        });

        let json = serde_json::to_string(&event).unwrap();
        let parsed: Event = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.api_version, API_VERSION);
        assert!(matches!(parsed.payload, EventPayload::ChallengeOpened { .. }));
    }

    #[test]
    fn timed_out_event_carries_action() {
        let event = Event::new(EventPayload::ChallengeTimedOut {
            challenge_id: ChallengeId::new(),
            action: ActionKind::Sleep,
            action_ok: false,
        });

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("challenge_timed_out"));
        assert!(json.contains("sleep"));

        let parsed: Event = serde_json::from_str(&json).unwrap();
        if let EventPayload::ChallengeTimedOut { action, action_ok, .. } = parsed.payload {
            assert_eq!(action, ActionKind::Sleep);
            assert!(!action_ok);
        } else {
            panic!("Expected ChallengeTimedOut");
        }
    }
}
