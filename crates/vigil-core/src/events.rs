//! Events emitted by the monitoring engine

use chrono::{DateTime, Local};
use vigil_api::{ActionKind, StopReason};
use vigil_util::ChallengeId;
use std::time::Duration;

/// Events emitted by the monitoring engine
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// Monitoring started; first check is scheduled
    MonitoringStarted {
        next_check_at: DateTime<Local>,
    },

    /// Monitoring stopped
    MonitoringStopped {
        reason: StopReason,
    },

    /// A challenge prompt is now open
    ChallengeOpened {
        challenge_id: ChallengeId,
        deadline: DateTime<Local>,
        timeout: Duration,
        sound: bool,
    },

    /// Countdown advanced by one displayed second
    ChallengeCountdown {
        challenge_id: ChallengeId,
        remaining_seconds: u64,
        low_time: bool,
    },

    /// The user answered an open challenge
    ChallengeAnswered {
        challenge_id: ChallengeId,
        next_check_at: DateTime<Local>,
    },

    /// The challenge timed out and the action was attempted
    ChallengeTimedOut {
        challenge_id: ChallengeId,
        action: ActionKind,
        action_ok: bool,
    },
}
