//! Core monitoring engine

use chrono::{DateTime, Local};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};
use vigil_api::{
    ChallengeInfo, MonitorPhase, MonitorSnapshot, StopReason, API_VERSION,
};
use vigil_config::{Settings, SettingsHandle};
use vigil_host_api::{ActionExecutor, PromptError, PromptRequest, PromptSurface};
use vigil_util::{display_seconds, MonotonicInstant};

use crate::{Challenge, EngineEvent, LOW_TIME_THRESHOLD_SECS};

/// Engine errors surfaced to the daemon
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Challenge prompt unavailable: {0}")]
    PromptUnavailable(#[from] PromptError),
}

pub type EngineResult<T> = Result<T, EngineError>;

/// Current engine phase
#[derive(Debug)]
enum Phase {
    Stopped,
    Waiting {
        /// Wall-clock check time (for display)
        next_check_at: DateTime<Local>,
        /// Monotonic check time (for enforcement)
        next_check_mono: MonotonicInstant,
    },
    Challenging {
        challenge: Challenge,
    },
}

/// The attentiveness monitoring engine.
///
/// Tick-driven: the daemon calls [`MonitorEngine::tick`] once per second and
/// broadcasts the returned events. All transitions happen through `&mut self`,
/// so callers holding the engine behind a mutex get stop-wins ordering for
/// free: once `stop` returns, no later tick can fire the action.
pub struct MonitorEngine {
    settings: SettingsHandle,
    executor: Arc<dyn ActionExecutor>,
    prompt: Arc<dyn PromptSurface>,
    phase: Phase,
}

impl MonitorEngine {
    /// Create a new engine in the stopped state
    pub fn new(
        settings: SettingsHandle,
        executor: Arc<dyn ActionExecutor>,
        prompt: Arc<dyn PromptSurface>,
    ) -> Self {
        let snapshot = settings.snapshot();
        info!(
            check_interval_secs = snapshot.check_interval.as_secs(),
            response_timeout_secs = snapshot.response_timeout.as_secs(),
            action = %snapshot.action,
            "Monitor engine initialized"
        );

        Self {
            settings,
            executor,
            prompt,
            phase: Phase::Stopped,
        }
    }

    /// Phase tag as exposed to clients
    pub fn phase(&self) -> MonitorPhase {
        match &self.phase {
            Phase::Stopped => MonitorPhase::Stopped,
            Phase::Waiting { .. } => MonitorPhase::Waiting,
            Phase::Challenging { .. } => MonitorPhase::Challenging,
        }
    }

    /// Whether monitoring is active (waiting or challenging)
    pub fn is_running(&self) -> bool {
        !matches!(self.phase, Phase::Stopped)
    }

    /// Start monitoring. Returns `None` when already running.
    pub fn start(
        &mut self,
        now: DateTime<Local>,
        now_mono: MonotonicInstant,
    ) -> Option<EngineEvent> {
        if self.is_running() {
            debug!("Start requested while already running");
            return None;
        }

        let settings = self.settings.snapshot();
        let next_check_at = self.arm_wait(&settings, now, now_mono);

        info!(next_check_at = %next_check_at, "Monitoring started");

        Some(EngineEvent::MonitoringStarted { next_check_at })
    }

    /// Stop monitoring unconditionally.
    ///
    /// An open challenge is dismissed without resolving it; the action
    /// executor is never invoked on this path. Returns `None` when already
    /// stopped.
    pub async fn stop(&mut self, reason: StopReason) -> Option<EngineEvent> {
        match std::mem::replace(&mut self.phase, Phase::Stopped) {
            Phase::Stopped => None,
            Phase::Waiting { .. } => {
                info!(reason = ?reason, "Monitoring stopped");
                Some(EngineEvent::MonitoringStopped { reason })
            }
            Phase::Challenging { challenge } => {
                if let Err(e) = self.prompt.dismiss(&challenge.id).await {
                    warn!(challenge_id = %challenge.id, error = %e, "Failed to dismiss prompt on stop");
                }
                info!(
                    challenge_id = %challenge.id,
                    reason = ?reason,
                    "Monitoring stopped with open challenge"
                );
                Some(EngineEvent::MonitoringStopped { reason })
            }
        }
    }

    /// Advance the engine by one tick.
    ///
    /// Drives the wait deadline into a challenge, the countdown into prompt
    /// updates, and the challenge deadline into the power action.
    pub async fn tick(
        &mut self,
        now: DateTime<Local>,
        now_mono: MonotonicInstant,
    ) -> EngineResult<Vec<EngineEvent>> {
        match &mut self.phase {
            Phase::Stopped => Ok(Vec::new()),

            Phase::Waiting { next_check_mono, .. } => {
                if now_mono < *next_check_mono {
                    return Ok(Vec::new());
                }
                self.open_challenge(now, now_mono).await
            }

            Phase::Challenging { challenge } => {
                if challenge.is_expired(now_mono) {
                    return Ok(self.fire_timeout().await);
                }

                let mut events = Vec::new();
                if let Some(step) = challenge.countdown_tick(now_mono) {
                    // Update failures are not fatal; the deadline still holds.
                    if let Err(e) = self
                        .prompt
                        .update(&challenge.id, step.remaining_seconds, step.low_time)
                        .await
                    {
                        warn!(
                            challenge_id = %challenge.id,
                            error = %e,
                            "Failed to update prompt countdown"
                        );
                    }
                    events.push(EngineEvent::ChallengeCountdown {
                        challenge_id: challenge.id,
                        remaining_seconds: step.remaining_seconds,
                        low_time: step.low_time,
                    });
                }
                Ok(events)
            }
        }
    }

    /// Record a user response to the open challenge.
    ///
    /// Returns `None` unless a challenge is open and unresolved; a second
    /// response to the same challenge is a no-op.
    pub async fn respond(
        &mut self,
        now: DateTime<Local>,
        now_mono: MonotonicInstant,
    ) -> Option<EngineEvent> {
        let challenge = match &mut self.phase {
            Phase::Challenging { challenge } => challenge,
            _ => return None,
        };

        if !challenge.resolve_response() {
            return None;
        }
        let challenge_id = challenge.id;

        if let Err(e) = self.prompt.dismiss(&challenge_id).await {
            warn!(challenge_id = %challenge_id, error = %e, "Failed to dismiss prompt on response");
        }

        // Next cycle reads current settings; a reload takes effect here.
        let settings = self.settings.snapshot();
        let next_check_at = self.arm_wait(&settings, now, now_mono);

        info!(
            challenge_id = %challenge_id,
            next_check_at = %next_check_at,
            "Challenge answered"
        );

        Some(EngineEvent::ChallengeAnswered {
            challenge_id,
            next_check_at,
        })
    }

    /// Time until the next check. `Some` only while waiting.
    pub fn time_until_next_check(&self, now_mono: MonotonicInstant) -> Option<Duration> {
        match &self.phase {
            Phase::Waiting { next_check_mono, .. } => {
                Some(next_check_mono.saturating_duration_until(now_mono))
            }
            _ => None,
        }
    }

    /// Full state snapshot for IPC clients
    pub fn snapshot(&self, now_mono: MonotonicInstant) -> MonitorSnapshot {
        let settings = self.settings.snapshot();

        let (next_check_at, time_until_next_check, challenge) = match &self.phase {
            Phase::Stopped => (None, None, None),
            Phase::Waiting {
                next_check_at,
                next_check_mono,
            } => (
                Some(*next_check_at),
                Some(next_check_mono.saturating_duration_until(now_mono)),
                None,
            ),
            Phase::Challenging { challenge } => {
                let remaining_seconds = display_seconds(challenge.time_remaining(now_mono));
                (
                    None,
                    None,
                    Some(ChallengeInfo {
                        challenge_id: challenge.id,
                        deadline: challenge.deadline,
                        timeout: challenge.timeout,
                        remaining_seconds,
                        low_time: remaining_seconds <= LOW_TIME_THRESHOLD_SECS,
                        sound: challenge.sound,
                    }),
                )
            }
        };

        // The frozen action wins over the configured one mid-challenge.
        let action = match &self.phase {
            Phase::Challenging { challenge } => challenge.action,
            _ => settings.action,
        };

        MonitorSnapshot {
            api_version: API_VERSION,
            phase: self.phase(),
            next_check_at,
            time_until_next_check,
            challenge,
            action,
            check_interval: settings.check_interval,
            response_timeout: settings.response_timeout,
        }
    }

    fn arm_wait(
        &mut self,
        settings: &Settings,
        now: DateTime<Local>,
        now_mono: MonotonicInstant,
    ) -> DateTime<Local> {
        let next_check_at =
            now + chrono::Duration::from_std(settings.check_interval).unwrap_or_default();
        self.phase = Phase::Waiting {
            next_check_at,
            next_check_mono: now_mono + settings.check_interval,
        };
        next_check_at
    }

    /// Waiting deadline has passed: freeze settings and show the prompt.
    async fn open_challenge(
        &mut self,
        now: DateTime<Local>,
        now_mono: MonotonicInstant,
    ) -> EngineResult<Vec<EngineEvent>> {
        let settings = self.settings.snapshot();
        let challenge = Challenge::open(
            settings.action,
            settings.response_timeout,
            settings.sound_enabled,
            now,
            now_mono,
        );

        let request = PromptRequest {
            challenge_id: challenge.id,
            timeout: challenge.timeout,
            deadline: challenge.deadline,
            sound: challenge.sound,
        };

        if let Err(e) = self.prompt.show(&request).await {
            // No way to challenge the user means no safe way to keep arming
            // the action; stop and surface the failure.
            warn!(challenge_id = %challenge.id, error = %e, "Cannot show challenge prompt");
            self.phase = Phase::Stopped;
            return Err(EngineError::PromptUnavailable(e));
        }

        info!(
            challenge_id = %challenge.id,
            deadline = %challenge.deadline,
            action = %challenge.action,
            "Challenge opened"
        );

        let event = EngineEvent::ChallengeOpened {
            challenge_id: challenge.id,
            deadline: challenge.deadline,
            timeout: challenge.timeout,
            sound: challenge.sound,
        };
        self.phase = Phase::Challenging { challenge };

        Ok(vec![event])
    }

    /// Challenge deadline has passed: perform the action, then stop.
    async fn fire_timeout(&mut self) -> Vec<EngineEvent> {
        // tick only calls this from Challenging
        let Phase::Challenging { challenge } = &mut self.phase else {
            return Vec::new();
        };

        if !challenge.resolve_timeout() {
            return Vec::new();
        }

        let challenge_id = challenge.id;
        let action = challenge.action;

        if let Err(e) = self.prompt.dismiss(&challenge_id).await {
            warn!(challenge_id = %challenge_id, error = %e, "Failed to dismiss prompt on timeout");
        }

        info!(
            challenge_id = %challenge_id,
            action = %action,
            "Challenge timed out, performing action"
        );

        let action_ok = match self.executor.perform(action).await {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    challenge_id = %challenge_id,
                    action = %action,
                    error = %e,
                    "Power action failed"
                );
                false
            }
        };

        self.phase = Phase::Stopped;

        vec![
            EngineEvent::ChallengeTimedOut {
                challenge_id,
                action,
                action_ok,
            },
            EngineEvent::MonitoringStopped {
                reason: StopReason::ActionFired { action },
            },
        ]
    }
}
