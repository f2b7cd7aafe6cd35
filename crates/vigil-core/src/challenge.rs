//! Challenge state machine

use chrono::{DateTime, Local};
use vigil_api::ActionKind;
use vigil_util::{display_seconds, ChallengeId, MonotonicInstant};
use std::time::Duration;

/// Countdown threshold below which the prompt escalates (seconds remaining)
pub const LOW_TIME_THRESHOLD_SECS: u64 = 5;

/// How a challenge was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChallengeOutcome {
    /// The user answered in time
    Responded,
    /// The deadline passed with no answer
    TimedOut,
}

/// An open attentiveness challenge.
///
/// The action, timeout, and sound flag are frozen from the settings in
/// effect when the challenge opened; a reload never alters an open challenge.
#[derive(Debug, Clone)]
pub struct Challenge {
    /// Identity of this challenge
    pub id: ChallengeId,

    /// Power action that fires on timeout
    pub action: ActionKind,

    /// Full answer window
    pub timeout: Duration,

    /// Whether the prompt plays an alert sound
    pub sound: bool,

    /// Wall-clock open time (for display/logging)
    pub opened_at: DateTime<Local>,

    /// Wall-clock deadline (for display)
    pub deadline: DateTime<Local>,

    /// Monotonic deadline (for enforcement)
    pub deadline_mono: MonotonicInstant,

    /// Last remaining-seconds value announced to the prompt
    pub last_announced: Option<u64>,

    /// Whether the low-time escalation has fired
    pub low_time_fired: bool,

    /// Terminal outcome, set exactly once
    pub outcome: Option<ChallengeOutcome>,
}

/// A countdown step produced by [`Challenge::countdown_tick`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountdownStep {
    /// Whole seconds remaining, rounded up
    pub remaining_seconds: u64,

    /// True on the single step that crosses the low-time threshold
    pub low_time: bool,
}

impl Challenge {
    /// Open a new challenge with settings frozen from the current cycle
    pub fn open(
        action: ActionKind,
        timeout: Duration,
        sound: bool,
        now: DateTime<Local>,
        now_mono: MonotonicInstant,
    ) -> Self {
        let deadline = now + chrono::Duration::from_std(timeout).unwrap_or_default();
        let deadline_mono = now_mono + timeout;

        Self {
            id: ChallengeId::new(),
            action,
            timeout,
            sound,
            opened_at: now,
            deadline,
            deadline_mono,
            last_announced: None,
            low_time_fired: false,
            outcome: None,
        }
    }

    /// Time remaining using monotonic time
    pub fn time_remaining(&self, now_mono: MonotonicInstant) -> Duration {
        self.deadline_mono.saturating_duration_until(now_mono)
    }

    /// Whether the deadline has passed
    pub fn is_expired(&self, now_mono: MonotonicInstant) -> bool {
        now_mono >= self.deadline_mono
    }

    /// Whether the challenge has reached a terminal outcome
    pub fn is_resolved(&self) -> bool {
        self.outcome.is_some()
    }

    /// Resolve as answered. Returns false if already resolved.
    pub fn resolve_response(&mut self) -> bool {
        if self.outcome.is_some() {
            return false;
        }
        self.outcome = Some(ChallengeOutcome::Responded);
        true
    }

    /// Resolve as timed out. Returns false if already resolved.
    pub fn resolve_timeout(&mut self) -> bool {
        if self.outcome.is_some() {
            return false;
        }
        self.outcome = Some(ChallengeOutcome::TimedOut);
        true
    }

    /// Advance the countdown.
    ///
    /// Returns a step only when the displayed remaining-seconds value has
    /// changed since the last announcement, so a 1 Hz tick produces at most
    /// one update per second and a delayed tick catches up with one step.
    pub fn countdown_tick(&mut self, now_mono: MonotonicInstant) -> Option<CountdownStep> {
        if self.is_resolved() || self.is_expired(now_mono) {
            return None;
        }

        let remaining_seconds = display_seconds(self.time_remaining(now_mono));
        if self.last_announced == Some(remaining_seconds) {
            return None;
        }
        self.last_announced = Some(remaining_seconds);

        let low_time = remaining_seconds <= LOW_TIME_THRESHOLD_SECS && !self.low_time_fired;
        if low_time {
            self.low_time_fired = true;
        }

        Some(CountdownStep {
            remaining_seconds,
            low_time,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_challenge(timeout_secs: u64) -> (Challenge, MonotonicInstant) {
        let now = Local::now();
        let now_mono = MonotonicInstant::now();
        let challenge = Challenge::open(
            ActionKind::Shutdown,
            Duration::from_secs(timeout_secs),
            true,
            now,
            now_mono,
        );
        (challenge, now_mono)
    }

    #[test]
    fn test_challenge_creation() {
        let (challenge, now_mono) = make_challenge(30);

        assert!(!challenge.is_resolved());
        assert!(!challenge.is_expired(now_mono));
        assert_eq!(challenge.time_remaining(now_mono), Duration::from_secs(30));
    }

    #[test]
    fn test_expiry_at_deadline() {
        let (challenge, now_mono) = make_challenge(30);

        assert!(!challenge.is_expired(now_mono + Duration::from_secs(29)));
        assert!(challenge.is_expired(now_mono + Duration::from_secs(30)));
        assert!(challenge.is_expired(now_mono + Duration::from_secs(31)));
    }

    #[test]
    fn test_outcome_set_once() {
        let (mut challenge, _) = make_challenge(30);

        assert!(challenge.resolve_response());
        assert!(!challenge.resolve_timeout());
        assert_eq!(challenge.outcome, Some(ChallengeOutcome::Responded));

        let (mut challenge, _) = make_challenge(30);
        assert!(challenge.resolve_timeout());
        assert!(!challenge.resolve_response());
        assert_eq!(challenge.outcome, Some(ChallengeOutcome::TimedOut));
    }

    #[test]
    fn test_countdown_announces_once_per_second() {
        let (mut challenge, now_mono) = make_challenge(30);

        let step = challenge.countdown_tick(now_mono).unwrap();
        assert_eq!(step.remaining_seconds, 30);

        // Same second, no new step
        assert!(challenge
            .countdown_tick(now_mono + Duration::from_millis(100))
            .is_none());

        let step = challenge
            .countdown_tick(now_mono + Duration::from_millis(1100))
            .unwrap();
        assert_eq!(step.remaining_seconds, 29);
    }

    #[test]
    fn test_low_time_fires_once() {
        let (mut challenge, now_mono) = make_challenge(30);

        // At 6s remaining, not yet low time
        let step = challenge
            .countdown_tick(now_mono + Duration::from_secs(24))
            .unwrap();
        assert_eq!(step.remaining_seconds, 6);
        assert!(!step.low_time);

        // Crossing to 5s fires the escalation
        let step = challenge
            .countdown_tick(now_mono + Duration::from_secs(25))
            .unwrap();
        assert_eq!(step.remaining_seconds, 5);
        assert!(step.low_time);

        // Later steps stay below threshold but don't re-fire
        let step = challenge
            .countdown_tick(now_mono + Duration::from_secs(26))
            .unwrap();
        assert_eq!(step.remaining_seconds, 4);
        assert!(!step.low_time);
    }

    #[test]
    fn test_delayed_tick_catches_up_with_one_step() {
        let (mut challenge, now_mono) = make_challenge(30);

        // First tick arrives 7 seconds late; one step, threshold not skipped
        let step = challenge
            .countdown_tick(now_mono + Duration::from_secs(27))
            .unwrap();
        assert_eq!(step.remaining_seconds, 3);
        assert!(step.low_time);
    }

    #[test]
    fn test_no_countdown_after_resolution_or_expiry() {
        let (mut challenge, now_mono) = make_challenge(30);
        challenge.resolve_response();
        assert!(challenge.countdown_tick(now_mono).is_none());

        let (mut challenge, now_mono) = make_challenge(30);
        assert!(challenge
            .countdown_tick(now_mono + Duration::from_secs(31))
            .is_none());
    }
}
