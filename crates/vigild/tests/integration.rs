//! Integration tests for vigild
//!
//! These tests drive the full monitoring cycle end-to-end with mock hosts
//! and simulated monotonic time.

use chrono::Local;
use std::sync::Arc;
use std::time::Duration;
use vigil_api::{ActionKind, MonitorPhase, StopReason};
use vigil_config::{parse_settings, Settings, SettingsHandle};
use vigil_core::{EngineError, EngineEvent, MonitorEngine};
use vigil_host_api::{MockExecutor, MockPrompt};
use vigil_util::MonotonicInstant;

fn make_settings(interval_secs: u64, timeout_secs: u64, action: ActionKind) -> SettingsHandle {
    let mut settings = Settings::default();
    settings.check_interval = Duration::from_secs(interval_secs);
    settings.response_timeout = Duration::from_secs(timeout_secs);
    settings.action = action;
    SettingsHandle::new(settings)
}

fn make_engine(
    settings: SettingsHandle,
) -> (MonitorEngine, Arc<MockExecutor>, Arc<MockPrompt>) {
    let executor = Arc::new(MockExecutor::new());
    let prompt = Arc::new(MockPrompt::new());
    let engine = MonitorEngine::new(settings, executor.clone(), prompt.clone());
    (engine, executor, prompt)
}

/// Full happy cycle: wait, challenge, answer, wait again.
#[tokio::test]
async fn responsive_user_cycles_without_action() {
    let settings = make_settings(1200, 30, ActionKind::Shutdown);
    let (mut engine, executor, prompt) = make_engine(settings);

    let now = Local::now();
    let t0 = MonotonicInstant::now();

    engine.start(now, t0).unwrap();

    // First check comes due
    let t_check = t0 + Duration::from_secs(1200);
    let events = engine.tick(now, t_check).await.unwrap();
    assert!(matches!(events[0], EngineEvent::ChallengeOpened { .. }));
    assert_eq!(prompt.shown_count(), 1);

    // Countdown runs for a few seconds
    for s in 1..=3u64 {
        let events = engine
            .tick(now, t_check + Duration::from_secs(s))
            .await
            .unwrap();
        assert!(matches!(
            events[0],
            EngineEvent::ChallengeCountdown { .. }
        ));
    }

    // User answers with 26 seconds to spare
    let event = engine
        .respond(now, t_check + Duration::from_secs(4))
        .await
        .unwrap();
    let challenge_id = match event {
        EngineEvent::ChallengeAnswered { challenge_id, .. } => challenge_id,
        other => panic!("expected ChallengeAnswered, got {other:?}"),
    };
    assert!(prompt.dismissed(&challenge_id));

    // Back in waiting with a fresh full interval; no power action happened
    assert_eq!(engine.phase(), MonitorPhase::Waiting);
    assert_eq!(
        engine.time_until_next_check(t_check + Duration::from_secs(4)),
        Some(Duration::from_secs(1200))
    );
    assert!(executor.performed_actions().is_empty());

    // The next cycle opens a second, distinct challenge
    let t_check2 = t_check + Duration::from_secs(4) + Duration::from_secs(1200);
    let events = engine.tick(now, t_check2).await.unwrap();
    match &events[0] {
        EngineEvent::ChallengeOpened {
            challenge_id: second,
            ..
        } => assert_ne!(*second, challenge_id),
        other => panic!("expected ChallengeOpened, got {other:?}"),
    }
}

/// Unanswered challenge fires the configured action and stops monitoring.
#[tokio::test]
async fn unresponsive_user_triggers_action() {
    let settings = make_settings(1200, 30, ActionKind::Sleep);
    let (mut engine, executor, prompt) = make_engine(settings);

    let now = Local::now();
    let t0 = MonotonicInstant::now();

    engine.start(now, t0).unwrap();

    let t_check = t0 + Duration::from_secs(1200);
    engine.tick(now, t_check).await.unwrap();

    // Drive ticks through the whole window
    let mut countdowns = 0;
    let mut fired = Vec::new();
    for s in 1..=30u64 {
        let events = engine
            .tick(now, t_check + Duration::from_secs(s))
            .await
            .unwrap();
        for event in events {
            match event {
                EngineEvent::ChallengeCountdown { .. } => countdowns += 1,
                other => fired.push(other),
            }
        }
    }

    // 29 displayed-seconds changes before the deadline tick
    assert_eq!(countdowns, 29);
    assert!(matches!(
        fired[0],
        EngineEvent::ChallengeTimedOut {
            action: ActionKind::Sleep,
            action_ok: true,
            ..
        }
    ));
    assert!(matches!(
        fired[1],
        EngineEvent::MonitoringStopped {
            reason: StopReason::ActionFired {
                action: ActionKind::Sleep
            }
        }
    ));

    assert_eq!(executor.performed_actions(), vec![ActionKind::Sleep]);
    assert_eq!(engine.phase(), MonitorPhase::Stopped);
    assert_eq!(prompt.shown_count(), 1);
}

/// Stop during an open challenge dismisses it and never fires the action.
#[tokio::test]
async fn stop_during_challenge_cancels_cleanly() {
    let settings = make_settings(1200, 30, ActionKind::Shutdown);
    let (mut engine, executor, prompt) = make_engine(settings);

    let now = Local::now();
    let t0 = MonotonicInstant::now();

    engine.start(now, t0).unwrap();
    let t_check = t0 + Duration::from_secs(1200);
    engine.tick(now, t_check).await.unwrap();

    let event = engine.stop(StopReason::UserStop).await.unwrap();
    assert!(matches!(
        event,
        EngineEvent::MonitoringStopped {
            reason: StopReason::UserStop
        }
    ));
    assert_eq!(prompt.dismissals.lock().unwrap().len(), 1);

    // Ticks far past the old deadline stay quiet
    for s in [31u64, 60, 600] {
        let events = engine
            .tick(now, t_check + Duration::from_secs(s))
            .await
            .unwrap();
        assert!(events.is_empty());
    }
    assert!(executor.performed_actions().is_empty());
}

/// A failing action still resolves the challenge and stops the monitor.
#[tokio::test]
async fn action_failure_still_reports_timeout() {
    let settings = make_settings(1200, 30, ActionKind::Shutdown);
    let (mut engine, executor, _prompt) = make_engine(settings);
    *executor.fail_perform.lock().unwrap() = true;

    let now = Local::now();
    let t0 = MonotonicInstant::now();

    engine.start(now, t0).unwrap();
    let t_check = t0 + Duration::from_secs(1200);
    engine.tick(now, t_check).await.unwrap();

    let events = engine
        .tick(now, t_check + Duration::from_secs(30))
        .await
        .unwrap();
    assert!(matches!(
        events[0],
        EngineEvent::ChallengeTimedOut {
            action_ok: false,
            ..
        }
    ));
    assert_eq!(engine.phase(), MonitorPhase::Stopped);

    // Restartable afterwards
    assert!(engine.start(now, t0).is_some());
}

/// A prompt that cannot be shown stops monitoring with a visible error.
#[tokio::test]
async fn headless_host_stops_monitoring() {
    let settings = make_settings(1200, 30, ActionKind::Shutdown);
    let (mut engine, executor, prompt) = make_engine(settings);
    *prompt.fail_show.lock().unwrap() = true;

    let now = Local::now();
    let t0 = MonotonicInstant::now();

    engine.start(now, t0).unwrap();
    let result = engine.tick(now, t0 + Duration::from_secs(1200)).await;

    assert!(matches!(result, Err(EngineError::PromptUnavailable(_))));
    assert_eq!(engine.phase(), MonitorPhase::Stopped);
    assert!(executor.performed_actions().is_empty());
}

/// Settings reload applies to the next cycle but not an open challenge.
#[tokio::test]
async fn reload_respects_cycle_boundaries() {
    let settings = make_settings(1200, 30, ActionKind::Shutdown);
    let (mut engine, _executor, prompt) = make_engine(settings.clone());

    let now = Local::now();
    let t0 = MonotonicInstant::now();

    engine.start(now, t0).unwrap();
    let t_check = t0 + Duration::from_secs(1200);
    engine.tick(now, t_check).await.unwrap();

    // Swap settings while the challenge is open
    let mut updated = settings.snapshot();
    updated.check_interval = Duration::from_secs(300);
    updated.response_timeout = Duration::from_secs(60);
    settings.replace(updated);

    // Open challenge keeps its original 30-second deadline
    let events = engine
        .tick(now, t_check + Duration::from_secs(30))
        .await
        .unwrap();
    assert!(matches!(events[0], EngineEvent::ChallengeTimedOut { .. }));

    // Fresh monitoring session picks up the new interval
    engine.start(now, t0).unwrap();
    assert_eq!(
        engine.time_until_next_check(t0),
        Some(Duration::from_secs(300))
    );
    assert_eq!(prompt.shown_count(), 1);
}

/// The countdown survives wall-clock changes: only monotonic time matters.
#[tokio::test]
async fn wall_clock_jump_does_not_fire_early() {
    let settings = make_settings(1200, 30, ActionKind::Shutdown);
    let (mut engine, executor, _prompt) = make_engine(settings);

    let now = Local::now();
    let t0 = MonotonicInstant::now();

    engine.start(now, t0).unwrap();
    let t_check = t0 + Duration::from_secs(1200);
    engine.tick(now, t_check).await.unwrap();

    // Wall clock leaps forward an hour; monotonic time has only moved 5s
    let jumped = now + chrono::Duration::hours(1);
    let events = engine
        .tick(jumped, t_check + Duration::from_secs(5))
        .await
        .unwrap();
    assert!(matches!(
        events[0],
        EngineEvent::ChallengeCountdown {
            remaining_seconds: 25,
            ..
        }
    ));
    assert!(executor.performed_actions().is_empty());
}

#[test]
fn settings_parse_and_validate() {
    let settings = parse_settings(
        r#"
            config_version = 1
            check_interval_minutes = 45
            response_timeout_seconds = 20
            action = "lock"
            sound_enabled = false
        "#,
    )
    .unwrap();

    assert_eq!(settings.check_interval, Duration::from_secs(45 * 60));
    assert_eq!(settings.response_timeout, Duration::from_secs(20));
    assert_eq!(settings.action, ActionKind::Lock);
    assert!(!settings.sound_enabled);

    // Out-of-range values are rejected with validation errors
    assert!(parse_settings(
        r#"
            config_version = 1
            response_timeout_seconds = 5
        "#
    )
    .is_err());
}
