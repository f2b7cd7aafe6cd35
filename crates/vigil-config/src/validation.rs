//! Configuration validation

use crate::schema::RawSettings;
use thiserror::Error;
use vigil_api::ActionKind;

/// Minimum minutes between checks
pub const MIN_CHECK_INTERVAL_MINUTES: u64 = 5;
/// Maximum minutes between checks
pub const MAX_CHECK_INTERVAL_MINUTES: u64 = 120;
/// Minimum seconds allowed for a response
pub const MIN_RESPONSE_TIMEOUT_SECONDS: u64 = 15;
/// Maximum seconds allowed for a response
pub const MAX_RESPONSE_TIMEOUT_SECONDS: u64 = 60;

/// Validation error
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("check_interval_minutes {value} out of range ({min}-{max})")]
    CheckIntervalOutOfRange { value: u64, min: u64, max: u64 },

    #[error("response_timeout_seconds {value} out of range ({min}-{max})")]
    ResponseTimeoutOutOfRange { value: u64, min: u64, max: u64 },

    #[error("response_timeout_seconds {timeout}s must be shorter than check_interval_minutes ({interval}m)")]
    TimeoutExceedsInterval { timeout: u64, interval: u64 },

    #[error("Unknown action '{0}' (expected shutdown, sleep, or lock)")]
    UnknownAction(String),
}

/// Validate raw settings
pub fn validate_settings(raw: &RawSettings) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if raw.check_interval_minutes < MIN_CHECK_INTERVAL_MINUTES
        || raw.check_interval_minutes > MAX_CHECK_INTERVAL_MINUTES
    {
        errors.push(ValidationError::CheckIntervalOutOfRange {
            value: raw.check_interval_minutes,
            min: MIN_CHECK_INTERVAL_MINUTES,
            max: MAX_CHECK_INTERVAL_MINUTES,
        });
    }

    if raw.response_timeout_seconds < MIN_RESPONSE_TIMEOUT_SECONDS
        || raw.response_timeout_seconds > MAX_RESPONSE_TIMEOUT_SECONDS
    {
        errors.push(ValidationError::ResponseTimeoutOutOfRange {
            value: raw.response_timeout_seconds,
            min: MIN_RESPONSE_TIMEOUT_SECONDS,
            max: MAX_RESPONSE_TIMEOUT_SECONDS,
        });
    }

    // The answer window must end well before the next check is due. An
    // interval too large for the multiplication is already a range error
    // and trivially longer than any timeout.
    if let Some(interval_secs) = raw.check_interval_minutes.checked_mul(60)
        && raw.response_timeout_seconds >= interval_secs
    {
        errors.push(ValidationError::TimeoutExceedsInterval {
            timeout: raw.response_timeout_seconds,
            interval: raw.check_interval_minutes,
        });
    }

    if raw.action.parse::<ActionKind>().is_err() {
        errors.push(ValidationError::UnknownAction(raw.action.clone()));
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_validate_clean() {
        let raw = RawSettings::default();
        assert!(validate_settings(&raw).is_empty());
    }

    #[test]
    fn interval_range_enforced() {
        let mut raw = RawSettings::default();
        raw.check_interval_minutes = 3;
        let errors = validate_settings(&raw);
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::CheckIntervalOutOfRange { value: 3, .. })));

        raw.check_interval_minutes = 121;
        let errors = validate_settings(&raw);
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::CheckIntervalOutOfRange { value: 121, .. })));
    }

    #[test]
    fn timeout_range_enforced() {
        let mut raw = RawSettings::default();
        raw.response_timeout_seconds = 10;
        let errors = validate_settings(&raw);
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::ResponseTimeoutOutOfRange { value: 10, .. })));

        raw.response_timeout_seconds = 90;
        let errors = validate_settings(&raw);
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::ResponseTimeoutOutOfRange { value: 90, .. })));
    }

    #[test]
    fn huge_interval_is_a_range_error_not_a_panic() {
        let mut raw = RawSettings::default();
        raw.check_interval_minutes = u64::MAX;
        let errors = validate_settings(&raw);
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::CheckIntervalOutOfRange { .. })));
        assert!(!errors
            .iter()
            .any(|e| matches!(e, ValidationError::TimeoutExceedsInterval { .. })));
    }

    #[test]
    fn unknown_action_rejected() {
        let mut raw = RawSettings::default();
        raw.action = "hibernate".into();
        let errors = validate_settings(&raw);
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::UnknownAction(_))));
    }

    #[test]
    fn suspend_alias_accepted() {
        let mut raw = RawSettings::default();
        raw.action = "suspend".into();
        assert!(validate_settings(&raw).is_empty());
    }
}
