//! Time utilities for vigild
//!
//! Deadlines are enforced against monotonic time so that a wall-clock jump
//! (NTP step, manual change, resume from suspend) can neither fire a
//! challenge early nor starve it. Wall-clock time is carried alongside for
//! display and logging only.

use chrono::{DateTime, Local};
use std::time::{Duration, Instant};

/// Get the current local time.
pub fn now() -> DateTime<Local> {
    Local::now()
}

/// A point in monotonic time for countdown enforcement.
/// Immune to wall-clock changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MonotonicInstant(Instant);

impl MonotonicInstant {
    pub fn now() -> Self {
        Self(Instant::now())
    }

    pub fn elapsed(&self) -> Duration {
        self.0.elapsed()
    }

    pub fn duration_since(&self, earlier: MonotonicInstant) -> Duration {
        self.0.duration_since(earlier.0)
    }

    pub fn checked_add(&self, duration: Duration) -> Option<MonotonicInstant> {
        self.0.checked_add(duration).map(MonotonicInstant)
    }

    /// Returns duration until `self`, or zero if `self` is in the past
    pub fn saturating_duration_until(&self, from: MonotonicInstant) -> Duration {
        if self.0 > from.0 {
            self.0.duration_since(from.0)
        } else {
            Duration::ZERO
        }
    }
}

impl std::ops::Add<Duration> for MonotonicInstant {
    type Output = MonotonicInstant;

    fn add(self, rhs: Duration) -> Self::Output {
        MonotonicInstant(self.0 + rhs)
    }
}

/// Number of whole seconds to display for a remaining duration.
/// Rounds up so a freshly armed 30s countdown reads "30", not "29".
pub fn display_seconds(remaining: Duration) -> u64 {
    if remaining.subsec_nanos() > 0 {
        remaining.as_secs() + 1
    } else {
        remaining.as_secs()
    }
}

/// Helper to format durations in human-readable form
pub fn format_duration(d: Duration) -> String {
    let total_secs = d.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

/// Format a DateTime for display with full date and time.
pub fn format_datetime_full(dt: &DateTime<Local>) -> String {
    dt.format("%Y-%m-%d %H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone};

    #[test]
    fn test_monotonic_instant() {
        let t1 = MonotonicInstant::now();
        std::thread::sleep(Duration::from_millis(10));
        let t2 = MonotonicInstant::now();

        assert!(t2 > t1);
        assert!(t2.duration_since(t1) >= Duration::from_millis(10));
    }

    #[test]
    fn test_saturating_duration_until() {
        let t1 = MonotonicInstant::now();
        let t2 = t1 + Duration::from_secs(5);

        assert_eq!(t2.saturating_duration_until(t1), Duration::from_secs(5));
        assert_eq!(t1.saturating_duration_until(t2), Duration::ZERO);
    }

    #[test]
    fn test_display_seconds_rounds_up() {
        assert_eq!(display_seconds(Duration::from_secs(30)), 30);
        assert_eq!(display_seconds(Duration::from_millis(29_500)), 30);
        assert_eq!(display_seconds(Duration::from_millis(400)), 1);
        assert_eq!(display_seconds(Duration::ZERO), 0);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_secs(30)), "30s");
        assert_eq!(format_duration(Duration::from_secs(90)), "1m 30s");
        assert_eq!(format_duration(Duration::from_secs(3661)), "1h 1m 1s");
    }

    #[test]
    fn test_format_datetime_full() {
        let dt = Local.with_ymd_and_hms(2025, 12, 25, 14, 30, 45).unwrap();
        assert_eq!(format_datetime_full(&dt), "2025-12-25 14:30:45");
    }

    #[test]
    fn test_now_returns_time() {
        let t = now();
        assert!(t.year() >= 2020);
        assert!(t.year() <= 2100);
    }
}
