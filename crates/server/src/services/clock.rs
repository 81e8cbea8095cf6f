//! Time source for the inventory engine.
//!
//! Batch codes, expiry validation, the radar window and ledger timestamps all
//! depend on "now", so the engine reads it through [`Clock`] instead of
//! calling `Utc::now()` directly.

use std::sync::Mutex;

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};

/// Source of the current instant.
pub trait Clock: Send + Sync {
    /// Current instant.
    fn now(&self) -> DateTime<Utc>;

    /// Current calendar date (UTC).
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
///
/// Each reading advances the clock by one microsecond so that records created
/// in sequence keep distinct, ordered timestamps.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    /// Create a clock starting at `start`.
    #[must_use]
    pub const fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, delta: TimeDelta) {
        let mut now = self.now.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        *now += delta;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        let mut now = self.now.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let current = *now;
        *now += TimeDelta::microseconds(1);
        current
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_manual_clock_readings_are_strictly_increasing() {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 12, 15, 9, 0, 0).unwrap());
        let first = clock.now();
        let second = clock.now();
        assert!(second > first);
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2025, 12, 15).unwrap());
    }

    #[test]
    fn test_manual_clock_advance() {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 12, 15, 9, 0, 0).unwrap());
        clock.advance(TimeDelta::days(2));
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2025, 12, 17).unwrap());
    }
}
