//! # Clock
//!
//! Injected time source. The engine never calls `Utc::now()` directly, so
//! timestamps and "last N days" windows are deterministic under test.

use chrono::{DateTime, Duration, NaiveDate, Utc};

/// A source of the current instant.
pub trait Clock: Send + Sync {
    /// Current instant in UTC.
    fn now(&self) -> DateTime<Utc>;

    /// Current calendar date (UTC).
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Wall clock used in production.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock frozen at a given instant; `advance` moves it forward.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    now: DateTime<Utc>,
}

impl FixedClock {
    /// Freezes the clock at `now`.
    pub fn at(now: DateTime<Utc>) -> Self {
        FixedClock { now }
    }

    /// Freezes the clock at midnight UTC of `date`.
    pub fn on(date: NaiveDate) -> Self {
        FixedClock {
            now: date.and_time(chrono::NaiveTime::MIN).and_utc(),
        }
    }

    /// Moves the clock forward.
    pub fn advance(&mut self, by: Duration) {
        self.now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock_advance() {
        let day = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        let mut clock = FixedClock::on(day);
        assert_eq!(clock.today(), day);

        clock.advance(Duration::hours(25));
        assert_eq!(clock.today(), day.succ_opt().unwrap());
    }
}
