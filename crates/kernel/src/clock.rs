//! Calendar clock used to stamp loans and compute overdue windows.

use std::fmt::Debug;
use std::sync::{Arc, Mutex};

use time::{Date, OffsetDateTime};

/// Port for obtaining the current calendar date.
pub trait Clock: Send + Sync + Debug {
    /// Today's date in UTC.
    fn today(&self) -> Date;
}

/// Clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    fn today(&self) -> Date {
        OffsetDateTime::now_utc().date()
    }
}

/// Settable clock for tests.
///
/// Clones share the same date, so moving one moves all of them.
#[derive(Debug, Clone)]
pub struct FixedClock {
    today: Arc<Mutex<Date>>,
}

impl FixedClock {
    pub fn new(today: Date) -> Self {
        Self {
            today: Arc::new(Mutex::new(today)),
        }
    }

    /// Set the clock to a specific date.
    pub fn set(&self, date: Date) {
        *self.today.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = date;
    }

    /// Move the clock forward by whole days.
    pub fn advance_days(&self, days: i64) {
        let mut today = self.today.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *today = today.saturating_add(time::Duration::days(days));
    }
}

impl Clock for FixedClock {
    fn today(&self) -> Date {
        *self.today.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn test_fixed_clock() {
        let clock = FixedClock::new(date!(2024 - 03 - 10));
        assert_eq!(clock.today(), date!(2024 - 03 - 10));

        let shared = clock.clone();
        shared.advance_days(5);
        assert_eq!(clock.today(), date!(2024 - 03 - 15));

        clock.set(date!(2025 - 01 - 01));
        assert_eq!(shared.today(), date!(2025 - 01 - 01));
    }

    #[test]
    fn test_system_clock_matches_utc_date() {
        let before = OffsetDateTime::now_utc().date();
        let today = SystemClock::new().today();
        let after = OffsetDateTime::now_utc().date();
        assert!(today >= before && today <= after);
    }
}
