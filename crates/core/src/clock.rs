//! Time source for the engines.
//!
//! Budget periods, invoice periods, goal completion timestamps and the
//! recurring batch all read "now" through [`Clock`] so they can be pinned.

use std::sync::RwLock;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

/// Source of the current instant.
pub trait Clock: Send + Sync {
    /// The current instant in UTC.
    fn now(&self) -> DateTime<Utc>;

    /// The current calendar date in UTC.
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
#[derive(Debug)]
pub struct FixedClock {
    now: RwLock<DateTime<Utc>>,
}

impl FixedClock {
    /// Creates a clock pinned to `now`.
    #[must_use]
    pub const fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: RwLock::new(now),
        }
    }

    /// Creates a clock pinned to noon UTC of `date`.
    #[must_use]
    pub fn at_date(date: NaiveDate) -> Self {
        Self::new(date.and_time(NaiveTime::MIN).and_utc() + chrono::Duration::hours(12))
    }

    /// Moves the clock to `now`.
    pub fn set(&self, now: DateTime<Utc>) {
        match self.now.write() {
            Ok(mut guard) => *guard = now,
            Err(poisoned) => *poisoned.into_inner() = now,
        }
    }

    /// Moves the clock to noon UTC of `date`.
    pub fn set_date(&self, date: NaiveDate) {
        self.set(date.and_time(NaiveTime::MIN).and_utc() + chrono::Duration::hours(12));
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        match self.now.read() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}
