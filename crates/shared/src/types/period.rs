//! Calendar month periods.
//!
//! Budgets and invoices are keyed by `(month, year)` and the recurring
//! scheduler steps month by month, so all of them share this type.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// A calendar month of a specific year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MonthPeriod {
    /// Year (e.g., 2024).
    pub year: i32,
    /// Month number, 1-12.
    pub month: u32,
}

impl MonthPeriod {
    /// Creates a period, returning `None` for a month outside 1-12.
    #[must_use]
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    /// The period containing `date`.
    #[must_use]
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// First day of the month.
    #[must_use]
    pub fn first_day(self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    /// Last day of the month.
    #[must_use]
    pub fn last_day(self) -> NaiveDate {
        self.next()
            .first_day()
            .pred_opt()
            .unwrap_or(NaiveDate::MAX)
    }

    /// Number of days in the month.
    #[must_use]
    pub fn days_in_month(self) -> u32 {
        self.last_day().day()
    }

    /// The following month.
    #[must_use]
    pub fn next(self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// The preceding month.
    #[must_use]
    pub fn previous(self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    /// The date for `day` in this month, clamped to the last day when the
    /// month is shorter (day 31 in April gives April 30).
    #[must_use]
    pub fn day_clamped(self, day: u32) -> NaiveDate {
        let day = day.clamp(1, self.days_in_month());
        NaiveDate::from_ymd_opt(self.year, self.month, day).unwrap_or_else(|| self.last_day())
    }
}

impl std::fmt::Display for MonthPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_new_rejects_invalid_month() {
        assert!(MonthPeriod::new(2024, 0).is_none());
        assert!(MonthPeriod::new(2024, 13).is_none());
        assert!(MonthPeriod::new(2024, 12).is_some());
    }

    #[rstest]
    #[case(2024, 2, 29)]
    #[case(2023, 2, 28)]
    #[case(2024, 4, 30)]
    #[case(2024, 12, 31)]
    fn test_days_in_month(#[case] year: i32, #[case] month: u32, #[case] expected: u32) {
        let period = MonthPeriod::new(year, month).unwrap();
        assert_eq!(period.days_in_month(), expected);
        assert_eq!(period.last_day(), date(year, month, expected));
    }

    #[test]
    fn test_next_and_previous_wrap_years() {
        let dec = MonthPeriod::new(2024, 12).unwrap();
        assert_eq!(dec.next(), MonthPeriod::new(2025, 1).unwrap());
        assert_eq!(dec.next().previous(), dec);
    }

    #[rstest]
    #[case(2024, 2, 31, date(2024, 2, 29))]
    #[case(2024, 4, 31, date(2024, 4, 30))]
    #[case(2024, 1, 31, date(2024, 1, 31))]
    #[case(2024, 3, 0, date(2024, 3, 1))]
    fn test_day_clamped(
        #[case] year: i32,
        #[case] month: u32,
        #[case] day: u32,
        #[case] expected: NaiveDate,
    ) {
        assert_eq!(MonthPeriod::new(year, month).unwrap().day_clamped(day), expected);
    }

    #[test]
    fn test_of_and_display() {
        let period = MonthPeriod::of(date(2024, 3, 15));
        assert_eq!(period, MonthPeriod::of(date(2024, 3, 1)));
        assert_ne!(period, MonthPeriod::of(date(2024, 4, 1)));
        assert_eq!(period.to_string(), "2024-03");
    }
}
