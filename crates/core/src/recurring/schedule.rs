//! Next-due date arithmetic.

use chrono::{Datelike, Days, Months, NaiveDate, Weekday};
use tally_shared::types::MonthPeriod;

use super::types::Frequency;

/// Computes the occurrence following `from`.
///
/// - `Daily`: the next day.
/// - `Weekly`: the next `day_of_week` strictly after `from`; a week later when
///   `from` already is that weekday. Without a weekday, `from + 7 days`.
/// - `Monthly`: `day_of_month` in the month after `from`, clamped to that
///   month's last day. Without a day, `from`'s own day is used.
/// - `Yearly`: the same month and day one year later, Feb 29 clamping to Feb 28.
#[must_use]
pub fn calculate_next_due(
    from: NaiveDate,
    frequency: Frequency,
    day_of_month: Option<u32>,
    day_of_week: Option<Weekday>,
) -> NaiveDate {
    match frequency {
        Frequency::Daily => add_days(from, 1),
        Frequency::Weekly => {
            let Some(target) = day_of_week else {
                return add_days(from, 7);
            };
            let today = from.weekday().num_days_from_monday();
            let ahead = (target.num_days_from_monday() + 7 - today) % 7;
            add_days(from, if ahead == 0 { 7 } else { u64::from(ahead) })
        }
        Frequency::Monthly => {
            MonthPeriod::of(from)
                .next()
                .day_clamped(day_of_month.unwrap_or_else(|| from.day()))
        }
        Frequency::Yearly => from.checked_add_months(Months::new(12)).unwrap_or(from),
    }
}

/// First occurrence on or after `start`.
#[must_use]
pub fn first_due(
    start: NaiveDate,
    frequency: Frequency,
    day_of_month: Option<u32>,
    day_of_week: Option<Weekday>,
) -> NaiveDate {
    match frequency {
        Frequency::Daily | Frequency::Yearly => start,
        Frequency::Weekly => match day_of_week {
            Some(target) if start.weekday() != target => {
                calculate_next_due(start, frequency, day_of_month, day_of_week)
            }
            _ => start,
        },
        Frequency::Monthly => {
            let day = day_of_month.unwrap_or_else(|| start.day());
            let candidate = MonthPeriod::of(start).day_clamped(day);
            if candidate >= start {
                candidate
            } else {
                calculate_next_due(start, frequency, day_of_month, day_of_week)
            }
        }
    }
}

fn add_days(date: NaiveDate, days: u64) -> NaiveDate {
    date.checked_add_days(Days::new(days)).unwrap_or(date)
}
