//! Property tests for next-due arithmetic.

use chrono::{Datelike, NaiveDate, Weekday};
use proptest::prelude::*;
use tally_shared::types::MonthPeriod;

use super::schedule::calculate_next_due;
use super::types::Frequency;

fn weekday(n: u8) -> Weekday {
    Weekday::try_from(n % 7).unwrap_or(Weekday::Mon)
}

fn start_date() -> impl Strategy<Value = NaiveDate> {
    (2000i32..2100, 1u32..=12, 1u32..=28)
        .prop_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap())
}

proptest! {
    /// Repeated monthly steps with day 31 land on the last day of short
    /// months and on day 31 of long months.
    #[test]
    fn prop_monthly_day_31_tracks_month_end(start in start_date(), steps in 1usize..48) {
        let mut due = start;
        for _ in 0..steps {
            due = calculate_next_due(due, Frequency::Monthly, Some(31), None);
            let period = MonthPeriod::of(due);
            prop_assert_eq!(due, period.last_day());
            prop_assert_eq!(due.day(), period.days_in_month());
        }
    }

    /// Monthly steps advance exactly one calendar month each time.
    #[test]
    fn prop_monthly_advances_one_month(start in start_date(), day in 1u32..=31) {
        let next = calculate_next_due(start, Frequency::Monthly, Some(day), None);
        prop_assert_eq!(MonthPeriod::of(next), MonthPeriod::of(start).next());
    }

    /// Weekly steps land on the requested weekday within 1..=7 days.
    #[test]
    fn prop_weekly_lands_on_weekday(start in start_date(), n in 0u8..7) {
        let target = weekday(n);
        let next = calculate_next_due(start, Frequency::Weekly, None, Some(target));
        let gap = (next - start).num_days();
        prop_assert!((1..=7).contains(&gap));
        prop_assert_eq!(next.weekday(), target);
    }

    /// Every frequency moves strictly forward.
    #[test]
    fn prop_next_due_is_after_from(start in start_date(), day in 1u32..=31, n in 0u8..7) {
        for frequency in [
            Frequency::Daily,
            Frequency::Weekly,
            Frequency::Monthly,
            Frequency::Yearly,
        ] {
            let next = calculate_next_due(start, frequency, Some(day), Some(weekday(n)));
            prop_assert!(next > start);
        }
    }
}
