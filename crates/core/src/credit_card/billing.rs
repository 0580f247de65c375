//! Invoice period dates.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use tally_shared::types::MonthPeriod;

/// Dates of the billing cycle that contains a given day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceSchedule {
    /// First day of the cycle, the day after the previous closing date.
    pub opening_date: NaiveDate,
    /// Last day charges are accepted.
    pub closing_date: NaiveDate,
    /// Payment due date, never before the closing date.
    pub due_date: NaiveDate,
}

/// Computes the billing cycle that `today` falls into.
///
/// The closing date is `closing_day` of the current month, rolled to next
/// month when it has already passed. The due date is `due_day` of the closing
/// month, rolled one month further when it would precede the closing date.
/// Days beyond a month's length are clamped to its last day.
#[must_use]
pub fn invoice_schedule(today: NaiveDate, closing_day: u32, due_day: u32) -> InvoiceSchedule {
    let mut closing_date = MonthPeriod::of(today).day_clamped(closing_day);
    if closing_date < today {
        closing_date = MonthPeriod::of(today).next().day_clamped(closing_day);
    }

    let closing_month = MonthPeriod::of(closing_date);
    let mut due_date = closing_month.day_clamped(due_day);
    if due_date < closing_date {
        due_date = closing_month.next().day_clamped(due_day);
    }

    let previous_closing = closing_month.previous().day_clamped(closing_day);
    let opening_date = previous_closing
        .checked_add_days(Days::new(1))
        .unwrap_or(previous_closing);

    InvoiceSchedule {
        opening_date,
        closing_date,
        due_date,
    }
}
