//! Budget types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{BudgetId, CategoryId, MonthPeriod, UserId};

use crate::ownership::Owned;

/// Alert threshold used when none is given, in percent.
pub const DEFAULT_ALERT_AT: Decimal = Decimal::from_parts(80, 0, 0, false, 0);

/// Spending status derived from `spent / amount`. Never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BudgetStatus {
    /// Below the alert threshold.
    Ok,
    /// At or above the alert threshold.
    Warning,
    /// At or above 100%.
    Exceeded,
}

/// Spending limit for one category in one month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    /// Budget ID.
    pub id: BudgetId,
    /// Owning user.
    pub user_id: UserId,
    /// Tracked category.
    pub category_id: CategoryId,
    /// Month, 1-12.
    pub month: u32,
    /// Year.
    pub year: i32,
    /// Spending limit.
    pub amount: Decimal,
    /// Accumulated spend, changed only by atomic deltas.
    pub spent: Decimal,
    /// Alert threshold in percent, 1-100.
    pub alert_at: Decimal,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Budget {
    /// The budgeted month.
    #[must_use]
    pub fn period(&self) -> MonthPeriod {
        MonthPeriod {
            year: self.year,
            month: self.month,
        }
    }

    /// Spent share of the limit in percent, two decimals.
    #[must_use]
    pub fn percentage(&self) -> Decimal {
        if self.amount.is_zero() {
            return Decimal::ZERO;
        }
        (self.spent / self.amount * Decimal::ONE_HUNDRED).round_dp(2)
    }

    /// Derives the spending status from the exact ratio; the rounded
    /// [`percentage`](Self::percentage) is for display only.
    #[must_use]
    pub fn status(&self) -> BudgetStatus {
        if self.amount <= Decimal::ZERO {
            return BudgetStatus::Ok;
        }
        if self.spent >= self.amount {
            BudgetStatus::Exceeded
        } else if self.spent * Decimal::ONE_HUNDRED >= self.alert_at * self.amount {
            BudgetStatus::Warning
        } else {
            BudgetStatus::Ok
        }
    }

    /// Builds the derived status report.
    #[must_use]
    pub fn report(self) -> BudgetStatusReport {
        BudgetStatusReport {
            percentage: self.percentage(),
            remaining: self.amount - self.spent,
            status: self.status(),
            budget: self,
        }
    }
}

impl Owned for Budget {
    fn owner(&self) -> UserId {
        self.user_id
    }
}

/// A budget together with its derived figures.
#[derive(Debug, Clone, Serialize)]
pub struct BudgetStatusReport {
    /// The budget.
    pub budget: Budget,
    /// `spent / amount * 100`.
    pub percentage: Decimal,
    /// `amount - spent`, negative once exceeded.
    pub remaining: Decimal,
    /// Derived status.
    pub status: BudgetStatus,
}

/// Input for creating a budget.
#[derive(Debug, Clone)]
pub struct CreateBudgetInput {
    /// Owning user.
    pub user_id: UserId,
    /// Tracked category.
    pub category_id: CategoryId,
    /// Budgeted month.
    pub period: MonthPeriod,
    /// Spending limit, positive.
    pub amount: Decimal,
    /// Alert threshold in percent; defaults to 80.
    pub alert_at: Option<Decimal>,
}

/// Partial update of a budget. `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct UpdateBudgetInput {
    /// New spending limit.
    pub amount: Option<Decimal>,
    /// New alert threshold.
    pub alert_at: Option<Decimal>,
}
