//! Recurring transaction types.

use chrono::{DateTime, NaiveDate, Utc, Weekday};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{AccountId, CategoryId, RecurringTransactionId, UserId};

use crate::ownership::Owned;
use crate::transaction::{Transaction, TransactionType};

/// How often a definition repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Frequency {
    /// Every day.
    Daily,
    /// Every week on `day_of_week`.
    Weekly,
    /// Every month on `day_of_month`.
    Monthly,
    /// Every year on the start date's month and day.
    Yearly,
}

impl Frequency {
    /// Stable string form used in storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "DAILY",
            Self::Weekly => "WEEKLY",
            Self::Monthly => "MONTHLY",
            Self::Yearly => "YEARLY",
        }
    }
}

/// A transaction template materialized on a schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurringTransaction {
    /// Definition ID.
    pub id: RecurringTransactionId,
    /// Owning user.
    pub user_id: UserId,
    /// Account each occurrence is booked on.
    pub account_id: AccountId,
    /// `Receipt` or `Expense`.
    pub transaction_type: TransactionType,
    /// Category.
    pub category_id: CategoryId,
    /// Positive amount.
    pub amount: Decimal,
    /// Description copied onto each occurrence.
    pub description: Option<String>,
    /// Repetition.
    pub frequency: Frequency,
    /// Day for `Monthly`, 1-31.
    pub day_of_month: Option<u32>,
    /// Weekday for `Weekly`.
    pub day_of_week: Option<Weekday>,
    /// First day occurrences may fall on.
    pub start_date: NaiveDate,
    /// Last day occurrences may fall on.
    pub end_date: Option<NaiveDate>,
    /// Date of the last materialization.
    pub last_processed: Option<NaiveDate>,
    /// Date of the next occurrence.
    pub next_due: NaiveDate,
    /// Inactive definitions are skipped by the batch.
    pub is_active: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl RecurringTransaction {
    /// Returns true if `date` is after the end date.
    #[must_use]
    pub fn is_past_end(&self, date: NaiveDate) -> bool {
        self.end_date.is_some_and(|end| date > end)
    }
}

impl Owned for RecurringTransaction {
    fn owner(&self) -> UserId {
        self.user_id
    }
}

/// Input for creating a recurring definition.
#[derive(Debug, Clone)]
pub struct CreateRecurringInput {
    /// Owning user.
    pub user_id: UserId,
    /// Account each occurrence is booked on.
    pub account_id: AccountId,
    /// `Receipt` or `Expense`.
    pub transaction_type: TransactionType,
    /// Category.
    pub category_id: CategoryId,
    /// Positive amount.
    pub amount: Decimal,
    /// Description copied onto each occurrence.
    pub description: Option<String>,
    /// Repetition.
    pub frequency: Frequency,
    /// Required for `Monthly`.
    pub day_of_month: Option<u32>,
    /// Required for `Weekly`.
    pub day_of_week: Option<Weekday>,
    /// First day occurrences may fall on.
    pub start_date: NaiveDate,
    /// Optional last day.
    pub end_date: Option<NaiveDate>,
}

/// Outcome counts of one batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProcessingReport {
    /// Definitions materialized.
    pub processed: usize,
    /// Definitions whose materialization failed; left unadvanced.
    pub failed: usize,
    /// Definitions deactivated because they ran past their end date.
    pub deactivated: usize,
}

/// Result of a manual run.
#[derive(Debug, Clone)]
pub struct ManualRun {
    /// The materialized transaction.
    pub transaction: Transaction,
    /// The definition after advancing.
    pub recurring: RecurringTransaction,
}
