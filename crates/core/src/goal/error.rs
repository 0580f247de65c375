//! Goal rule violations.

use rust_decimal::Decimal;
use tally_shared::AppError;
use thiserror::Error;

/// Business-rule violations specific to goals.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GoalError {
    /// Contributions are only accepted while the goal is active.
    #[error("Goal is not active")]
    NotActive,

    /// Withdrawal larger than the saved amount.
    #[error("Cannot withdraw {requested}, goal holds {available}")]
    ExceedsSaved {
        /// Requested withdrawal.
        requested: Decimal,
        /// Current saved amount.
        available: Decimal,
    },

    /// Goal still holds money.
    #[error("Goal still holds {0}")]
    NotEmpty(Decimal),
}

impl From<GoalError> for AppError {
    fn from(err: GoalError) -> Self {
        Self::Validation(err.to_string())
    }
}
