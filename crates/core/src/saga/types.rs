//! Movement intent and compensation types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{
    AccountId, BudgetId, CardTransactionId, ContributionId, CreditCardId, GoalId, InvestmentId,
    InvoiceId, MovementId, TransactionId, UserId,
};

use crate::credit_card::InvoiceStatus;
use crate::transaction::Transaction;

/// The flow a movement belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    /// Plain income or expense.
    TransactionCreate,
    /// Removal of a plain income or expense.
    TransactionDelete,
    /// Account to goal.
    GoalContribution,
    /// Goal to account.
    GoalWithdrawal,
    /// New investment funded from an account.
    InvestmentCreate,
    /// Account to investment.
    InvestmentContribution,
    /// Investment to account.
    InvestmentWithdrawal,
    /// New card with its shadow account.
    CardCreate,
    /// Card charge.
    CardCharge,
    /// Invoice payment.
    InvoicePayment,
}

impl MovementKind {
    /// Stable string form used in storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TransactionCreate => "transaction_create",
            Self::TransactionDelete => "transaction_delete",
            Self::GoalContribution => "goal_contribution",
            Self::GoalWithdrawal => "goal_withdrawal",
            Self::InvestmentCreate => "investment_create",
            Self::InvestmentContribution => "investment_contribution",
            Self::InvestmentWithdrawal => "investment_withdrawal",
            Self::CardCreate => "card_create",
            Self::CardCharge => "card_charge",
            Self::InvoicePayment => "invoice_payment",
        }
    }
}

impl std::fmt::Display for MovementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of a movement intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementStatus {
    /// Running, or interrupted if old.
    Pending,
    /// Every step applied.
    Completed,
    /// A step failed and every applied step was undone.
    Compensated,
    /// Undo was incomplete; needs manual review.
    Failed,
}

impl MovementStatus {
    /// Stable string form used in storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Completed => "COMPLETED",
            Self::Compensated => "COMPENSATED",
            Self::Failed => "FAILED",
        }
    }
}

impl std::fmt::Display for MovementStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inverse of one applied step.
///
/// Stored as JSON inside the movement intent so an interrupted movement can
/// be undone by another process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Compensation {
    /// Apply a balance delta to an account.
    AdjustAccountBalance {
        /// Account to adjust.
        account_id: AccountId,
        /// Signed delta.
        delta: Decimal,
    },
    /// Delete an account created by the movement.
    DeleteAccount {
        /// Account to delete.
        account_id: AccountId,
    },
    /// Delete a transaction record written by the movement.
    DeleteTransaction {
        /// Record to delete.
        transaction_id: TransactionId,
    },
    /// Re-insert a transaction record deleted by the movement.
    RestoreTransaction {
        /// Record as it was.
        transaction: Box<Transaction>,
    },
    /// Apply a spend delta to a budget.
    AdjustBudgetSpent {
        /// Budget to adjust.
        budget_id: BudgetId,
        /// Signed delta.
        delta: Decimal,
    },
    /// Delete a goal contribution record.
    DeleteContribution {
        /// Record to delete.
        contribution_id: ContributionId,
    },
    /// Apply a delta to a goal's saved amount, then re-derive its status.
    AdjustGoalAmount {
        /// Goal to adjust.
        goal_id: GoalId,
        /// Signed delta.
        delta: Decimal,
    },
    /// Delete an investment created by the movement.
    DeleteInvestment {
        /// Investment to delete.
        investment_id: InvestmentId,
    },
    /// Apply a delta to an investment balance, then refresh its returns.
    AdjustInvestmentBalance {
        /// Investment to adjust.
        investment_id: InvestmentId,
        /// Signed delta.
        delta: Decimal,
    },
    /// Apply a delta to an invoice total.
    AdjustInvoiceTotal {
        /// Invoice to adjust.
        invoice_id: InvoiceId,
        /// Signed delta.
        delta: Decimal,
    },
    /// Delete a card charge.
    DeleteCardTransaction {
        /// Charge to delete.
        card_transaction_id: CardTransactionId,
    },
    /// Delete a card created by the movement.
    DeleteCreditCard {
        /// Card to delete.
        credit_card_id: CreditCardId,
    },
    /// Apply a delta to a card's available limit.
    AdjustAvailableLimit {
        /// Card to adjust.
        credit_card_id: CreditCardId,
        /// Signed delta.
        delta: Decimal,
    },
    /// Take back a payment applied to an invoice.
    RevertInvoicePayment {
        /// Invoice paid.
        invoice_id: InvoiceId,
        /// Amount applied.
        amount: Decimal,
        /// Status before the payment.
        previous_status: InvoiceStatus,
    },
}

/// Persisted record of a multi-step movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementIntent {
    /// Movement ID.
    pub id: MovementId,
    /// User the movement acts for.
    pub user_id: UserId,
    /// Flow.
    pub kind: MovementKind,
    /// Lifecycle status.
    pub status: MovementStatus,
    /// Step started but not yet confirmed.
    pub in_flight_step: Option<String>,
    /// Inverses of the applied steps, in application order.
    pub compensations: Vec<Compensation>,
    /// Error that ended the movement.
    pub error: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_compensation_serializes_with_action_tag() {
        let id = AccountId::new();
        let compensation = Compensation::AdjustAccountBalance {
            account_id: id,
            delta: dec!(-12.50),
        };
        let json = serde_json::to_value(&compensation).unwrap();
        assert_eq!(json["action"], "adjust_account_balance");
        assert_eq!(json["account_id"], id.to_string());

        let back: Compensation = serde_json::from_value(json).unwrap();
        assert_eq!(back, compensation);
    }

    #[test]
    fn test_invoice_payment_revert_keeps_previous_status() {
        let compensation = Compensation::RevertInvoicePayment {
            invoice_id: InvoiceId::new(),
            amount: dec!(300),
            previous_status: InvoiceStatus::Open,
        };
        let json = serde_json::to_string(&compensation).unwrap();
        assert!(json.contains("\"previous_status\":\"OPEN\""));
    }
}
