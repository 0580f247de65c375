//! Transaction types and the sign convention.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{AccountId, CategoryId, InvestmentId, TransactionId, UserId};

use crate::ownership::Owned;

/// Transaction type. Determines the sign of the account effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    /// Income, credits the account.
    Receipt,
    /// Spending, debits the account.
    Expense,
    /// Money moved into an investment, debits the account.
    Investment,
    /// Money taken out of an investment, credits the account.
    Withdraw,
}

impl TransactionType {
    /// Stable string form used in storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Receipt => "receipt",
            Self::Expense => "expense",
            Self::Investment => "investment",
            Self::Withdraw => "withdraw",
        }
    }

    /// Signed effect of a transaction of this type on its account.
    #[must_use]
    pub fn balance_effect(self, amount: Decimal) -> Decimal {
        match self {
            Self::Receipt | Self::Withdraw => amount,
            Self::Expense | Self::Investment => -amount,
        }
    }

    /// Returns true for the types users create directly. Investment legs are
    /// written by the investment engine only.
    #[must_use]
    pub const fn is_plain(self) -> bool {
        matches!(self, Self::Receipt | Self::Expense)
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable audit record of one movement on an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Transaction ID.
    pub id: TransactionId,
    /// Owning user.
    pub user_id: UserId,
    /// Affected account.
    pub account_id: AccountId,
    /// Type, which decides the sign.
    pub transaction_type: TransactionType,
    /// Category.
    pub category_id: CategoryId,
    /// Linked investment for investment legs.
    pub investment_id: Option<InvestmentId>,
    /// Amount, always positive.
    pub amount: Decimal,
    /// Value date.
    pub date: NaiveDate,
    /// Free-form description.
    pub description: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Signed effect on the account balance.
    #[must_use]
    pub fn balance_effect(&self) -> Decimal {
        self.transaction_type.balance_effect(self.amount)
    }
}

impl Owned for Transaction {
    fn owner(&self) -> UserId {
        self.user_id
    }
}

/// Input for a plain income or expense.
#[derive(Debug, Clone)]
pub struct CreateTransactionInput {
    /// Owning user.
    pub user_id: UserId,
    /// Affected account.
    pub account_id: AccountId,
    /// `Receipt` or `Expense`.
    pub transaction_type: TransactionType,
    /// Category.
    pub category_id: CategoryId,
    /// Positive amount.
    pub amount: Decimal,
    /// Value date.
    pub date: NaiveDate,
    /// Free-form description.
    pub description: Option<String>,
}

/// Net principal put into an investment: investment legs minus withdraw legs.
#[must_use]
pub fn total_invested(legs: &[Transaction]) -> Decimal {
    legs.iter()
        .map(|leg| match leg.transaction_type {
            TransactionType::Investment => leg.amount,
            TransactionType::Withdraw => -leg.amount,
            TransactionType::Receipt | TransactionType::Expense => Decimal::ZERO,
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case(TransactionType::Receipt, dec!(10))]
    #[case(TransactionType::Expense, dec!(-10))]
    #[case(TransactionType::Investment, dec!(-10))]
    #[case(TransactionType::Withdraw, dec!(10))]
    fn test_sign_convention(#[case] kind: TransactionType, #[case] expected: Decimal) {
        assert_eq!(kind.balance_effect(dec!(10)), expected);
    }

    fn leg(kind: TransactionType, amount: Decimal) -> Transaction {
        Transaction {
            id: TransactionId::new(),
            user_id: UserId::new(),
            account_id: AccountId::new(),
            transaction_type: kind,
            category_id: CategoryId::new(),
            investment_id: Some(InvestmentId::new()),
            amount,
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            description: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_total_invested_nets_withdrawals() {
        let legs = vec![
            leg(TransactionType::Investment, dec!(1000)),
            leg(TransactionType::Investment, dec!(250)),
            leg(TransactionType::Withdraw, dec!(300)),
        ];
        assert_eq!(total_invested(&legs), dec!(950));
        assert_eq!(total_invested(&[]), Decimal::ZERO);
    }

    #[test]
    fn test_only_receipt_and_expense_are_plain() {
        assert!(TransactionType::Receipt.is_plain());
        assert!(TransactionType::Expense.is_plain());
        assert!(!TransactionType::Investment.is_plain());
        assert!(!TransactionType::Withdraw.is_plain());
    }
}
