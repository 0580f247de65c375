//! Account domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{AccountId, UserId};

use crate::ownership::Owned;

/// Kind of account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountType {
    /// Checking account.
    Checking,
    /// Savings account.
    Savings,
    /// Physical cash.
    Cash,
    /// Brokerage or investment cash account.
    Investment,
    /// Shadow account of a credit card. Its balance represents debt and may
    /// go negative.
    CreditCard,
    /// Anything else.
    Other,
}

impl AccountType {
    /// Stable string form used in storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Checking => "checking",
            Self::Savings => "savings",
            Self::Cash => "cash",
            Self::Investment => "investment",
            Self::CreditCard => "credit_card",
            Self::Other => "other",
        }
    }

    /// Returns true if balances of this type must stay non-negative.
    #[must_use]
    pub const fn requires_non_negative_balance(self) -> bool {
        !matches!(self, Self::CreditCard)
    }
}

impl std::fmt::Display for AccountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A money-holding account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Account ID.
    pub id: AccountId,
    /// Owning user.
    pub user_id: UserId,
    /// Display name.
    pub name: String,
    /// Account kind.
    pub account_type: AccountType,
    /// Current balance. Only ever changed through signed deltas.
    pub balance: Decimal,
    /// Whether the balance counts toward the user's total.
    pub include_in_total: bool,
    /// Inactive accounts cannot take part in new transfers.
    pub is_active: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Returns true if this is a credit-card shadow account.
    #[must_use]
    pub const fn is_credit_card(&self) -> bool {
        matches!(self.account_type, AccountType::CreditCard)
    }

    /// Returns true if applying `delta` keeps the balance valid for this type.
    #[must_use]
    pub fn accepts_delta(&self, delta: Decimal) -> bool {
        !self.account_type.requires_non_negative_balance() || self.balance + delta >= Decimal::ZERO
    }

    /// Returns true if the account can be debited by `amount`.
    #[must_use]
    pub fn can_cover(&self, amount: Decimal) -> bool {
        self.accepts_delta(-amount)
    }
}

impl Owned for Account {
    fn owner(&self) -> UserId {
        self.user_id
    }
}

/// Input for creating an account.
#[derive(Debug, Clone)]
pub struct CreateAccountInput {
    /// Owning user.
    pub user_id: UserId,
    /// Display name.
    pub name: String,
    /// Account kind.
    pub account_type: AccountType,
    /// Balance at creation, the only time it is set directly.
    pub opening_balance: Decimal,
    /// Whether the balance counts toward the user's total.
    pub include_in_total: bool,
}

/// Both sides of a completed transfer.
#[derive(Debug, Clone)]
pub struct Transfer {
    /// Debited account after the transfer.
    pub from: Account,
    /// Credited account after the transfer.
    pub to: Account,
}
