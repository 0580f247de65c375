//! Investment types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{AccountId, InvestmentId, UserId};

use crate::ownership::Owned;
use crate::transaction::Transaction;

/// Asset class of an investment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvestmentType {
    /// Bonds, deposits and similar.
    FixedIncome,
    /// Equities.
    Stocks,
    /// Investment funds.
    Funds,
    /// Real estate.
    RealEstate,
    /// Crypto assets.
    Crypto,
    /// Anything else.
    Other,
}

impl InvestmentType {
    /// Stable string form used in storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FixedIncome => "fixed_income",
            Self::Stocks => "stocks",
            Self::Funds => "funds",
            Self::RealEstate => "real_estate",
            Self::Crypto => "crypto",
            Self::Other => "other",
        }
    }
}

/// An investment position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Investment {
    /// Investment ID.
    pub id: InvestmentId,
    /// Owning user.
    pub user_id: UserId,
    /// Display name.
    pub name: String,
    /// Asset class.
    pub investment_type: InvestmentType,
    /// Principal plus gains. Only changed by atomic deltas.
    pub current_balance: Decimal,
    /// `current_balance - total_invested`, refreshed after every movement.
    pub return_balance: Decimal,
    /// `return_balance / total_invested * 100`.
    pub return_rate: Decimal,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Owned for Investment {
    fn owner(&self) -> UserId {
        self.user_id
    }
}

/// Input for creating an investment funded from an account.
#[derive(Debug, Clone)]
pub struct CreateInvestmentInput {
    /// Owning user.
    pub user_id: UserId,
    /// Account paying the initial amount.
    pub account_id: AccountId,
    /// Display name.
    pub name: String,
    /// Asset class.
    pub investment_type: InvestmentType,
    /// Initial principal, zero or more.
    pub initial_amount: Decimal,
}

/// Result of an investment movement.
#[derive(Debug, Clone)]
pub struct InvestmentMovement {
    /// Investment after the movement, returns refreshed.
    pub investment: Investment,
    /// The audit leg written, absent for an empty initial amount.
    pub leg: Option<Transaction>,
}
