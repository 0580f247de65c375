//! Credit card, invoice and charge types.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{
    AccountId, CardTransactionId, CategoryId, CreditCardId, InvoiceId, MonthPeriod, UserId,
};

use crate::account::Account;
use crate::ownership::Owned;
use crate::transaction::Transaction;

/// A credit card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditCard {
    /// Card ID.
    pub id: CreditCardId,
    /// Owning user.
    pub user_id: UserId,
    /// The 1:1 shadow account of type `CREDIT_CARD`.
    pub account_id: AccountId,
    /// Display name.
    pub name: String,
    /// Total credit line.
    pub credit_limit: Decimal,
    /// Credit line not consumed by unpaid charges. Only changed by atomic deltas.
    pub available_limit: Decimal,
    /// Day of month the invoice closes, 1-31.
    pub closing_day: u32,
    /// Day of month the invoice is due, 1-31.
    pub due_day: u32,
    /// Inactive cards reject new charges.
    pub is_active: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Owned for CreditCard {
    fn owner(&self) -> UserId {
        self.user_id
    }
}

/// Invoice status.
///
/// ```text
/// OPEN ──(closing date, external)──► CLOSED
/// OPEN/CLOSED ──(partial payment)──► PARTIAL ──(full payment)──► PAID
/// OPEN/CLOSED/PARTIAL ──(due date unpaid, external)──► OVERDUE
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceStatus {
    /// Accepting charges.
    Open,
    /// Past the closing date.
    Closed,
    /// Partially paid.
    Partial,
    /// Fully paid.
    Paid,
    /// Past the due date without full payment.
    Overdue,
}

impl InvoiceStatus {
    /// Stable string form used in storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Closed => "CLOSED",
            Self::Partial => "PARTIAL",
            Self::Paid => "PAID",
            Self::Overdue => "OVERDUE",
        }
    }
}

impl std::fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One billing cycle of a card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    /// Invoice ID.
    pub id: InvoiceId,
    /// Billed card.
    pub credit_card_id: CreditCardId,
    /// Reference month, 1-12.
    pub reference_month: u32,
    /// Reference year.
    pub reference_year: i32,
    /// First day of the cycle.
    pub opening_date: NaiveDate,
    /// Closing date.
    pub closing_date: NaiveDate,
    /// Due date.
    pub due_date: NaiveDate,
    /// Sum of charges.
    pub total_amount: Decimal,
    /// Sum of payments.
    pub paid_amount: Decimal,
    /// Lifecycle status.
    pub status: InvoiceStatus,
    /// When the invoice was fully paid.
    pub paid_at: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    /// The invoice period key.
    #[must_use]
    pub fn period(&self) -> MonthPeriod {
        MonthPeriod {
            year: self.reference_year,
            month: self.reference_month,
        }
    }

    /// Amount still owed.
    #[must_use]
    pub fn remaining(&self) -> Decimal {
        (self.total_amount - self.paid_amount).max(Decimal::ZERO)
    }
}

/// Immutable charge record tied to exactly one invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardTransaction {
    /// Charge ID.
    pub id: CardTransactionId,
    /// Charged card.
    pub credit_card_id: CreditCardId,
    /// Invoice the charge belongs to.
    pub invoice_id: InvoiceId,
    /// Owning user.
    pub user_id: UserId,
    /// Category.
    pub category_id: CategoryId,
    /// Positive amount.
    pub amount: Decimal,
    /// Purchase date.
    pub date: NaiveDate,
    /// Free-form description.
    pub description: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// How the shadow account of a new card is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShadowAccount {
    /// Create a fresh `CREDIT_CARD` account named after the card.
    Create,
    /// Link an existing, unlinked `CREDIT_CARD` account.
    Adopt(AccountId),
}

/// Input for creating a card.
#[derive(Debug, Clone)]
pub struct CreateCardInput {
    /// Owning user.
    pub user_id: UserId,
    /// Display name.
    pub name: String,
    /// Credit line, positive.
    pub credit_limit: Decimal,
    /// Closing day, 1-31.
    pub closing_day: u32,
    /// Due day, 1-31.
    pub due_day: u32,
    /// Shadow account source.
    pub shadow_account: ShadowAccount,
}

/// Input for a card charge.
#[derive(Debug, Clone)]
pub struct CreateChargeInput {
    /// Owning user.
    pub user_id: UserId,
    /// Charged card.
    pub credit_card_id: CreditCardId,
    /// Category.
    pub category_id: CategoryId,
    /// Positive amount.
    pub amount: Decimal,
    /// Purchase date.
    pub date: NaiveDate,
    /// Free-form description.
    pub description: Option<String>,
}

/// Input for an invoice payment.
#[derive(Debug, Clone)]
pub struct PayInvoiceInput {
    /// Owning user.
    pub user_id: UserId,
    /// Card the invoice belongs to.
    pub credit_card_id: CreditCardId,
    /// Invoice being paid.
    pub invoice_id: InvoiceId,
    /// Regular account paying.
    pub account_id: AccountId,
    /// Requested amount, clamped to the remainder.
    pub amount: Decimal,
}

/// Result of a charge.
#[derive(Debug, Clone)]
pub struct CardCharge {
    /// The charge record.
    pub transaction: CardTransaction,
    /// Invoice after the charge.
    pub invoice: Invoice,
    /// Card after the limit was consumed.
    pub card: CreditCard,
}

/// Result of a payment.
#[derive(Debug, Clone)]
pub struct InvoicePayment {
    /// Invoice after the payment.
    pub invoice: Invoice,
    /// Card after the limit was restored.
    pub card: CreditCard,
    /// Paying account after the debit.
    pub account: Account,
    /// Amount actually applied after clamping.
    pub amount_paid: Decimal,
    /// Expense leg recorded on the paying account.
    pub leg: Transaction,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn invoice(total: Decimal, paid: Decimal) -> Invoice {
        let day = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        Invoice {
            id: InvoiceId::new(),
            credit_card_id: CreditCardId::new(),
            reference_month: 3,
            reference_year: 2024,
            opening_date: day,
            closing_date: day,
            due_date: day,
            total_amount: total,
            paid_amount: paid,
            status: InvoiceStatus::Open,
            paid_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_remaining_and_period() {
        let inv = invoice(dec!(300), dec!(100));
        assert_eq!(inv.remaining(), dec!(200));
        assert_eq!(invoice(dec!(100), dec!(150)).remaining(), dec!(0));
        assert_eq!(inv.period().to_string(), "2024-03");
    }
}
