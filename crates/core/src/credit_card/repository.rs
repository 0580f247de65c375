//! Persistence contracts for cards, invoices and charges.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tally_shared::{
    AppResult,
    types::{AccountId, CardTransactionId, CreditCardId, InvoiceId, MonthPeriod, UserId},
};

use super::types::{CardTransaction, CreditCard, Invoice, InvoiceStatus};

/// Credit card storage.
#[async_trait]
pub trait CreditCardRepository: Send + Sync {
    /// Inserts a card. A second card on the same account fails with `Conflict`.
    async fn create(&self, card: CreditCard) -> AppResult<CreditCard>;

    /// Finds a card by ID.
    async fn get_by_id(&self, id: CreditCardId) -> AppResult<Option<CreditCard>>;

    /// Finds the card linked to a shadow account.
    async fn get_by_account(&self, account_id: AccountId) -> AppResult<Option<CreditCard>>;

    /// Lists a user's cards.
    async fn list_by_user(&self, user_id: UserId) -> AppResult<Vec<CreditCard>>;

    /// Deletes a card together with its invoices and charges.
    async fn delete(&self, id: CreditCardId) -> AppResult<()>;

    /// Applies `available_limit = available_limit + delta` as one atomic
    /// statement that only matches while the result stays within
    /// `0..=credit_limit`. A non-match on an existing card is reported as
    /// insufficient limit.
    async fn adjust_available_limit(
        &self,
        id: CreditCardId,
        delta: Decimal,
    ) -> AppResult<CreditCard>;
}

/// Invoice storage.
#[async_trait]
pub trait InvoiceRepository: Send + Sync {
    /// Inserts an invoice. A second invoice for the same
    /// `(card, month, year)` fails with `Conflict`.
    async fn create(&self, invoice: Invoice) -> AppResult<Invoice>;

    /// Finds an invoice by ID.
    async fn get_by_id(&self, id: InvoiceId) -> AppResult<Option<Invoice>>;

    /// Finds the invoice of a card for one period.
    async fn find_by_period(
        &self,
        credit_card_id: CreditCardId,
        period: MonthPeriod,
    ) -> AppResult<Option<Invoice>>;

    /// Lists a card's invoices, newest period first.
    async fn list_by_card(&self, credit_card_id: CreditCardId) -> AppResult<Vec<Invoice>>;

    /// Applies `total_amount = total_amount + delta` as one atomic statement.
    ///
    /// A `PARTIAL` or `PAID` invoice has its status re-derived against the new
    /// total: `PAID` while `paid_amount` covers it, `PARTIAL` (and no
    /// `paid_at`) otherwise.
    async fn adjust_total(&self, id: InvoiceId, delta: Decimal) -> AppResult<Invoice>;

    /// Adds a payment in one atomic statement: increments `paid_amount`, sets
    /// `PAID` with `paid_at` when the total is covered and `PARTIAL`
    /// otherwise. Only matches an unpaid invoice with enough remainder.
    async fn apply_payment(
        &self,
        id: InvoiceId,
        amount: Decimal,
        paid_at: DateTime<Utc>,
    ) -> AppResult<Invoice>;

    /// Undoes a payment: decrements `paid_amount`, restores the previous
    /// status and clears `paid_at`.
    async fn revert_payment(
        &self,
        id: InvoiceId,
        amount: Decimal,
        previous_status: InvoiceStatus,
    ) -> AppResult<Invoice>;
}

/// Charge storage.
#[async_trait]
pub trait CardTransactionRepository: Send + Sync {
    /// Inserts a charge.
    async fn create(&self, charge: CardTransaction) -> AppResult<CardTransaction>;

    /// Deletes a charge.
    async fn delete(&self, id: CardTransactionId) -> AppResult<()>;

    /// Lists the charges of an invoice, oldest first.
    async fn list_by_invoice(&self, invoice_id: InvoiceId) -> AppResult<Vec<CardTransaction>>;
}
