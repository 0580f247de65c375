//! Credit-card billing engine.

use std::sync::Arc;

use rust_decimal::Decimal;
use tally_shared::{
    AppError, AppResult,
    types::{CardTransactionId, CreditCardId, InvoiceId, MonthPeriod, TransactionId, UserId},
};
use tracing::{debug, info};

use super::billing::invoice_schedule;
use super::repository::{CardTransactionRepository, CreditCardRepository, InvoiceRepository};
use super::types::{
    CardCharge, CardTransaction, CreateCardInput, CreateChargeInput, CreditCard, Invoice,
    InvoicePayment, InvoiceStatus, PayInvoiceInput, ShadowAccount,
};
use crate::account::{AccountService, AccountType, CreateAccountInput};
use crate::category::{DefaultCategory, DefaultCategoryResolver};
use crate::clock::Clock;
use crate::ownership::ensure_owned;
use crate::saga::{Compensation, MovementKind, SagaCoordinator};
use crate::transaction::{Transaction, TransactionRepository, TransactionType};
use crate::user::UserChecker;

/// Credit-card billing engine.
pub struct CreditCardService {
    cards: Arc<dyn CreditCardRepository>,
    invoices: Arc<dyn InvoiceRepository>,
    charges: Arc<dyn CardTransactionRepository>,
    transactions: Arc<dyn TransactionRepository>,
    ledger: Arc<AccountService>,
    sagas: Arc<SagaCoordinator>,
    categories: Arc<dyn DefaultCategoryResolver>,
    users: Arc<dyn UserChecker>,
    clock: Arc<dyn Clock>,
}

impl CreditCardService {
    /// Creates a new credit card service.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        cards: Arc<dyn CreditCardRepository>,
        invoices: Arc<dyn InvoiceRepository>,
        charges: Arc<dyn CardTransactionRepository>,
        transactions: Arc<dyn TransactionRepository>,
        ledger: Arc<AccountService>,
        sagas: Arc<SagaCoordinator>,
        categories: Arc<dyn DefaultCategoryResolver>,
        users: Arc<dyn UserChecker>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            cards,
            invoices,
            charges,
            transactions,
            ledger,
            sagas,
            categories,
            users,
            clock,
        }
    }

    /// Creates a card, creating or adopting its shadow account.
    pub async fn create_card(&self, input: CreateCardInput) -> AppResult<CreditCard> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("card name is required".into()));
        }
        if input.credit_limit <= Decimal::ZERO {
            return Err(AppError::Validation("credit limit must be positive".into()));
        }
        if !(1..=31).contains(&input.closing_day) || !(1..=31).contains(&input.due_day) {
            return Err(AppError::Validation(
                "closing and due days must be between 1 and 31".into(),
            ));
        }
        self.users.ensure_user_exists(input.user_id).await?;

        let user_id = input.user_id;
        let now = self.clock.now();
        let card = |account_id| CreditCard {
            id: CreditCardId::new(),
            user_id,
            account_id,
            name: name.to_string(),
            credit_limit: input.credit_limit,
            available_limit: input.credit_limit,
            closing_day: input.closing_day,
            due_day: input.due_day,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        let created = match input.shadow_account {
            ShadowAccount::Adopt(account_id) => {
                let account = self.ledger.get_account(account_id, user_id).await?;
                if account.account_type != AccountType::CreditCard {
                    return Err(AppError::Validation(format!(
                        "account {account_id} is not a credit card account"
                    )));
                }
                if self.cards.get_by_account(account_id).await?.is_some() {
                    return Err(AppError::Conflict(format!(
                        "account {account_id} is already linked to a card"
                    )));
                }
                self.cards.create(card(account_id)).await?
            }
            ShadowAccount::Create => {
                let mut saga = self.sagas.begin(MovementKind::CardCreate, user_id).await?;
                let account = saga
                    .step(
                        "create_shadow_account",
                        self.ledger.create_account(CreateAccountInput {
                            user_id,
                            name: name.to_string(),
                            account_type: AccountType::CreditCard,
                            opening_balance: Decimal::ZERO,
                            include_in_total: true,
                        }),
                        |a| Some(Compensation::DeleteAccount { account_id: a.id }),
                    )
                    .await?;
                let created = saga
                    .step("insert_card", self.cards.create(card(account.id)), |c| {
                        Some(Compensation::DeleteCreditCard {
                            credit_card_id: c.id,
                        })
                    })
                    .await?;
                saga.complete().await?;
                created
            }
        };

        info!(
            credit_card_id = %created.id,
            account_id = %created.account_id,
            limit = %created.credit_limit,
            "credit card created"
        );
        Ok(created)
    }

    /// Loads a card owned by `user_id`.
    pub async fn get_card(&self, id: CreditCardId, user_id: UserId) -> AppResult<CreditCard> {
        ensure_owned(self.cards.get_by_id(id).await?, user_id, "credit card", id)
    }

    /// Lists a user's cards.
    pub async fn list_cards(&self, user_id: UserId) -> AppResult<Vec<CreditCard>> {
        self.cards.list_by_user(user_id).await
    }

    /// Returns the invoice of the current period, creating it if absent.
    ///
    /// Concurrent creators race on the `(card, month, year)` key; the loser
    /// reads the winner's invoice.
    pub async fn get_or_create_current_invoice(&self, card: &CreditCard) -> AppResult<Invoice> {
        let today = self.clock.today();
        let period = MonthPeriod::of(today);
        if let Some(invoice) = self.invoices.find_by_period(card.id, period).await? {
            return Ok(invoice);
        }

        let schedule = invoice_schedule(today, card.closing_day, card.due_day);
        let now = self.clock.now();
        let created = self
            .invoices
            .create(Invoice {
                id: InvoiceId::new(),
                credit_card_id: card.id,
                reference_month: period.month,
                reference_year: period.year,
                opening_date: schedule.opening_date,
                closing_date: schedule.closing_date,
                due_date: schedule.due_date,
                total_amount: Decimal::ZERO,
                paid_amount: Decimal::ZERO,
                status: InvoiceStatus::Open,
                paid_at: None,
                created_at: now,
                updated_at: now,
            })
            .await;

        match created {
            Ok(invoice) => {
                info!(
                    invoice_id = %invoice.id,
                    credit_card_id = %card.id,
                    %period,
                    "invoice opened"
                );
                Ok(invoice)
            }
            Err(AppError::Conflict(_)) => {
                debug!(credit_card_id = %card.id, %period, "invoice created concurrently");
                self.invoices
                    .find_by_period(card.id, period)
                    .await?
                    .ok_or_else(|| {
                        AppError::NotFound(format!("invoice {period} of card {}", card.id))
                    })
            }
            Err(e) => Err(e),
        }
    }

    /// Current invoice of a card owned by `user_id`.
    pub async fn current_invoice(
        &self,
        card_id: CreditCardId,
        user_id: UserId,
    ) -> AppResult<Invoice> {
        let card = self.get_card(card_id, user_id).await?;
        self.get_or_create_current_invoice(&card).await
    }

    /// Loads an invoice of a card owned by `user_id`.
    pub async fn get_invoice(&self, invoice_id: InvoiceId, user_id: UserId) -> AppResult<Invoice> {
        let invoice = self
            .invoices
            .get_by_id(invoice_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("invoice {invoice_id}")))?;
        self.get_card(invoice.credit_card_id, user_id).await?;
        Ok(invoice)
    }

    /// Lists the invoices of a card.
    pub async fn list_invoices(
        &self,
        card_id: CreditCardId,
        user_id: UserId,
    ) -> AppResult<Vec<Invoice>> {
        self.get_card(card_id, user_id).await?;
        self.invoices.list_by_card(card_id).await
    }

    /// Lists the charges of an invoice.
    pub async fn list_invoice_charges(
        &self,
        invoice_id: InvoiceId,
        user_id: UserId,
    ) -> AppResult<Vec<CardTransaction>> {
        self.get_invoice(invoice_id, user_id).await?;
        self.charges.list_by_invoice(invoice_id).await
    }

    /// Charges a card.
    ///
    /// Steps: consume available limit, write the charge on the current
    /// invoice, grow the invoice total.
    pub async fn create_transaction(&self, input: CreateChargeInput) -> AppResult<CardCharge> {
        if input.amount <= Decimal::ZERO {
            return Err(AppError::Validation("charge amount must be positive".into()));
        }
        self.users.ensure_user_exists(input.user_id).await?;
        let card = self.get_card(input.credit_card_id, input.user_id).await?;
        if !card.is_active {
            return Err(AppError::Validation(format!("credit card {} is inactive", card.id)));
        }
        if card.available_limit < input.amount {
            return Err(AppError::Validation(format!(
                "insufficient available limit on credit card {}",
                card.id
            )));
        }

        let invoice = self.get_or_create_current_invoice(&card).await?;
        let (card_id, invoice_id, amount) = (card.id, invoice.id, input.amount);
        let charge = CardTransaction {
            id: CardTransactionId::new(),
            credit_card_id: card_id,
            invoice_id,
            user_id: input.user_id,
            category_id: input.category_id,
            amount,
            date: input.date,
            description: input.description,
            created_at: self.clock.now(),
        };

        let mut saga = self.sagas.begin(MovementKind::CardCharge, input.user_id).await?;

        let card = saga
            .step(
                "consume_limit",
                self.cards.adjust_available_limit(card_id, -amount),
                |_| {
                    Some(Compensation::AdjustAvailableLimit {
                        credit_card_id: card_id,
                        delta: amount,
                    })
                },
            )
            .await?;

        let transaction = saga
            .step("insert_charge", self.charges.create(charge), |c| {
                Some(Compensation::DeleteCardTransaction {
                    card_transaction_id: c.id,
                })
            })
            .await?;

        let invoice = saga
            .step(
                "grow_invoice",
                self.invoices.adjust_total(invoice_id, amount),
                |_| {
                    Some(Compensation::AdjustInvoiceTotal {
                        invoice_id,
                        delta: -amount,
                    })
                },
            )
            .await?;

        saga.complete().await?;
        info!(
            credit_card_id = %card_id,
            %invoice_id,
            %amount,
            available = %card.available_limit,
            "card charged"
        );
        Ok(CardCharge {
            transaction,
            invoice,
            card,
        })
    }

    /// Pays an invoice from a regular account.
    ///
    /// The amount is clamped to the remainder. Steps: debit the account,
    /// apply the payment, restore the available limit, write the expense leg.
    pub async fn pay_invoice(&self, input: PayInvoiceInput) -> AppResult<InvoicePayment> {
        if input.amount <= Decimal::ZERO {
            return Err(AppError::Validation("payment amount must be positive".into()));
        }
        let user_id = input.user_id;
        let card = self.get_card(input.credit_card_id, user_id).await?;
        let invoice = self
            .invoices
            .get_by_id(input.invoice_id)
            .await?
            .filter(|i| i.credit_card_id == card.id)
            .ok_or_else(|| AppError::NotFound(format!("invoice {}", input.invoice_id)))?;
        if invoice.status == InvoiceStatus::Paid {
            return Err(AppError::Validation(format!("invoice {} is already paid", invoice.id)));
        }
        let account = self.ledger.get_account(input.account_id, user_id).await?;
        AccountService::ensure_can_fund(&account, input.amount)?;

        let amount = input.amount.min(invoice.remaining());
        if amount <= Decimal::ZERO {
            return Err(AppError::Validation(format!(
                "invoice {} has nothing left to pay",
                invoice.id
            )));
        }

        let (account_id, card_id, invoice_id) = (account.id, card.id, invoice.id);
        let previous_status = invoice.status;
        let leg = Transaction {
            id: TransactionId::new(),
            user_id,
            account_id,
            transaction_type: TransactionType::Expense,
            category_id: self
                .categories
                .resolve(user_id, DefaultCategory::CreditCardPayment),
            investment_id: None,
            amount,
            date: self.clock.today(),
            description: Some(format!("{} invoice {}", card.name, invoice.period())),
            created_at: self.clock.now(),
        };

        let mut saga = self.sagas.begin(MovementKind::InvoicePayment, user_id).await?;

        let account = saga
            .step(
                "debit_account",
                self.ledger.update_balance(account_id, user_id, -amount),
                |_| {
                    Some(Compensation::AdjustAccountBalance {
                        account_id,
                        delta: amount,
                    })
                },
            )
            .await?;

        let invoice = saga
            .step(
                "apply_payment",
                self.invoices.apply_payment(invoice_id, amount, self.clock.now()),
                |_| {
                    Some(Compensation::RevertInvoicePayment {
                        invoice_id,
                        amount,
                        previous_status,
                    })
                },
            )
            .await?;

        let card = saga
            .step(
                "restore_limit",
                self.cards.adjust_available_limit(card_id, amount),
                |_| {
                    Some(Compensation::AdjustAvailableLimit {
                        credit_card_id: card_id,
                        delta: -amount,
                    })
                },
            )
            .await?;

        let leg = saga
            .step("insert_payment_leg", self.transactions.create(leg), |t| {
                Some(Compensation::DeleteTransaction {
                    transaction_id: t.id,
                })
            })
            .await?;

        saga.complete().await?;
        info!(
            %invoice_id,
            credit_card_id = %card_id,
            %account_id,
            %amount,
            status = %invoice.status,
            "invoice paid"
        );
        Ok(InvoicePayment {
            invoice,
            card,
            account,
            amount_paid: amount,
            leg,
        })
    }

    /// Deletes a card with nothing owed, then its shadow account.
    ///
    /// Rejected while the current invoice carries charges or any invoice has
    /// an unpaid remainder.
    pub async fn delete_card(&self, card_id: CreditCardId, user_id: UserId) -> AppResult<()> {
        let card = self.get_card(card_id, user_id).await?;
        let period = MonthPeriod::of(self.clock.today());
        if let Some(current) = self.invoices.find_by_period(card_id, period).await?
            && current.total_amount > Decimal::ZERO
        {
            return Err(AppError::Validation(format!(
                "credit card {card_id} has charges on its current invoice"
            )));
        }
        let invoices = self.invoices.list_by_card(card_id).await?;
        if invoices.iter().any(|i| i.remaining() > Decimal::ZERO) {
            return Err(AppError::Validation(format!(
                "credit card {card_id} has unpaid invoices"
            )));
        }

        self.ledger.delete_account(card.account_id, user_id).await?;
        self.cards.delete(card_id).await?;
        info!(credit_card_id = %card_id, account_id = %card.account_id, "credit card deleted");
        Ok(())
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
