//! Plain income/expense orchestration.
//!
//! Glue between the account ledger and the budget tracker: every plain
//! transaction moves the account balance, writes the record and, for
//! expenses, accumulates budget spend.

use std::sync::Arc;

use rust_decimal::Decimal;
use tally_shared::{
    AppError, AppResult,
    types::{MonthPeriod, TransactionId, UserId},
};
use tracing::info;

use super::repository::TransactionRepository;
use super::types::{CreateTransactionInput, Transaction, TransactionType};
use crate::account::AccountService;
use crate::budget::BudgetService;
use crate::category::{DefaultCategory, DefaultCategoryResolver};
use crate::clock::Clock;
use crate::ownership::ensure_owned;
use crate::saga::{Compensation, MovementKind, SagaCoordinator};
use crate::user::UserChecker;

/// Plain transaction service.
pub struct TransactionService {
    transactions: Arc<dyn TransactionRepository>,
    ledger: Arc<AccountService>,
    budgets: Arc<BudgetService>,
    sagas: Arc<SagaCoordinator>,
    categories: Arc<dyn DefaultCategoryResolver>,
    users: Arc<dyn UserChecker>,
    clock: Arc<dyn Clock>,
}

impl TransactionService {
    /// Creates a new transaction service.
    pub fn new(
        transactions: Arc<dyn TransactionRepository>,
        ledger: Arc<AccountService>,
        budgets: Arc<BudgetService>,
        sagas: Arc<SagaCoordinator>,
        categories: Arc<dyn DefaultCategoryResolver>,
        users: Arc<dyn UserChecker>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            transactions,
            ledger,
            budgets,
            sagas,
            categories,
            users,
            clock,
        }
    }

    /// Books a plain income or expense.
    ///
    /// Steps: account delta by sign convention, record insert, budget spend
    /// for expenses. A failing step undoes the earlier ones.
    pub async fn create_transaction(
        &self,
        input: CreateTransactionInput,
    ) -> AppResult<Transaction> {
        if !input.transaction_type.is_plain() {
            return Err(AppError::Validation(format!(
                "{} transactions are written by their engine",
                input.transaction_type
            )));
        }
        if input.amount <= Decimal::ZERO {
            return Err(AppError::Validation("amount must be positive".into()));
        }
        self.users.ensure_user_exists(input.user_id).await?;

        let account = self.ledger.get_account(input.account_id, input.user_id).await?;
        let delta = input.transaction_type.balance_effect(input.amount);
        if !account.accepts_delta(delta) {
            return Err(AppError::insufficient_funds(format!("account {}", account.id)));
        }

        let record = Transaction {
            id: TransactionId::new(),
            user_id: input.user_id,
            account_id: input.account_id,
            transaction_type: input.transaction_type,
            category_id: input.category_id,
            investment_id: None,
            amount: input.amount,
            date: input.date,
            description: input.description.map(|d| d.trim().to_string()).filter(|d| !d.is_empty()),
            created_at: self.clock.now(),
        };

        let mut saga = self
            .sagas
            .begin(MovementKind::TransactionCreate, input.user_id)
            .await?;

        saga.step(
            "adjust_account",
            self.ledger.update_balance(account.id, input.user_id, delta),
            |a| {
                Some(Compensation::AdjustAccountBalance {
                    account_id: a.id,
                    delta: -delta,
                })
            },
        )
        .await?;

        let transaction = saga
            .step("insert_transaction", self.transactions.create(record), |t| {
                Some(Compensation::DeleteTransaction {
                    transaction_id: t.id,
                })
            })
            .await?;

        if transaction.transaction_type == TransactionType::Expense {
            let amount = transaction.amount;
            saga.step(
                "update_budget_spent",
                self.budgets
                    .update_spent(transaction.category_id, transaction.user_id, amount),
                |budget| {
                    budget.as_ref().map(|b| Compensation::AdjustBudgetSpent {
                        budget_id: b.id,
                        delta: -amount,
                    })
                },
            )
            .await?;
        }

        saga.complete().await?;
        info!(
            transaction_id = %transaction.id,
            account_id = %transaction.account_id,
            transaction_type = %transaction.transaction_type,
            amount = %transaction.amount,
            "transaction created"
        );
        Ok(transaction)
    }

    /// Loads a transaction owned by `user_id`.
    pub async fn get_transaction(
        &self,
        id: TransactionId,
        user_id: UserId,
    ) -> AppResult<Transaction> {
        ensure_owned(self.transactions.get_by_id(id).await?, user_id, "transaction", id)
    }

    /// Lists a user's transactions.
    pub async fn list_transactions(&self, user_id: UserId) -> AppResult<Vec<Transaction>> {
        self.transactions.list_by_user(user_id).await
    }

    /// Removes a plain transaction, reversing its balance effect and its
    /// budget spend in the month it was booked.
    pub async fn delete_transaction(&self, id: TransactionId, user_id: UserId) -> AppResult<()> {
        let transaction = self.get_transaction(id, user_id).await?;
        let payment_category = self
            .categories
            .resolve(user_id, DefaultCategory::CreditCardPayment);
        if !transaction.transaction_type.is_plain() || transaction.category_id == payment_category {
            return Err(AppError::Validation(format!(
                "transaction {id} is owned by its engine"
            )));
        }

        let reversal = -transaction.balance_effect();
        let mut saga = self
            .sagas
            .begin(MovementKind::TransactionDelete, user_id)
            .await?;

        saga.step(
            "reverse_account",
            self.ledger
                .update_balance(transaction.account_id, user_id, reversal),
            |a| {
                Some(Compensation::AdjustAccountBalance {
                    account_id: a.id,
                    delta: -reversal,
                })
            },
        )
        .await?;

        if transaction.transaction_type == TransactionType::Expense {
            let amount = transaction.amount;
            saga.step(
                "reverse_budget_spent",
                self.budgets.update_spent_in(
                    MonthPeriod::of(transaction.created_at.date_naive()),
                    transaction.category_id,
                    user_id,
                    -amount,
                ),
                |budget| {
                    budget.as_ref().map(|b| Compensation::AdjustBudgetSpent {
                        budget_id: b.id,
                        delta: amount,
                    })
                },
            )
            .await?;
        }

        let restore = Box::new(transaction);
        saga.step("delete_transaction", self.transactions.delete(id), |_| {
            Some(Compensation::RestoreTransaction {
                transaction: restore,
            })
        })
        .await?;

        saga.complete().await?;
        info!(transaction_id = %id, "transaction deleted");
        Ok(())
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
