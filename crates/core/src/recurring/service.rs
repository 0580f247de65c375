//! Recurring scheduler.

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tally_shared::{
    AppError, AppResult,
    types::{RecurringTransactionId, UserId},
};
use tracing::{error, info, warn};

use super::repository::RecurringRepository;
use super::schedule::{calculate_next_due, first_due};
use super::types::{
    CreateRecurringInput, Frequency, ManualRun, ProcessingReport, RecurringTransaction,
};
use crate::account::AccountService;
use crate::clock::Clock;
use crate::ownership::ensure_owned;
use crate::transaction::{CreateTransactionInput, Transaction, TransactionService};
use crate::user::UserChecker;

/// Recurring scheduler.
pub struct RecurringService {
    recurring: Arc<dyn RecurringRepository>,
    transactions: Arc<TransactionService>,
    ledger: Arc<AccountService>,
    users: Arc<dyn UserChecker>,
    clock: Arc<dyn Clock>,
}

impl RecurringService {
    /// Creates a new recurring service.
    pub fn new(
        recurring: Arc<dyn RecurringRepository>,
        transactions: Arc<TransactionService>,
        ledger: Arc<AccountService>,
        users: Arc<dyn UserChecker>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            recurring,
            transactions,
            ledger,
            users,
            clock,
        }
    }

    /// Creates a definition. The first occurrence is the first matching day
    /// on or after the start date.
    pub async fn create_recurring(
        &self,
        input: CreateRecurringInput,
    ) -> AppResult<RecurringTransaction> {
        if !input.transaction_type.is_plain() {
            return Err(AppError::Validation(
                "recurring transactions must be receipts or expenses".into(),
            ));
        }
        if input.amount <= Decimal::ZERO {
            return Err(AppError::Validation("amount must be positive".into()));
        }
        match input.frequency {
            Frequency::Monthly if !input.day_of_month.is_some_and(|d| (1..=31).contains(&d)) => {
                return Err(AppError::Validation(
                    "monthly recurrences need a day of month between 1 and 31".into(),
                ));
            }
            Frequency::Weekly if input.day_of_week.is_none() => {
                return Err(AppError::Validation(
                    "weekly recurrences need a day of week".into(),
                ));
            }
            _ => {}
        }
        if input.end_date.is_some_and(|end| end < input.start_date) {
            return Err(AppError::Validation(
                "end date cannot precede start date".into(),
            ));
        }
        self.users.ensure_user_exists(input.user_id).await?;
        self.ledger.get_account(input.account_id, input.user_id).await?;

        let next_due = first_due(
            input.start_date,
            input.frequency,
            input.day_of_month,
            input.day_of_week,
        );
        if input.end_date.is_some_and(|end| next_due > end) {
            return Err(AppError::Validation(
                "no occurrence falls between start and end date".into(),
            ));
        }

        let now = self.clock.now();
        let recurring = self
            .recurring
            .create(RecurringTransaction {
                id: RecurringTransactionId::new(),
                user_id: input.user_id,
                account_id: input.account_id,
                transaction_type: input.transaction_type,
                category_id: input.category_id,
                amount: input.amount,
                description: input.description,
                frequency: input.frequency,
                day_of_month: input.day_of_month,
                day_of_week: input.day_of_week,
                start_date: input.start_date,
                end_date: input.end_date,
                last_processed: None,
                next_due,
                is_active: true,
                created_at: now,
                updated_at: now,
            })
            .await?;
        info!(
            recurring_id = %recurring.id,
            frequency = recurring.frequency.as_str(),
            %next_due,
            "recurring transaction created"
        );
        Ok(recurring)
    }

    /// Loads a definition owned by `user_id`.
    pub async fn get_recurring(
        &self,
        id: RecurringTransactionId,
        user_id: UserId,
    ) -> AppResult<RecurringTransaction> {
        ensure_owned(self.recurring.get_by_id(id).await?, user_id, "recurring transaction", id)
    }

    /// Lists a user's definitions.
    pub async fn list_recurring(&self, user_id: UserId) -> AppResult<Vec<RecurringTransaction>> {
        self.recurring.list_by_user(user_id).await
    }

    /// Stops a definition from being processed.
    pub async fn deactivate_recurring(
        &self,
        id: RecurringTransactionId,
        user_id: UserId,
    ) -> AppResult<RecurringTransaction> {
        self.get_recurring(id, user_id).await?;
        self.recurring.set_active(id, false).await
    }

    /// Deletes a definition. Transactions already materialized stay.
    pub async fn delete_recurring(
        &self,
        id: RecurringTransactionId,
        user_id: UserId,
    ) -> AppResult<()> {
        self.get_recurring(id, user_id).await?;
        self.recurring.delete(id).await
    }

    async fn materialize(
        &self,
        recurring: &RecurringTransaction,
        date: NaiveDate,
    ) -> AppResult<Transaction> {
        self.transactions
            .create_transaction(CreateTransactionInput {
                user_id: recurring.user_id,
                account_id: recurring.account_id,
                transaction_type: recurring.transaction_type,
                category_id: recurring.category_id,
                amount: recurring.amount,
                date,
                description: recurring.description.clone(),
            })
            .await
    }

    fn next_after(recurring: &RecurringTransaction, date: NaiveDate) -> NaiveDate {
        calculate_next_due(
            date,
            recurring.frequency,
            recurring.day_of_month,
            recurring.day_of_week,
        )
    }

    /// Materializes every active definition due today or earlier.
    ///
    /// Failures are logged and left unadvanced so the next run retries them;
    /// definitions past their end date are deactivated.
    pub async fn process_due_transactions(&self) -> AppResult<ProcessingReport> {
        let today = self.clock.today();
        let due = self.recurring.list_due(today).await?;
        let mut report = ProcessingReport::default();

        for recurring in due {
            if recurring.is_past_end(recurring.next_due) {
                self.recurring.set_active(recurring.id, false).await?;
                report.deactivated += 1;
                info!(recurring_id = %recurring.id, "recurring transaction ended");
                continue;
            }

            if let Err(e) = self.materialize(&recurring, recurring.next_due).await {
                warn!(
                    recurring_id = %recurring.id,
                    due = %recurring.next_due,
                    error = %e,
                    "recurring transaction skipped"
                );
                report.failed += 1;
                continue;
            }

            let next_due = Self::next_after(&recurring, today);
            let is_active = !recurring.is_past_end(next_due);
            match self
                .recurring
                .advance(recurring.id, today, next_due, is_active)
                .await
            {
                Ok(_) => {
                    report.processed += 1;
                    if !is_active {
                        report.deactivated += 1;
                    }
                }
                Err(e) => {
                    error!(
                        recurring_id = %recurring.id,
                        error = %e,
                        "recurring transaction materialized but not advanced"
                    );
                    report.failed += 1;
                }
            }
        }

        info!(
            processed = report.processed,
            failed = report.failed,
            deactivated = report.deactivated,
            "recurring batch finished"
        );
        Ok(report)
    }

    /// Materializes one definition on user request.
    ///
    /// `process_date` defaults to today and must lie within the definition's
    /// start and end dates. The schedule never moves backwards.
    pub async fn process_recurring_manually(
        &self,
        id: RecurringTransactionId,
        user_id: UserId,
        process_date: Option<NaiveDate>,
    ) -> AppResult<ManualRun> {
        let recurring = self.get_recurring(id, user_id).await?;
        if !recurring.is_active {
            return Err(AppError::Validation(format!(
                "recurring transaction {id} is inactive"
            )));
        }
        let date = process_date.unwrap_or_else(|| self.clock.today());
        if date < recurring.start_date {
            return Err(AppError::Validation(
                "process date is before the start date".into(),
            ));
        }
        if recurring.is_past_end(date) {
            return Err(AppError::Validation(
                "process date is after the end date".into(),
            ));
        }

        let transaction = self.materialize(&recurring, date).await?;
        let next_due = Self::next_after(&recurring, date).max(recurring.next_due);
        let is_active = !recurring.is_past_end(next_due);
        let recurring = self.recurring.advance(id, date, next_due, is_active).await?;

        info!(recurring_id = %id, %date, %next_due, "recurring transaction processed manually");
        Ok(ManualRun {
            transaction,
            recurring,
        })
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
