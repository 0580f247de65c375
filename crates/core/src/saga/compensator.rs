//! Applies compensating actions.

use std::sync::Arc;

use tally_shared::AppResult;
use tracing::debug;

use super::types::Compensation;
use crate::account::AccountRepository;
use crate::budget::BudgetRepository;
use crate::clock::Clock;
use crate::credit_card::{CardTransactionRepository, CreditCardRepository, InvoiceRepository};
use crate::goal::{ContributionRepository, GoalRepository, service::settle_status};
use crate::investment::{InvestmentRepository, service::refresh_returns};
use crate::services::Repositories;
use crate::transaction::TransactionRepository;

/// Executes [`Compensation`]s directly against the repositories.
///
/// Compensations bypass the services: they restore a previous state and must
/// not be rejected by the rules that guard new movements.
pub struct Compensator {
    accounts: Arc<dyn AccountRepository>,
    transactions: Arc<dyn TransactionRepository>,
    budgets: Arc<dyn BudgetRepository>,
    goals: Arc<dyn GoalRepository>,
    contributions: Arc<dyn ContributionRepository>,
    investments: Arc<dyn InvestmentRepository>,
    credit_cards: Arc<dyn CreditCardRepository>,
    invoices: Arc<dyn InvoiceRepository>,
    card_transactions: Arc<dyn CardTransactionRepository>,
    clock: Arc<dyn Clock>,
}

impl Compensator {
    /// Creates a compensator over the given repositories.
    pub fn new(repos: &Repositories, clock: Arc<dyn Clock>) -> Self {
        Self {
            accounts: Arc::clone(&repos.accounts),
            transactions: Arc::clone(&repos.transactions),
            budgets: Arc::clone(&repos.budgets),
            goals: Arc::clone(&repos.goals),
            contributions: Arc::clone(&repos.contributions),
            investments: Arc::clone(&repos.investments),
            credit_cards: Arc::clone(&repos.credit_cards),
            invoices: Arc::clone(&repos.invoices),
            card_transactions: Arc::clone(&repos.card_transactions),
            clock,
        }
    }

    /// Applies one compensation.
    pub async fn apply(&self, compensation: &Compensation) -> AppResult<()> {
        debug!(?compensation, "applying compensation");
        match compensation {
            Compensation::AdjustAccountBalance { account_id, delta } => {
                self.accounts.adjust_balance(*account_id, *delta).await?;
            }
            Compensation::DeleteAccount { account_id } => {
                self.accounts.delete(*account_id).await?;
            }
            Compensation::DeleteTransaction { transaction_id } => {
                self.transactions.delete(*transaction_id).await?;
            }
            Compensation::RestoreTransaction { transaction } => {
                self.transactions.create(transaction.as_ref().clone()).await?;
            }
            Compensation::AdjustBudgetSpent { budget_id, delta } => {
                self.budgets.adjust_spent(*budget_id, *delta).await?;
            }
            Compensation::DeleteContribution { contribution_id } => {
                self.contributions.delete(*contribution_id).await?;
            }
            Compensation::AdjustGoalAmount { goal_id, delta } => {
                let goal = self.goals.adjust_current_amount(*goal_id, *delta).await?;
                settle_status(self.goals.as_ref(), goal, self.clock.now()).await?;
            }
            Compensation::DeleteInvestment { investment_id } => {
                self.investments.delete(*investment_id).await?;
            }
            Compensation::AdjustInvestmentBalance {
                investment_id,
                delta,
            } => {
                self.investments.adjust_balance(*investment_id, *delta).await?;
                refresh_returns(
                    self.investments.as_ref(),
                    self.transactions.as_ref(),
                    *investment_id,
                )
                .await?;
            }
            Compensation::AdjustInvoiceTotal { invoice_id, delta } => {
                self.invoices.adjust_total(*invoice_id, *delta).await?;
            }
            Compensation::DeleteCardTransaction {
                card_transaction_id,
            } => {
                self.card_transactions.delete(*card_transaction_id).await?;
            }
            Compensation::DeleteCreditCard { credit_card_id } => {
                self.credit_cards.delete(*credit_card_id).await?;
            }
            Compensation::AdjustAvailableLimit {
                credit_card_id,
                delta,
            } => {
                self.credit_cards
                    .adjust_available_limit(*credit_card_id, *delta)
                    .await?;
            }
            Compensation::RevertInvoicePayment {
                invoice_id,
                amount,
                previous_status,
            } => {
                self.invoices
                    .revert_payment(*invoice_id, *amount, *previous_status)
                    .await?;
            }
        }
        Ok(())
    }
}
