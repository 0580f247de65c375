//! Investment movement engine.

use std::sync::Arc;

use rust_decimal::Decimal;
use tally_shared::{
    AppError, AppResult,
    types::{AccountId, InvestmentId, TransactionId, UserId},
};
use tracing::info;

use super::repository::InvestmentRepository;
use super::returns::{ReturnSummary, calculate_return};
use super::types::{CreateInvestmentInput, Investment, InvestmentMovement};
use crate::account::AccountService;
use crate::category::{DefaultCategory, DefaultCategoryResolver};
use crate::clock::Clock;
use crate::ownership::ensure_owned;
use crate::saga::{Compensation, MovementKind, SagaCoordinator};
use crate::transaction::{Transaction, TransactionRepository, TransactionType, total_invested};
use crate::user::UserChecker;

/// Recomputes and persists `return_balance` and `return_rate` from the
/// current balance and the investment's legs.
pub(crate) async fn refresh_returns(
    investments: &dyn InvestmentRepository,
    transactions: &dyn TransactionRepository,
    id: InvestmentId,
) -> AppResult<Investment> {
    let investment = investments
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("investment {id}")))?;
    let legs = transactions.list_by_investment(id).await?;
    let summary = calculate_return(investment.current_balance, total_invested(&legs));
    if summary.profit == investment.return_balance && summary.return_pct == investment.return_rate {
        return Ok(investment);
    }
    investments
        .set_returns(id, summary.profit, summary.return_pct)
        .await
}

/// Investment movement engine.
pub struct InvestmentService {
    investments: Arc<dyn InvestmentRepository>,
    transactions: Arc<dyn TransactionRepository>,
    ledger: Arc<AccountService>,
    sagas: Arc<SagaCoordinator>,
    categories: Arc<dyn DefaultCategoryResolver>,
    users: Arc<dyn UserChecker>,
    clock: Arc<dyn Clock>,
}

impl InvestmentService {
    /// Creates a new investment service.
    pub fn new(
        investments: Arc<dyn InvestmentRepository>,
        transactions: Arc<dyn TransactionRepository>,
        ledger: Arc<AccountService>,
        sagas: Arc<SagaCoordinator>,
        categories: Arc<dyn DefaultCategoryResolver>,
        users: Arc<dyn UserChecker>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            investments,
            transactions,
            ledger,
            sagas,
            categories,
            users,
            clock,
        }
    }

    fn leg(
        &self,
        user_id: UserId,
        account_id: AccountId,
        investment_id: InvestmentId,
        transaction_type: TransactionType,
        amount: Decimal,
        description: Option<String>,
    ) -> Transaction {
        let category = match transaction_type {
            TransactionType::Withdraw => DefaultCategory::InvestmentWithdrawals,
            _ => DefaultCategory::Investments,
        };
        Transaction {
            id: TransactionId::new(),
            user_id,
            account_id,
            transaction_type,
            category_id: self.categories.resolve(user_id, category),
            investment_id: Some(investment_id),
            amount,
            date: self.clock.today(),
            description,
            created_at: self.clock.now(),
        }
    }

    /// Creates an investment funded from an account.
    ///
    /// Steps: insert the investment, debit the account, write the
    /// `INVESTMENT` leg, refresh returns. A failure after the insert deletes
    /// the investment and re-credits the account if it was debited.
    pub async fn create_investment(
        &self,
        input: CreateInvestmentInput,
    ) -> AppResult<InvestmentMovement> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("investment name is required".into()));
        }
        if input.initial_amount < Decimal::ZERO {
            return Err(AppError::Validation("initial amount cannot be negative".into()));
        }
        self.users.ensure_user_exists(input.user_id).await?;
        let account = self.ledger.get_account(input.account_id, input.user_id).await?;
        AccountService::ensure_can_fund(&account, input.initial_amount)?;

        let (user_id, account_id, amount) = (input.user_id, input.account_id, input.initial_amount);
        let now = self.clock.now();
        let mut saga = self
            .sagas
            .begin(MovementKind::InvestmentCreate, user_id)
            .await?;

        let investment = saga
            .step(
                "insert_investment",
                self.investments.create(Investment {
                    id: InvestmentId::new(),
                    user_id,
                    name: name.to_string(),
                    investment_type: input.investment_type,
                    current_balance: amount,
                    return_balance: Decimal::ZERO,
                    return_rate: Decimal::ZERO,
                    created_at: now,
                    updated_at: now,
                }),
                |i| {
                    Some(Compensation::DeleteInvestment {
                        investment_id: i.id,
                    })
                },
            )
            .await?;

        if amount.is_zero() {
            saga.complete().await?;
            info!(investment_id = %investment.id, "investment created without principal");
            return Ok(InvestmentMovement {
                investment,
                leg: None,
            });
        }

        saga.step(
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

        let record = self.leg(
            user_id,
            account_id,
            investment.id,
            TransactionType::Investment,
            amount,
            None,
        );
        let leg = saga
            .step("insert_leg", self.transactions.create(record), |t| {
                Some(Compensation::DeleteTransaction {
                    transaction_id: t.id,
                })
            })
            .await?;

        let investment = saga
            .step(
                "refresh_returns",
                refresh_returns(
                    self.investments.as_ref(),
                    self.transactions.as_ref(),
                    investment.id,
                ),
                |_| None,
            )
            .await?;

        saga.complete().await?;
        info!(investment_id = %investment.id, %account_id, %amount, "investment created");
        Ok(InvestmentMovement {
            investment,
            leg: Some(leg),
        })
    }

    /// Loads an investment owned by `user_id`.
    pub async fn get_investment(&self, id: InvestmentId, user_id: UserId) -> AppResult<Investment> {
        ensure_owned(self.investments.get_by_id(id).await?, user_id, "investment", id)
    }

    /// Lists a user's investments.
    pub async fn list_investments(&self, user_id: UserId) -> AppResult<Vec<Investment>> {
        self.investments.list_by_user(user_id).await
    }

    /// Lists the transaction legs of an investment.
    pub async fn list_legs(
        &self,
        id: InvestmentId,
        user_id: UserId,
    ) -> AppResult<Vec<Transaction>> {
        self.get_investment(id, user_id).await?;
        self.transactions.list_by_investment(id).await
    }

    /// Computes the return of an investment from its legs.
    pub async fn calculate_return(
        &self,
        id: InvestmentId,
        user_id: UserId,
    ) -> AppResult<ReturnSummary> {
        let investment = self.get_investment(id, user_id).await?;
        let legs = self.transactions.list_by_investment(id).await?;
        Ok(calculate_return(investment.current_balance, total_invested(&legs)))
    }

    /// Moves `amount` from an account into an investment.
    pub async fn make_contribution(
        &self,
        investment_id: InvestmentId,
        account_id: AccountId,
        user_id: UserId,
        amount: Decimal,
        description: Option<String>,
    ) -> AppResult<InvestmentMovement> {
        if amount <= Decimal::ZERO {
            return Err(AppError::Validation("contribution must be positive".into()));
        }
        self.get_investment(investment_id, user_id).await?;
        let account = self.ledger.get_account(account_id, user_id).await?;
        AccountService::ensure_can_fund(&account, amount)?;

        let mut saga = self
            .sagas
            .begin(MovementKind::InvestmentContribution, user_id)
            .await?;

        saga.step(
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

        saga.step(
            "increment_investment",
            self.investments.adjust_balance(investment_id, amount),
            |_| {
                Some(Compensation::AdjustInvestmentBalance {
                    investment_id,
                    delta: -amount,
                })
            },
        )
        .await?;

        let record = self.leg(
            user_id,
            account_id,
            investment_id,
            TransactionType::Investment,
            amount,
            description,
        );
        let leg = saga
            .step("insert_leg", self.transactions.create(record), |t| {
                Some(Compensation::DeleteTransaction {
                    transaction_id: t.id,
                })
            })
            .await?;

        let investment = saga
            .step(
                "refresh_returns",
                refresh_returns(
                    self.investments.as_ref(),
                    self.transactions.as_ref(),
                    investment_id,
                ),
                |_| None,
            )
            .await?;

        saga.complete().await?;
        info!(
            %investment_id,
            %account_id,
            %amount,
            balance = %investment.current_balance,
            "investment contribution made"
        );
        Ok(InvestmentMovement {
            investment,
            leg: Some(leg),
        })
    }

    /// Moves `amount` from an investment back into an account.
    pub async fn make_withdraw(
        &self,
        investment_id: InvestmentId,
        account_id: AccountId,
        user_id: UserId,
        amount: Decimal,
        description: Option<String>,
    ) -> AppResult<InvestmentMovement> {
        if amount <= Decimal::ZERO {
            return Err(AppError::Validation("withdrawal must be positive".into()));
        }
        let investment = self.get_investment(investment_id, user_id).await?;
        if amount > investment.current_balance {
            return Err(AppError::insufficient_funds(format!("investment {investment_id}")));
        }
        let account = self.ledger.get_account(account_id, user_id).await?;
        AccountService::ensure_can_receive(&account)?;

        let mut saga = self
            .sagas
            .begin(MovementKind::InvestmentWithdrawal, user_id)
            .await?;

        saga.step(
            "decrement_investment",
            self.investments.adjust_balance(investment_id, -amount),
            |_| {
                Some(Compensation::AdjustInvestmentBalance {
                    investment_id,
                    delta: amount,
                })
            },
        )
        .await?;

        saga.step(
            "credit_account",
            self.ledger.update_balance(account_id, user_id, amount),
            |_| {
                Some(Compensation::AdjustAccountBalance {
                    account_id,
                    delta: -amount,
                })
            },
        )
        .await?;

        let record = self.leg(
            user_id,
            account_id,
            investment_id,
            TransactionType::Withdraw,
            amount,
            description,
        );
        let leg = saga
            .step("insert_leg", self.transactions.create(record), |t| {
                Some(Compensation::DeleteTransaction {
                    transaction_id: t.id,
                })
            })
            .await?;

        let investment = saga
            .step(
                "refresh_returns",
                refresh_returns(
                    self.investments.as_ref(),
                    self.transactions.as_ref(),
                    investment_id,
                ),
                |_| None,
            )
            .await?;

        saga.complete().await?;
        info!(
            %investment_id,
            %account_id,
            %amount,
            balance = %investment.current_balance,
            "investment withdrawal made"
        );
        Ok(InvestmentMovement {
            investment,
            leg: Some(leg),
        })
    }

    /// Applies a market valuation: the balance moves to `new_balance` by an
    /// atomic delta and returns are recomputed. No account is touched.
    pub async fn record_valuation(
        &self,
        id: InvestmentId,
        user_id: UserId,
        new_balance: Decimal,
    ) -> AppResult<Investment> {
        if new_balance < Decimal::ZERO {
            return Err(AppError::Validation("valuation cannot be negative".into()));
        }
        let investment = self.get_investment(id, user_id).await?;
        let delta = new_balance - investment.current_balance;
        if !delta.is_zero() {
            self.investments.adjust_balance(id, delta).await?;
        }
        let investment =
            refresh_returns(self.investments.as_ref(), self.transactions.as_ref(), id).await?;
        info!(
            investment_id = %id,
            balance = %investment.current_balance,
            return_rate = %investment.return_rate,
            "valuation recorded"
        );
        Ok(investment)
    }

    /// Deletes an empty investment together with its legs.
    pub async fn delete_investment(&self, id: InvestmentId, user_id: UserId) -> AppResult<()> {
        let investment = self.get_investment(id, user_id).await?;
        if !investment.current_balance.is_zero() {
            return Err(AppError::Validation(format!(
                "investment {id} still holds {}",
                investment.current_balance
            )));
        }
        let legs = self.transactions.delete_by_investment(id).await?;
        self.investments.delete(id).await?;
        info!(investment_id = %id, legs, "investment deleted");
        Ok(())
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
