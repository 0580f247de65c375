//! Budget spend tracker.

use std::sync::Arc;

use rust_decimal::Decimal;
use tally_shared::{
    AppError, AppResult,
    types::{BudgetId, CategoryId, MonthPeriod, UserId},
};
use tracing::{debug, info};

use super::repository::BudgetRepository;
use super::types::{
    Budget, BudgetStatusReport, CreateBudgetInput, DEFAULT_ALERT_AT, UpdateBudgetInput,
};
use crate::clock::Clock;
use crate::ownership::ensure_owned;
use crate::user::UserChecker;

/// Budget spend tracker.
pub struct BudgetService {
    budgets: Arc<dyn BudgetRepository>,
    users: Arc<dyn UserChecker>,
    clock: Arc<dyn Clock>,
}

impl BudgetService {
    /// Creates a new budget service.
    pub fn new(
        budgets: Arc<dyn BudgetRepository>,
        users: Arc<dyn UserChecker>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            budgets,
            users,
            clock,
        }
    }

    fn validate_limits(amount: Decimal, alert_at: Decimal) -> AppResult<()> {
        if amount <= Decimal::ZERO {
            return Err(AppError::Validation("budget amount must be positive".into()));
        }
        if alert_at < Decimal::ONE || alert_at > Decimal::ONE_HUNDRED {
            return Err(AppError::Validation(
                "alert threshold must be between 1 and 100".into(),
            ));
        }
        Ok(())
    }

    /// Creates a budget for one category and month.
    pub async fn create_budget(&self, input: CreateBudgetInput) -> AppResult<Budget> {
        let alert_at = input.alert_at.unwrap_or(DEFAULT_ALERT_AT);
        Self::validate_limits(input.amount, alert_at)?;
        self.users.ensure_user_exists(input.user_id).await?;

        if self
            .budgets
            .find_for_period(input.user_id, input.category_id, input.period)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(format!(
                "budget for category {} in {} already exists",
                input.category_id, input.period
            )));
        }

        let now = self.clock.now();
        let budget = self
            .budgets
            .create(Budget {
                id: BudgetId::new(),
                user_id: input.user_id,
                category_id: input.category_id,
                month: input.period.month,
                year: input.period.year,
                amount: input.amount,
                spent: Decimal::ZERO,
                alert_at,
                created_at: now,
                updated_at: now,
            })
            .await?;

        info!(
            budget_id = %budget.id,
            period = %input.period,
            amount = %budget.amount,
            "budget created"
        );
        Ok(budget)
    }

    /// Loads a budget owned by `user_id`.
    pub async fn get_budget(&self, id: BudgetId, user_id: UserId) -> AppResult<Budget> {
        ensure_owned(self.budgets.get_by_id(id).await?, user_id, "budget", id)
    }

    /// Changes the limit and/or the alert threshold.
    pub async fn update_budget(
        &self,
        id: BudgetId,
        user_id: UserId,
        input: UpdateBudgetInput,
    ) -> AppResult<Budget> {
        let budget = self.get_budget(id, user_id).await?;
        let amount = input.amount.unwrap_or(budget.amount);
        let alert_at = input.alert_at.unwrap_or(budget.alert_at);
        Self::validate_limits(amount, alert_at)?;
        self.budgets.update_limits(id, amount, alert_at).await
    }

    /// Deletes a budget.
    pub async fn delete_budget(&self, id: BudgetId, user_id: UserId) -> AppResult<()> {
        self.get_budget(id, user_id).await?;
        self.budgets.delete(id).await
    }

    /// Adds `delta` to the spend of the category's budget for the current
    /// month. Returns `None` without writing when no budget exists, since
    /// spending in unbudgeted categories is allowed and untracked.
    pub async fn update_spent(
        &self,
        category_id: CategoryId,
        user_id: UserId,
        delta: Decimal,
    ) -> AppResult<Option<Budget>> {
        let period = MonthPeriod::of(self.clock.today());
        self.update_spent_in(period, category_id, user_id, delta).await
    }

    /// Adds `delta` to the spend of the category's budget for `period`, if
    /// one exists.
    pub async fn update_spent_in(
        &self,
        period: MonthPeriod,
        category_id: CategoryId,
        user_id: UserId,
        delta: Decimal,
    ) -> AppResult<Option<Budget>> {
        let Some(budget) = self
            .budgets
            .find_for_period(user_id, category_id, period)
            .await?
        else {
            debug!(%category_id, %period, "no budget for category, spend untracked");
            return Ok(None);
        };
        self.budgets.adjust_spent(budget.id, delta).await.map(Some)
    }

    /// Derived status of one budget.
    pub async fn get_budget_status(
        &self,
        id: BudgetId,
        user_id: UserId,
    ) -> AppResult<BudgetStatusReport> {
        Ok(self.get_budget(id, user_id).await?.report())
    }

    /// Derived statuses of all budgets of a month.
    pub async fn list_budget_statuses(
        &self,
        user_id: UserId,
        period: MonthPeriod,
    ) -> AppResult<Vec<BudgetStatusReport>> {
        let budgets = self.budgets.list_for_period(user_id, period).await?;
        Ok(budgets.into_iter().map(Budget::report).collect())
    }
}
