//! Persistence contract for budgets.

use async_trait::async_trait;
use rust_decimal::Decimal;
use tally_shared::{
    AppResult,
    types::{BudgetId, CategoryId, MonthPeriod, UserId},
};

use super::types::Budget;

/// Budget storage.
#[async_trait]
pub trait BudgetRepository: Send + Sync {
    /// Inserts a budget. A second budget for the same
    /// `(user, category, month, year)` fails with `Conflict`.
    async fn create(&self, budget: Budget) -> AppResult<Budget>;

    /// Finds a budget by ID.
    async fn get_by_id(&self, id: BudgetId) -> AppResult<Option<Budget>>;

    /// Finds the budget of a category for one month.
    async fn find_for_period(
        &self,
        user_id: UserId,
        category_id: CategoryId,
        period: MonthPeriod,
    ) -> AppResult<Option<Budget>>;

    /// Lists a user's budgets for one month.
    async fn list_for_period(&self, user_id: UserId, period: MonthPeriod) -> AppResult<Vec<Budget>>;

    /// Persists `amount` and `alert_at` of an existing budget.
    async fn update_limits(
        &self,
        id: BudgetId,
        amount: Decimal,
        alert_at: Decimal,
    ) -> AppResult<Budget>;

    /// Deletes a budget.
    async fn delete(&self, id: BudgetId) -> AppResult<()>;

    /// Applies `spent = spent + delta` as one atomic statement.
    async fn adjust_spent(&self, id: BudgetId, delta: Decimal) -> AppResult<Budget>;
}
