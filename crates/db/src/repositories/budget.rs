//! Budget repository.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    sea_query::Expr,
};
use tally_core::budget::{self, Budget};
use tally_shared::{
    AppResult,
    types::{BudgetId, CategoryId, MonthPeriod, UserId},
};

use super::{not_found, utc};
use crate::entities::budgets;
use crate::error::db_err;

impl From<budgets::Model> for Budget {
    fn from(model: budgets::Model) -> Self {
        Self {
            id: BudgetId::from_uuid(model.id),
            user_id: UserId::from_uuid(model.user_id),
            category_id: CategoryId::from_uuid(model.category_id),
            month: model.month.unsigned_abs(),
            year: model.year,
            amount: model.amount,
            spent: model.spent,
            alert_at: model.alert_at,
            created_at: utc(model.created_at),
            updated_at: utc(model.updated_at),
        }
    }
}

impl From<Budget> for budgets::ActiveModel {
    fn from(budget: Budget) -> Self {
        Self {
            id: Set(budget.id.into_inner()),
            user_id: Set(budget.user_id.into_inner()),
            category_id: Set(budget.category_id.into_inner()),
            month: Set(budget.month.cast_signed()),
            year: Set(budget.year),
            amount: Set(budget.amount),
            spent: Set(budget.spent),
            alert_at: Set(budget.alert_at),
            created_at: Set(budget.created_at.into()),
            updated_at: Set(budget.updated_at.into()),
        }
    }
}

/// Budget repository backed by the `budgets` table.
#[derive(Debug, Clone)]
pub struct BudgetRepository {
    db: DatabaseConnection,
}

impl BudgetRepository {
    /// Creates a new budget repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl budget::BudgetRepository for BudgetRepository {
    async fn create(&self, budget: Budget) -> AppResult<Budget> {
        // uq_budgets_period surfaces as Conflict
        let model = budgets::ActiveModel::from(budget)
            .insert(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.into())
    }

    async fn get_by_id(&self, id: BudgetId) -> AppResult<Option<Budget>> {
        let model = budgets::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(Into::into))
    }

    async fn find_for_period(
        &self,
        user_id: UserId,
        category_id: CategoryId,
        period: MonthPeriod,
    ) -> AppResult<Option<Budget>> {
        let model = budgets::Entity::find()
            .filter(budgets::Column::UserId.eq(user_id.into_inner()))
            .filter(budgets::Column::CategoryId.eq(category_id.into_inner()))
            .filter(budgets::Column::Month.eq(period.month.cast_signed()))
            .filter(budgets::Column::Year.eq(period.year))
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(Into::into))
    }

    async fn list_for_period(
        &self,
        user_id: UserId,
        period: MonthPeriod,
    ) -> AppResult<Vec<Budget>> {
        let models = budgets::Entity::find()
            .filter(budgets::Column::UserId.eq(user_id.into_inner()))
            .filter(budgets::Column::Month.eq(period.month.cast_signed()))
            .filter(budgets::Column::Year.eq(period.year))
            .order_by_asc(budgets::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn update_limits(
        &self,
        id: BudgetId,
        amount: Decimal,
        alert_at: Decimal,
    ) -> AppResult<Budget> {
        let updated = budgets::Entity::update_many()
            .col_expr(budgets::Column::Amount, Expr::value(amount))
            .col_expr(budgets::Column::AlertAt, Expr::value(alert_at))
            .filter(budgets::Column::Id.eq(id.into_inner()))
            .exec_with_returning(&self.db)
            .await
            .map_err(db_err)?;
        updated
            .into_iter()
            .next()
            .map(Into::into)
            .ok_or_else(|| not_found("budget", id))
    }

    async fn delete(&self, id: BudgetId) -> AppResult<()> {
        budgets::Entity::delete_by_id(id.into_inner())
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn adjust_spent(&self, id: BudgetId, delta: Decimal) -> AppResult<Budget> {
        // spent may go above the limit; only existence is checked
        let updated = budgets::Entity::update_many()
            .col_expr(
                budgets::Column::Spent,
                Expr::col(budgets::Column::Spent).add(delta),
            )
            .filter(budgets::Column::Id.eq(id.into_inner()))
            .exec_with_returning(&self.db)
            .await
            .map_err(db_err)?;
        updated
            .into_iter()
            .next()
            .map(Into::into)
            .ok_or_else(|| not_found("budget", id))
    }
}
