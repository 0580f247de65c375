//! Investment repository.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    sea_query::Expr,
};
use tally_core::investment::{self, Investment};
use tally_shared::{
    AppError, AppResult,
    types::{InvestmentId, UserId},
};

use super::{not_found, utc};
use crate::entities::investments;
use crate::error::db_err;

impl From<investments::Model> for Investment {
    fn from(model: investments::Model) -> Self {
        Self {
            id: InvestmentId::from_uuid(model.id),
            user_id: UserId::from_uuid(model.user_id),
            name: model.name,
            investment_type: model.investment_type.into(),
            current_balance: model.current_balance,
            return_balance: model.return_balance,
            return_rate: model.return_rate,
            created_at: utc(model.created_at),
            updated_at: utc(model.updated_at),
        }
    }
}

impl From<Investment> for investments::ActiveModel {
    fn from(investment: Investment) -> Self {
        Self {
            id: Set(investment.id.into_inner()),
            user_id: Set(investment.user_id.into_inner()),
            name: Set(investment.name),
            investment_type: Set(investment.investment_type.into()),
            current_balance: Set(investment.current_balance),
            return_balance: Set(investment.return_balance),
            return_rate: Set(investment.return_rate),
            created_at: Set(investment.created_at.into()),
            updated_at: Set(investment.updated_at.into()),
        }
    }
}

/// Investment repository backed by the `investments` table.
#[derive(Debug, Clone)]
pub struct InvestmentRepository {
    db: DatabaseConnection,
}

impl InvestmentRepository {
    /// Creates a new investment repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn find(&self, id: InvestmentId) -> AppResult<Option<investments::Model>> {
        investments::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(db_err)
    }
}

#[async_trait]
impl investment::InvestmentRepository for InvestmentRepository {
    async fn create(&self, investment: Investment) -> AppResult<Investment> {
        let model = investments::ActiveModel::from(investment)
            .insert(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.into())
    }

    async fn get_by_id(&self, id: InvestmentId) -> AppResult<Option<Investment>> {
        Ok(self.find(id).await?.map(Into::into))
    }

    async fn list_by_user(&self, user_id: UserId) -> AppResult<Vec<Investment>> {
        let models = investments::Entity::find()
            .filter(investments::Column::UserId.eq(user_id.into_inner()))
            .order_by_asc(investments::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn delete(&self, id: InvestmentId) -> AppResult<()> {
        investments::Entity::delete_by_id(id.into_inner())
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn adjust_balance(&self, id: InvestmentId, delta: Decimal) -> AppResult<Investment> {
        let updated = investments::Entity::update_many()
            .col_expr(
                investments::Column::CurrentBalance,
                Expr::col(investments::Column::CurrentBalance).add(delta),
            )
            .filter(investments::Column::Id.eq(id.into_inner()))
            .filter(investments::Column::CurrentBalance.gte(-delta))
            .exec_with_returning(&self.db)
            .await
            .map_err(db_err)?;
        if let Some(model) = updated.into_iter().next() {
            return Ok(model.into());
        }
        match self.find(id).await? {
            Some(_) => Err(AppError::insufficient_funds(format!("investment {id}"))),
            None => Err(not_found("investment", id)),
        }
    }

    async fn set_returns(
        &self,
        id: InvestmentId,
        return_balance: Decimal,
        return_rate: Decimal,
    ) -> AppResult<Investment> {
        let updated = investments::Entity::update_many()
            .col_expr(investments::Column::ReturnBalance, Expr::value(return_balance))
            .col_expr(investments::Column::ReturnRate, Expr::value(return_rate))
            .filter(investments::Column::Id.eq(id.into_inner()))
            .exec_with_returning(&self.db)
            .await
            .map_err(db_err)?;
        updated
            .into_iter()
            .next()
            .map(Into::into)
            .ok_or_else(|| not_found("investment", id))
    }
}
