//! Transaction log repository.

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use tally_core::transaction::{self, Transaction};
use tally_shared::{
    AppResult,
    types::{AccountId, CategoryId, InvestmentId, TransactionId, UserId},
};

use super::utc;
use crate::entities::transactions;
use crate::error::db_err;

impl From<transactions::Model> for Transaction {
    fn from(model: transactions::Model) -> Self {
        Self {
            id: TransactionId::from_uuid(model.id),
            user_id: UserId::from_uuid(model.user_id),
            account_id: AccountId::from_uuid(model.account_id),
            transaction_type: model.transaction_type.into(),
            category_id: CategoryId::from_uuid(model.category_id),
            investment_id: model.investment_id.map(InvestmentId::from_uuid),
            amount: model.amount,
            date: model.date,
            description: model.description,
            created_at: utc(model.created_at),
        }
    }
}

impl From<Transaction> for transactions::ActiveModel {
    fn from(transaction: Transaction) -> Self {
        Self {
            id: Set(transaction.id.into_inner()),
            user_id: Set(transaction.user_id.into_inner()),
            account_id: Set(transaction.account_id.into_inner()),
            transaction_type: Set(transaction.transaction_type.into()),
            category_id: Set(transaction.category_id.into_inner()),
            investment_id: Set(transaction.investment_id.map(InvestmentId::into_inner)),
            amount: Set(transaction.amount),
            date: Set(transaction.date),
            description: Set(transaction.description),
            created_at: Set(transaction.created_at.into()),
        }
    }
}

/// Transaction repository backed by the `transactions` table.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    db: DatabaseConnection,
}

impl TransactionRepository {
    /// Creates a new transaction repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl transaction::TransactionRepository for TransactionRepository {
    async fn create(&self, transaction: Transaction) -> AppResult<Transaction> {
        let model = transactions::ActiveModel::from(transaction)
            .insert(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.into())
    }

    async fn get_by_id(&self, id: TransactionId) -> AppResult<Option<Transaction>> {
        let model = transactions::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(Into::into))
    }

    async fn list_by_user(&self, user_id: UserId) -> AppResult<Vec<Transaction>> {
        let models = transactions::Entity::find()
            .filter(transactions::Column::UserId.eq(user_id.into_inner()))
            .order_by_desc(transactions::Column::Date)
            .order_by_desc(transactions::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn list_by_investment(&self, investment_id: InvestmentId) -> AppResult<Vec<Transaction>> {
        let models = transactions::Entity::find()
            .filter(transactions::Column::InvestmentId.eq(investment_id.into_inner()))
            .order_by_asc(transactions::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn delete(&self, id: TransactionId) -> AppResult<()> {
        transactions::Entity::delete_by_id(id.into_inner())
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn delete_by_investment(&self, investment_id: InvestmentId) -> AppResult<u64> {
        let result = transactions::Entity::delete_many()
            .filter(transactions::Column::InvestmentId.eq(investment_id.into_inner()))
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected)
    }
}
