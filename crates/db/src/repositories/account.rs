//! Account repository: guarded balance deltas and atomic transfers.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait, sea_query::Expr,
};
use tally_core::account::{self, Account};
use tally_shared::{
    AppError, AppResult,
    types::{AccountId, UserId},
};

use super::{not_found, utc};
use crate::entities::{accounts, sea_orm_active_enums::AccountType};
use crate::error::db_err;

impl From<accounts::Model> for Account {
    fn from(model: accounts::Model) -> Self {
        Self {
            id: AccountId::from_uuid(model.id),
            user_id: UserId::from_uuid(model.user_id),
            name: model.name,
            account_type: model.account_type.into(),
            balance: model.balance,
            include_in_total: model.include_in_total,
            is_active: model.is_active,
            created_at: utc(model.created_at),
            updated_at: utc(model.updated_at),
        }
    }
}

impl From<Account> for accounts::ActiveModel {
    fn from(account: Account) -> Self {
        Self {
            id: Set(account.id.into_inner()),
            user_id: Set(account.user_id.into_inner()),
            name: Set(account.name),
            account_type: Set(account.account_type.into()),
            balance: Set(account.balance),
            include_in_total: Set(account.include_in_total),
            is_active: Set(account.is_active),
            created_at: Set(account.created_at.into()),
            updated_at: Set(account.updated_at.into()),
        }
    }
}

/// Applies `delta` unless it would take a non-card account below zero.
///
/// Returns `None` when the guard rejected the change or the row is missing.
async fn apply_delta<C: ConnectionTrait>(
    conn: &C,
    id: AccountId,
    delta: Decimal,
) -> Result<Option<accounts::Model>, DbErr> {
    let updated = accounts::Entity::update_many()
        .col_expr(
            accounts::Column::Balance,
            Expr::col(accounts::Column::Balance).add(delta),
        )
        .filter(accounts::Column::Id.eq(id.into_inner()))
        .filter(
            Condition::any()
                .add(accounts::Column::AccountType.eq(AccountType::CreditCard))
                .add(accounts::Column::Balance.gte(-delta)),
        )
        .exec_with_returning(conn)
        .await?;
    Ok(updated.into_iter().next())
}

/// Account repository backed by the `accounts` table.
#[derive(Debug, Clone)]
pub struct AccountRepository {
    db: DatabaseConnection,
}

impl AccountRepository {
    /// Creates a new account repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Explains why a guarded update touched no row.
    async fn rejected(&self, id: AccountId) -> AppError {
        match accounts::Entity::find_by_id(id.into_inner()).one(&self.db).await {
            Ok(Some(_)) => AppError::insufficient_funds(format!("account {id}")),
            Ok(None) => not_found("account", id),
            Err(err) => db_err(err),
        }
    }
}

#[async_trait]
impl account::AccountRepository for AccountRepository {
    async fn create(&self, account: Account) -> AppResult<Account> {
        let model = accounts::ActiveModel::from(account)
            .insert(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.into())
    }

    async fn get_by_id(&self, id: AccountId) -> AppResult<Option<Account>> {
        let model = accounts::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(Into::into))
    }

    async fn list_by_user(&self, user_id: UserId) -> AppResult<Vec<Account>> {
        let models = accounts::Entity::find()
            .filter(accounts::Column::UserId.eq(user_id.into_inner()))
            .order_by_asc(accounts::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn delete(&self, id: AccountId) -> AppResult<()> {
        accounts::Entity::delete_by_id(id.into_inner())
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn adjust_balance(&self, id: AccountId, delta: Decimal) -> AppResult<Account> {
        match apply_delta(&self.db, id, delta).await.map_err(db_err)? {
            Some(model) => Ok(model.into()),
            None => Err(self.rejected(id).await),
        }
    }

    async fn transfer(
        &self,
        from: AccountId,
        to: AccountId,
        amount: Decimal,
    ) -> AppResult<(Account, Account)> {
        // Rows are locked in id order so opposite transfers cannot deadlock.
        let legs = if from.into_inner() < to.into_inner() {
            [(from, -amount), (to, amount)]
        } else {
            [(to, amount), (from, -amount)]
        };

        let txn = self.db.begin().await.map_err(db_err)?;
        let mut updated = Vec::with_capacity(legs.len());
        for (id, delta) in legs {
            match apply_delta(&txn, id, delta).await.map_err(db_err)? {
                Some(model) => updated.push(model),
                None => {
                    txn.rollback().await.map_err(db_err)?;
                    return Err(self.rejected(id).await);
                }
            }
        }
        txn.commit().await.map_err(db_err)?;

        let (source, destination): (Vec<_>, Vec<_>) = updated
            .into_iter()
            .partition(|model| model.id == from.into_inner());
        match (source.into_iter().next(), destination.into_iter().next()) {
            (Some(source), Some(destination)) => Ok((source.into(), destination.into())),
            _ => Err(AppError::Internal(format!(
                "transfer {from} -> {to} did not return both accounts"
            ))),
        }
    }
}
