//! Recurring definition repository.

use async_trait::async_trait;
use chrono::{NaiveDate, Weekday};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    sea_query::Expr,
};
use tally_core::recurring::{self, RecurringTransaction};
use tally_shared::{
    AppResult,
    types::{AccountId, CategoryId, RecurringTransactionId, UserId},
};

use super::{not_found, utc};
use crate::entities::recurring_transactions;
use crate::error::db_err;

/// Stored weekday, counting from Sunday = 0.
const fn weekday_to_db(day: Weekday) -> i16 {
    match day {
        Weekday::Sun => 0,
        Weekday::Mon => 1,
        Weekday::Tue => 2,
        Weekday::Wed => 3,
        Weekday::Thu => 4,
        Weekday::Fri => 5,
        Weekday::Sat => 6,
    }
}

const fn weekday_from_db(value: i16) -> Option<Weekday> {
    match value {
        0 => Some(Weekday::Sun),
        1 => Some(Weekday::Mon),
        2 => Some(Weekday::Tue),
        3 => Some(Weekday::Wed),
        4 => Some(Weekday::Thu),
        5 => Some(Weekday::Fri),
        6 => Some(Weekday::Sat),
        _ => None,
    }
}

impl From<recurring_transactions::Model> for RecurringTransaction {
    fn from(model: recurring_transactions::Model) -> Self {
        Self {
            id: RecurringTransactionId::from_uuid(model.id),
            user_id: UserId::from_uuid(model.user_id),
            account_id: AccountId::from_uuid(model.account_id),
            transaction_type: model.transaction_type.into(),
            category_id: CategoryId::from_uuid(model.category_id),
            amount: model.amount,
            description: model.description,
            frequency: model.frequency.into(),
            day_of_month: model.day_of_month.map(i32::unsigned_abs),
            day_of_week: model.day_of_week.and_then(weekday_from_db),
            start_date: model.start_date,
            end_date: model.end_date,
            last_processed: model.last_processed,
            next_due: model.next_due,
            is_active: model.is_active,
            created_at: utc(model.created_at),
            updated_at: utc(model.updated_at),
        }
    }
}

impl From<RecurringTransaction> for recurring_transactions::ActiveModel {
    fn from(recurring: RecurringTransaction) -> Self {
        Self {
            id: Set(recurring.id.into_inner()),
            user_id: Set(recurring.user_id.into_inner()),
            account_id: Set(recurring.account_id.into_inner()),
            transaction_type: Set(recurring.transaction_type.into()),
            category_id: Set(recurring.category_id.into_inner()),
            amount: Set(recurring.amount),
            description: Set(recurring.description),
            frequency: Set(recurring.frequency.into()),
            day_of_month: Set(recurring.day_of_month.map(u32::cast_signed)),
            day_of_week: Set(recurring.day_of_week.map(weekday_to_db)),
            start_date: Set(recurring.start_date),
            end_date: Set(recurring.end_date),
            last_processed: Set(recurring.last_processed),
            next_due: Set(recurring.next_due),
            is_active: Set(recurring.is_active),
            created_at: Set(recurring.created_at.into()),
            updated_at: Set(recurring.updated_at.into()),
        }
    }
}

/// Recurring repository backed by the `recurring_transactions` table.
#[derive(Debug, Clone)]
pub struct RecurringRepository {
    db: DatabaseConnection,
}

impl RecurringRepository {
    /// Creates a new recurring repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl recurring::RecurringRepository for RecurringRepository {
    async fn create(&self, recurring: RecurringTransaction) -> AppResult<RecurringTransaction> {
        let model = recurring_transactions::ActiveModel::from(recurring)
            .insert(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.into())
    }

    async fn get_by_id(
        &self,
        id: RecurringTransactionId,
    ) -> AppResult<Option<RecurringTransaction>> {
        let model = recurring_transactions::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(Into::into))
    }

    async fn list_by_user(&self, user_id: UserId) -> AppResult<Vec<RecurringTransaction>> {
        let models = recurring_transactions::Entity::find()
            .filter(recurring_transactions::Column::UserId.eq(user_id.into_inner()))
            .order_by_asc(recurring_transactions::Column::NextDue)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn list_due(&self, today: NaiveDate) -> AppResult<Vec<RecurringTransaction>> {
        let models = recurring_transactions::Entity::find()
            .filter(recurring_transactions::Column::IsActive.eq(true))
            .filter(recurring_transactions::Column::NextDue.lte(today))
            .order_by_asc(recurring_transactions::Column::NextDue)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn advance(
        &self,
        id: RecurringTransactionId,
        last_processed: NaiveDate,
        next_due: NaiveDate,
        is_active: bool,
    ) -> AppResult<RecurringTransaction> {
        let updated = recurring_transactions::Entity::update_many()
            .col_expr(
                recurring_transactions::Column::LastProcessed,
                Expr::value(last_processed),
            )
            .col_expr(recurring_transactions::Column::NextDue, Expr::value(next_due))
            .col_expr(recurring_transactions::Column::IsActive, Expr::value(is_active))
            .filter(recurring_transactions::Column::Id.eq(id.into_inner()))
            .exec_with_returning(&self.db)
            .await
            .map_err(db_err)?;
        updated
            .into_iter()
            .next()
            .map(Into::into)
            .ok_or_else(|| not_found("recurring transaction", id))
    }

    async fn set_active(
        &self,
        id: RecurringTransactionId,
        is_active: bool,
    ) -> AppResult<RecurringTransaction> {
        let updated = recurring_transactions::Entity::update_many()
            .col_expr(recurring_transactions::Column::IsActive, Expr::value(is_active))
            .filter(recurring_transactions::Column::Id.eq(id.into_inner()))
            .exec_with_returning(&self.db)
            .await
            .map_err(db_err)?;
        updated
            .into_iter()
            .next()
            .map(Into::into)
            .ok_or_else(|| not_found("recurring transaction", id))
    }

    async fn delete(&self, id: RecurringTransactionId) -> AppResult<()> {
        recurring_transactions::Entity::delete_by_id(id.into_inner())
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weekday_round_trips_from_sunday() {
        for day in [
            Weekday::Sun,
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
            Weekday::Sat,
        ] {
            assert_eq!(weekday_from_db(weekday_to_db(day)), Some(day));
        }
        assert_eq!(weekday_to_db(Weekday::Sun), 0);
        assert_eq!(weekday_from_db(7), None);
    }
}
