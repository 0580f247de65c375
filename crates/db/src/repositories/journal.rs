//! Movement journal repository.
//!
//! Compensations live in a JSONB array so another process can undo an
//! interrupted movement without the code that started it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbBackend, EntityTrait,
    QueryFilter, QueryOrder, Set, Statement, prelude::DateTimeWithTimeZone, sea_query::Expr,
};
use tally_core::saga::{Compensation, MovementIntent, MovementJournal, MovementStatus};
use tally_shared::{
    AppError, AppResult,
    types::{MovementId, UserId},
};
use tracing::warn;

use super::{enum_value, not_found, utc};
use crate::entities::{movement_intents, sea_orm_active_enums};
use crate::error::db_err;

const APPEND_COMPENSATION_SQL: &str = r"
UPDATE movement_intents
SET compensations = compensations || $1::jsonb,
    in_flight_step = NULL
WHERE id = $2
";

const DISCARD_COMPENSATION_SQL: &str = r"
UPDATE movement_intents
SET compensations = compensations - $1::int,
    in_flight_step = NULL
WHERE id = $2
";

fn to_json<T: serde::Serialize>(value: &T) -> AppResult<serde_json::Value> {
    serde_json::to_value(value)
        .map_err(|e| AppError::Internal(format!("cannot encode compensation: {e}")))
}

impl TryFrom<movement_intents::Model> for MovementIntent {
    type Error = AppError;

    fn try_from(model: movement_intents::Model) -> AppResult<Self> {
        let compensations: Vec<Compensation> = serde_json::from_value(model.compensations)
            .map_err(|e| {
                AppError::Internal(format!(
                    "movement {} has unreadable compensations: {e}",
                    model.id
                ))
            })?;
        Ok(Self {
            id: MovementId::from_uuid(model.id),
            user_id: UserId::from_uuid(model.user_id),
            kind: model.kind.into(),
            status: model.status.into(),
            in_flight_step: model.in_flight_step,
            compensations,
            error: model.error,
            created_at: utc(model.created_at),
            updated_at: utc(model.updated_at),
        })
    }
}

/// Movement journal backed by the `movement_intents` table.
#[derive(Debug, Clone)]
pub struct MovementJournalRepository {
    db: DatabaseConnection,
}

impl MovementJournalRepository {
    /// Creates a new movement journal repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl MovementJournal for MovementJournalRepository {
    async fn create(&self, intent: MovementIntent) -> AppResult<MovementIntent> {
        let created_at: DateTimeWithTimeZone = intent.created_at.into();
        let model = movement_intents::ActiveModel {
            id: Set(intent.id.into_inner()),
            user_id: Set(intent.user_id.into_inner()),
            kind: Set(intent.kind.into()),
            status: Set(intent.status.into()),
            in_flight_step: Set(intent.in_flight_step),
            compensations: Set(to_json(&intent.compensations)?),
            error: Set(intent.error),
            created_at: Set(created_at),
            updated_at: Set(intent.updated_at.into()),
        }
        .insert(&self.db)
        .await
        .map_err(db_err)?;
        MovementIntent::try_from(model)
    }

    async fn get_by_id(&self, id: MovementId) -> AppResult<Option<MovementIntent>> {
        movement_intents::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(MovementIntent::try_from)
            .transpose()
    }

    async fn mark_step(&self, id: MovementId, step: Option<String>) -> AppResult<()> {
        let result = movement_intents::Entity::update_many()
            .col_expr(movement_intents::Column::InFlightStep, Expr::value(step))
            .filter(movement_intents::Column::Id.eq(id.into_inner()))
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        if result.rows_affected == 0 {
            return Err(not_found("movement", id));
        }
        Ok(())
    }

    async fn record_compensation(
        &self,
        id: MovementId,
        compensation: Compensation,
    ) -> AppResult<()> {
        let entry = to_json(&[compensation])?;
        let result = self
            .db
            .execute(Statement::from_sql_and_values(
                DbBackend::Postgres,
                APPEND_COMPENSATION_SQL,
                [entry.into(), id.into_inner().into()],
            ))
            .await
            .map_err(db_err)?;
        if result.rows_affected() == 0 {
            return Err(not_found("movement", id));
        }
        Ok(())
    }

    async fn discard_compensation(&self, id: MovementId, index: usize) -> AppResult<()> {
        let index = i32::try_from(index)
            .map_err(|_| AppError::Internal(format!("compensation index {index} out of range")))?;
        let result = self
            .db
            .execute(Statement::from_sql_and_values(
                DbBackend::Postgres,
                DISCARD_COMPENSATION_SQL,
                [index.into(), id.into_inner().into()],
            ))
            .await
            .map_err(db_err)?;
        if result.rows_affected() == 0 {
            return Err(not_found("movement", id));
        }
        Ok(())
    }

    async fn finish(
        &self,
        id: MovementId,
        status: MovementStatus,
        error: Option<String>,
    ) -> AppResult<()> {
        let status = sea_orm_active_enums::MovementStatus::from(status);
        let result = movement_intents::Entity::update_many()
            .col_expr(movement_intents::Column::Status, enum_value(&status))
            .col_expr(movement_intents::Column::Error, Expr::value(error))
            .col_expr(
                movement_intents::Column::InFlightStep,
                Expr::value(Option::<String>::None),
            )
            .filter(movement_intents::Column::Id.eq(id.into_inner()))
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        if result.rows_affected == 0 {
            return Err(not_found("movement", id));
        }
        Ok(())
    }

    async fn list_pending(&self, started_before: DateTime<Utc>) -> AppResult<Vec<MovementIntent>> {
        let cutoff: DateTimeWithTimeZone = started_before.into();
        let models = movement_intents::Entity::find()
            .filter(
                movement_intents::Column::Status.eq(sea_orm_active_enums::MovementStatus::Pending),
            )
            .filter(movement_intents::Column::CreatedAt.lt(cutoff))
            .order_by_asc(movement_intents::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(db_err)?;

        // An unreadable entry must not block reconciliation of the rest.
        let mut intents = Vec::with_capacity(models.len());
        for model in models {
            let id = model.id;
            match MovementIntent::try_from(model) {
                Ok(intent) => intents.push(intent),
                Err(err) => warn!(movement_id = %id, error = %err, "skipping unreadable movement"),
            }
        }
        Ok(intents)
    }
}
