//! Mapping from `SeaORM` errors to application errors.

use sea_orm::{DbErr, SqlErr};
use tally_shared::AppError;

/// Converts a database error, surfacing constraint violations as conflicts.
pub(crate) fn db_err(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => AppError::Conflict(detail),
        Some(SqlErr::ForeignKeyConstraintViolation(detail)) => {
            AppError::Conflict(format!("record is still referenced: {detail}"))
        }
        _ => AppError::database(err),
    }
}
