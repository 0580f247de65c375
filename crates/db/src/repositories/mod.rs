//! Postgres implementations of the `tally-core` repository traits.
//!
//! Balance-like columns change only through guarded
//! `UPDATE ... SET col = col + delta WHERE <guard> RETURNING *` statements.
//! An empty result means the guard rejected the change or the row is gone;
//! a follow-up read tells the two apart.

pub mod account;
pub mod budget;
pub mod credit_card;
pub mod goal;
pub mod investment;
pub mod journal;
pub mod recurring;
pub mod transaction;
pub mod user;

pub use account::AccountRepository;
pub use budget::BudgetRepository;
pub use credit_card::{CardTransactionRepository, CreditCardRepository, InvoiceRepository};
pub use goal::{ContributionRepository, GoalRepository};
pub use investment::InvestmentRepository;
pub use journal::MovementJournalRepository;
pub use recurring::RecurringRepository;
pub use transaction::TransactionRepository;
pub use user::UserRepository;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveEnum,
    prelude::DateTimeWithTimeZone,
    sea_query::{Expr, SimpleExpr},
};
use tally_shared::AppError;

pub(crate) fn utc(value: DateTimeWithTimeZone) -> DateTime<Utc> {
    value.with_timezone(&Utc)
}

pub(crate) fn not_found(what: &str, id: impl std::fmt::Display) -> AppError {
    AppError::NotFound(format!("{what} {id}"))
}

/// Enum literal cast to its Postgres type, for use in `SET` expressions.
pub(crate) fn enum_value<E: ActiveEnum<Value = String>>(value: &E) -> SimpleExpr {
    Expr::val(value.to_value()).as_enum(E::name())
}
