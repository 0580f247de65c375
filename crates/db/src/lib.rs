//! Database layer with `SeaORM` entities and repositories.
//!
//! This crate provides:
//! - `SeaORM` entity definitions
//! - Postgres implementations of the `tally-core` repository traits
//! - Database migrations

pub mod entities;
pub mod migration;
pub mod repositories;

mod error;

pub use repositories::{
    AccountRepository, BudgetRepository, CardTransactionRepository, ContributionRepository,
    CreditCardRepository, GoalRepository, InvestmentRepository, InvoiceRepository,
    MovementJournalRepository, RecurringRepository, TransactionRepository, UserRepository,
};

use std::sync::Arc;
use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use tally_core::{ContentAddressedCategories, Repositories, Services, SystemClock};
use tally_shared::config::DatabaseConfig;

/// Establishes a pooled connection to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(Duration::from_secs(10))
        .sqlx_logging(false);
    Database::connect(options).await
}

/// Postgres-backed repository set for the engines.
#[must_use]
pub fn repositories(db: &DatabaseConnection) -> Repositories {
    Repositories {
        accounts: Arc::new(AccountRepository::new(db.clone())),
        transactions: Arc::new(TransactionRepository::new(db.clone())),
        budgets: Arc::new(BudgetRepository::new(db.clone())),
        goals: Arc::new(GoalRepository::new(db.clone())),
        contributions: Arc::new(ContributionRepository::new(db.clone())),
        investments: Arc::new(InvestmentRepository::new(db.clone())),
        credit_cards: Arc::new(CreditCardRepository::new(db.clone())),
        invoices: Arc::new(InvoiceRepository::new(db.clone())),
        card_transactions: Arc::new(CardTransactionRepository::new(db.clone())),
        recurring: Arc::new(RecurringRepository::new(db.clone())),
        journal: Arc::new(MovementJournalRepository::new(db.clone())),
        users: Arc::new(UserRepository::new(db.clone())),
    }
}

/// Engines wired over Postgres with the system clock and content-addressed
/// default categories.
#[must_use]
pub fn services(db: &DatabaseConnection) -> Services {
    Services::new(
        &repositories(db),
        Arc::new(SystemClock),
        Arc::new(ContentAddressedCategories),
    )
}
