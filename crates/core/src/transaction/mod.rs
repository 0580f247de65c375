//! Transaction log and the plain income/expense orchestration.
//!
//! Every balance-affecting movement leaves an immutable [`Transaction`]
//! record. The sign of its effect on the account is derived from the type.

pub mod repository;
pub mod service;
pub mod types;

pub use repository::TransactionRepository;
pub use service::TransactionService;
pub use types::{CreateTransactionInput, Transaction, TransactionType, total_invested};
