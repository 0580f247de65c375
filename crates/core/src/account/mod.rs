//! Account ledger.
//!
//! Owns `Account::balance`. Every balance change is a signed delta applied by
//! the repository as one guarded atomic statement; transfers run both legs in
//! a single repository transaction.

pub mod repository;
pub mod service;
pub mod types;

pub use repository::AccountRepository;
pub use service::AccountService;
pub use types::{Account, AccountType, CreateAccountInput, Transfer};
