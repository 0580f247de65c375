//! Core business logic for Tally.
//!
//! This crate contains the balance-consistency engines with ZERO web or
//! database dependencies. Persistence is reached only through the repository
//! traits declared next to each domain; `tally-db` implements them.
//!
//! # Modules
//!
//! - `account` - Account ledger: atomic balance deltas and transfers
//! - `transaction` - Plain income/expense orchestration
//! - `budget` - Monthly spend tracking per category
//! - `goal` - Savings goal contributions and withdrawals
//! - `investment` - Investment movements and return calculation
//! - `credit_card` - Invoice lifecycle and available-limit tracking
//! - `recurring` - Next-due computation and materialization
//! - `saga` - Journaled multi-step movements with compensation

pub mod account;
pub mod budget;
pub mod category;
pub mod clock;
pub mod credit_card;
pub mod goal;
pub mod investment;
pub mod recurring;
pub mod saga;
pub mod services;
pub mod transaction;
pub mod user;

mod ownership;

#[cfg(test)]
mod testing;

pub use category::{ContentAddressedCategories, DefaultCategory, DefaultCategoryResolver};
pub use clock::{Clock, FixedClock, SystemClock};
pub use services::{Repositories, Services};
pub use user::UserChecker;
