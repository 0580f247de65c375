//! Recurring transactions: next-due computation and materialization.
//!
//! Only the computation and the batch are here. Whatever timer invokes the
//! batch lives outside this crate.

pub mod repository;
pub mod schedule;
pub mod service;
pub mod types;

#[cfg(test)]
mod schedule_props;

pub use repository::RecurringRepository;
pub use schedule::{calculate_next_due, first_due};
pub use service::RecurringService;
pub use types::{
    CreateRecurringInput, Frequency, ManualRun, ProcessingReport, RecurringTransaction,
};
