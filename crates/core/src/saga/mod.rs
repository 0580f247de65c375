//! Journaled multi-step movements.
//!
//! A movement that touches more than one aggregate runs as a [`Saga`]: the
//! intent is persisted first, every completed step appends the typed
//! [`Compensation`] that undoes it, and a failing step triggers those
//! compensations in reverse order. Intents left `PENDING` by a crashed
//! process are picked up by [`SagaCoordinator::reconcile`].

pub mod compensator;
pub mod journal;
pub mod runner;
pub mod types;

#[cfg(test)]
mod runner_tests;

pub use compensator::Compensator;
pub use journal::MovementJournal;
pub use runner::{ReconcileReport, Saga, SagaCoordinator};
pub use types::{Compensation, MovementIntent, MovementKind, MovementStatus};
