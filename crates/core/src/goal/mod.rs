//! Savings goals: moving money from accounts into goals and back.

pub mod error;
pub mod repository;
pub mod service;
pub mod types;

pub use error::GoalError;
pub use repository::{ContributionRepository, GoalRepository};
pub use service::GoalService;
pub use types::{
    Contribution, ContributionType, CreateGoalInput, Goal, GoalMovement, GoalStatus,
    GoalTransition,
};
