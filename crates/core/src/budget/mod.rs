//! Monthly spend tracking per category.

pub mod repository;
pub mod service;
pub mod types;


pub use repository::BudgetRepository;
pub use service::BudgetService;
pub use types::{
    Budget, BudgetStatus, BudgetStatusReport, CreateBudgetInput, DEFAULT_ALERT_AT,
    UpdateBudgetInput,
};
