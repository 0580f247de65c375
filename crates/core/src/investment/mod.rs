//! Investments: moving money from accounts into investments and back, with
//! an auditable transaction leg per movement.

pub mod repository;
pub mod returns;
pub mod service;
pub mod types;

pub use repository::InvestmentRepository;
pub use returns::{ReturnSummary, calculate_return};
pub use service::InvestmentService;
pub use types::{CreateInvestmentInput, Investment, InvestmentMovement, InvestmentType};
