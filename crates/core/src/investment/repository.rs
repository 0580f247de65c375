//! Persistence contract for investments.

use async_trait::async_trait;
use rust_decimal::Decimal;
use tally_shared::{
    AppResult,
    types::{InvestmentId, UserId},
};

use super::types::Investment;

/// Investment storage.
#[async_trait]
pub trait InvestmentRepository: Send + Sync {
    /// Inserts an investment.
    async fn create(&self, investment: Investment) -> AppResult<Investment>;

    /// Finds an investment by ID.
    async fn get_by_id(&self, id: InvestmentId) -> AppResult<Option<Investment>>;

    /// Lists a user's investments.
    async fn list_by_user(&self, user_id: UserId) -> AppResult<Vec<Investment>>;

    /// Deletes an investment row.
    async fn delete(&self, id: InvestmentId) -> AppResult<()>;

    /// Applies `current_balance = current_balance + delta` as one atomic
    /// statement that only matches while the result stays non-negative.
    async fn adjust_balance(&self, id: InvestmentId, delta: Decimal) -> AppResult<Investment>;

    /// Persists freshly computed return figures.
    async fn set_returns(
        &self,
        id: InvestmentId,
        return_balance: Decimal,
        return_rate: Decimal,
    ) -> AppResult<Investment>;
}
