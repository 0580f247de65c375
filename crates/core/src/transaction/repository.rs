//! Persistence contract for the transaction log.

use async_trait::async_trait;
use tally_shared::{
    AppResult,
    types::{InvestmentId, TransactionId, UserId},
};

use super::types::Transaction;

/// Transaction log storage.
#[async_trait]
pub trait TransactionRepository: Send + Sync {
    /// Inserts a transaction record.
    async fn create(&self, transaction: Transaction) -> AppResult<Transaction>;

    /// Finds a transaction by ID.
    async fn get_by_id(&self, id: TransactionId) -> AppResult<Option<Transaction>>;

    /// Lists a user's transactions, newest date first.
    async fn list_by_user(&self, user_id: UserId) -> AppResult<Vec<Transaction>>;

    /// Lists the legs linked to an investment.
    async fn list_by_investment(&self, investment_id: InvestmentId) -> AppResult<Vec<Transaction>>;

    /// Deletes a transaction record.
    async fn delete(&self, id: TransactionId) -> AppResult<()>;

    /// Deletes every leg linked to an investment, returning how many were removed.
    async fn delete_by_investment(&self, investment_id: InvestmentId) -> AppResult<u64>;
}
