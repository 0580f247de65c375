//! Persistence contract for recurring definitions.

use async_trait::async_trait;
use chrono::NaiveDate;
use tally_shared::{
    AppResult,
    types::{RecurringTransactionId, UserId},
};

use super::types::RecurringTransaction;

/// Recurring definition storage.
#[async_trait]
pub trait RecurringRepository: Send + Sync {
    /// Inserts a definition.
    async fn create(&self, recurring: RecurringTransaction) -> AppResult<RecurringTransaction>;

    /// Finds a definition by ID.
    async fn get_by_id(
        &self,
        id: RecurringTransactionId,
    ) -> AppResult<Option<RecurringTransaction>>;

    /// Lists a user's definitions.
    async fn list_by_user(&self, user_id: UserId) -> AppResult<Vec<RecurringTransaction>>;

    /// Lists active definitions with `next_due <= today`, oldest due first.
    async fn list_due(&self, today: NaiveDate) -> AppResult<Vec<RecurringTransaction>>;

    /// Records a materialization and moves the schedule forward.
    async fn advance(
        &self,
        id: RecurringTransactionId,
        last_processed: NaiveDate,
        next_due: NaiveDate,
        is_active: bool,
    ) -> AppResult<RecurringTransaction>;

    /// Activates or deactivates a definition.
    async fn set_active(
        &self,
        id: RecurringTransactionId,
        is_active: bool,
    ) -> AppResult<RecurringTransaction>;

    /// Deletes a definition.
    async fn delete(&self, id: RecurringTransactionId) -> AppResult<()>;
}
