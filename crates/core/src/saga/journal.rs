//! Persistence contract for movement intents.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tally_shared::{AppResult, types::MovementId};

use super::types::{Compensation, MovementIntent, MovementStatus};

/// Write-ahead journal of multi-step movements.
#[async_trait]
pub trait MovementJournal: Send + Sync {
    /// Persists a new `PENDING` intent.
    async fn create(&self, intent: MovementIntent) -> AppResult<MovementIntent>;

    /// Finds an intent by ID.
    async fn get_by_id(&self, id: MovementId) -> AppResult<Option<MovementIntent>>;

    /// Records the step about to run, or clears it.
    async fn mark_step(&self, id: MovementId, step: Option<String>) -> AppResult<()>;

    /// Appends the inverse of a completed step and clears the in-flight step.
    async fn record_compensation(
        &self,
        id: MovementId,
        compensation: Compensation,
    ) -> AppResult<()>;

    /// Drops the compensation at `index` once it has been applied and clears
    /// the in-flight step. An index past the end only clears the step.
    async fn discard_compensation(&self, id: MovementId, index: usize) -> AppResult<()>;

    /// Closes an intent.
    async fn finish(
        &self,
        id: MovementId,
        status: MovementStatus,
        error: Option<String>,
    ) -> AppResult<()>;

    /// Lists `PENDING` intents created before `started_before`.
    async fn list_pending(&self, started_before: DateTime<Utc>) -> AppResult<Vec<MovementIntent>>;
}
