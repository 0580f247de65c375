//! Persistence contracts for goals and their contributions.

use async_trait::async_trait;
use rust_decimal::Decimal;
use tally_shared::{
    AppResult,
    types::{ContributionId, GoalId, UserId},
};

use super::types::{Contribution, Goal, GoalTransition};

/// Goal storage.
#[async_trait]
pub trait GoalRepository: Send + Sync {
    /// Inserts a goal.
    async fn create(&self, goal: Goal) -> AppResult<Goal>;

    /// Finds a goal by ID.
    async fn get_by_id(&self, id: GoalId) -> AppResult<Option<Goal>>;

    /// Lists a user's goals.
    async fn list_by_user(&self, user_id: UserId) -> AppResult<Vec<Goal>>;

    /// Deletes a goal and its contributions.
    async fn delete(&self, id: GoalId) -> AppResult<()>;

    /// Applies `current_amount = current_amount + delta` as one atomic
    /// statement that only matches while the result stays non-negative.
    async fn adjust_current_amount(&self, id: GoalId, delta: Decimal) -> AppResult<Goal>;

    /// Persists a status transition. The update only matches while the goal
    /// is still in the transition's source status and its amounts still call
    /// for it; `None` means the transition no longer applies.
    async fn apply_transition(
        &self,
        id: GoalId,
        transition: GoalTransition,
    ) -> AppResult<Option<Goal>>;
}

/// Contribution storage.
#[async_trait]
pub trait ContributionRepository: Send + Sync {
    /// Inserts a contribution record.
    async fn create(&self, contribution: Contribution) -> AppResult<Contribution>;

    /// Deletes a contribution record.
    async fn delete(&self, id: ContributionId) -> AppResult<()>;

    /// Lists a goal's contributions, oldest first.
    async fn list_by_goal(&self, goal_id: GoalId) -> AppResult<Vec<Contribution>>;
}
