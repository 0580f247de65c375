//! User existence check provided by the user collaborator.

use async_trait::async_trait;
use tally_shared::{AppResult, types::UserId};

/// Capability to confirm that a user exists before creating data for it.
#[async_trait]
pub trait UserChecker: Send + Sync {
    /// Returns `NotFound` when the user does not exist.
    async fn ensure_user_exists(&self, user_id: UserId) -> AppResult<()>;
}
