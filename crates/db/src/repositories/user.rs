//! User repository for database operations.

use async_trait::async_trait;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use tally_core::UserChecker;
use tally_shared::{AppResult, types::UserId};

use super::not_found;
use crate::entities::users;
use crate::error::db_err;

/// User repository backed by the `users` table.
#[derive(Debug, Clone)]
pub struct UserRepository {
    db: DatabaseConnection,
}

impl UserRepository {
    /// Creates a new user repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn create(&self, name: &str) -> AppResult<UserId> {
        let user = users::ActiveModel {
            id: Set(UserId::new().into_inner()),
            name: Set(name.to_string()),
            created_at: Set(chrono::Utc::now().into()),
        }
        .insert(&self.db)
        .await
        .map_err(db_err)?;
        Ok(UserId::from_uuid(user.id))
    }
}

#[async_trait]
impl UserChecker for UserRepository {
    async fn ensure_user_exists(&self, user_id: UserId) -> AppResult<()> {
        users::Entity::find_by_id(user_id.into_inner())
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(|_| ())
            .ok_or_else(|| not_found("user", user_id))
    }
}
