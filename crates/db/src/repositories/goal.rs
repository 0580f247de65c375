//! Goal and contribution repositories.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, prelude::DateTimeWithTimeZone, sea_query::Expr,
};
use tally_core::goal::{self, Contribution, Goal, GoalTransition};
use tally_shared::{
    AppError, AppResult,
    types::{AccountId, ContributionId, GoalId, UserId},
};

use super::{enum_value, not_found, utc};
use crate::entities::{goal_contributions, goals, sea_orm_active_enums::GoalStatus};
use crate::error::db_err;

impl From<goals::Model> for Goal {
    fn from(model: goals::Model) -> Self {
        Self {
            id: GoalId::from_uuid(model.id),
            user_id: UserId::from_uuid(model.user_id),
            name: model.name,
            target_amount: model.target_amount,
            current_amount: model.current_amount,
            status: model.status.into(),
            ended_at: model.ended_at.map(utc),
            created_at: utc(model.created_at),
            updated_at: utc(model.updated_at),
        }
    }
}

impl From<Goal> for goals::ActiveModel {
    fn from(goal: Goal) -> Self {
        Self {
            id: Set(goal.id.into_inner()),
            user_id: Set(goal.user_id.into_inner()),
            name: Set(goal.name),
            target_amount: Set(goal.target_amount),
            current_amount: Set(goal.current_amount),
            status: Set(goal.status.into()),
            ended_at: Set(goal.ended_at.map(Into::into)),
            created_at: Set(goal.created_at.into()),
            updated_at: Set(goal.updated_at.into()),
        }
    }
}

impl From<goal_contributions::Model> for Contribution {
    fn from(model: goal_contributions::Model) -> Self {
        Self {
            id: ContributionId::from_uuid(model.id),
            goal_id: GoalId::from_uuid(model.goal_id),
            account_id: AccountId::from_uuid(model.account_id),
            contribution_type: model.contribution_type.into(),
            amount: model.amount,
            description: model.description,
            created_at: utc(model.created_at),
        }
    }
}

impl From<Contribution> for goal_contributions::ActiveModel {
    fn from(contribution: Contribution) -> Self {
        Self {
            id: Set(contribution.id.into_inner()),
            goal_id: Set(contribution.goal_id.into_inner()),
            account_id: Set(contribution.account_id.into_inner()),
            contribution_type: Set(contribution.contribution_type.into()),
            amount: Set(contribution.amount),
            description: Set(contribution.description),
            created_at: Set(contribution.created_at.into()),
        }
    }
}

/// Goal repository backed by the `goals` table.
#[derive(Debug, Clone)]
pub struct GoalRepository {
    db: DatabaseConnection,
}

impl GoalRepository {
    /// Creates a new goal repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn find(&self, id: GoalId) -> AppResult<Option<goals::Model>> {
        goals::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(db_err)
    }
}

#[async_trait]
impl goal::GoalRepository for GoalRepository {
    async fn create(&self, goal: Goal) -> AppResult<Goal> {
        let model = goals::ActiveModel::from(goal)
            .insert(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.into())
    }

    async fn get_by_id(&self, id: GoalId) -> AppResult<Option<Goal>> {
        Ok(self.find(id).await?.map(Into::into))
    }

    async fn list_by_user(&self, user_id: UserId) -> AppResult<Vec<Goal>> {
        let models = goals::Entity::find()
            .filter(goals::Column::UserId.eq(user_id.into_inner()))
            .order_by_asc(goals::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn delete(&self, id: GoalId) -> AppResult<()> {
        goals::Entity::delete_by_id(id.into_inner())
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn adjust_current_amount(&self, id: GoalId, delta: Decimal) -> AppResult<Goal> {
        let updated = goals::Entity::update_many()
            .col_expr(
                goals::Column::CurrentAmount,
                Expr::col(goals::Column::CurrentAmount).add(delta),
            )
            .filter(goals::Column::Id.eq(id.into_inner()))
            .filter(goals::Column::CurrentAmount.gte(-delta))
            .exec_with_returning(&self.db)
            .await
            .map_err(db_err)?;
        if let Some(model) = updated.into_iter().next() {
            return Ok(model.into());
        }
        match self.find(id).await? {
            Some(_) => Err(AppError::Validation(format!(
                "goal {id} cannot go below zero"
            ))),
            None => Err(not_found("goal", id)),
        }
    }

    async fn apply_transition(
        &self,
        id: GoalId,
        transition: GoalTransition,
    ) -> AppResult<Option<Goal>> {
        let (ended_at, amounts): (Option<DateTimeWithTimeZone>, _) = match transition {
            GoalTransition::Complete { ended_at } => (
                Some(ended_at.into()),
                Expr::col(goals::Column::CurrentAmount)
                    .gte(Expr::col(goals::Column::TargetAmount)),
            ),
            GoalTransition::Reactivate => (
                None,
                Expr::col(goals::Column::CurrentAmount)
                    .lt(Expr::col(goals::Column::TargetAmount)),
            ),
        };
        let from = GoalStatus::from(transition.from_status());
        let to = GoalStatus::from(transition.to_status());

        // Compare-and-set on the status, re-checked against the amounts.
        let updated = goals::Entity::update_many()
            .col_expr(goals::Column::Status, enum_value(&to))
            .col_expr(goals::Column::EndedAt, Expr::value(ended_at))
            .filter(goals::Column::Id.eq(id.into_inner()))
            .filter(goals::Column::Status.eq(from))
            .filter(amounts)
            .exec_with_returning(&self.db)
            .await
            .map_err(db_err)?;
        Ok(updated.into_iter().next().map(Goal::from))
    }
}

/// Contribution repository backed by the `goal_contributions` table.
#[derive(Debug, Clone)]
pub struct ContributionRepository {
    db: DatabaseConnection,
}

impl ContributionRepository {
    /// Creates a new contribution repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl goal::ContributionRepository for ContributionRepository {
    async fn create(&self, contribution: Contribution) -> AppResult<Contribution> {
        let model = goal_contributions::ActiveModel::from(contribution)
            .insert(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.into())
    }

    async fn delete(&self, id: ContributionId) -> AppResult<()> {
        goal_contributions::Entity::delete_by_id(id.into_inner())
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn list_by_goal(&self, goal_id: GoalId) -> AppResult<Vec<Contribution>> {
        let models = goal_contributions::Entity::find()
            .filter(goal_contributions::Column::GoalId.eq(goal_id.into_inner()))
            .order_by_asc(goal_contributions::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(Into::into).collect())
    }
}
