//! Goal contribution engine.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tally_shared::{
    AppError, AppResult,
    types::{AccountId, ContributionId, GoalId, UserId},
};
use tracing::info;

use super::error::GoalError;
use super::repository::{ContributionRepository, GoalRepository};
use super::types::{
    Contribution, ContributionType, CreateGoalInput, Goal, GoalMovement, GoalStatus,
};
use crate::account::AccountService;
use crate::clock::Clock;
use crate::ownership::ensure_owned;
use crate::saga::{Compensation, MovementKind, SagaCoordinator};
use crate::user::UserChecker;

/// Rounds of re-reading a goal changed by a concurrent movement. Every
/// movement settles the goal after its own delta.
const SETTLE_ATTEMPTS: usize = 3;

/// Persists the transition that brings the goal's status in line with its
/// amounts, if one is due.
pub(crate) async fn settle_status(
    goals: &dyn GoalRepository,
    mut goal: Goal,
    now: DateTime<Utc>,
) -> AppResult<Goal> {
    for _ in 0..SETTLE_ATTEMPTS {
        let Some(transition) = goal.next_transition(now) else {
            return Ok(goal);
        };
        if let Some(settled) = goals.apply_transition(goal.id, transition).await? {
            info!(goal_id = %settled.id, status = %settled.status, "goal status changed");
            return Ok(settled);
        }
        goal = goals
            .get_by_id(goal.id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("goal {}", goal.id)))?;
    }
    Ok(goal)
}

/// Goal contribution engine.
pub struct GoalService {
    goals: Arc<dyn GoalRepository>,
    contributions: Arc<dyn ContributionRepository>,
    ledger: Arc<AccountService>,
    sagas: Arc<SagaCoordinator>,
    users: Arc<dyn UserChecker>,
    clock: Arc<dyn Clock>,
}

impl GoalService {
    /// Creates a new goal service.
    pub fn new(
        goals: Arc<dyn GoalRepository>,
        contributions: Arc<dyn ContributionRepository>,
        ledger: Arc<AccountService>,
        sagas: Arc<SagaCoordinator>,
        users: Arc<dyn UserChecker>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            goals,
            contributions,
            ledger,
            sagas,
            users,
            clock,
        }
    }

    /// Creates an empty, active goal.
    pub async fn create_goal(&self, input: CreateGoalInput) -> AppResult<Goal> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("goal name is required".into()));
        }
        if input.target_amount <= Decimal::ZERO {
            return Err(AppError::Validation("target amount must be positive".into()));
        }
        self.users.ensure_user_exists(input.user_id).await?;

        let now = self.clock.now();
        let goal = self
            .goals
            .create(Goal {
                id: GoalId::new(),
                user_id: input.user_id,
                name: name.to_string(),
                target_amount: input.target_amount,
                current_amount: Decimal::ZERO,
                status: GoalStatus::Active,
                ended_at: None,
                created_at: now,
                updated_at: now,
            })
            .await?;
        info!(goal_id = %goal.id, target = %goal.target_amount, "goal created");
        Ok(goal)
    }

    /// Loads a goal owned by `user_id`.
    pub async fn get_goal(&self, id: GoalId, user_id: UserId) -> AppResult<Goal> {
        ensure_owned(self.goals.get_by_id(id).await?, user_id, "goal", id)
    }

    /// Lists a user's goals.
    pub async fn list_goals(&self, user_id: UserId) -> AppResult<Vec<Goal>> {
        self.goals.list_by_user(user_id).await
    }

    /// Lists the movements of a goal.
    pub async fn list_contributions(
        &self,
        goal_id: GoalId,
        user_id: UserId,
    ) -> AppResult<Vec<Contribution>> {
        self.get_goal(goal_id, user_id).await?;
        self.contributions.list_by_goal(goal_id).await
    }

    /// Deletes a goal that holds no money.
    pub async fn delete_goal(&self, id: GoalId, user_id: UserId) -> AppResult<()> {
        let goal = self.get_goal(id, user_id).await?;
        if !goal.current_amount.is_zero() {
            return Err(GoalError::NotEmpty(goal.current_amount).into());
        }
        self.goals.delete(id).await?;
        info!(goal_id = %id, "goal deleted");
        Ok(())
    }

    /// Moves `amount` from an account into an active goal.
    ///
    /// Steps: debit the account, write the deposit record, increment the
    /// goal, then complete the goal if the target is reached.
    pub async fn make_contribution(
        &self,
        goal_id: GoalId,
        account_id: AccountId,
        user_id: UserId,
        amount: Decimal,
        description: Option<String>,
    ) -> AppResult<GoalMovement> {
        if amount <= Decimal::ZERO {
            return Err(AppError::Validation("contribution must be positive".into()));
        }
        let goal = self.get_goal(goal_id, user_id).await?;
        if goal.status != GoalStatus::Active {
            return Err(GoalError::NotActive.into());
        }
        let account = self.ledger.get_account(account_id, user_id).await?;
        AccountService::ensure_can_fund(&account, amount)?;

        let record = self.contribution(
            goal_id,
            account_id,
            ContributionType::Deposit,
            amount,
            description,
        );
        let mut saga = self
            .sagas
            .begin(MovementKind::GoalContribution, user_id)
            .await?;

        saga.step(
            "debit_account",
            self.ledger.update_balance(account_id, user_id, -amount),
            |_| {
                Some(Compensation::AdjustAccountBalance {
                    account_id,
                    delta: amount,
                })
            },
        )
        .await?;

        let contribution = saga
            .step("insert_contribution", self.contributions.create(record), |c| {
                Some(Compensation::DeleteContribution {
                    contribution_id: c.id,
                })
            })
            .await?;

        let goal = saga
            .step(
                "increment_goal",
                self.goals.adjust_current_amount(goal_id, amount),
                |_| {
                    Some(Compensation::AdjustGoalAmount {
                        goal_id,
                        delta: -amount,
                    })
                },
            )
            .await?;

        let goal = saga
            .step(
                "evaluate_completion",
                settle_status(self.goals.as_ref(), goal, self.clock.now()),
                |_| None,
            )
            .await?;

        saga.complete().await?;
        info!(
            %goal_id,
            %account_id,
            %amount,
            current = %goal.current_amount,
            "goal contribution made"
        );
        Ok(GoalMovement { goal, contribution })
    }

    /// Moves `amount` from a goal back into an account.
    ///
    /// Steps: write the withdrawal record, decrement the goal, credit the
    /// account, then reactivate the goal if it fell below its target.
    pub async fn withdraw_from_goal(
        &self,
        goal_id: GoalId,
        account_id: AccountId,
        user_id: UserId,
        amount: Decimal,
        description: Option<String>,
    ) -> AppResult<GoalMovement> {
        if amount <= Decimal::ZERO {
            return Err(AppError::Validation("withdrawal must be positive".into()));
        }
        let goal = self.get_goal(goal_id, user_id).await?;
        if amount > goal.current_amount {
            return Err(GoalError::ExceedsSaved {
                requested: amount,
                available: goal.current_amount,
            }
            .into());
        }
        let account = self.ledger.get_account(account_id, user_id).await?;
        AccountService::ensure_can_receive(&account)?;

        let record = self.contribution(
            goal_id,
            account_id,
            ContributionType::Withdraw,
            amount,
            description,
        );
        let mut saga = self
            .sagas
            .begin(MovementKind::GoalWithdrawal, user_id)
            .await?;

        let contribution = saga
            .step("insert_withdrawal", self.contributions.create(record), |c| {
                Some(Compensation::DeleteContribution {
                    contribution_id: c.id,
                })
            })
            .await?;

        let goal = saga
            .step(
                "decrement_goal",
                self.goals.adjust_current_amount(goal_id, -amount),
                |_| {
                    Some(Compensation::AdjustGoalAmount {
                        goal_id,
                        delta: amount,
                    })
                },
            )
            .await?;

        saga.step(
            "credit_account",
            self.ledger.update_balance(account_id, user_id, amount),
            |_| {
                Some(Compensation::AdjustAccountBalance {
                    account_id,
                    delta: -amount,
                })
            },
        )
        .await?;

        let goal = saga
            .step(
                "evaluate_completion",
                settle_status(self.goals.as_ref(), goal, self.clock.now()),
                |_| None,
            )
            .await?;

        saga.complete().await?;
        info!(
            %goal_id,
            %account_id,
            %amount,
            current = %goal.current_amount,
            "goal withdrawal made"
        );
        Ok(GoalMovement { goal, contribution })
    }

    fn contribution(
        &self,
        goal_id: GoalId,
        account_id: AccountId,
        contribution_type: ContributionType,
        amount: Decimal,
        description: Option<String>,
    ) -> Contribution {
        Contribution {
            id: ContributionId::new(),
            goal_id,
            account_id,
            contribution_type,
            amount,
            description,
            created_at: self.clock.now(),
        }
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
