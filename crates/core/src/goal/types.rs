//! Goal types and the completion state machine.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{AccountId, ContributionId, GoalId, UserId};

use crate::ownership::Owned;

/// Goal status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GoalStatus {
    /// Still saving.
    Active,
    /// Target reached.
    Completed,
}

impl GoalStatus {
    /// Stable string form used in storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Completed => "COMPLETED",
        }
    }
}

impl std::fmt::Display for GoalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed status change of a goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GoalTransition {
    /// `ACTIVE -> COMPLETED`, stamping the completion time.
    Complete {
        /// Completion time.
        ended_at: DateTime<Utc>,
    },
    /// `COMPLETED -> ACTIVE`, clearing the completion time.
    Reactivate,
}

impl GoalTransition {
    /// Status the transition starts from.
    #[must_use]
    pub const fn from_status(self) -> GoalStatus {
        match self {
            Self::Complete { .. } => GoalStatus::Active,
            Self::Reactivate => GoalStatus::Completed,
        }
    }

    /// Status the transition ends in.
    #[must_use]
    pub const fn to_status(self) -> GoalStatus {
        match self {
            Self::Complete { .. } => GoalStatus::Completed,
            Self::Reactivate => GoalStatus::Active,
        }
    }
}

/// A savings goal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goal {
    /// Goal ID.
    pub id: GoalId,
    /// Owning user.
    pub user_id: UserId,
    /// Display name.
    pub name: String,
    /// Amount to reach.
    pub target_amount: Decimal,
    /// Deposits minus withdrawals. Only changed by atomic deltas.
    pub current_amount: Decimal,
    /// Completion status.
    pub status: GoalStatus,
    /// When the goal was completed.
    pub ended_at: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Goal {
    /// The transition that would bring `status` in line with the amounts,
    /// if any. `COMPLETED` holds exactly when `current >= target`.
    #[must_use]
    pub fn next_transition(&self, now: DateTime<Utc>) -> Option<GoalTransition> {
        let reached = self.current_amount >= self.target_amount;
        match (self.status, reached) {
            (GoalStatus::Active, true) => Some(GoalTransition::Complete { ended_at: now }),
            (GoalStatus::Completed, false) => Some(GoalTransition::Reactivate),
            _ => None,
        }
    }

    /// Amount still missing to reach the target.
    #[must_use]
    pub fn remaining(&self) -> Decimal {
        (self.target_amount - self.current_amount).max(Decimal::ZERO)
    }
}

impl Owned for Goal {
    fn owner(&self) -> UserId {
        self.user_id
    }
}

/// Direction of a goal movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContributionType {
    /// Account to goal.
    Deposit,
    /// Goal to account.
    Withdraw,
}

impl ContributionType {
    /// Signed effect on `Goal::current_amount`.
    #[must_use]
    pub fn goal_effect(self, amount: Decimal) -> Decimal {
        match self {
            Self::Deposit => amount,
            Self::Withdraw => -amount,
        }
    }
}

/// Immutable audit record of one goal movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contribution {
    /// Contribution ID.
    pub id: ContributionId,
    /// Goal moved into or out of.
    pub goal_id: GoalId,
    /// Account on the other side.
    pub account_id: AccountId,
    /// Direction.
    pub contribution_type: ContributionType,
    /// Positive amount.
    pub amount: Decimal,
    /// Free-form description.
    pub description: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Input for creating a goal.
#[derive(Debug, Clone)]
pub struct CreateGoalInput {
    /// Owning user.
    pub user_id: UserId,
    /// Display name.
    pub name: String,
    /// Amount to reach, positive.
    pub target_amount: Decimal,
}

/// Result of a contribution or withdrawal.
#[derive(Debug, Clone)]
pub struct GoalMovement {
    /// Goal after the movement, status re-evaluated.
    pub goal: Goal,
    /// The audit record written.
    pub contribution: Contribution,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn goal(target: Decimal, current: Decimal, status: GoalStatus) -> Goal {
        let now = Utc::now();
        Goal {
            id: GoalId::new(),
            user_id: UserId::new(),
            name: "Trip".into(),
            target_amount: target,
            current_amount: current,
            status,
            ended_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_next_transition_completes_when_target_reached() {
        let now = Utc::now();
        let g = goal(dec!(500), dec!(500), GoalStatus::Active);
        assert_eq!(
            g.next_transition(now),
            Some(GoalTransition::Complete { ended_at: now })
        );
    }

    #[test]
    fn test_next_transition_reactivates_below_target() {
        let g = goal(dec!(500), dec!(499.99), GoalStatus::Completed);
        assert_eq!(g.next_transition(Utc::now()), Some(GoalTransition::Reactivate));
    }

    #[test]
    fn test_next_transition_none_when_consistent() {
        let now = Utc::now();
        assert_eq!(goal(dec!(500), dec!(100), GoalStatus::Active).next_transition(now), None);
        assert_eq!(
            goal(dec!(500), dec!(600), GoalStatus::Completed).next_transition(now),
            None
        );
    }
}
