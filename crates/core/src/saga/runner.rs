//! Saga runner and interrupted-movement recovery.

use std::future::Future;
use std::sync::Arc;

use chrono::Duration;
use serde::Serialize;
use tally_shared::{
    AppError, AppResult,
    types::{MovementId, UserId},
};
use tracing::{error, info, warn};

use super::compensator::Compensator;
use super::journal::MovementJournal;
use super::types::{Compensation, MovementIntent, MovementKind, MovementStatus};
use crate::clock::Clock;

/// One running movement.
///
/// Obtained from [`SagaCoordinator::begin`]. Steps run through [`Saga::step`];
/// the movement ends with [`Saga::complete`] or with the first failing step.
pub struct Saga {
    id: MovementId,
    kind: MovementKind,
    journal: Arc<dyn MovementJournal>,
    compensator: Arc<Compensator>,
    applied: Vec<Compensation>,
}

impl Saga {
    /// Journal ID of this movement.
    #[must_use]
    pub const fn id(&self) -> MovementId {
        self.id
    }

    /// Runs one step.
    ///
    /// The step is marked in flight before `action` runs. On success `undo`
    /// derives the inverse from the step's output and it is journaled. On
    /// failure every earlier step is compensated and the error is returned,
    /// or `PartiallyFailed` when a compensation could not be applied.
    pub async fn step<T, F, U>(&mut self, name: &'static str, action: F, undo: U) -> AppResult<T>
    where
        F: Future<Output = AppResult<T>>,
        U: FnOnce(&T) -> Option<Compensation>,
    {
        if let Err(e) = self.journal.mark_step(self.id, Some(name.to_string())).await {
            return Err(self.abort(e).await);
        }

        let output = match action.await {
            Ok(output) => output,
            Err(e) => {
                warn!(
                    movement_id = %self.id,
                    kind = %self.kind,
                    step = name,
                    error = %e,
                    "movement step failed"
                );
                return Err(self.abort(e).await);
            }
        };

        let recorded = match undo(&output) {
            Some(compensation) => {
                self.applied.push(compensation.clone());
                self.journal.record_compensation(self.id, compensation).await
            }
            None => self.journal.mark_step(self.id, None).await,
        };
        if let Err(e) = recorded {
            return Err(self.abort(e).await);
        }
        Ok(output)
    }

    /// Marks the movement completed.
    ///
    /// When the journal cannot be updated the movement is undone instead, so
    /// that no completed movement stays `PENDING` for reconciliation.
    pub async fn complete(mut self) -> AppResult<MovementId> {
        if let Err(e) = self
            .journal
            .finish(self.id, MovementStatus::Completed, None)
            .await
        {
            return Err(self.abort(e).await);
        }
        Ok(self.id)
    }

    async fn abort(&mut self, cause: AppError) -> AppError {
        let applied = std::mem::take(&mut self.applied);
        if !applied.is_empty() {
            warn!(
                movement_id = %self.id,
                kind = %self.kind,
                steps = applied.len(),
                "compensating movement"
            );
        }

        let unwound = unwind(self.journal.as_ref(), &self.compensator, self.id, &applied).await;
        let failures = match unwound {
            Ok(failures) => failures,
            Err(e) => {
                // Whatever is still journaled is left for reconciliation.
                error!(
                    movement_id = %self.id,
                    kind = %self.kind,
                    error = %e,
                    "journal unavailable while compensating"
                );
                return AppError::PartiallyFailed {
                    cause: cause.to_string(),
                    movement_id: self.id.into_inner(),
                };
            }
        };

        if failures.is_empty() {
            if let Err(e) = self
                .journal
                .finish(self.id, MovementStatus::Compensated, Some(cause.to_string()))
                .await
            {
                error!(
                    movement_id = %self.id,
                    error = %e,
                    "movement compensated but journal not closed"
                );
            }
            return cause;
        }

        let detail = format!("{cause}; compensation failures: {}", failures.join("; "));
        error!(
            movement_id = %self.id,
            kind = %self.kind,
            error = %detail,
            "movement partially failed"
        );
        if let Err(e) = self
            .journal
            .finish(self.id, MovementStatus::Failed, Some(detail))
            .await
        {
            error!(movement_id = %self.id, error = %e, "could not mark movement failed");
        }
        AppError::PartiallyFailed {
            cause: cause.to_string(),
            movement_id: self.id.into_inner(),
        }
    }
}

const UNDO_STEP_PREFIX: &str = "undo:";

fn undo_step(index: usize) -> String {
    format!("{UNDO_STEP_PREFIX}{index}")
}

/// True when the movement stopped while a compensation was running.
fn undo_in_flight(step: Option<&str>) -> bool {
    step.is_some_and(|s| s.starts_with(UNDO_STEP_PREFIX))
}

/// Applies `compensations` in reverse order, journaling progress.
///
/// Each compensation is marked in flight before it runs and dropped from the
/// intent once applied, so a compensation is never applied twice. Failed
/// compensations stay journaled and are returned as descriptions. A journal
/// error stops the unwind.
async fn unwind(
    journal: &dyn MovementJournal,
    compensator: &Compensator,
    id: MovementId,
    compensations: &[Compensation],
) -> AppResult<Vec<String>> {
    let mut failures = Vec::new();
    for (index, compensation) in compensations.iter().enumerate().rev() {
        journal.mark_step(id, Some(undo_step(index))).await?;
        match compensator.apply(compensation).await {
            Ok(()) => journal.discard_compensation(id, index).await?,
            Err(e) => {
                error!(movement_id = %id, ?compensation, error = %e, "compensating action failed");
                failures.push(format!("{compensation:?}: {e}"));
                journal.mark_step(id, None).await?;
            }
        }
    }
    Ok(failures)
}

/// Outcome counts of a reconciliation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    /// Interrupted movements found.
    pub examined: usize,
    /// Movements fully undone.
    pub compensated: usize,
    /// Movements left for manual review.
    pub failed: usize,
}

/// Starts movements and recovers interrupted ones.
pub struct SagaCoordinator {
    journal: Arc<dyn MovementJournal>,
    compensator: Arc<Compensator>,
    clock: Arc<dyn Clock>,
}

impl SagaCoordinator {
    /// Creates a coordinator.
    pub fn new(
        journal: Arc<dyn MovementJournal>,
        compensator: Arc<Compensator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            journal,
            compensator,
            clock,
        }
    }

    /// Persists a `PENDING` intent and returns the saga that runs it.
    pub async fn begin(&self, kind: MovementKind, user_id: UserId) -> AppResult<Saga> {
        let now = self.clock.now();
        let intent = self
            .journal
            .create(MovementIntent {
                id: MovementId::new(),
                user_id,
                kind,
                status: MovementStatus::Pending,
                in_flight_step: None,
                compensations: Vec::new(),
                error: None,
                created_at: now,
                updated_at: now,
            })
            .await?;

        Ok(Saga {
            id: intent.id,
            kind,
            journal: Arc::clone(&self.journal),
            compensator: Arc::clone(&self.compensator),
            applied: Vec::new(),
        })
    }

    /// Loads a movement intent.
    pub async fn get_movement(&self, id: MovementId) -> AppResult<MovementIntent> {
        self.journal
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("movement {id}")))
    }

    /// Undoes movements left `PENDING` for longer than `older_than`.
    ///
    /// Recorded compensations run in reverse. A movement whose last step was
    /// in flight when it was interrupted may have applied that step without
    /// recording it, so it ends `FAILED` for manual review. A movement that
    /// stopped while a compensation was running is not touched at all: that
    /// compensation may already be applied.
    pub async fn reconcile(&self, older_than: Duration) -> AppResult<ReconcileReport> {
        let cutoff = self
            .clock
            .now()
            .checked_sub_signed(older_than)
            .ok_or_else(|| AppError::Validation("reconcile threshold is out of range".into()))?;
        let pending = self.journal.list_pending(cutoff).await?;
        let mut report = ReconcileReport {
            examined: pending.len(),
            ..ReconcileReport::default()
        };

        for intent in pending {
            let step = intent.in_flight_step.as_deref();
            let (status, detail) = if undo_in_flight(step) {
                (
                    MovementStatus::Failed,
                    "interrupted while compensating; outcome unknown".to_string(),
                )
            } else {
                let failures = unwind(
                    self.journal.as_ref(),
                    &self.compensator,
                    intent.id,
                    &intent.compensations,
                )
                .await?;
                if !failures.is_empty() {
                    (
                        MovementStatus::Failed,
                        format!("interrupted; compensation failures: {}", failures.join("; ")),
                    )
                } else if let Some(step) = step {
                    (
                        MovementStatus::Failed,
                        format!("interrupted during step {step}; outcome unknown"),
                    )
                } else {
                    (MovementStatus::Compensated, "interrupted; compensated".to_string())
                }
            };

            if status == MovementStatus::Failed {
                error!(
                    movement_id = %intent.id,
                    kind = %intent.kind,
                    error = %detail,
                    "interrupted movement needs review"
                );
                report.failed += 1;
            } else {
                info!(
                    movement_id = %intent.id,
                    kind = %intent.kind,
                    "interrupted movement compensated"
                );
                report.compensated += 1;
            }
            self.journal.finish(intent.id, status, Some(detail)).await?;
        }

        Ok(report)
    }
}
