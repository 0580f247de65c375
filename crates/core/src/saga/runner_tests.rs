use chrono::Duration;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tally_shared::{
    AppError,
    types::{AccountId, MovementId},
};

use super::{Compensation, MovementIntent, MovementKind, MovementStatus};
use crate::clock::Clock;
use crate::testing::Harness;

fn ok<T: Send>(value: T) -> impl std::future::Future<Output = tally_shared::AppResult<T>> {
    async move { Ok(value) }
}

fn boom() -> impl std::future::Future<Output = tally_shared::AppResult<()>> {
    async { Err(AppError::Internal("boom".into())) }
}

#[tokio::test]
async fn test_completed_saga_journals_compensations() {
    let h = Harness::new();
    let account = h.checking(dec!(0)).await;

    let mut saga = h
        .services
        .sagas
        .begin(MovementKind::TransactionCreate, h.user)
        .await
        .unwrap();
    let value = saga
        .step("first", ok(7), |_| {
            Some(Compensation::AdjustAccountBalance {
                account_id: account.id,
                delta: dec!(1),
            })
        })
        .await
        .unwrap();
    assert_eq!(value, 7);
    let id = saga.complete().await.unwrap();

    let intent = h.services.sagas.get_movement(id).await.unwrap();
    assert_eq!(intent.status, MovementStatus::Completed);
    assert_eq!(intent.compensations.len(), 1);
    assert_eq!(intent.in_flight_step, None);
    // Nothing was undone.
    assert_eq!(h.store.account(account.id).balance, dec!(0));
}

#[tokio::test]
async fn test_failed_step_compensates_in_reverse_order() {
    let h = Harness::new();
    let account = h.checking(dec!(0)).await;
    let mut saga = h
        .services
        .sagas
        .begin(MovementKind::GoalContribution, h.user)
        .await
        .unwrap();

    // Only the reverse order keeps the balance non-negative throughout.
    saga.step("credit", ok(()), |_| {
        Some(Compensation::AdjustAccountBalance {
            account_id: account.id,
            delta: dec!(-50),
        })
    })
    .await
    .unwrap();
    saga.step("debit", ok(()), |_| {
        Some(Compensation::AdjustAccountBalance {
            account_id: account.id,
            delta: dec!(50),
        })
    })
    .await
    .unwrap();
    let id = saga.id();
    let err = saga.step("explode", boom(), |_| None).await.unwrap_err();

    assert!(matches!(err, AppError::Internal(_)));
    let intent = h.services.sagas.get_movement(id).await.unwrap();
    assert_eq!(intent.status, MovementStatus::Compensated);
    assert_eq!(intent.error.as_deref(), Some("Internal error: boom"));
    assert_eq!(h.store.account(account.id).balance, dec!(0));
}

#[tokio::test]
async fn test_failing_compensation_marks_movement_failed() {
    let h = Harness::new();
    let account = h.checking(dec!(0)).await;
    let mut saga = h
        .services
        .sagas
        .begin(MovementKind::CardCharge, h.user)
        .await
        .unwrap();
    saga.step("debit", ok(()), |_| {
        Some(Compensation::AdjustAccountBalance {
            account_id: account.id,
            delta: dec!(-1),
        })
    })
    .await
    .unwrap();

    let err = saga.step("explode", boom(), |_| None).await.unwrap_err();

    let AppError::PartiallyFailed { cause, movement_id } = err else {
        panic!("expected partial failure, got {err:?}");
    };
    assert_eq!(cause, "Internal error: boom");
    let intent = h
        .services
        .sagas
        .get_movement(MovementId::from_uuid(movement_id))
        .await
        .unwrap();
    assert_eq!(intent.status, MovementStatus::Failed);
    assert!(intent.error.unwrap().contains("compensation failures"));
}

#[tokio::test]
async fn test_journal_failure_before_step_aborts_without_running_it() {
    let h = Harness::new();
    let mut saga = h
        .services
        .sagas
        .begin(MovementKind::InvestmentCreate, h.user)
        .await
        .unwrap();
    h.store.fail_once("journal.mark_step");

    let mut ran = false;
    let err = saga
        .step(
            "never",
            async {
                ran = true;
                Ok(())
            },
            |_| None,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Database(_)));
    assert!(!ran);
}

#[tokio::test]
async fn test_complete_failure_undoes_movement() {
    let h = Harness::new();
    let account = h.checking(dec!(10)).await;
    let mut saga = h
        .services
        .sagas
        .begin(MovementKind::TransactionCreate, h.user)
        .await
        .unwrap();
    h.services
        .accounts
        .update_balance(account.id, h.user, dec!(5))
        .await
        .unwrap();
    saga.step("credit", ok(()), |_| {
        Some(Compensation::AdjustAccountBalance {
            account_id: account.id,
            delta: dec!(-5),
        })
    })
    .await
    .unwrap();
    h.store.fail_once("journal.finish");

    saga.complete().await.unwrap_err();

    assert_eq!(h.store.account(account.id).balance, dec!(10));
}

fn credit(account_id: AccountId, delta: Decimal) -> Compensation {
    Compensation::AdjustAccountBalance { account_id, delta }
}

#[tokio::test]
async fn test_journal_failure_mid_compensation_is_never_reapplied() {
    let h = Harness::new();
    let account = h.checking(dec!(0)).await;
    let mut saga = h
        .services
        .sagas
        .begin(MovementKind::InvestmentContribution, h.user)
        .await
        .unwrap();
    let first = credit(account.id, dec!(10));
    let second = credit(account.id, dec!(20));
    saga.step("first", ok(()), |_| Some(first)).await.unwrap();
    saga.step("second", ok(()), |_| Some(second)).await.unwrap();
    h.store.fail_once("journal.discard_compensation");

    let err = saga.step("explode", boom(), |_| None).await.unwrap_err();

    let AppError::PartiallyFailed { movement_id, .. } = err else {
        panic!("expected partial failure, got {err:?}");
    };
    let id = MovementId::from_uuid(movement_id);
    // The second compensation ran, its removal from the journal did not.
    assert_eq!(h.store.account(account.id).balance, dec!(20));
    let intent = h.services.sagas.get_movement(id).await.unwrap();
    assert_eq!(intent.status, MovementStatus::Pending);
    assert_eq!(intent.compensations.len(), 2);

    h.clock.set(h.clock.now() + Duration::hours(1));
    let report = h.services.sagas.reconcile(Duration::minutes(5)).await.unwrap();

    assert_eq!(report.failed, 1);
    assert_eq!(h.store.account(account.id).balance, dec!(20));
    let intent = h.services.sagas.get_movement(id).await.unwrap();
    assert_eq!(intent.status, MovementStatus::Failed);
    assert_eq!(intent.compensations.len(), 2);
}

#[tokio::test]
async fn test_reconcile_applies_compensations_left_by_unavailable_journal() {
    let h = Harness::new();
    let account = h.checking(dec!(0)).await;
    let mut saga = h
        .services
        .sagas
        .begin(MovementKind::InvestmentContribution, h.user)
        .await
        .unwrap();
    let first = credit(account.id, dec!(10));
    let second = credit(account.id, dec!(20));
    saga.step("first", ok(()), |_| Some(first)).await.unwrap();
    saga.step("second", ok(()), |_| Some(second)).await.unwrap();
    let store = std::sync::Arc::clone(&h.store);

    let err = saga
        .step(
            "explode",
            async move {
                store.fail_once("journal.mark_step");
                Err::<(), _>(AppError::Internal("boom".into()))
            },
            |_| None,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::PartiallyFailed { .. }));
    assert_eq!(h.store.account(account.id).balance, dec!(0));

    h.clock.set(h.clock.now() + Duration::hours(1));
    let report = h.services.sagas.reconcile(Duration::minutes(5)).await.unwrap();

    // Both compensations run once; the interrupted step still needs review.
    assert_eq!(report.failed, 1);
    assert_eq!(h.store.account(account.id).balance, dec!(30));
    let intent = h.store.intents().remove(0);
    assert_eq!(intent.status, MovementStatus::Failed);
    assert!(intent.compensations.is_empty());
}

#[tokio::test]
async fn test_reconcile_rejects_out_of_range_threshold() {
    let h = Harness::new();

    let err = h
        .services
        .sagas
        .reconcile(Duration::MAX)
        .await
        .unwrap_err();

    assert!(err.is_validation());
}

fn interrupted(
    h: &Harness,
    compensations: Vec<Compensation>,
    in_flight: Option<&str>,
    age: Duration,
) -> MovementId {
    let started = h.clock.now() - age;
    let intent = MovementIntent {
        id: MovementId::new(),
        user_id: h.user,
        kind: MovementKind::GoalWithdrawal,
        status: MovementStatus::Pending,
        in_flight_step: in_flight.map(str::to_string),
        compensations,
        error: None,
        created_at: started,
        updated_at: started,
    };
    let id = intent.id;
    h.store.insert_intent(intent);
    id
}

#[tokio::test]
async fn test_reconcile_compensates_stale_movements_only() {
    let h = Harness::new();
    let account = h.checking(dec!(100)).await;
    let stale = interrupted(
        &h,
        vec![Compensation::AdjustAccountBalance {
            account_id: account.id,
            delta: dec!(25),
        }],
        None,
        Duration::minutes(30),
    );
    let fresh = interrupted(&h, Vec::new(), None, Duration::seconds(10));

    let report = h.services.sagas.reconcile(Duration::minutes(5)).await.unwrap();

    assert_eq!(report.examined, 1);
    assert_eq!(report.compensated, 1);
    assert_eq!(report.failed, 0);
    assert_eq!(h.store.account(account.id).balance, dec!(125));
    let stale = h.services.sagas.get_movement(stale).await.unwrap();
    assert_eq!(stale.status, MovementStatus::Compensated);
    let fresh = h.services.sagas.get_movement(fresh).await.unwrap();
    assert_eq!(fresh.status, MovementStatus::Pending);
}

#[tokio::test]
async fn test_reconcile_flags_in_flight_and_broken_movements() {
    let h = Harness::new();
    let account = h.checking(dec!(0)).await;
    let in_flight = interrupted(&h, Vec::new(), Some("credit_account"), Duration::hours(1));
    let broken = interrupted(
        &h,
        vec![Compensation::AdjustAccountBalance {
            account_id: account.id,
            delta: dec!(-1),
        }],
        None,
        Duration::hours(1),
    );

    let report = h.services.sagas.reconcile(Duration::minutes(5)).await.unwrap();

    assert_eq!(report.examined, 2);
    assert_eq!(report.failed, 2);
    for id in [in_flight, broken] {
        let intent = h.services.sagas.get_movement(id).await.unwrap();
        assert_eq!(intent.status, MovementStatus::Failed);
    }

    let again = h.services.sagas.reconcile(Duration::minutes(5)).await.unwrap();
    assert_eq!(again.examined, 0);
}
