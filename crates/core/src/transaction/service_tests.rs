use super::*;
use crate::budget::CreateBudgetInput;
use crate::saga::MovementStatus;
use crate::testing::Harness;
use chrono::NaiveDate;
use rust_decimal_macros::dec;
use tally_shared::types::{AccountId, CategoryId};

fn input(
    h: &Harness,
    account_id: AccountId,
    kind: TransactionType,
    amount: Decimal,
) -> CreateTransactionInput {
    CreateTransactionInput {
        user_id: h.user,
        account_id,
        transaction_type: kind,
        category_id: CategoryId::new(),
        amount,
        date: NaiveDate::from_ymd_opt(2024, 1, 18).unwrap(),
        description: Some("  groceries ".into()),
    }
}

async fn budget_for(h: &Harness, category_id: CategoryId) -> tally_shared::types::BudgetId {
    h.services
        .budgets
        .create_budget(CreateBudgetInput {
            user_id: h.user,
            category_id,
            period: MonthPeriod::new(2024, 1).unwrap(),
            amount: dec!(1000),
            alert_at: None,
        })
        .await
        .unwrap()
        .id
}

#[tokio::test]
async fn test_receipt_credits_account() {
    let h = Harness::new();
    let account = h.checking(dec!(100)).await;

    let tx = h
        .services
        .transactions
        .create_transaction(input(&h, account.id, TransactionType::Receipt, dec!(2500)))
        .await
        .unwrap();

    assert_eq!(h.store.account(account.id).balance, dec!(2600));
    assert_eq!(tx.description.as_deref(), Some("groceries"));
    assert!(h.store.intents().iter().all(|i| i.status == MovementStatus::Completed));
}

#[tokio::test]
async fn test_expense_debits_account_and_tracks_budget() {
    let h = Harness::new();
    let account = h.checking(dec!(1000)).await;
    let request = input(&h, account.id, TransactionType::Expense, dec!(120.50));
    let budget_id = budget_for(&h, request.category_id).await;

    h.services.transactions.create_transaction(request).await.unwrap();

    assert_eq!(h.store.account(account.id).balance, dec!(879.50));
    let budget = h.services.budgets.get_budget(budget_id, h.user).await.unwrap();
    assert_eq!(budget.spent, dec!(120.50));
}

#[tokio::test]
async fn test_expense_beyond_balance_is_rejected_without_writes() {
    let h = Harness::new();
    let account = h.checking(dec!(50)).await;

    let err = h
        .services
        .transactions
        .create_transaction(input(&h, account.id, TransactionType::Expense, dec!(50.01)))
        .await
        .unwrap_err();

    assert!(err.is_validation());
    assert_eq!(h.store.account(account.id).balance, dec!(50));
    assert!(h.store.transactions().is_empty());
    assert!(h.store.intents().is_empty());
}

#[tokio::test]
async fn test_engine_types_are_rejected() {
    let h = Harness::new();
    let account = h.checking(dec!(50)).await;

    for kind in [TransactionType::Investment, TransactionType::Withdraw] {
        let err = h
            .services
            .transactions
            .create_transaction(input(&h, account.id, kind, dec!(1)))
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }
}

#[tokio::test]
async fn test_failed_insert_restores_account() {
    let h = Harness::new();
    let account = h.checking(dec!(300)).await;
    h.store.fail_once("transactions.create");

    let err = h
        .services
        .transactions
        .create_transaction(input(&h, account.id, TransactionType::Expense, dec!(100)))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Database(_)));
    assert_eq!(h.store.account(account.id).balance, dec!(300));
    let intents = h.store.intents();
    assert_eq!(intents.len(), 1);
    assert_eq!(intents[0].status, MovementStatus::Compensated);
}

#[tokio::test]
async fn test_failed_budget_update_unwinds_both_earlier_steps() {
    let h = Harness::new();
    let account = h.checking(dec!(300)).await;
    let request = input(&h, account.id, TransactionType::Expense, dec!(100));
    budget_for(&h, request.category_id).await;
    h.store.fail_once("budgets.adjust_spent");

    h.services.transactions.create_transaction(request).await.unwrap_err();

    assert_eq!(h.store.account(account.id).balance, dec!(300));
    assert!(h.store.transactions().is_empty());
}

#[tokio::test]
async fn test_failed_compensation_reports_partial_failure() {
    let h = Harness::new();
    let account = h.checking(dec!(300)).await;
    let request = input(&h, account.id, TransactionType::Expense, dec!(100));
    budget_for(&h, request.category_id).await;
    h.store.fail_once("budgets.adjust_spent");
    h.store.fail_always("transactions.delete");

    let err = h.services.transactions.create_transaction(request).await.unwrap_err();

    let AppError::PartiallyFailed { movement_id, .. } = err else {
        panic!("expected partial failure, got {err:?}");
    };
    let intent = h
        .services
        .sagas
        .get_movement(tally_shared::types::MovementId::from_uuid(movement_id))
        .await
        .unwrap();
    assert_eq!(intent.status, MovementStatus::Failed);
    // The account compensation still ran.
    assert_eq!(h.store.account(account.id).balance, dec!(300));
}

#[tokio::test]
async fn test_delete_reverses_balance_and_budget() {
    let h = Harness::new();
    let account = h.checking(dec!(500)).await;
    let request = input(&h, account.id, TransactionType::Expense, dec!(200));
    let budget_id = budget_for(&h, request.category_id).await;
    let tx = h.services.transactions.create_transaction(request).await.unwrap();

    h.services.transactions.delete_transaction(tx.id, h.user).await.unwrap();

    assert_eq!(h.store.account(account.id).balance, dec!(500));
    let budget = h.services.budgets.get_budget(budget_id, h.user).await.unwrap();
    assert_eq!(budget.spent, dec!(0));
    let err = h.services.transactions.get_transaction(tx.id, h.user).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_delete_receipt_cannot_overdraw() {
    let h = Harness::new();
    let account = h.checking(dec!(0)).await;
    let tx = h
        .services
        .transactions
        .create_transaction(input(&h, account.id, TransactionType::Receipt, dec!(100)))
        .await
        .unwrap();
    h.services
        .accounts
        .update_balance(account.id, h.user, dec!(-60))
        .await
        .unwrap();

    let err = h
        .services
        .transactions
        .delete_transaction(tx.id, h.user)
        .await
        .unwrap_err();

    assert!(err.is_validation());
    assert_eq!(h.store.account(account.id).balance, dec!(40));
    assert!(h.services.transactions.get_transaction(tx.id, h.user).await.is_ok());
}

#[tokio::test]
async fn test_failed_delete_restores_record() {
    let h = Harness::new();
    let account = h.checking(dec!(500)).await;
    let tx = h
        .services
        .transactions
        .create_transaction(input(&h, account.id, TransactionType::Expense, dec!(200)))
        .await
        .unwrap();
    h.store.fail_once("journal.finish");

    h.services
        .transactions
        .delete_transaction(tx.id, h.user)
        .await
        .unwrap_err();

    assert_eq!(h.store.account(account.id).balance, dec!(300));
    assert_eq!(
        h.services.transactions.get_transaction(tx.id, h.user).await.unwrap(),
        tx
    );
}

#[tokio::test]
async fn test_list_is_scoped_to_user() {
    let h = Harness::new();
    let account = h.checking(dec!(500)).await;
    h.services
        .transactions
        .create_transaction(input(&h, account.id, TransactionType::Receipt, dec!(1)))
        .await
        .unwrap();
    let other = h.store.add_user();

    assert_eq!(h.services.transactions.list_transactions(h.user).await.unwrap().len(), 1);
    assert!(h.services.transactions.list_transactions(other).await.unwrap().is_empty());
}
