//! Account ledger service.

use std::sync::Arc;

use rust_decimal::Decimal;
use tally_shared::{
    AppError, AppResult,
    types::{AccountId, UserId},
};
use tracing::info;

use super::repository::AccountRepository;
use super::types::{Account, AccountType, CreateAccountInput, Transfer};
use crate::clock::Clock;
use crate::ownership::ensure_owned;
use crate::user::UserChecker;

/// Account ledger: the only writer of `Account::balance`.
pub struct AccountService {
    accounts: Arc<dyn AccountRepository>,
    users: Arc<dyn UserChecker>,
    clock: Arc<dyn Clock>,
}

impl AccountService {
    /// Creates a new account service.
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        users: Arc<dyn UserChecker>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            accounts,
            users,
            clock,
        }
    }

    /// Creates an account with its opening balance.
    pub async fn create_account(&self, input: CreateAccountInput) -> AppResult<Account> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("account name is required".into()));
        }
        if input.account_type.requires_non_negative_balance()
            && input.opening_balance < Decimal::ZERO
        {
            return Err(AppError::Validation(
                "opening balance cannot be negative".into(),
            ));
        }
        self.users.ensure_user_exists(input.user_id).await?;

        let now = self.clock.now();
        let account = self
            .accounts
            .create(Account {
                id: AccountId::new(),
                user_id: input.user_id,
                name: name.to_string(),
                account_type: input.account_type,
                balance: input.opening_balance,
                include_in_total: input.include_in_total,
                is_active: true,
                created_at: now,
                updated_at: now,
            })
            .await?;

        info!(
            account_id = %account.id,
            user_id = %account.user_id,
            account_type = %account.account_type,
            "account created"
        );
        Ok(account)
    }

    /// Loads an account owned by `user_id`.
    pub async fn get_account(&self, id: AccountId, user_id: UserId) -> AppResult<Account> {
        ensure_owned(self.accounts.get_by_id(id).await?, user_id, "account", id)
    }

    /// Lists the accounts of a user.
    pub async fn list_accounts(&self, user_id: UserId) -> AppResult<Vec<Account>> {
        self.accounts.list_by_user(user_id).await
    }

    /// Sum of balances of the user's active accounts flagged `include_in_total`.
    pub async fn total_balance(&self, user_id: UserId) -> AppResult<Decimal> {
        let accounts = self.accounts.list_by_user(user_id).await?;
        Ok(accounts
            .iter()
            .filter(|a| a.is_active && a.include_in_total)
            .map(|a| a.balance)
            .sum())
    }

    /// Applies a signed delta to an account balance.
    ///
    /// The repository performs the increment and the non-negative guard in one
    /// statement, so concurrent callers cannot lose updates or overdraw.
    pub async fn update_balance(
        &self,
        id: AccountId,
        user_id: UserId,
        delta: Decimal,
    ) -> AppResult<Account> {
        if delta.is_zero() {
            return Err(AppError::Validation("balance delta must be non-zero".into()));
        }
        let account = self.get_account(id, user_id).await?;
        if !account.accepts_delta(delta) {
            return Err(AppError::insufficient_funds(format!("account {id}")));
        }
        self.accounts.adjust_balance(id, delta).await
    }

    /// Moves `amount` between two accounts of the same user atomically.
    pub async fn transfer(
        &self,
        from: AccountId,
        to: AccountId,
        user_id: UserId,
        amount: Decimal,
    ) -> AppResult<Transfer> {
        if amount <= Decimal::ZERO {
            return Err(AppError::Validation("transfer amount must be positive".into()));
        }
        if from == to {
            return Err(AppError::Validation(
                "cannot transfer to the same account".into(),
            ));
        }

        let source = self.get_account(from, user_id).await?;
        let destination = self.get_account(to, user_id).await?;
        if !source.is_active || !destination.is_active {
            return Err(AppError::Validation(
                "transfers require active accounts".into(),
            ));
        }
        if !source.can_cover(amount) {
            return Err(AppError::insufficient_funds(format!("account {from}")));
        }

        let (from, to) = self.accounts.transfer(from, to, amount).await?;
        info!(from = %from.id, to = %to.id, %amount, "transfer completed");
        Ok(Transfer { from, to })
    }

    /// Deletes an account whose balance is zero.
    pub async fn delete_account(&self, id: AccountId, user_id: UserId) -> AppResult<()> {
        let account = self.get_account(id, user_id).await?;
        if !account.balance.is_zero() {
            return Err(AppError::Validation(format!(
                "account {id} still holds a balance of {}",
                account.balance
            )));
        }
        self.accounts.delete(id).await?;
        info!(account_id = %id, "account deleted");
        Ok(())
    }

    /// Returns an error unless the account can fund a debit of `amount`.
    pub(crate) fn ensure_can_fund(account: &Account, amount: Decimal) -> AppResult<()> {
        if account.account_type == AccountType::CreditCard {
            return Err(AppError::Validation(
                "credit card accounts cannot fund this movement".into(),
            ));
        }
        if !account.is_active {
            return Err(AppError::Validation(format!("account {} is inactive", account.id)));
        }
        if !account.can_cover(amount) {
            return Err(AppError::insufficient_funds(format!("account {}", account.id)));
        }
        Ok(())
    }

    /// Returns an error unless the account can receive money from an engine.
    pub(crate) fn ensure_can_receive(account: &Account) -> AppResult<()> {
        if account.account_type == AccountType::CreditCard {
            return Err(AppError::Validation(
                "credit card accounts cannot receive this movement".into(),
            ));
        }
        if !account.is_active {
            return Err(AppError::Validation(format!("account {} is inactive", account.id)));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
