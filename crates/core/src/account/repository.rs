//! Persistence contract for accounts.

use async_trait::async_trait;
use rust_decimal::Decimal;
use tally_shared::{
    AppResult,
    types::{AccountId, UserId},
};

use super::types::Account;

/// Account storage.
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Inserts a new account.
    async fn create(&self, account: Account) -> AppResult<Account>;

    /// Finds an account by ID.
    async fn get_by_id(&self, id: AccountId) -> AppResult<Option<Account>>;

    /// Lists all accounts of a user.
    async fn list_by_user(&self, user_id: UserId) -> AppResult<Vec<Account>>;

    /// Deletes an account.
    async fn delete(&self, id: AccountId) -> AppResult<()>;

    /// Applies `balance = balance + delta` as one atomic statement.
    ///
    /// The statement only matches when the account is a credit card or the
    /// resulting balance is non-negative. A non-match is reported as
    /// `NotFound` for a missing row, otherwise as insufficient funds.
    async fn adjust_balance(&self, id: AccountId, delta: Decimal) -> AppResult<Account>;

    /// Moves `amount` from one account to another inside one repository
    /// transaction. Either both legs apply or neither does.
    async fn transfer(
        &self,
        from: AccountId,
        to: AccountId,
        amount: Decimal,
    ) -> AppResult<(Account, Account)>;
}
