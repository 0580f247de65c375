//! In-memory repositories for engine tests.
//!
//! One [`InMemoryStore`] implements every repository trait. Any operation can
//! be made to fail by name (`"goals.adjust_current_amount"`), which is how the
//! compensation paths are exercised.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use tally_shared::{
    AppError, AppResult,
    types::{
        AccountId, BudgetId, CardTransactionId, CategoryId, ContributionId, CreditCardId, GoalId,
        InvestmentId, InvoiceId, MonthPeriod, MovementId, RecurringTransactionId, TransactionId,
        UserId,
    },
};

use crate::account::{Account, AccountRepository, AccountType, CreateAccountInput};
use crate::budget::{Budget, BudgetRepository};
use crate::category::ContentAddressedCategories;
use crate::clock::{Clock, FixedClock};
use crate::credit_card::{
    CardTransaction, CardTransactionRepository, CreditCard, CreditCardRepository, Invoice,
    InvoiceRepository, InvoiceStatus,
};
use crate::goal::{
    Contribution, ContributionRepository, Goal, GoalRepository, GoalStatus, GoalTransition,
};
use crate::investment::{Investment, InvestmentRepository};
use crate::recurring::{RecurringRepository, RecurringTransaction};
use crate::saga::{Compensation, MovementIntent, MovementJournal, MovementStatus};
use crate::services::{Repositories, Services};
use crate::transaction::{Transaction, TransactionRepository};
use crate::user::UserChecker;

#[derive(Default)]
struct State {
    users: HashSet<UserId>,
    accounts: HashMap<AccountId, Account>,
    transactions: HashMap<TransactionId, Transaction>,
    budgets: HashMap<BudgetId, Budget>,
    goals: HashMap<GoalId, Goal>,
    contributions: HashMap<ContributionId, Contribution>,
    investments: HashMap<InvestmentId, Investment>,
    cards: HashMap<CreditCardId, CreditCard>,
    invoices: HashMap<InvoiceId, Invoice>,
    charges: HashMap<CardTransactionId, CardTransaction>,
    recurring: HashMap<RecurringTransactionId, RecurringTransaction>,
    intents: HashMap<MovementId, MovementIntent>,
}

#[derive(Clone, Copy)]
enum Fault {
    Once,
    Always,
}

/// Repository set backed by hash maps.
#[derive(Default)]
pub(crate) struct InMemoryStore {
    state: Mutex<State>,
    faults: Mutex<HashMap<&'static str, Fault>>,
}

fn not_found(what: &str, id: impl std::fmt::Display) -> AppError {
    AppError::NotFound(format!("{what} {id}"))
}

impl InMemoryStore {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Registers a user.
    pub(crate) fn add_user(&self) -> UserId {
        let id = UserId::new();
        self.state.lock().unwrap().users.insert(id);
        id
    }

    /// Makes the next call of `op` fail.
    pub(crate) fn fail_once(&self, op: &'static str) {
        self.faults.lock().unwrap().insert(op, Fault::Once);
    }

    /// Makes every call of `op` fail.
    pub(crate) fn fail_always(&self, op: &'static str) {
        self.faults.lock().unwrap().insert(op, Fault::Always);
    }

    fn check(&self, op: &'static str) -> AppResult<()> {
        let mut faults = self.faults.lock().unwrap();
        match faults.get(op).copied() {
            Some(Fault::Once) => {
                faults.remove(op);
                Err(AppError::Database(format!("injected failure in {op}")))
            }
            Some(Fault::Always) => Err(AppError::Database(format!("injected failure in {op}"))),
            None => Ok(()),
        }
    }

    pub(crate) fn repositories(self: &Arc<Self>) -> Repositories {
        Repositories {
            accounts: Arc::clone(self) as Arc<dyn AccountRepository>,
            transactions: Arc::clone(self) as Arc<dyn TransactionRepository>,
            budgets: Arc::clone(self) as Arc<dyn BudgetRepository>,
            goals: Arc::clone(self) as Arc<dyn GoalRepository>,
            contributions: Arc::clone(self) as Arc<dyn ContributionRepository>,
            investments: Arc::clone(self) as Arc<dyn InvestmentRepository>,
            credit_cards: Arc::clone(self) as Arc<dyn CreditCardRepository>,
            invoices: Arc::clone(self) as Arc<dyn InvoiceRepository>,
            card_transactions: Arc::clone(self) as Arc<dyn CardTransactionRepository>,
            recurring: Arc::clone(self) as Arc<dyn RecurringRepository>,
            journal: Arc::clone(self) as Arc<dyn MovementJournal>,
            users: Arc::clone(self) as Arc<dyn UserChecker>,
        }
    }

    pub(crate) fn account(&self, id: AccountId) -> Account {
        self.state.lock().unwrap().accounts[&id].clone()
    }

    pub(crate) fn has_account(&self, id: AccountId) -> bool {
        self.state.lock().unwrap().accounts.contains_key(&id)
    }

    pub(crate) fn goal(&self, id: GoalId) -> Goal {
        self.state.lock().unwrap().goals[&id].clone()
    }

    pub(crate) fn contributions_of(&self, goal_id: GoalId) -> Vec<Contribution> {
        let state = self.state.lock().unwrap();
        state
            .contributions
            .values()
            .filter(|c| c.goal_id == goal_id)
            .cloned()
            .collect()
    }

    pub(crate) fn investment(&self, id: InvestmentId) -> Option<Investment> {
        self.state.lock().unwrap().investments.get(&id).cloned()
    }

    pub(crate) fn investment_count(&self) -> usize {
        self.state.lock().unwrap().investments.len()
    }

    pub(crate) fn card(&self, id: CreditCardId) -> Option<CreditCard> {
        self.state.lock().unwrap().cards.get(&id).cloned()
    }

    pub(crate) fn card_count(&self) -> usize {
        self.state.lock().unwrap().cards.len()
    }

    pub(crate) fn invoice(&self, id: InvoiceId) -> Invoice {
        self.state.lock().unwrap().invoices[&id].clone()
    }

    pub(crate) fn invoices_of(&self, card_id: CreditCardId) -> Vec<Invoice> {
        let state = self.state.lock().unwrap();
        state
            .invoices
            .values()
            .filter(|i| i.credit_card_id == card_id)
            .cloned()
            .collect()
    }

    pub(crate) fn charges_of(&self, card_id: CreditCardId) -> Vec<CardTransaction> {
        let state = self.state.lock().unwrap();
        state
            .charges
            .values()
            .filter(|c| c.credit_card_id == card_id)
            .cloned()
            .collect()
    }

    pub(crate) fn transactions(&self) -> Vec<Transaction> {
        self.state.lock().unwrap().transactions.values().cloned().collect()
    }

    pub(crate) fn recurring(&self, id: RecurringTransactionId) -> RecurringTransaction {
        self.state.lock().unwrap().recurring[&id].clone()
    }

    pub(crate) fn intents(&self) -> Vec<MovementIntent> {
        self.state.lock().unwrap().intents.values().cloned().collect()
    }

    /// Stores an intent as if a process had crashed while running it.
    pub(crate) fn insert_intent(&self, intent: MovementIntent) {
        self.state.lock().unwrap().intents.insert(intent.id, intent);
    }
}

#[async_trait]
impl UserChecker for InMemoryStore {
    async fn ensure_user_exists(&self, user_id: UserId) -> AppResult<()> {
        self.check("users.ensure_user_exists")?;
        if self.state.lock().unwrap().users.contains(&user_id) {
            Ok(())
        } else {
            Err(not_found("user", user_id))
        }
    }
}

#[async_trait]
impl AccountRepository for InMemoryStore {
    async fn create(&self, account: Account) -> AppResult<Account> {
        self.check("accounts.create")?;
        self.state.lock().unwrap().accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn get_by_id(&self, id: AccountId) -> AppResult<Option<Account>> {
        self.check("accounts.get_by_id")?;
        Ok(self.state.lock().unwrap().accounts.get(&id).cloned())
    }

    async fn list_by_user(&self, user_id: UserId) -> AppResult<Vec<Account>> {
        let state = self.state.lock().unwrap();
        Ok(state.accounts.values().filter(|a| a.user_id == user_id).cloned().collect())
    }

    async fn delete(&self, id: AccountId) -> AppResult<()> {
        self.check("accounts.delete")?;
        self.state.lock().unwrap().accounts.remove(&id);
        Ok(())
    }

    async fn adjust_balance(&self, id: AccountId, delta: Decimal) -> AppResult<Account> {
        self.check("accounts.adjust_balance")?;
        let mut state = self.state.lock().unwrap();
        let account = state.accounts.get_mut(&id).ok_or_else(|| not_found("account", id))?;
        if !account.accepts_delta(delta) {
            return Err(AppError::insufficient_funds(format!("account {id}")));
        }
        account.balance += delta;
        Ok(account.clone())
    }

    async fn transfer(
        &self,
        from: AccountId,
        to: AccountId,
        amount: Decimal,
    ) -> AppResult<(Account, Account)> {
        self.check("accounts.transfer")?;
        let mut state = self.state.lock().unwrap();
        let source = state.accounts.get(&from).ok_or_else(|| not_found("account", from))?;
        if !state.accounts.contains_key(&to) {
            return Err(not_found("account", to));
        }
        if !source.can_cover(amount) {
            return Err(AppError::insufficient_funds(format!("account {from}")));
        }
        let Some(source) = state.accounts.get_mut(&from) else {
            return Err(not_found("account", from));
        };
        source.balance -= amount;
        let source = source.clone();
        let Some(destination) = state.accounts.get_mut(&to) else {
            return Err(not_found("account", to));
        };
        destination.balance += amount;
        Ok((source, destination.clone()))
    }
}

#[async_trait]
impl TransactionRepository for InMemoryStore {
    async fn create(&self, transaction: Transaction) -> AppResult<Transaction> {
        self.check("transactions.create")?;
        self.state
            .lock()
            .unwrap()
            .transactions
            .insert(transaction.id, transaction.clone());
        Ok(transaction)
    }

    async fn get_by_id(&self, id: TransactionId) -> AppResult<Option<Transaction>> {
        Ok(self.state.lock().unwrap().transactions.get(&id).cloned())
    }

    async fn list_by_user(&self, user_id: UserId) -> AppResult<Vec<Transaction>> {
        let state = self.state.lock().unwrap();
        let mut list: Vec<_> = state
            .transactions
            .values()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect();
        list.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(list)
    }

    async fn list_by_investment(&self, investment_id: InvestmentId) -> AppResult<Vec<Transaction>> {
        self.check("transactions.list_by_investment")?;
        let state = self.state.lock().unwrap();
        Ok(state
            .transactions
            .values()
            .filter(|t| t.investment_id == Some(investment_id))
            .cloned()
            .collect())
    }

    async fn delete(&self, id: TransactionId) -> AppResult<()> {
        self.check("transactions.delete")?;
        self.state.lock().unwrap().transactions.remove(&id);
        Ok(())
    }

    async fn delete_by_investment(&self, investment_id: InvestmentId) -> AppResult<u64> {
        self.check("transactions.delete_by_investment")?;
        let mut state = self.state.lock().unwrap();
        let before = state.transactions.len();
        state
            .transactions
            .retain(|_, t| t.investment_id != Some(investment_id));
        Ok((before - state.transactions.len()) as u64)
    }
}

#[async_trait]
impl BudgetRepository for InMemoryStore {
    async fn create(&self, budget: Budget) -> AppResult<Budget> {
        self.check("budgets.create")?;
        let mut state = self.state.lock().unwrap();
        if state.budgets.values().any(|b| {
            b.user_id == budget.user_id
                && b.category_id == budget.category_id
                && b.period() == budget.period()
        }) {
            return Err(AppError::Conflict("budget period already exists".into()));
        }
        state.budgets.insert(budget.id, budget.clone());
        Ok(budget)
    }

    async fn get_by_id(&self, id: BudgetId) -> AppResult<Option<Budget>> {
        Ok(self.state.lock().unwrap().budgets.get(&id).cloned())
    }

    async fn find_for_period(
        &self,
        user_id: UserId,
        category_id: CategoryId,
        period: MonthPeriod,
    ) -> AppResult<Option<Budget>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .budgets
            .values()
            .find(|b| b.user_id == user_id && b.category_id == category_id && b.period() == period)
            .cloned())
    }

    async fn list_for_period(
        &self,
        user_id: UserId,
        period: MonthPeriod,
    ) -> AppResult<Vec<Budget>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .budgets
            .values()
            .filter(|b| b.user_id == user_id && b.period() == period)
            .cloned()
            .collect())
    }

    async fn update_limits(
        &self,
        id: BudgetId,
        amount: Decimal,
        alert_at: Decimal,
    ) -> AppResult<Budget> {
        let mut state = self.state.lock().unwrap();
        let budget = state.budgets.get_mut(&id).ok_or_else(|| not_found("budget", id))?;
        budget.amount = amount;
        budget.alert_at = alert_at;
        Ok(budget.clone())
    }

    async fn delete(&self, id: BudgetId) -> AppResult<()> {
        self.state.lock().unwrap().budgets.remove(&id);
        Ok(())
    }

    async fn adjust_spent(&self, id: BudgetId, delta: Decimal) -> AppResult<Budget> {
        self.check("budgets.adjust_spent")?;
        let mut state = self.state.lock().unwrap();
        let budget = state.budgets.get_mut(&id).ok_or_else(|| not_found("budget", id))?;
        budget.spent += delta;
        Ok(budget.clone())
    }
}

#[async_trait]
impl GoalRepository for InMemoryStore {
    async fn create(&self, goal: Goal) -> AppResult<Goal> {
        self.check("goals.create")?;
        self.state.lock().unwrap().goals.insert(goal.id, goal.clone());
        Ok(goal)
    }

    async fn get_by_id(&self, id: GoalId) -> AppResult<Option<Goal>> {
        Ok(self.state.lock().unwrap().goals.get(&id).cloned())
    }

    async fn list_by_user(&self, user_id: UserId) -> AppResult<Vec<Goal>> {
        let state = self.state.lock().unwrap();
        Ok(state.goals.values().filter(|g| g.user_id == user_id).cloned().collect())
    }

    async fn delete(&self, id: GoalId) -> AppResult<()> {
        let mut state = self.state.lock().unwrap();
        state.goals.remove(&id);
        state.contributions.retain(|_, c| c.goal_id != id);
        Ok(())
    }

    async fn adjust_current_amount(&self, id: GoalId, delta: Decimal) -> AppResult<Goal> {
        self.check("goals.adjust_current_amount")?;
        let mut state = self.state.lock().unwrap();
        let goal = state.goals.get_mut(&id).ok_or_else(|| not_found("goal", id))?;
        if goal.current_amount + delta < Decimal::ZERO {
            return Err(AppError::Validation(format!("goal {id} cannot go below zero")));
        }
        goal.current_amount += delta;
        Ok(goal.clone())
    }

    async fn apply_transition(
        &self,
        id: GoalId,
        transition: GoalTransition,
    ) -> AppResult<Option<Goal>> {
        self.check("goals.apply_transition")?;
        let mut state = self.state.lock().unwrap();
        let Some(goal) = state.goals.get_mut(&id) else {
            return Ok(None);
        };
        let reached = goal.current_amount >= goal.target_amount;
        match transition {
            GoalTransition::Complete { ended_at }
                if goal.status == GoalStatus::Active && reached =>
            {
                goal.status = GoalStatus::Completed;
                goal.ended_at = Some(ended_at);
            }
            GoalTransition::Reactivate if goal.status == GoalStatus::Completed && !reached => {
                goal.status = GoalStatus::Active;
                goal.ended_at = None;
            }
            _ => return Ok(None),
        }
        Ok(Some(goal.clone()))
    }
}

#[async_trait]
impl ContributionRepository for InMemoryStore {
    async fn create(&self, contribution: Contribution) -> AppResult<Contribution> {
        self.check("contributions.create")?;
        self.state
            .lock()
            .unwrap()
            .contributions
            .insert(contribution.id, contribution.clone());
        Ok(contribution)
    }

    async fn delete(&self, id: ContributionId) -> AppResult<()> {
        self.check("contributions.delete")?;
        self.state.lock().unwrap().contributions.remove(&id);
        Ok(())
    }

    async fn list_by_goal(&self, goal_id: GoalId) -> AppResult<Vec<Contribution>> {
        let mut list = self.contributions_of(goal_id);
        list.sort_by_key(|c| c.created_at);
        Ok(list)
    }
}

#[async_trait]
impl InvestmentRepository for InMemoryStore {
    async fn create(&self, investment: Investment) -> AppResult<Investment> {
        self.check("investments.create")?;
        self.state
            .lock()
            .unwrap()
            .investments
            .insert(investment.id, investment.clone());
        Ok(investment)
    }

    async fn get_by_id(&self, id: InvestmentId) -> AppResult<Option<Investment>> {
        Ok(self.investment(id))
    }

    async fn list_by_user(&self, user_id: UserId) -> AppResult<Vec<Investment>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .investments
            .values()
            .filter(|i| i.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn delete(&self, id: InvestmentId) -> AppResult<()> {
        self.check("investments.delete")?;
        self.state.lock().unwrap().investments.remove(&id);
        Ok(())
    }

    async fn adjust_balance(&self, id: InvestmentId, delta: Decimal) -> AppResult<Investment> {
        self.check("investments.adjust_balance")?;
        let mut state = self.state.lock().unwrap();
        let investment = state
            .investments
            .get_mut(&id)
            .ok_or_else(|| not_found("investment", id))?;
        if investment.current_balance + delta < Decimal::ZERO {
            return Err(AppError::insufficient_funds(format!("investment {id}")));
        }
        investment.current_balance += delta;
        Ok(investment.clone())
    }

    async fn set_returns(
        &self,
        id: InvestmentId,
        return_balance: Decimal,
        return_rate: Decimal,
    ) -> AppResult<Investment> {
        self.check("investments.set_returns")?;
        let mut state = self.state.lock().unwrap();
        let investment = state
            .investments
            .get_mut(&id)
            .ok_or_else(|| not_found("investment", id))?;
        investment.return_balance = return_balance;
        investment.return_rate = return_rate;
        Ok(investment.clone())
    }
}

#[async_trait]
impl CreditCardRepository for InMemoryStore {
    async fn create(&self, card: CreditCard) -> AppResult<CreditCard> {
        self.check("cards.create")?;
        let mut state = self.state.lock().unwrap();
        if state.cards.values().any(|c| c.account_id == card.account_id) {
            return Err(AppError::Conflict("account already linked to a card".into()));
        }
        state.cards.insert(card.id, card.clone());
        Ok(card)
    }

    async fn get_by_id(&self, id: CreditCardId) -> AppResult<Option<CreditCard>> {
        Ok(self.card(id))
    }

    async fn get_by_account(&self, account_id: AccountId) -> AppResult<Option<CreditCard>> {
        let state = self.state.lock().unwrap();
        Ok(state.cards.values().find(|c| c.account_id == account_id).cloned())
    }

    async fn list_by_user(&self, user_id: UserId) -> AppResult<Vec<CreditCard>> {
        let state = self.state.lock().unwrap();
        Ok(state.cards.values().filter(|c| c.user_id == user_id).cloned().collect())
    }

    async fn delete(&self, id: CreditCardId) -> AppResult<()> {
        self.check("cards.delete")?;
        let mut state = self.state.lock().unwrap();
        state.cards.remove(&id);
        state.invoices.retain(|_, i| i.credit_card_id != id);
        state.charges.retain(|_, c| c.credit_card_id != id);
        Ok(())
    }

    async fn adjust_available_limit(
        &self,
        id: CreditCardId,
        delta: Decimal,
    ) -> AppResult<CreditCard> {
        self.check("cards.adjust_available_limit")?;
        let mut state = self.state.lock().unwrap();
        let card = state.cards.get_mut(&id).ok_or_else(|| not_found("credit card", id))?;
        let next = card.available_limit + delta;
        if next < Decimal::ZERO || next > card.credit_limit {
            return Err(AppError::Validation(format!(
                "insufficient available limit on credit card {id}"
            )));
        }
        card.available_limit = next;
        Ok(card.clone())
    }
}

#[async_trait]
impl InvoiceRepository for InMemoryStore {
    async fn create(&self, invoice: Invoice) -> AppResult<Invoice> {
        self.check("invoices.create")?;
        let mut state = self.state.lock().unwrap();
        if state
            .invoices
            .values()
            .any(|i| i.credit_card_id == invoice.credit_card_id && i.period() == invoice.period())
        {
            return Err(AppError::Conflict("invoice period already exists".into()));
        }
        state.invoices.insert(invoice.id, invoice.clone());
        Ok(invoice)
    }

    async fn get_by_id(&self, id: InvoiceId) -> AppResult<Option<Invoice>> {
        Ok(self.state.lock().unwrap().invoices.get(&id).cloned())
    }

    async fn find_by_period(
        &self,
        credit_card_id: CreditCardId,
        period: MonthPeriod,
    ) -> AppResult<Option<Invoice>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .invoices
            .values()
            .find(|i| i.credit_card_id == credit_card_id && i.period() == period)
            .cloned())
    }

    async fn list_by_card(&self, credit_card_id: CreditCardId) -> AppResult<Vec<Invoice>> {
        let mut list = self.invoices_of(credit_card_id);
        list.sort_by_key(|i| std::cmp::Reverse(i.period()));
        Ok(list)
    }

    async fn adjust_total(&self, id: InvoiceId, delta: Decimal) -> AppResult<Invoice> {
        self.check("invoices.adjust_total")?;
        let mut state = self.state.lock().unwrap();
        let invoice = state.invoices.get_mut(&id).ok_or_else(|| not_found("invoice", id))?;
        invoice.total_amount += delta;
        if matches!(invoice.status, InvoiceStatus::Partial | InvoiceStatus::Paid) {
            if invoice.paid_amount >= invoice.total_amount {
                invoice.status = InvoiceStatus::Paid;
            } else {
                invoice.status = InvoiceStatus::Partial;
                invoice.paid_at = None;
            }
        }
        Ok(invoice.clone())
    }

    async fn apply_payment(
        &self,
        id: InvoiceId,
        amount: Decimal,
        paid_at: DateTime<Utc>,
    ) -> AppResult<Invoice> {
        self.check("invoices.apply_payment")?;
        let mut state = self.state.lock().unwrap();
        let invoice = state.invoices.get_mut(&id).ok_or_else(|| not_found("invoice", id))?;
        if invoice.status == InvoiceStatus::Paid
            || invoice.paid_amount + amount > invoice.total_amount
        {
            return Err(AppError::Validation(format!("invoice {id} cannot take this payment")));
        }
        invoice.paid_amount += amount;
        invoice.status = if invoice.paid_amount >= invoice.total_amount {
            InvoiceStatus::Paid
        } else {
            InvoiceStatus::Partial
        };
        if invoice.status == InvoiceStatus::Paid {
            invoice.paid_at = Some(paid_at);
        }
        Ok(invoice.clone())
    }

    async fn revert_payment(
        &self,
        id: InvoiceId,
        amount: Decimal,
        previous_status: InvoiceStatus,
    ) -> AppResult<Invoice> {
        self.check("invoices.revert_payment")?;
        let mut state = self.state.lock().unwrap();
        let invoice = state.invoices.get_mut(&id).ok_or_else(|| not_found("invoice", id))?;
        invoice.paid_amount -= amount;
        invoice.status = previous_status;
        invoice.paid_at = None;
        Ok(invoice.clone())
    }
}

#[async_trait]
impl CardTransactionRepository for InMemoryStore {
    async fn create(&self, charge: CardTransaction) -> AppResult<CardTransaction> {
        self.check("charges.create")?;
        self.state.lock().unwrap().charges.insert(charge.id, charge.clone());
        Ok(charge)
    }

    async fn delete(&self, id: CardTransactionId) -> AppResult<()> {
        self.check("charges.delete")?;
        self.state.lock().unwrap().charges.remove(&id);
        Ok(())
    }

    async fn list_by_invoice(&self, invoice_id: InvoiceId) -> AppResult<Vec<CardTransaction>> {
        let state = self.state.lock().unwrap();
        let mut list: Vec<_> = state
            .charges
            .values()
            .filter(|c| c.invoice_id == invoice_id)
            .cloned()
            .collect();
        list.sort_by_key(|c| c.created_at);
        Ok(list)
    }
}

#[async_trait]
impl RecurringRepository for InMemoryStore {
    async fn create(&self, recurring: RecurringTransaction) -> AppResult<RecurringTransaction> {
        self.state
            .lock()
            .unwrap()
            .recurring
            .insert(recurring.id, recurring.clone());
        Ok(recurring)
    }

    async fn get_by_id(
        &self,
        id: RecurringTransactionId,
    ) -> AppResult<Option<RecurringTransaction>> {
        Ok(self.state.lock().unwrap().recurring.get(&id).cloned())
    }

    async fn list_by_user(&self, user_id: UserId) -> AppResult<Vec<RecurringTransaction>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .recurring
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn list_due(&self, today: NaiveDate) -> AppResult<Vec<RecurringTransaction>> {
        let state = self.state.lock().unwrap();
        let mut list: Vec<_> = state
            .recurring
            .values()
            .filter(|r| r.is_active && r.next_due <= today)
            .cloned()
            .collect();
        list.sort_by_key(|r| r.next_due);
        Ok(list)
    }

    async fn advance(
        &self,
        id: RecurringTransactionId,
        last_processed: NaiveDate,
        next_due: NaiveDate,
        is_active: bool,
    ) -> AppResult<RecurringTransaction> {
        self.check("recurring.advance")?;
        let mut state = self.state.lock().unwrap();
        let recurring = state
            .recurring
            .get_mut(&id)
            .ok_or_else(|| not_found("recurring transaction", id))?;
        recurring.last_processed = Some(last_processed);
        recurring.next_due = next_due;
        recurring.is_active = is_active;
        Ok(recurring.clone())
    }

    async fn set_active(
        &self,
        id: RecurringTransactionId,
        is_active: bool,
    ) -> AppResult<RecurringTransaction> {
        let mut state = self.state.lock().unwrap();
        let recurring = state
            .recurring
            .get_mut(&id)
            .ok_or_else(|| not_found("recurring transaction", id))?;
        recurring.is_active = is_active;
        Ok(recurring.clone())
    }

    async fn delete(&self, id: RecurringTransactionId) -> AppResult<()> {
        self.state.lock().unwrap().recurring.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl MovementJournal for InMemoryStore {
    async fn create(&self, intent: MovementIntent) -> AppResult<MovementIntent> {
        self.check("journal.create")?;
        self.state.lock().unwrap().intents.insert(intent.id, intent.clone());
        Ok(intent)
    }

    async fn get_by_id(&self, id: MovementId) -> AppResult<Option<MovementIntent>> {
        Ok(self.state.lock().unwrap().intents.get(&id).cloned())
    }

    async fn mark_step(&self, id: MovementId, step: Option<String>) -> AppResult<()> {
        self.check("journal.mark_step")?;
        let mut state = self.state.lock().unwrap();
        let intent = state.intents.get_mut(&id).ok_or_else(|| not_found("movement", id))?;
        intent.in_flight_step = step;
        Ok(())
    }

    async fn record_compensation(
        &self,
        id: MovementId,
        compensation: Compensation,
    ) -> AppResult<()> {
        self.check("journal.record_compensation")?;
        let mut state = self.state.lock().unwrap();
        let intent = state.intents.get_mut(&id).ok_or_else(|| not_found("movement", id))?;
        intent.compensations.push(compensation);
        intent.in_flight_step = None;
        Ok(())
    }

    async fn discard_compensation(&self, id: MovementId, index: usize) -> AppResult<()> {
        self.check("journal.discard_compensation")?;
        let mut state = self.state.lock().unwrap();
        let intent = state.intents.get_mut(&id).ok_or_else(|| not_found("movement", id))?;
        if index < intent.compensations.len() {
            intent.compensations.remove(index);
        }
        intent.in_flight_step = None;
        Ok(())
    }

    async fn finish(
        &self,
        id: MovementId,
        status: MovementStatus,
        error: Option<String>,
    ) -> AppResult<()> {
        self.check("journal.finish")?;
        let mut state = self.state.lock().unwrap();
        let intent = state.intents.get_mut(&id).ok_or_else(|| not_found("movement", id))?;
        intent.status = status;
        intent.error = error;
        intent.in_flight_step = None;
        Ok(())
    }

    async fn list_pending(&self, started_before: DateTime<Utc>) -> AppResult<Vec<MovementIntent>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .intents
            .values()
            .filter(|i| i.status == MovementStatus::Pending && i.created_at < started_before)
            .cloned()
            .collect())
    }
}

/// Engines wired over an [`InMemoryStore`] with a pinned clock and one user.
pub(crate) struct Harness {
    pub store: Arc<InMemoryStore>,
    pub clock: Arc<FixedClock>,
    pub services: Services,
    pub user: UserId,
}

impl Harness {
    /// Clock pinned to 2024-01-20.
    pub(crate) fn new() -> Self {
        Self::at(NaiveDate::from_ymd_opt(2024, 1, 20).unwrap())
    }

    pub(crate) fn at(today: NaiveDate) -> Self {
        let store = InMemoryStore::new();
        let clock = Arc::new(FixedClock::at_date(today));
        let services = Services::new(
            &store.repositories(),
            Arc::clone(&clock) as Arc<dyn Clock>,
            Arc::new(ContentAddressedCategories),
        );
        let user = store.add_user();
        Self {
            store,
            clock,
            services,
            user,
        }
    }

    pub(crate) async fn account_of(
        &self,
        user: UserId,
        kind: AccountType,
        balance: Decimal,
    ) -> Account {
        self.services
            .accounts
            .create_account(CreateAccountInput {
                user_id: user,
                name: format!("{kind} account"),
                account_type: kind,
                opening_balance: balance,
                include_in_total: true,
            })
            .await
            .unwrap()
    }

    /// A checking account of the harness user.
    pub(crate) async fn checking(&self, balance: Decimal) -> Account {
        self.account_of(self.user, AccountType::Checking, balance).await
    }

    pub(crate) fn today(&self) -> NaiveDate {
        self.clock.today()
    }
}
