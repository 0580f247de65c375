//! Composition root.
//!
//! Storage adapters hand over a [`Repositories`] set; [`Services::new`] wires
//! every engine on top of it.

use std::sync::Arc;

use crate::account::{AccountRepository, AccountService};
use crate::budget::{BudgetRepository, BudgetService};
use crate::category::DefaultCategoryResolver;
use crate::clock::Clock;
use crate::credit_card::{
    CardTransactionRepository, CreditCardRepository, CreditCardService, InvoiceRepository,
};
use crate::goal::{ContributionRepository, GoalRepository, GoalService};
use crate::investment::{InvestmentRepository, InvestmentService};
use crate::recurring::{RecurringRepository, RecurringService};
use crate::saga::{Compensator, MovementJournal, SagaCoordinator};
use crate::transaction::{TransactionRepository, TransactionService};
use crate::user::UserChecker;

/// Every repository the engines need.
#[derive(Clone)]
pub struct Repositories {
    /// Accounts.
    pub accounts: Arc<dyn AccountRepository>,
    /// Transaction log.
    pub transactions: Arc<dyn TransactionRepository>,
    /// Budgets.
    pub budgets: Arc<dyn BudgetRepository>,
    /// Goals.
    pub goals: Arc<dyn GoalRepository>,
    /// Goal contributions.
    pub contributions: Arc<dyn ContributionRepository>,
    /// Investments.
    pub investments: Arc<dyn InvestmentRepository>,
    /// Credit cards.
    pub credit_cards: Arc<dyn CreditCardRepository>,
    /// Invoices.
    pub invoices: Arc<dyn InvoiceRepository>,
    /// Card charges.
    pub card_transactions: Arc<dyn CardTransactionRepository>,
    /// Recurring definitions.
    pub recurring: Arc<dyn RecurringRepository>,
    /// Movement journal.
    pub journal: Arc<dyn MovementJournal>,
    /// User existence checks.
    pub users: Arc<dyn UserChecker>,
}

/// All engines, wired.
#[derive(Clone)]
pub struct Services {
    /// Account ledger.
    pub accounts: Arc<AccountService>,
    /// Budget spend tracker.
    pub budgets: Arc<BudgetService>,
    /// Plain income/expense orchestration.
    pub transactions: Arc<TransactionService>,
    /// Goal engine.
    pub goals: Arc<GoalService>,
    /// Investment engine.
    pub investments: Arc<InvestmentService>,
    /// Credit card engine.
    pub credit_cards: Arc<CreditCardService>,
    /// Recurring scheduler.
    pub recurring: Arc<RecurringService>,
    /// Movement coordinator, also used for reconciliation.
    pub sagas: Arc<SagaCoordinator>,
}

impl Services {
    /// Wires the engines over `repos`.
    pub fn new(
        repos: &Repositories,
        clock: Arc<dyn Clock>,
        categories: Arc<dyn DefaultCategoryResolver>,
    ) -> Self {
        let compensator = Arc::new(Compensator::new(repos, Arc::clone(&clock)));
        let sagas = Arc::new(SagaCoordinator::new(
            Arc::clone(&repos.journal),
            compensator,
            Arc::clone(&clock),
        ));

        let accounts = Arc::new(AccountService::new(
            Arc::clone(&repos.accounts),
            Arc::clone(&repos.users),
            Arc::clone(&clock),
        ));
        let budgets = Arc::new(BudgetService::new(
            Arc::clone(&repos.budgets),
            Arc::clone(&repos.users),
            Arc::clone(&clock),
        ));
        let transactions = Arc::new(TransactionService::new(
            Arc::clone(&repos.transactions),
            Arc::clone(&accounts),
            Arc::clone(&budgets),
            Arc::clone(&sagas),
            Arc::clone(&categories),
            Arc::clone(&repos.users),
            Arc::clone(&clock),
        ));
        let goals = Arc::new(GoalService::new(
            Arc::clone(&repos.goals),
            Arc::clone(&repos.contributions),
            Arc::clone(&accounts),
            Arc::clone(&sagas),
            Arc::clone(&repos.users),
            Arc::clone(&clock),
        ));
        let investments = Arc::new(InvestmentService::new(
            Arc::clone(&repos.investments),
            Arc::clone(&repos.transactions),
            Arc::clone(&accounts),
            Arc::clone(&sagas),
            Arc::clone(&categories),
            Arc::clone(&repos.users),
            Arc::clone(&clock),
        ));
        let credit_cards = Arc::new(CreditCardService::new(
            Arc::clone(&repos.credit_cards),
            Arc::clone(&repos.invoices),
            Arc::clone(&repos.card_transactions),
            Arc::clone(&repos.transactions),
            Arc::clone(&accounts),
            Arc::clone(&sagas),
            categories,
            Arc::clone(&repos.users),
            Arc::clone(&clock),
        ));
        let recurring = Arc::new(RecurringService::new(
            Arc::clone(&repos.recurring),
            Arc::clone(&transactions),
            Arc::clone(&accounts),
            Arc::clone(&repos.users),
            clock,
        ));

        Self {
            accounts,
            budgets,
            transactions,
            goals,
            investments,
            credit_cards,
            recurring,
            sagas,
        }
    }
}
