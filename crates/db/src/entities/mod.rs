//! `SeaORM` entity definitions.

pub mod accounts;
pub mod budgets;
pub mod credit_card_transactions;
pub mod credit_cards;
pub mod goal_contributions;
pub mod goals;
pub mod investments;
pub mod invoices;
pub mod movement_intents;
pub mod recurring_transactions;
pub mod sea_orm_active_enums;
pub mod transactions;
pub mod users;
