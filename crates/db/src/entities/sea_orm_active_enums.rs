//! `SeaORM` active enums backed by Postgres enum types.
//!
//! Each enum converts to and from its `tally-core` counterpart.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use tally_core::{
    account::AccountType as CoreAccountType,
    credit_card::InvoiceStatus as CoreInvoiceStatus,
    goal::{ContributionType as CoreContributionType, GoalStatus as CoreGoalStatus},
    investment::InvestmentType as CoreInvestmentType,
    recurring::Frequency as CoreFrequency,
    saga::{MovementKind as CoreMovementKind, MovementStatus as CoreMovementStatus},
    transaction::TransactionType as CoreTransactionType,
};

macro_rules! mirror_enum {
    ($db:ident => $domain:ident { $($variant:ident),+ $(,)? }) => {
        impl From<$db> for $domain {
            fn from(value: $db) -> Self {
                match value {
                    $($db::$variant => Self::$variant,)+
                }
            }
        }

        impl From<$domain> for $db {
            fn from(value: $domain) -> Self {
                match value {
                    $($domain::$variant => Self::$variant,)+
                }
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "account_type")]
pub enum AccountType {
    #[sea_orm(string_value = "checking")]
    Checking,
    #[sea_orm(string_value = "savings")]
    Savings,
    #[sea_orm(string_value = "cash")]
    Cash,
    #[sea_orm(string_value = "investment")]
    Investment,
    #[sea_orm(string_value = "credit_card")]
    CreditCard,
    #[sea_orm(string_value = "other")]
    Other,
}

mirror_enum!(AccountType => CoreAccountType {
    Checking, Savings, Cash, Investment, CreditCard, Other
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "transaction_type")]
pub enum TransactionType {
    #[sea_orm(string_value = "RECEIPT")]
    Receipt,
    #[sea_orm(string_value = "EXPENSE")]
    Expense,
    #[sea_orm(string_value = "INVESTMENT")]
    Investment,
    #[sea_orm(string_value = "WITHDRAW")]
    Withdraw,
}

mirror_enum!(TransactionType => CoreTransactionType {
    Receipt, Expense, Investment, Withdraw
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "goal_status")]
pub enum GoalStatus {
    #[sea_orm(string_value = "ACTIVE")]
    Active,
    #[sea_orm(string_value = "COMPLETED")]
    Completed,
}

mirror_enum!(GoalStatus => CoreGoalStatus { Active, Completed });

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "contribution_type")]
pub enum ContributionType {
    #[sea_orm(string_value = "DEPOSIT")]
    Deposit,
    #[sea_orm(string_value = "WITHDRAW")]
    Withdraw,
}

mirror_enum!(ContributionType => CoreContributionType { Deposit, Withdraw });

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "investment_type")]
pub enum InvestmentType {
    #[sea_orm(string_value = "fixed_income")]
    FixedIncome,
    #[sea_orm(string_value = "stocks")]
    Stocks,
    #[sea_orm(string_value = "funds")]
    Funds,
    #[sea_orm(string_value = "real_estate")]
    RealEstate,
    #[sea_orm(string_value = "crypto")]
    Crypto,
    #[sea_orm(string_value = "other")]
    Other,
}

mirror_enum!(InvestmentType => CoreInvestmentType {
    FixedIncome, Stocks, Funds, RealEstate, Crypto, Other
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "invoice_status")]
pub enum InvoiceStatus {
    #[sea_orm(string_value = "OPEN")]
    Open,
    #[sea_orm(string_value = "CLOSED")]
    Closed,
    #[sea_orm(string_value = "PARTIAL")]
    Partial,
    #[sea_orm(string_value = "PAID")]
    Paid,
    #[sea_orm(string_value = "OVERDUE")]
    Overdue,
}

mirror_enum!(InvoiceStatus => CoreInvoiceStatus {
    Open, Closed, Partial, Paid, Overdue
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "recurring_frequency")]
pub enum Frequency {
    #[sea_orm(string_value = "DAILY")]
    Daily,
    #[sea_orm(string_value = "WEEKLY")]
    Weekly,
    #[sea_orm(string_value = "MONTHLY")]
    Monthly,
    #[sea_orm(string_value = "YEARLY")]
    Yearly,
}

mirror_enum!(Frequency => CoreFrequency { Daily, Weekly, Monthly, Yearly });

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "movement_kind")]
pub enum MovementKind {
    #[sea_orm(string_value = "transaction_create")]
    TransactionCreate,
    #[sea_orm(string_value = "transaction_delete")]
    TransactionDelete,
    #[sea_orm(string_value = "goal_contribution")]
    GoalContribution,
    #[sea_orm(string_value = "goal_withdrawal")]
    GoalWithdrawal,
    #[sea_orm(string_value = "investment_create")]
    InvestmentCreate,
    #[sea_orm(string_value = "investment_contribution")]
    InvestmentContribution,
    #[sea_orm(string_value = "investment_withdrawal")]
    InvestmentWithdrawal,
    #[sea_orm(string_value = "card_create")]
    CardCreate,
    #[sea_orm(string_value = "card_charge")]
    CardCharge,
    #[sea_orm(string_value = "invoice_payment")]
    InvoicePayment,
}

mirror_enum!(MovementKind => CoreMovementKind {
    TransactionCreate,
    TransactionDelete,
    GoalContribution,
    GoalWithdrawal,
    InvestmentCreate,
    InvestmentContribution,
    InvestmentWithdrawal,
    CardCreate,
    CardCharge,
    InvoicePayment,
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "movement_status")]
pub enum MovementStatus {
    #[sea_orm(string_value = "PENDING")]
    Pending,
    #[sea_orm(string_value = "COMPLETED")]
    Completed,
    #[sea_orm(string_value = "COMPENSATED")]
    Compensated,
    #[sea_orm(string_value = "FAILED")]
    Failed,
}

mirror_enum!(MovementStatus => CoreMovementStatus {
    Pending, Completed, Compensated, Failed
});
