//! `SeaORM` Entity for the credit_cards table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "credit_cards")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    #[sea_orm(unique)]
    pub account_id: Uuid,
    pub name: String,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub credit_limit: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub available_limit: Decimal,
    pub closing_day: i32,
    pub due_day: i32,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::invoices::Entity")]
    Invoices,
    #[sea_orm(has_many = "super::credit_card_transactions::Entity")]
    CreditCardTransactions,
}

impl Related<super::invoices::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Invoices.def()
    }
}

impl Related<super::credit_card_transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CreditCardTransactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
