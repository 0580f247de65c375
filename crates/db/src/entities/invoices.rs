//! `SeaORM` Entity for the invoices table.

use super::sea_orm_active_enums::InvoiceStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "invoices")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub credit_card_id: Uuid,
    pub reference_month: i32,
    pub reference_year: i32,
    pub opening_date: Date,
    pub closing_date: Date,
    pub due_date: Date,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub total_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub paid_amount: Decimal,
    pub status: InvoiceStatus,
    pub paid_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::credit_cards::Entity",
        from = "Column::CreditCardId",
        to = "super::credit_cards::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    CreditCards,
    #[sea_orm(has_many = "super::credit_card_transactions::Entity")]
    CreditCardTransactions,
}

impl Related<super::credit_cards::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CreditCards.def()
    }
}

impl Related<super::credit_card_transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CreditCardTransactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
