//! `SeaORM` Entity for the investments table.

use super::sea_orm_active_enums::InvestmentType;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "investments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub investment_type: InvestmentType,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub current_balance: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub return_balance: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 4)))")]
    pub return_rate: Decimal,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::transactions::Entity")]
    Transactions,
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
