//! Credit card, invoice and charge repositories.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
    prelude::DateTimeWithTimeZone,
    sea_query::{Expr, SimpleExpr},
};
use tally_core::credit_card::{self, CardTransaction, CreditCard, Invoice};
use tally_shared::{
    AppError, AppResult,
    types::{
        AccountId, CardTransactionId, CategoryId, CreditCardId, InvoiceId, MonthPeriod, UserId,
    },
};

use super::{enum_value, not_found, utc};
use crate::entities::{
    credit_card_transactions, credit_cards, invoices, sea_orm_active_enums::InvoiceStatus,
};
use crate::error::db_err;

impl From<credit_cards::Model> for CreditCard {
    fn from(model: credit_cards::Model) -> Self {
        Self {
            id: CreditCardId::from_uuid(model.id),
            user_id: UserId::from_uuid(model.user_id),
            account_id: AccountId::from_uuid(model.account_id),
            name: model.name,
            credit_limit: model.credit_limit,
            available_limit: model.available_limit,
            closing_day: model.closing_day.unsigned_abs(),
            due_day: model.due_day.unsigned_abs(),
            is_active: model.is_active,
            created_at: utc(model.created_at),
            updated_at: utc(model.updated_at),
        }
    }
}

impl From<CreditCard> for credit_cards::ActiveModel {
    fn from(card: CreditCard) -> Self {
        Self {
            id: Set(card.id.into_inner()),
            user_id: Set(card.user_id.into_inner()),
            account_id: Set(card.account_id.into_inner()),
            name: Set(card.name),
            credit_limit: Set(card.credit_limit),
            available_limit: Set(card.available_limit),
            closing_day: Set(card.closing_day.cast_signed()),
            due_day: Set(card.due_day.cast_signed()),
            is_active: Set(card.is_active),
            created_at: Set(card.created_at.into()),
            updated_at: Set(card.updated_at.into()),
        }
    }
}

impl From<invoices::Model> for Invoice {
    fn from(model: invoices::Model) -> Self {
        Self {
            id: InvoiceId::from_uuid(model.id),
            credit_card_id: CreditCardId::from_uuid(model.credit_card_id),
            reference_month: model.reference_month.unsigned_abs(),
            reference_year: model.reference_year,
            opening_date: model.opening_date,
            closing_date: model.closing_date,
            due_date: model.due_date,
            total_amount: model.total_amount,
            paid_amount: model.paid_amount,
            status: model.status.into(),
            paid_at: model.paid_at.map(utc),
            created_at: utc(model.created_at),
            updated_at: utc(model.updated_at),
        }
    }
}

impl From<Invoice> for invoices::ActiveModel {
    fn from(invoice: Invoice) -> Self {
        Self {
            id: Set(invoice.id.into_inner()),
            credit_card_id: Set(invoice.credit_card_id.into_inner()),
            reference_month: Set(invoice.reference_month.cast_signed()),
            reference_year: Set(invoice.reference_year),
            opening_date: Set(invoice.opening_date),
            closing_date: Set(invoice.closing_date),
            due_date: Set(invoice.due_date),
            total_amount: Set(invoice.total_amount),
            paid_amount: Set(invoice.paid_amount),
            status: Set(invoice.status.into()),
            paid_at: Set(invoice.paid_at.map(Into::into)),
            created_at: Set(invoice.created_at.into()),
            updated_at: Set(invoice.updated_at.into()),
        }
    }
}

impl From<credit_card_transactions::Model> for CardTransaction {
    fn from(model: credit_card_transactions::Model) -> Self {
        Self {
            id: CardTransactionId::from_uuid(model.id),
            credit_card_id: CreditCardId::from_uuid(model.credit_card_id),
            invoice_id: InvoiceId::from_uuid(model.invoice_id),
            user_id: UserId::from_uuid(model.user_id),
            category_id: CategoryId::from_uuid(model.category_id),
            amount: model.amount,
            date: model.date,
            description: model.description,
            created_at: utc(model.created_at),
        }
    }
}

impl From<CardTransaction> for credit_card_transactions::ActiveModel {
    fn from(charge: CardTransaction) -> Self {
        Self {
            id: Set(charge.id.into_inner()),
            credit_card_id: Set(charge.credit_card_id.into_inner()),
            invoice_id: Set(charge.invoice_id.into_inner()),
            user_id: Set(charge.user_id.into_inner()),
            category_id: Set(charge.category_id.into_inner()),
            amount: Set(charge.amount),
            date: Set(charge.date),
            description: Set(charge.description),
            created_at: Set(charge.created_at.into()),
        }
    }
}

/// Credit card repository backed by the `credit_cards` table.
#[derive(Debug, Clone)]
pub struct CreditCardRepository {
    db: DatabaseConnection,
}

impl CreditCardRepository {
    /// Creates a new credit card repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn find(&self, id: CreditCardId) -> AppResult<Option<credit_cards::Model>> {
        credit_cards::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(db_err)
    }
}

#[async_trait]
impl credit_card::CreditCardRepository for CreditCardRepository {
    async fn create(&self, card: CreditCard) -> AppResult<CreditCard> {
        // uq_credit_cards_account surfaces as Conflict
        let model = credit_cards::ActiveModel::from(card)
            .insert(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.into())
    }

    async fn get_by_id(&self, id: CreditCardId) -> AppResult<Option<CreditCard>> {
        Ok(self.find(id).await?.map(Into::into))
    }

    async fn get_by_account(&self, account_id: AccountId) -> AppResult<Option<CreditCard>> {
        let model = credit_cards::Entity::find()
            .filter(credit_cards::Column::AccountId.eq(account_id.into_inner()))
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(Into::into))
    }

    async fn list_by_user(&self, user_id: UserId) -> AppResult<Vec<CreditCard>> {
        let models = credit_cards::Entity::find()
            .filter(credit_cards::Column::UserId.eq(user_id.into_inner()))
            .order_by_asc(credit_cards::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn delete(&self, id: CreditCardId) -> AppResult<()> {
        // invoices and charges go with the card (ON DELETE CASCADE)
        credit_cards::Entity::delete_by_id(id.into_inner())
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn adjust_available_limit(
        &self,
        id: CreditCardId,
        delta: Decimal,
    ) -> AppResult<CreditCard> {
        let updated = credit_cards::Entity::update_many()
            .col_expr(
                credit_cards::Column::AvailableLimit,
                Expr::col(credit_cards::Column::AvailableLimit).add(delta),
            )
            .filter(credit_cards::Column::Id.eq(id.into_inner()))
            .filter(credit_cards::Column::AvailableLimit.gte(-delta))
            .filter(
                Expr::expr(Expr::col(credit_cards::Column::AvailableLimit).add(delta))
                    .lte(Expr::col(credit_cards::Column::CreditLimit)),
            )
            .exec_with_returning(&self.db)
            .await
            .map_err(db_err)?;
        if let Some(model) = updated.into_iter().next() {
            return Ok(model.into());
        }
        match self.find(id).await? {
            Some(_) => Err(AppError::Validation(format!(
                "insufficient available limit on credit card {id}"
            ))),
            None => Err(not_found("credit card", id)),
        }
    }
}

/// `paid_at = NULL`
fn no_paid_at() -> SimpleExpr {
    Expr::value(Option::<DateTimeWithTimeZone>::None)
}

/// Invoice repository backed by the `invoices` table.
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    db: DatabaseConnection,
}

impl InvoiceRepository {
    /// Creates a new invoice repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn find(&self, id: InvoiceId) -> AppResult<Option<invoices::Model>> {
        invoices::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(db_err)
    }
}

#[async_trait]
impl credit_card::InvoiceRepository for InvoiceRepository {
    async fn create(&self, invoice: Invoice) -> AppResult<Invoice> {
        // uq_invoices_period surfaces as Conflict
        let model = invoices::ActiveModel::from(invoice)
            .insert(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.into())
    }

    async fn get_by_id(&self, id: InvoiceId) -> AppResult<Option<Invoice>> {
        Ok(self.find(id).await?.map(Into::into))
    }

    async fn find_by_period(
        &self,
        credit_card_id: CreditCardId,
        period: MonthPeriod,
    ) -> AppResult<Option<Invoice>> {
        let model = invoices::Entity::find()
            .filter(invoices::Column::CreditCardId.eq(credit_card_id.into_inner()))
            .filter(invoices::Column::ReferenceMonth.eq(period.month.cast_signed()))
            .filter(invoices::Column::ReferenceYear.eq(period.year))
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(Into::into))
    }

    async fn list_by_card(&self, credit_card_id: CreditCardId) -> AppResult<Vec<Invoice>> {
        let models = invoices::Entity::find()
            .filter(invoices::Column::CreditCardId.eq(credit_card_id.into_inner()))
            .order_by_desc(invoices::Column::ReferenceYear)
            .order_by_desc(invoices::Column::ReferenceMonth)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn adjust_total(&self, id: InvoiceId, delta: Decimal) -> AppResult<Invoice> {
        // Invoices that took payments re-derive PARTIAL/PAID against the new
        // total. SET expressions see the row as it was before the update.
        let took_payment = Condition::any()
            .add(invoices::Column::Status.eq(InvoiceStatus::Partial))
            .add(invoices::Column::Status.eq(InvoiceStatus::Paid));
        let settled = Expr::col(invoices::Column::PaidAmount)
            .gte(Expr::col(invoices::Column::TotalAmount).add(delta));

        let status = Expr::case(
            Condition::all().add(took_payment.clone()).add(settled.clone()),
            enum_value(&InvoiceStatus::Paid),
        )
        .case(took_payment.clone(), enum_value(&InvoiceStatus::Partial))
        .finally(Expr::col(invoices::Column::Status));
        let paid_at = Expr::case(
            Condition::all()
                .add(took_payment)
                .add(Condition::all().add(settled).not()),
            no_paid_at(),
        )
        .finally(Expr::col(invoices::Column::PaidAt));

        let updated = invoices::Entity::update_many()
            .col_expr(
                invoices::Column::TotalAmount,
                Expr::col(invoices::Column::TotalAmount).add(delta),
            )
            .col_expr(invoices::Column::Status, status.into())
            .col_expr(invoices::Column::PaidAt, paid_at.into())
            .filter(invoices::Column::Id.eq(id.into_inner()))
            .exec_with_returning(&self.db)
            .await
            .map_err(db_err)?;
        updated
            .into_iter()
            .next()
            .map(Into::into)
            .ok_or_else(|| not_found("invoice", id))
    }

    async fn apply_payment(
        &self,
        id: InvoiceId,
        amount: Decimal,
        paid_at: DateTime<Utc>,
    ) -> AppResult<Invoice> {
        let paid_after = || Expr::col(invoices::Column::PaidAmount).add(amount);
        let settles = Expr::expr(paid_after()).gte(Expr::col(invoices::Column::TotalAmount));

        let status = Expr::case(settles.clone(), enum_value(&InvoiceStatus::Paid))
            .finally(enum_value(&InvoiceStatus::Partial));
        let stamp = Expr::case(settles, Expr::value(DateTimeWithTimeZone::from(paid_at)))
            .finally(no_paid_at());

        let updated = invoices::Entity::update_many()
            .col_expr(invoices::Column::PaidAmount, paid_after())
            .col_expr(invoices::Column::Status, status.into())
            .col_expr(invoices::Column::PaidAt, stamp.into())
            .filter(invoices::Column::Id.eq(id.into_inner()))
            .filter(invoices::Column::Status.ne(InvoiceStatus::Paid))
            .filter(Expr::expr(paid_after()).lte(Expr::col(invoices::Column::TotalAmount)))
            .exec_with_returning(&self.db)
            .await
            .map_err(db_err)?;
        if let Some(model) = updated.into_iter().next() {
            return Ok(model.into());
        }
        match self.find(id).await? {
            Some(_) => Err(AppError::Validation(format!(
                "invoice {id} cannot take this payment"
            ))),
            None => Err(not_found("invoice", id)),
        }
    }

    async fn revert_payment(
        &self,
        id: InvoiceId,
        amount: Decimal,
        previous_status: credit_card::InvoiceStatus,
    ) -> AppResult<Invoice> {
        let updated = invoices::Entity::update_many()
            .col_expr(
                invoices::Column::PaidAmount,
                Expr::col(invoices::Column::PaidAmount).sub(amount),
            )
            .col_expr(
                invoices::Column::Status,
                enum_value(&InvoiceStatus::from(previous_status)),
            )
            .col_expr(invoices::Column::PaidAt, no_paid_at())
            .filter(invoices::Column::Id.eq(id.into_inner()))
            .exec_with_returning(&self.db)
            .await
            .map_err(db_err)?;
        updated
            .into_iter()
            .next()
            .map(Into::into)
            .ok_or_else(|| not_found("invoice", id))
    }
}

/// Charge repository backed by the `credit_card_transactions` table.
#[derive(Debug, Clone)]
pub struct CardTransactionRepository {
    db: DatabaseConnection,
}

impl CardTransactionRepository {
    /// Creates a new charge repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl credit_card::CardTransactionRepository for CardTransactionRepository {
    async fn create(&self, charge: CardTransaction) -> AppResult<CardTransaction> {
        let model = credit_card_transactions::ActiveModel::from(charge)
            .insert(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.into())
    }

    async fn delete(&self, id: CardTransactionId) -> AppResult<()> {
        credit_card_transactions::Entity::delete_by_id(id.into_inner())
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn list_by_invoice(&self, invoice_id: InvoiceId) -> AppResult<Vec<CardTransaction>> {
        let models = credit_card_transactions::Entity::find()
            .filter(credit_card_transactions::Column::InvoiceId.eq(invoice_id.into_inner()))
            .order_by_asc(credit_card_transactions::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(Into::into).collect())
    }
}
