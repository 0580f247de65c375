//! Credit cards: invoice lifecycle and available-limit tracking.
//!
//! Each card has a shadow `CREDIT_CARD` account. Charges accumulate on the
//! invoice of the current period and consume available limit; paying an
//! invoice debits a regular account and restores the limit.

pub mod billing;
pub mod repository;
pub mod service;
pub mod types;

pub use billing::{InvoiceSchedule, invoice_schedule};
pub use repository::{CardTransactionRepository, CreditCardRepository, InvoiceRepository};
pub use service::CreditCardService;
pub use types::{
    CardCharge, CardTransaction, CreateCardInput, CreateChargeInput, CreditCard, Invoice,
    InvoicePayment, InvoiceStatus, PayInvoiceInput, ShadowAccount,
};
