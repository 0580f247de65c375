//! Typed IDs for type-safe entity references.
//!
//! Using typed IDs prevents accidentally passing a `GoalId` where an `AccountId` is expected.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Macro to generate typed ID wrappers.
macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Creates a new random ID using UUID v7 (time-ordered).
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Creates an ID from an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner UUID.
            #[must_use]
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

typed_id!(UserId, "Unique identifier for a user.");
typed_id!(AccountId, "Unique identifier for a money account.");
typed_id!(TransactionId, "Unique identifier for a transaction record.");
typed_id!(CategoryId, "Unique identifier for a spending or income category.");
typed_id!(BudgetId, "Unique identifier for a monthly category budget.");
typed_id!(GoalId, "Unique identifier for a savings goal.");
typed_id!(ContributionId, "Unique identifier for a goal contribution record.");
typed_id!(InvestmentId, "Unique identifier for an investment.");
typed_id!(CreditCardId, "Unique identifier for a credit card.");
typed_id!(InvoiceId, "Unique identifier for a credit card invoice.");
typed_id!(
    CardTransactionId,
    "Unique identifier for a credit card charge."
);
typed_id!(
    RecurringTransactionId,
    "Unique identifier for a recurring transaction definition."
);
typed_id!(MovementId, "Unique identifier for a journaled movement.");

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
