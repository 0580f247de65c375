//! System categories with content-addressed identities.
//!
//! Engine-written legs (investment contributions, withdrawals, invoice
//! payments) need a category that exists for every user without a prior
//! write. Their IDs are derived from `(user, name)`.

use serde::{Deserialize, Serialize};
use tally_shared::types::{CategoryId, UserId};
use uuid::Uuid;

/// Namespace for derived category IDs.
const CATEGORY_NAMESPACE: Uuid = Uuid::from_u128(0x6f1c_2a4e_93b7_4d0a_8e55_1b2c_7d3e_9f40);

/// Categories the engines book into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DefaultCategory {
    /// Money moved into investments.
    Investments,
    /// Money taken out of investments.
    InvestmentWithdrawals,
    /// Credit card invoice payments.
    CreditCardPayment,
}

impl DefaultCategory {
    /// Display name, also the input of the ID derivation.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Investments => "Investments",
            Self::InvestmentWithdrawals => "Investment withdrawals",
            Self::CreditCardPayment => "Credit card payment",
        }
    }
}

/// Resolves the category ID of a system category for a user.
pub trait DefaultCategoryResolver: Send + Sync {
    /// Category ID of `category` for `user_id`.
    fn resolve(&self, user_id: UserId, category: DefaultCategory) -> CategoryId;
}

/// Derives IDs as UUIDv5 of `"{user}:{lowercased name}"`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentAddressedCategories;

impl ContentAddressedCategories {
    /// The derivation itself, usable for any category name.
    #[must_use]
    pub fn derive(user_id: UserId, name: &str) -> CategoryId {
        let key = format!("{user_id}:{}", name.trim().to_lowercase());
        CategoryId::from_uuid(Uuid::new_v5(&CATEGORY_NAMESPACE, key.as_bytes()))
    }
}

impl DefaultCategoryResolver for ContentAddressedCategories {
    fn resolve(&self, user_id: UserId, category: DefaultCategory) -> CategoryId {
        Self::derive(user_id, category.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derivation_is_stable_per_user_and_name() {
        let user = UserId::new();
        let resolver = ContentAddressedCategories;
        assert_eq!(
            resolver.resolve(user, DefaultCategory::Investments),
            resolver.resolve(user, DefaultCategory::Investments)
        );
        assert_eq!(
            ContentAddressedCategories::derive(user, " investments "),
            resolver.resolve(user, DefaultCategory::Investments)
        );
    }

    #[test]
    fn test_derivation_differs_across_users_and_names() {
        let resolver = ContentAddressedCategories;
        let (a, b) = (UserId::new(), UserId::new());
        assert_ne!(
            resolver.resolve(a, DefaultCategory::Investments),
            resolver.resolve(b, DefaultCategory::Investments)
        );
        assert_ne!(
            resolver.resolve(a, DefaultCategory::Investments),
            resolver.resolve(a, DefaultCategory::InvestmentWithdrawals)
        );
    }
}
