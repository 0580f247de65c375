//! Application-wide error types.

use thiserror::Error;
use uuid::Uuid;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad input or business-rule violation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Resource exists but belongs to another user.
    #[error("Resource not owned: {0}")]
    ResourceNotOwned(String),

    /// Conflict (e.g., duplicate entry).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// A multi-step movement failed and at least one compensating action
    /// could not be applied. The movement journal keeps the details.
    #[error("Movement {movement_id} partially failed: {cause}")]
    PartiallyFailed {
        /// The error that aborted the movement.
        cause: String,
        /// Journal id of the movement left for reconciliation.
        movement_id: Uuid,
    },

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::ResourceNotOwned(_) => 403,
            Self::Validation(_) => 400,
            Self::Conflict(_) => 409,
            Self::Database(_) | Self::PartiallyFailed { .. } | Self::Internal(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::ResourceNotOwned(_) => "RESOURCE_NOT_OWNED",
            Self::Conflict(_) => "CONFLICT",
            Self::Database(_) => "DATABASE_ERROR",
            Self::PartiallyFailed { .. } => "PARTIALLY_FAILED",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Validation error raised when a debit would overdraw an account.
    #[must_use]
    pub fn insufficient_funds(what: impl std::fmt::Display) -> Self {
        Self::Validation(format!("insufficient funds in {what}"))
    }

    /// Wraps a persistence failure, keeping the underlying cause.
    #[must_use]
    pub fn database(cause: impl std::fmt::Display) -> Self {
        Self::Database(cause.to_string())
    }

    /// Returns true for errors raised before anything was written.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
