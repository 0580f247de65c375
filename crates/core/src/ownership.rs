//! Ownership checks shared by every engine.

use std::fmt::Display;

use tally_shared::{AppError, AppResult, types::UserId};

/// An aggregate that belongs to exactly one user.
pub(crate) trait Owned {
    fn owner(&self) -> UserId;
}

/// Resolves a repository lookup into an owned aggregate.
///
/// Missing rows become `NotFound`, rows of another user `ResourceNotOwned`.
pub(crate) fn ensure_owned<T: Owned>(
    found: Option<T>,
    user_id: UserId,
    what: &str,
    id: impl Display,
) -> AppResult<T> {
    let item = found.ok_or_else(|| AppError::NotFound(format!("{what} {id}")))?;
    if item.owner() != user_id {
        return Err(AppError::ResourceNotOwned(format!("{what} {id}")));
    }
    Ok(item)
}
