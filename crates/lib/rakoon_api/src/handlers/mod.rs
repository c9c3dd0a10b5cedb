//! Request handlers.

pub mod auth;
pub mod ping;
pub mod users;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthenticatedUser;

/// Resolve a `{id}` path segment and make sure it belongs to the caller.
pub(crate) fn own_id(user: &AuthenticatedUser, raw_id: &str) -> AppResult<i64> {
    let id: i64 = raw_id
        .parse()
        .map_err(|_| AppError::Validation("Id not valid".into()))?;
    if id != user.0.id {
        return Err(AppError::Forbidden("Forbidden.".into()));
    }
    Ok(id)
}
