//! Authentication middleware: Bearer token extraction and verification.

use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use rakoon_core::auth::TokenError;
use rakoon_core::models::auth::AuthenticatedSubject;
use tracing::debug;

use crate::AppState;
use crate::error::AppError;

/// Identity stored in request extensions once the token checks out.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser(pub AuthenticatedSubject);

/// Pull the token out of `Authorization: Bearer <token>`.
///
/// An absent header and a badly formed one are different failures.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let header = headers
        .get(AUTHORIZATION)
        .ok_or(AppError::Token(TokenError::MissingToken))?;

    header
        .to_str()
        .ok()
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AppError::Token(TokenError::Malformed))
}

/// Axum middleware: verifies the bearer token against the credential service
/// and injects `AuthenticatedUser` into request extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(request.headers())?.to_owned();
    let subject = state.service.verify_access(&token).await.map_err(|e| {
        debug!(error = %e, "token rejected");
        AppError::from(e)
    })?;

    request.extensions_mut().insert(AuthenticatedUser(subject));

    Ok(next.run(request).await)
}
