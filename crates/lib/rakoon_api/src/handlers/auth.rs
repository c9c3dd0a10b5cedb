//! Signup, login, refresh and logout handlers.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::{Extension, Json};

use super::own_id;
use crate::AppState;
use crate::error::AppResult;
use crate::middleware::auth::{AuthenticatedUser, bearer_token};
use crate::models::{CredentialsRequest, MessageResponse, RefreshResponse, TokenResponse};

/// `POST /v1/user`: create an account and return its first token.
pub async fn signup_handler(
    State(state): State<AppState>,
    body: Result<Json<CredentialsRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<TokenResponse>)> {
    let Json(body) = body?;
    body.validate()?;

    let issued = state.service.sign_up(&body.name, &body.password).await?;
    Ok((
        StatusCode::CREATED,
        Json(TokenResponse {
            id: issued.user_id,
            token: issued.token,
        }),
    ))
}

/// `POST /v1/user/connect`: authenticate with name + password.
pub async fn login_handler(
    State(state): State<AppState>,
    body: Result<Json<CredentialsRequest>, JsonRejection>,
) -> AppResult<Json<TokenResponse>> {
    let Json(body) = body?;
    body.validate()?;

    let issued = state.service.login(&body.name, &body.password).await?;
    Ok(Json(TokenResponse {
        id: issued.user_id,
        token: issued.token,
    }))
}

/// `POST /v1/refresh/token`: trade a signed, possibly expired token for a new one.
pub async fn refresh_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<Json<RefreshResponse>> {
    let token = bearer_token(&headers)?;
    let issued = state.service.refresh(token).await?;
    Ok(Json(RefreshResponse {
        message: "Token refreshed.".into(),
        user_id: issued.user_id,
        token: issued.token,
        is_admin: issued.is_admin,
    }))
}

/// `PUT /v1/user/{id}/logout`: invalidate every outstanding token of the caller.
pub async fn logout_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    let id = own_id(&user, &id)?;
    state.service.logout(id).await?;
    Ok(Json(MessageResponse::new("User logged out.")))
}
