//! User account handlers. All routes here sit behind `require_auth`.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::{Extension, Json};
use rakoon_core::models::auth::PublicUser;
use tracing::warn;

use super::own_id;
use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{DataResponse, MessageResponse, UpdatePasswordRequest, UpdateUserRequest};

/// `GET /v1/user/{id}`
pub async fn get_user_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> AppResult<Json<DataResponse<PublicUser>>> {
    let id = own_id(&user, &id)?;
    let data = state.service.profile(id).await?;
    Ok(Json(DataResponse { data }))
}

/// `PUT /v1/user/{id}`: change the login name.
pub async fn update_user_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
    body: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> AppResult<Json<MessageResponse>> {
    let id = own_id(&user, &id)?;
    let Json(body) = body?;
    body.validate()?;

    state.service.rename(id, &body.name).await?;
    Ok(Json(MessageResponse::new("User updated")))
}

/// `PUT /v1/user/{id}/password`: the caller must log in again afterwards.
pub async fn update_password_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
    body: Result<Json<UpdatePasswordRequest>, JsonRejection>,
) -> AppResult<Json<MessageResponse>> {
    let id = own_id(&user, &id)?;
    let Json(body) = body?;
    body.validate()?;

    state.service.change_password(id, &body.password).await?;
    Ok(Json(MessageResponse::new("Password updated")))
}

/// `PUT /v1/user/{id}/archive`: soft delete.
pub async fn archive_user_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    let id = own_id(&user, &id)?;
    state.service.archive(id).await?;
    Ok(Json(MessageResponse::new("User archived")))
}

/// `DELETE /v1/user/{id}`
pub async fn delete_user_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    let id = own_id(&user, &id)?;
    state.service.delete(id).await?;
    Ok(Json(MessageResponse::new("User removed")))
}

/// `GET /v1/users`: admin only.
pub async fn list_users_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> AppResult<Json<DataResponse<Vec<PublicUser>>>> {
    if !user.0.is_admin {
        warn!(user_id = user.0.id, "non-admin attempted to list users");
        return Err(AppError::Forbidden("Forbidden.".into()));
    }
    let data = state.service.list_users().await?;
    Ok(Json(DataResponse { data }))
}
