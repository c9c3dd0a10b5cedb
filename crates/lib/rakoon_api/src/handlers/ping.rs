//! Liveness endpoint.

use axum::Json;

use crate::models::MessageResponse;

/// `GET /ping`
pub async fn ping() -> Json<MessageResponse> {
    Json(MessageResponse::new("pong"))
}
