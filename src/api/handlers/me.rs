//! Authenticated self-service endpoint.

use axum::{extract::Extension, http::HeaderMap, response::IntoResponse, Json};
use std::sync::Arc;

use super::auth::{principal::require_auth, AuthState};
use crate::types::{ErrorResponse, UserSnapshot};

#[utoipa::path(
    get,
    path = "/users/me",
    responses(
        (status = 200, description = "Return the authenticated user", body = UserSnapshot),
        (status = 401, description = "Missing, invalid or expired credential", body = ErrorResponse),
        (status = 403, description = "Account is inactive", body = ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn get_me(headers: HeaderMap, auth: Extension<Arc<AuthState>>) -> impl IntoResponse {
    match require_auth(&headers, &auth).await {
        Ok(user) => Json(user).into_response(),
        Err(err) => err.into_response(),
    }
}
