use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use std::sync::Arc;
use tracing::{debug, info, instrument};

use super::{
    auth::{AuthState, Issued},
    detail,
};
use crate::types::{AuthResponse, ErrorResponse, RegisterRequest};

#[utoipa::path(
    post,
    path = "/users/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Registration successful", body = AuthResponse, content_type = "application/json"),
        (status = 400, description = "Username or email already registered", body = ErrorResponse),
        (status = 422, description = "Invalid registration payload", body = ErrorResponse),
    ),
    tag = "users"
)]
#[instrument(skip(auth, payload))]
pub async fn register(
    auth: Extension<Arc<AuthState>>,
    payload: Option<Json<RegisterRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return detail(StatusCode::UNPROCESSABLE_ENTITY, "Invalid request body");
    };

    debug!("register: {:?}", request);

    match auth
        .issuer()
        .register(&request.username, &request.email, &request.password)
        .await
    {
        Ok(issued) => {
            info!(user_id = %issued.user.id, "user registered");
            (
                StatusCode::CREATED,
                Json(auth_response("User registered successfully", issued)),
            )
                .into_response()
        }
        Err(err) => err.into_response(),
    }
}

pub(super) fn auth_response(message: &str, issued: Issued) -> AuthResponse {
    AuthResponse {
        message: message.to_string(),
        user: issued.user,
        access_token: issued.access_token,
        token_type: issued.token_type,
    }
}
