use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use std::sync::Arc;
use tracing::{debug, info, instrument};

use super::{auth::AuthState, detail, user_register::auth_response};
use crate::types::{AuthResponse, ErrorResponse, LoginRequest};

#[utoipa::path(
    post,
    path = "/users/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse, content_type = "application/json"),
        (status = 401, description = "Incorrect username/email or password", body = ErrorResponse),
        (status = 403, description = "Account is inactive", body = ErrorResponse),
        (status = 422, description = "Invalid login payload", body = ErrorResponse),
    ),
    tag = "users"
)]
#[instrument(skip(auth, payload))]
pub async fn login(
    auth: Extension<Arc<AuthState>>,
    payload: Option<Json<LoginRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return detail(StatusCode::UNPROCESSABLE_ENTITY, "Invalid request body");
    };

    debug!("login: {:?}", request);

    match auth
        .issuer()
        .login(&request.username_or_email, &request.password)
        .await
    {
        Ok(issued) => {
            info!(user_id = %issued.user.id, "user logged in");
            (
                StatusCode::OK,
                Json(auth_response("Login successful", issued)),
            )
                .into_response()
        }
        Err(err) => err.into_response(),
    }
}
