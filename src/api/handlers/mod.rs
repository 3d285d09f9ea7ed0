//! API handlers and the error-to-response mapping they share.

pub mod auth;
pub mod health;
pub mod me;
pub mod user_login;
pub mod user_register;

use axum::{
    http::{header::WWW_AUTHENTICATE, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tracing::error;

use crate::types::ErrorResponse;
use auth::IssuerError;

pub(crate) fn detail(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            detail: message.into(),
        }),
    )
        .into_response()
}

impl IntoResponse for IssuerError {
    fn into_response(self) -> Response {
        match self {
            Self::InvalidInput(err) => detail(StatusCode::UNPROCESSABLE_ENTITY, err.to_string()),
            Self::DuplicateIdentity => detail(StatusCode::BAD_REQUEST, self.to_string()),
            Self::InvalidCredentials | Self::Unauthenticated => {
                let mut response = detail(StatusCode::UNAUTHORIZED, self.to_string());
                response
                    .headers_mut()
                    .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
                response
            }
            Self::AccountInactive => detail(StatusCode::FORBIDDEN, self.to_string()),
            Self::Internal(err) => {
                error!("Internal error: {err:#}");
                detail(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        }
    }
}
