use thiserror::Error;

use super::repository::StorageError;
use crate::validation::ValidationError;

/// Maximum number of error body characters surfaced to the user.
const MAX_ERROR_CHARS: usize = 200;

/// Errors a client flow can surface to the user.
///
/// Decode failures and expiry never appear here; the validator absorbs them
/// by clearing the session.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Not signed in")]
    NoCredential,
    #[error("Session rejected by the server; sign in again")]
    AuthenticationFailed,
    #[error(transparent)]
    InvalidInput(#[from] ValidationError),
    #[error("Username or email already registered")]
    DuplicateIdentity,
    #[error("Invalid username/email or password")]
    InvalidCredentials,
    #[error("Account is inactive")]
    AccountInactive,
    #[error("Request failed ({status}): {message}")]
    Http { status: u16, message: String },
    #[error("Network error: {0}")]
    Network(String),
    #[error("Timeout: {0}")]
    Timeout(String),
    #[error("Response error: {0}")]
    Parse(String),
    #[error("Session storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("Config error: {0}")]
    Config(String),
}

impl ClientError {
    /// True for errors after which the user has to sign in again.
    #[must_use]
    pub const fn requires_login(&self) -> bool {
        matches!(self, Self::NoCredential | Self::AuthenticationFailed)
    }
}

/// Maps transport errors, keeping timeouts distinct.
pub(crate) fn map_request_error(err: &reqwest::Error) -> ClientError {
    if err.is_timeout() {
        ClientError::Timeout("Request timed out. Please try again.".to_string())
    } else {
        ClientError::Network(format!("Unable to reach the server: {err}"))
    }
}

/// Prefers the `detail` field of a JSON error body, trimmed and truncated.
pub(crate) fn sanitize_body(body: &str) -> String {
    let detail = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| value.get("detail").and_then(|d| d.as_str()).map(str::to_string));
    let trimmed = detail.as_deref().unwrap_or(body).trim();
    if trimmed.is_empty() {
        "Request failed.".to_string()
    } else {
        trimmed.chars().take(MAX_ERROR_CHARS).collect()
    }
}
