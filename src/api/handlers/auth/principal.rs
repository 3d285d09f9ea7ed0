//! Authenticated principal extraction from the `Authorization` header.

use axum::http::{header::AUTHORIZATION, HeaderMap};

use super::{issuer::IssuerError, state::AuthState};
use crate::types::UserSnapshot;

/// Extract the credential from `Authorization: <scheme> <token>`.
///
/// Returns `None` when the header is missing, not UTF-8, or uses a scheme
/// other than the one tokens are issued with.
pub(crate) fn extract_bearer_token(headers: &HeaderMap, scheme: &str) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (given, token) = value.trim().split_once(' ')?;
    if !given.eq_ignore_ascii_case(scheme) {
        return None;
    }
    let token = token.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

/// Resolve the request credential into the identity it was issued for.
///
/// # Errors
/// `Unauthenticated` when the header is missing or the credential is rejected.
pub async fn require_auth(headers: &HeaderMap, auth: &AuthState) -> Result<UserSnapshot, IssuerError> {
    let scheme = auth.config().token_type().scheme();
    let Some(token) = extract_bearer_token(headers, scheme) else {
        return Err(IssuerError::Unauthenticated);
    };
    auth.issuer().validate(&token).await
}
