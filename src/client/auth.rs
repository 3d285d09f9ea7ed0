//! Calls to the unauthenticated endpoints and the resulting session save.

use reqwest::StatusCode;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};

use super::{
    config::ClientConfig,
    errors::{map_request_error, sanitize_body, ClientError},
    store::{Session, SessionStore, StorageScope},
};
use crate::{
    types::{AuthResponse, LoginRequest, RegisterRequest},
    validation::{validate_login, validate_registration},
};

pub const REGISTER_PATH: &str = "/users/register";
pub const LOGIN_PATH: &str = "/users/login";

#[derive(Clone)]
pub struct AuthClient {
    http: reqwest::Client,
    config: ClientConfig,
    store: Arc<SessionStore>,
}

impl AuthClient {
    /// # Errors
    /// Returns [`ClientError::Config`] if the HTTP client cannot be built.
    pub fn new(config: ClientConfig, store: Arc<SessionStore>) -> Result<Self, ClientError> {
        Ok(Self {
            http: config.http_client()?,
            config,
            store,
        })
    }

    /// Register and keep the issued session in the scope picked by `remember`.
    ///
    /// # Errors
    /// Input rule violations are reported before any request is sent.
    #[instrument(skip(self, email, password))]
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
        remember: bool,
    ) -> Result<Session, ClientError> {
        let identity = validate_registration(username, email, password)?;
        let request = RegisterRequest {
            username: identity.username,
            email: identity.email,
            password: password.to_string(),
        };
        let issued = self.post(REGISTER_PATH, &request, StatusCode::CREATED).await?;
        self.keep(issued, remember)
    }

    /// Sign in by username or email.
    ///
    /// # Errors
    /// Blank fields are reported before any request is sent; a wrong password
    /// and an unknown identifier are indistinguishable.
    #[instrument(skip(self, password))]
    pub async fn login(
        &self,
        username_or_email: &str,
        password: &str,
        remember: bool,
    ) -> Result<Session, ClientError> {
        validate_login(username_or_email, password)?;
        let request = LoginRequest {
            username_or_email: username_or_email.trim().to_string(),
            password: password.to_string(),
        };
        let issued = self.post(LOGIN_PATH, &request, StatusCode::OK).await?;
        self.keep(issued, remember)
    }

    /// Forget the session locally. Credentials are not revoked server-side.
    pub fn logout(&self) {
        self.store.clear();
        info!("signed out");
    }

    async fn post<B: Serialize>(
        &self,
        path: &str,
        body: &B,
        expected: StatusCode,
    ) -> Result<AuthResponse, ClientError> {
        let response = self
            .http
            .post(self.config.url_for(path))
            .json(body)
            .send()
            .await
            .map_err(|err| map_request_error(&err))?;

        let status = response.status();
        let text = response.text().await.map_err(|err| map_request_error(&err))?;
        if status != expected {
            return Err(map_auth_failure(status, &text));
        }
        serde_json::from_str(&text)
            .map_err(|err| ClientError::Parse(format!("Failed to decode response: {err}")))
    }

    fn keep(&self, issued: AuthResponse, remember: bool) -> Result<Session, ClientError> {
        let session = Session {
            access_token: issued.access_token,
            token_type: issued.token_type,
            user: issued.user,
        };
        let scope = StorageScope::from_remember(remember);
        self.store.save(&session, scope)?;
        info!(%scope, user_id = %session.user.id, "{}", issued.message);
        Ok(session)
    }
}

fn map_auth_failure(status: StatusCode, body: &str) -> ClientError {
    match status {
        StatusCode::BAD_REQUEST => ClientError::DuplicateIdentity,
        StatusCode::UNAUTHORIZED => ClientError::InvalidCredentials,
        StatusCode::FORBIDDEN => ClientError::AccountInactive,
        _ => ClientError::Http {
            status: status.as_u16(),
            message: sanitize_body(body),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ValidationError;

    fn offline_client() -> (AuthClient, Arc<SessionStore>) {
        let store = Arc::new(SessionStore::in_memory());
        let client = AuthClient::new(ClientConfig::new("http://127.0.0.1:1"), store.clone()).unwrap();
        (client, store)
    }

    #[tokio::test]
    async fn short_username_is_rejected_locally() {
        let (client, store) = offline_client();
        let err = client
            .register("ab", "ab@example.com", "securepass123", true)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ClientError::InvalidInput(ValidationError::UsernameLength)
        ));
        assert!(store.load().is_none());
    }

    #[tokio::test]
    async fn blank_login_is_rejected_locally() {
        let (client, _) = offline_client();
        let err = client.login("  ", "pw", false).await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::InvalidInput(ValidationError::MissingIdentifier)
        ));
    }

    #[tokio::test]
    async fn unreachable_server_is_a_transport_error() {
        let (client, store) = offline_client();
        let err = client.login("johndoe", "securepass123", false).await.unwrap_err();
        assert!(matches!(err, ClientError::Network(_) | ClientError::Timeout(_)));
        assert!(store.load().is_none());
    }

    #[test]
    fn failure_statuses_map_to_domain_errors() {
        assert!(matches!(
            map_auth_failure(StatusCode::BAD_REQUEST, ""),
            ClientError::DuplicateIdentity
        ));
        assert!(matches!(
            map_auth_failure(StatusCode::UNAUTHORIZED, ""),
            ClientError::InvalidCredentials
        ));
        assert!(matches!(
            map_auth_failure(StatusCode::FORBIDDEN, ""),
            ClientError::AccountInactive
        ));
        match map_auth_failure(StatusCode::UNPROCESSABLE_ENTITY, r#"{"detail":"Invalid email"}"#) {
            ClientError::Http { status, message } => {
                assert_eq!(status, 422);
                assert_eq!(message, "Invalid email");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
