//! Authenticated request gateway.
//!
//! Every protected call goes through [`Gateway::send`]: it attaches the stored
//! credential, and a 401 ends the session (store cleared, user sent to the
//! login entry point). There is no retry and no refresh.

use reqwest::{header::AUTHORIZATION, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use super::{
    config::ClientConfig,
    errors::{map_request_error, sanitize_body, ClientError},
    guard::Navigator,
    store::{SessionStore, Stored},
};

#[derive(Clone, Debug)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

impl ApiRequest {
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            path: path.into(),
            body: None,
        }
    }

    #[must_use]
    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::POST,
            path: path.into(),
            body: Some(body),
        }
    }
}

/// Any response other than 401, status and body untouched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// # Errors
    /// Returns [`ClientError::Http`] for non-2xx statuses and
    /// [`ClientError::Parse`] when the body does not match `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ClientError> {
        if !self.is_success() {
            return Err(ClientError::Http {
                status: self.status,
                message: sanitize_body(&self.body),
            });
        }
        serde_json::from_str(&self.body)
            .map_err(|err| ClientError::Parse(format!("Failed to decode response: {err}")))
    }
}

#[derive(Clone)]
pub struct Gateway {
    http: reqwest::Client,
    config: ClientConfig,
    store: Arc<SessionStore>,
    navigator: Arc<dyn Navigator>,
}

impl Gateway {
    /// # Errors
    /// Returns [`ClientError::Config`] if the HTTP client cannot be built.
    pub fn new(
        config: ClientConfig,
        store: Arc<SessionStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, ClientError> {
        Ok(Self {
            http: config.http_client()?,
            config,
            store,
            navigator,
        })
    }

    /// Send `request` with the stored credential.
    ///
    /// # Errors
    /// - [`ClientError::NoCredential`] when no complete session is stored; no
    ///   network I/O happens and leftover partial entries are removed.
    /// - [`ClientError::AuthenticationFailed`] on 401, after clearing the store.
    /// - [`ClientError::Network`] / [`ClientError::Timeout`] on transport failure.
    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ClientError> {
        let session = match self.store.read() {
            Stored::Complete(session, _) => session,
            Stored::Partial(scope) => {
                debug!(%scope, "partial session; clearing");
                self.store.clear();
                return Err(ClientError::NoCredential);
            }
            Stored::Empty => {
                debug!("no stored credential");
                return Err(ClientError::NoCredential);
            }
        };

        let mut builder = self
            .http
            .request(request.method, self.config.url_for(&request.path))
            .header(
                AUTHORIZATION,
                format!("{} {}", session.token_type.scheme(), session.access_token),
            );
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|err| map_request_error(&err))?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            warn!("credential rejected; clearing session");
            self.store.clear();
            self.navigator.navigate(&self.config.login_path);
            return Err(ClientError::AuthenticationFailed);
        }

        let body = response.text().await.map_err(|err| map_request_error(&err))?;
        Ok(ApiResponse {
            status: status.as_u16(),
            body,
        })
    }

    /// GET `path` and decode a JSON body.
    ///
    /// # Errors
    /// Everything [`Gateway::send`] returns, plus [`ClientError::Http`] for
    /// non-2xx statuses and [`ClientError::Parse`] for unexpected bodies.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.send(ApiRequest::get(path)).await?.json()
    }
}
