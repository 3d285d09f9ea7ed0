//! Client endpoint configuration. Values are public; do not store secrets here.

use std::time::Duration;

use super::{errors::ClientError, guard::LOGIN_ENTRY_POINT};
use crate::APP_USER_AGENT;

/// Default request timeout applied to every client call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub login_path: String,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_BASE_URL)
    }
}

impl ClientConfig {
    #[must_use]
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into().trim().trim_end_matches('/').to_string(),
            login_path: LOGIN_ENTRY_POINT.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_login_path(mut self, login_path: impl Into<String>) -> Self {
        self.login_path = login_path.into();
        self
    }

    /// Joins the API base URL and `path` with exactly one slash.
    #[must_use]
    pub fn url_for(&self, path: &str) -> String {
        let path = path.trim();
        if self.api_base_url.is_empty() {
            path.to_string()
        } else {
            format!("{}/{}", self.api_base_url, path.trim_start_matches('/'))
        }
    }

    /// # Errors
    /// Returns [`ClientError::Config`] if the HTTP client cannot be built.
    pub fn http_client(&self) -> Result<reqwest::Client, ClientError> {
        reqwest::Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(self.timeout)
            .build()
            .map_err(|err| ClientError::Config(format!("Failed to build HTTP client: {err}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_for_joins_with_single_slash() {
        let config = ClientConfig::new(" http://api.example:8000/ ");
        assert_eq!(config.url_for("/users/me"), "http://api.example:8000/users/me");
        assert_eq!(config.url_for("users/me"), "http://api.example:8000/users/me");
    }

    #[test]
    fn empty_base_keeps_relative_path() {
        assert_eq!(ClientConfig::new("").url_for("/users/me"), "/users/me");
    }

    #[test]
    fn defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.login_path, "/login");
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert!(config.http_client().is_ok());
    }
}
