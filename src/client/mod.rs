//! Client-side session lifecycle.
//!
//! Data flow: [`auth::AuthClient`] obtains a credential and saves it in the
//! [`store::SessionStore`]; [`validator::SessionValidator`] is consulted before
//! protected work; [`gateway::Gateway`] sends authenticated calls and ends the
//! session on 401; [`guard::RouteGuard`] redirects when there is no valid
//! session. Every check here is advisory; the server decides.

pub mod auth;
pub mod codec;
pub mod config;
pub mod errors;
pub mod gateway;
pub mod guard;
pub mod repository;
pub mod store;
pub mod validator;

use std::{path::Path, sync::Arc};

pub use auth::AuthClient;
pub use codec::{decode, is_expired, is_expired_at, DecodeError, DecodedClaims};
pub use config::ClientConfig;
pub use errors::ClientError;
pub use gateway::{ApiRequest, ApiResponse, Gateway};
pub use guard::{
    ConsoleNavigator, GuardDecision, Navigator, RecordingNavigator, RouteGuard, LOGIN_ENTRY_POINT,
};
pub use repository::{FileRepository, MemoryRepository, SessionRepository, StorageError};
pub use store::{Session, SessionStore, StorageScope, Stored};
pub use validator::{SessionState, SessionStatus, SessionValidator};

use crate::types::UserSnapshot;

/// Every client component wired to one store and one navigator.
#[derive(Clone)]
pub struct Client {
    pub store: Arc<SessionStore>,
    pub validator: SessionValidator,
    pub guard: RouteGuard,
    pub gateway: Gateway,
    pub auth: AuthClient,
}

impl Client {
    /// # Errors
    /// Returns [`ClientError::Config`] if the HTTP client cannot be built.
    pub fn new(
        config: ClientConfig,
        store: Arc<SessionStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, ClientError> {
        let validator = SessionValidator::new(store.clone());
        Ok(Self {
            guard: RouteGuard::new(validator.clone(), navigator.clone()),
            gateway: Gateway::new(config.clone(), store.clone(), navigator)?,
            auth: AuthClient::new(config, store.clone())?,
            validator,
            store,
        })
    }

    /// File-backed scopes: `persistent` survives reboots, `ephemeral` should
    /// live somewhere the OS clears at logout (a runtime or temp directory).
    ///
    /// # Errors
    /// Returns [`ClientError::Config`] if the HTTP client cannot be built.
    pub fn with_session_files(
        config: ClientConfig,
        persistent: &Path,
        ephemeral: &Path,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, ClientError> {
        let store = SessionStore::new(
            Arc::new(FileRepository::new(persistent)),
            Arc::new(FileRepository::new(ephemeral)),
        );
        Self::new(config, Arc::new(store), navigator)
    }

    /// Fetch the current user through the gateway.
    ///
    /// # Errors
    /// See [`Gateway::send`]; non-2xx statuses surface as [`ClientError::Http`].
    pub async fn current_user(&self) -> Result<UserSnapshot, ClientError> {
        self.gateway.get_json("/users/me").await
    }
}
