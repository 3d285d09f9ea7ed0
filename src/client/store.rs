//! Session custody across two storage scopes.
//!
//! Each scope holds three entries: the credential, its scheme label, and the
//! JSON user snapshot. Reads prefer the persistent scope; the scope that yields
//! a credential supplies all three fields. Saving into one scope first wipes
//! the other, so at most one scope holds a session written by this store.

use std::{fmt, sync::Arc};
use tracing::{debug, warn};

use super::repository::{MemoryRepository, SessionRepository, StorageError};
use crate::types::{TokenType, UserSnapshot};

pub const ACCESS_TOKEN_KEY: &str = "access_token";
pub const TOKEN_TYPE_KEY: &str = "token_type";
pub const USER_KEY: &str = "user";

const SESSION_KEYS: [&str; 3] = [ACCESS_TOKEN_KEY, TOKEN_TYPE_KEY, USER_KEY];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageScope {
    /// Survives restarts.
    Persistent,
    /// Ends with the browsing context or process.
    Ephemeral,
}

impl StorageScope {
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::Persistent => Self::Ephemeral,
            Self::Ephemeral => Self::Persistent,
        }
    }

    /// Scope selected by a "remember me" choice.
    #[must_use]
    pub const fn from_remember(remember: bool) -> Self {
        if remember {
            Self::Persistent
        } else {
            Self::Ephemeral
        }
    }
}

impl fmt::Display for StorageScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Persistent => f.write_str("persistent"),
            Self::Ephemeral => f.write_str("ephemeral"),
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    pub access_token: String,
    pub token_type: TokenType,
    pub user: UserSnapshot,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token_type", &self.token_type)
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}

/// What the store currently holds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Stored {
    Empty,
    /// A credential without its companions, or with an unreadable companion.
    Partial(StorageScope),
    Complete(Session, StorageScope),
}

pub struct SessionStore {
    persistent: Arc<dyn SessionRepository>,
    ephemeral: Arc<dyn SessionRepository>,
}

impl SessionStore {
    #[must_use]
    pub fn new(persistent: Arc<dyn SessionRepository>, ephemeral: Arc<dyn SessionRepository>) -> Self {
        Self {
            persistent,
            ephemeral,
        }
    }

    /// Both scopes in memory.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(MemoryRepository::new()),
            Arc::new(MemoryRepository::new()),
        )
    }

    #[must_use]
    pub fn repository(&self, scope: StorageScope) -> &Arc<dyn SessionRepository> {
        match scope {
            StorageScope::Persistent => &self.persistent,
            StorageScope::Ephemeral => &self.ephemeral,
        }
    }

    /// Write `session` into `scope` after wiping the other scope.
    ///
    /// The credential is written last so a concurrent reader never sees it
    /// without its companions. A failed write wipes `scope` again.
    ///
    /// # Errors
    /// Returns an error if the user snapshot cannot be encoded or a write fails.
    pub fn save(&self, session: &Session, scope: StorageScope) -> Result<(), StorageError> {
        self.clear_scope(scope.other());

        let user = serde_json::to_string(&session.user)?;
        let repo = self.repository(scope);
        let written = repo
            .set(USER_KEY, &user)
            .and_then(|()| repo.set(TOKEN_TYPE_KEY, session.token_type.as_str()))
            .and_then(|()| repo.set(ACCESS_TOKEN_KEY, &session.access_token));

        if let Err(err) = written {
            warn!(%scope, "failed to save session: {err}");
            self.clear_scope(scope);
            return Err(err);
        }

        debug!(%scope, user_id = %session.user.id, "session saved");
        Ok(())
    }

    /// Read the session, preferring the persistent scope.
    #[must_use]
    pub fn read(&self) -> Stored {
        for scope in [StorageScope::Persistent, StorageScope::Ephemeral] {
            let repo = self.repository(scope);
            let Some(access_token) = repo.get(ACCESS_TOKEN_KEY) else {
                continue;
            };

            let token_type = repo.get(TOKEN_TYPE_KEY).as_deref().and_then(TokenType::parse);
            let user = repo
                .get(USER_KEY)
                .and_then(|raw| serde_json::from_str::<UserSnapshot>(&raw).ok());

            return match (token_type, user) {
                (Some(token_type), Some(user)) => Stored::Complete(
                    Session {
                        access_token,
                        token_type,
                        user,
                    },
                    scope,
                ),
                _ => {
                    debug!(%scope, "partial session in storage");
                    Stored::Partial(scope)
                }
            };
        }
        Stored::Empty
    }

    /// The complete session, if any.
    #[must_use]
    pub fn load(&self) -> Option<Session> {
        match self.read() {
            Stored::Complete(session, _) => Some(session),
            Stored::Empty | Stored::Partial(_) => None,
        }
    }

    /// Remove every session entry from both scopes. Never fails.
    pub fn clear(&self) {
        self.clear_scope(StorageScope::Persistent);
        self.clear_scope(StorageScope::Ephemeral);
    }

    fn clear_scope(&self, scope: StorageScope) {
        let repo = self.repository(scope);
        for key in SESSION_KEYS {
            if let Err(err) = repo.delete(key) {
                warn!(%scope, key, "failed to clear session entry: {err}");
            }
        }
    }
}
