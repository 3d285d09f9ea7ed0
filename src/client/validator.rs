//! Session validity as a small state machine.
//!
//! `NoSession -> Valid -> Expired -> (cleared) -> NoSession`. Expired and
//! partial sessions are classified but never reported: the validator purges
//! them and answers `NoSession`.

use std::sync::Arc;
use tracing::{debug, info};

use super::{
    codec,
    store::{Session, SessionStore, Stored},
};

pub type Clock = Arc<dyn Fn() -> i64 + Send + Sync>;

/// Classification of whatever the store currently holds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionState {
    NoSession,
    Valid(Session),
    Expired,
    Partial,
}

/// What callers see once stale data has been purged.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionStatus {
    NoSession,
    Valid(Session),
}

/// Pure classification; `now` is whole unix seconds.
#[must_use]
pub fn classify(stored: &Stored, now: i64) -> SessionState {
    match stored {
        Stored::Empty => SessionState::NoSession,
        Stored::Partial(_) => SessionState::Partial,
        Stored::Complete(session, _) => {
            if codec::is_expired_at(&session.access_token, now) {
                SessionState::Expired
            } else {
                SessionState::Valid(session.clone())
            }
        }
    }
}

#[derive(Clone)]
pub struct SessionValidator {
    store: Arc<SessionStore>,
    clock: Clock,
}

impl SessionValidator {
    #[must_use]
    pub fn new(store: Arc<SessionStore>) -> Self {
        Self {
            store,
            clock: Arc::new(codec::now_unix_seconds),
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// Classify the stored session, clearing it when expired or incomplete.
    #[must_use]
    pub fn check(&self) -> SessionStatus {
        match classify(&self.store.read(), (self.clock)()) {
            SessionState::NoSession => SessionStatus::NoSession,
            SessionState::Valid(session) => SessionStatus::Valid(session),
            SessionState::Expired => {
                info!("session expired; clearing stored credential");
                self.store.clear();
                SessionStatus::NoSession
            }
            SessionState::Partial => {
                debug!("incomplete session; clearing stored entries");
                self.store.clear();
                SessionStatus::NoSession
            }
        }
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self.check(), SessionStatus::Valid(_))
    }

    /// Runs `on_fail` and returns false unless the session is valid.
    pub fn require_auth(&self, on_fail: impl FnOnce()) -> bool {
        if self.is_authenticated() {
            true
        } else {
            on_fail();
            false
        }
    }
}
