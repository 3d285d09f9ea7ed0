//! Route guard for protected flows.
//!
//! UX-only gate; real access control lives on the API. The decision is a
//! plain value and navigation goes through a [`Navigator`] adapter.

use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

use super::validator::SessionValidator;

pub const LOGIN_ENTRY_POINT: &str = "/login";

/// Side effect of moving the user to another location.
pub trait Navigator: Send + Sync {
    fn navigate(&self, target: &str);
}

/// Terminal navigator: prints where the user should go next.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNavigator;

impl Navigator for ConsoleNavigator {
    fn navigate(&self, target: &str) {
        if target == LOGIN_ENTRY_POINT {
            eprintln!("Not signed in. Run `calcgate login` to continue.");
        } else {
            eprintln!("Redirecting to {target}");
        }
    }
}

/// Keeps every navigation target; used by tests and headless callers.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    history: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn last(&self) -> Option<String> {
        self.history().pop()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, target: &str) {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(target.to_string());
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuardDecision {
    Render,
    Redirect(String),
}

#[must_use]
pub fn decide(authenticated: bool, redirect_target: Option<&str>) -> GuardDecision {
    if authenticated {
        GuardDecision::Render
    } else {
        GuardDecision::Redirect(redirect_target.unwrap_or(LOGIN_ENTRY_POINT).to_string())
    }
}

#[derive(Clone)]
pub struct RouteGuard {
    validator: SessionValidator,
    navigator: Arc<dyn Navigator>,
}

impl RouteGuard {
    #[must_use]
    pub fn new(validator: SessionValidator, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            validator,
            navigator,
        }
    }

    /// Decide without navigating. Stale sessions are still purged.
    #[must_use]
    pub fn evaluate(&self, redirect_target: Option<&str>) -> GuardDecision {
        decide(self.validator.is_authenticated(), redirect_target)
    }

    /// Returns true when the protected flow may proceed; otherwise navigates
    /// to `redirect_target` (the login entry point by default).
    pub fn enforce(&self, redirect_target: Option<&str>) -> bool {
        let destination = redirect_target.unwrap_or(LOGIN_ENTRY_POINT);
        self.validator.require_auth(|| {
            debug!(destination, "guard redirect");
            self.navigator.navigate(destination);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{
        codec::{now_unix_seconds, tests::token_with},
        store::{tests::session, SessionStore, StorageScope},
    };
    use serde_json::json;

    fn guard(store: Arc<SessionStore>) -> (RouteGuard, Arc<RecordingNavigator>) {
        let navigator = Arc::new(RecordingNavigator::new());
        let guard = RouteGuard::new(SessionValidator::new(store), navigator.clone());
        (guard, navigator)
    }

    #[test]
    fn decide_defaults_to_login() {
        assert_eq!(decide(true, Some("/x")), GuardDecision::Render);
        assert_eq!(
            decide(false, None),
            GuardDecision::Redirect(LOGIN_ENTRY_POINT.to_string())
        );
        assert_eq!(
            decide(false, Some("/welcome")),
            GuardDecision::Redirect("/welcome".to_string())
        );
    }

    #[test]
    fn enforce_redirects_without_session() {
        let (guard, navigator) = guard(Arc::new(SessionStore::in_memory()));
        assert!(!guard.enforce(None));
        assert!(!guard.enforce(Some("/signin")));
        assert_eq!(navigator.history(), vec!["/login", "/signin"]);
    }

    #[test]
    fn enforce_allows_valid_session() {
        let store = Arc::new(SessionStore::in_memory());
        let token = token_with(&json!({"sub": "u", "exp": now_unix_seconds() + 1800}));
        store.save(&session(&token), StorageScope::Persistent).unwrap();

        let (guard, navigator) = guard(store);
        assert!(guard.enforce(None));
        assert_eq!(guard.evaluate(None), GuardDecision::Render);
        assert!(navigator.history().is_empty());
    }

    #[test]
    fn expired_session_is_purged_and_redirected() {
        let store = Arc::new(SessionStore::in_memory());
        let token = token_with(&json!({"sub": "u", "exp": now_unix_seconds() - 5}));
        store.save(&session(&token), StorageScope::Ephemeral).unwrap();

        let (guard, navigator) = guard(store.clone());
        assert!(!guard.enforce(None));
        assert_eq!(navigator.last().as_deref(), Some(LOGIN_ENTRY_POINT));
        assert!(store.load().is_none());
    }
}
