//! # Calcgate (bearer credentials and client session custody)
//!
//! `calcgate` issues short-lived signed credentials and keeps them on the
//! client side until they expire or are rejected.
//!
//! ## Server
//!
//! [`api`] serves `/users/register`, `/users/login` and `/users/me`. Credentials
//! are HS256 JWTs with a fixed lifetime (30 minutes by default) and no refresh.
//!
//! ## Client
//!
//! [`client`] holds the session lifecycle: a signature-less token codec for
//! expiry checks, a two-scope session store (persistent or ephemeral), a
//! validator state machine, an authenticated request gateway that clears the
//! session on any 401, and a route guard that redirects unauthenticated flows
//! to the login entry point.
//!
//! Client-side checks are advisory. The server's credential validation is the
//! only security boundary.

pub mod api;
pub mod cli;
pub mod client;
pub mod types;
pub mod validation;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
