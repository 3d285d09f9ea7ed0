//! Credential issuance and verification.
//!
//! Credentials are HS256 JWTs carrying `sub` (user id), `username`, `iat`,
//! `exp` and a unique `jti`. They are never stored server-side: validity is
//! the signature plus `exp`, and every validation re-reads the identity so
//! deactivation takes effect before expiry.
//!
//! There is no refresh or revocation endpoint. A client that receives a 401
//! must discard its credential and log in again.

pub(crate) mod issuer;
pub(crate) mod password;
pub(crate) mod principal;
pub(crate) mod state;
pub(crate) mod storage;
pub(crate) mod token;

pub use issuer::{CredentialIssuer, IssuerError, Issued};
pub use state::{AuthConfig, AuthState};
pub use storage::{InsertOutcome, MemoryUserStore, PgUserStore, UserRecord, UserStore};
pub use token::{Claims, TokenError, TokenSigner};
