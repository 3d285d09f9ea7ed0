//! Auth state and configuration shared by the issuing handlers.

use anyhow::Result;
use rand::RngCore;
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use tracing::warn;

use super::{
    issuer::CredentialIssuer,
    password::Passwords,
    storage::UserStore,
    token::TokenSigner,
};
use crate::types::TokenType;

const DEFAULT_TOKEN_TTL_SECONDS: i64 = 30 * 60;
const DEFAULT_ARGON2_MEMORY_KIB: u32 = 19 * 1024;
const DEFAULT_ARGON2_ITERATIONS: u32 = 2;
const DEFAULT_ARGON2_PARALLELISM: u32 = 1;
const GENERATED_SECRET_BYTES: usize = 32;

#[derive(Clone, Debug)]
pub struct AuthConfig {
    token_secret: SecretString,
    token_ttl_seconds: i64,
    token_type: TokenType,
    argon2_memory_kib: u32,
    argon2_iterations: u32,
    argon2_parallelism: u32,
    frontend_base_url: Option<String>,
}

impl AuthConfig {
    #[must_use]
    pub fn new(token_secret: SecretString) -> Self {
        Self {
            token_secret,
            token_ttl_seconds: DEFAULT_TOKEN_TTL_SECONDS,
            token_type: TokenType::Bearer,
            argon2_memory_kib: DEFAULT_ARGON2_MEMORY_KIB,
            argon2_iterations: DEFAULT_ARGON2_ITERATIONS,
            argon2_parallelism: DEFAULT_ARGON2_PARALLELISM,
            frontend_base_url: None,
        }
    }

    /// Config with a random signing secret. Tokens do not survive a restart.
    #[must_use]
    pub fn with_generated_secret() -> Self {
        warn!("No token secret configured; generating an ephemeral signing secret");
        let mut bytes = [0u8; GENERATED_SECRET_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        let secret: String = bytes.iter().map(|byte| format!("{byte:02x}")).collect();
        Self::new(SecretString::from(secret))
    }

    #[must_use]
    pub fn with_token_ttl_seconds(mut self, seconds: i64) -> Self {
        self.token_ttl_seconds = seconds;
        self
    }

    /// Argon2 cost parameters; lower them only for tests and local tooling.
    #[must_use]
    pub fn with_argon2_params(mut self, memory_kib: u32, iterations: u32, parallelism: u32) -> Self {
        self.argon2_memory_kib = memory_kib;
        self.argon2_iterations = iterations;
        self.argon2_parallelism = parallelism;
        self
    }

    #[must_use]
    pub fn with_frontend_base_url(mut self, url: String) -> Self {
        self.frontend_base_url = Some(url);
        self
    }

    #[must_use]
    pub fn token_ttl_seconds(&self) -> i64 {
        self.token_ttl_seconds
    }

    #[must_use]
    pub fn token_type(&self) -> TokenType {
        self.token_type
    }

    #[must_use]
    pub fn frontend_base_url(&self) -> Option<&str> {
        self.frontend_base_url.as_deref()
    }

    pub(super) fn token_secret(&self) -> &[u8] {
        self.token_secret.expose_secret().as_bytes()
    }

    pub(super) fn argon2_params(&self) -> (u32, u32, u32) {
        (
            self.argon2_memory_kib,
            self.argon2_iterations,
            self.argon2_parallelism,
        )
    }
}

/// Request-scoped view of the auth configuration and the issuer.
pub struct AuthState {
    config: AuthConfig,
    issuer: CredentialIssuer,
}

impl AuthState {
    /// Build the issuer stack from configuration and an identity store.
    ///
    /// # Errors
    /// Returns an error if the password hasher cannot be initialized.
    pub fn new(config: AuthConfig, store: Arc<dyn UserStore>) -> Result<Self> {
        let (memory_kib, iterations, parallelism) = config.argon2_params();
        let passwords = Passwords::new(memory_kib, iterations, parallelism)?;
        let signer = TokenSigner::new(
            config.token_secret(),
            config.token_ttl_seconds(),
            config.token_type(),
        );
        let issuer = CredentialIssuer::new(store, signer, passwords);
        Ok(Self { config, issuer })
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    #[must_use]
    pub fn issuer(&self) -> &CredentialIssuer {
        &self.issuer
    }
}
