//! Credential issuer: register, login and validate.
//!
//! Flow Overview: registration and login verify or create an identity and then
//! sign a fresh credential for it. `validate` is the resource-server side:
//! it checks signature and expiry, then re-reads the identity so accounts
//! disabled after issuance are refused.

use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use super::{
    password::Passwords,
    storage::{InsertOutcome, UserStore},
    token::{TokenError, TokenSigner},
};
use crate::{
    types::{TokenType, UserSnapshot},
    validation::{validate_login, validate_registration, ValidationError},
};

#[derive(Debug, Error)]
pub enum IssuerError {
    #[error("{0}")]
    InvalidInput(#[from] ValidationError),
    #[error("username or email already registered")]
    DuplicateIdentity,
    #[error("incorrect username/email or password")]
    InvalidCredentials,
    #[error("account is inactive")]
    AccountInactive,
    #[error("could not validate credentials")]
    Unauthenticated,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// A freshly signed credential and the identity it was issued for.
#[derive(Clone, Debug)]
pub struct Issued {
    pub user: UserSnapshot,
    pub access_token: String,
    pub token_type: TokenType,
}

pub struct CredentialIssuer {
    store: Arc<dyn UserStore>,
    signer: TokenSigner,
    passwords: Passwords,
}

impl CredentialIssuer {
    #[must_use]
    pub fn new(store: Arc<dyn UserStore>, signer: TokenSigner, passwords: Passwords) -> Self {
        Self {
            store,
            signer,
            passwords,
        }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn UserStore> {
        &self.store
    }

    #[must_use]
    pub fn signer(&self) -> &TokenSigner {
        &self.signer
    }

    /// Create an identity and issue its first credential.
    ///
    /// # Errors
    /// `InvalidInput` on rule violations, `DuplicateIdentity` when the username
    /// or email is taken, `Internal` on storage or hashing failures.
    #[instrument(skip(self, password))]
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<Issued, IssuerError> {
        let identity = validate_registration(username, email, password)?;

        let passwords = self.passwords.clone();
        let password = password.to_string();
        let password_hash = tokio::task::spawn_blocking(move || passwords.hash(&password))
            .await
            .map_err(|e| anyhow::anyhow!("password hashing task failed: {e}"))??;

        let record = match self
            .store
            .insert(&identity.username, &identity.email, &password_hash)
            .await?
        {
            InsertOutcome::Created(record) => record,
            InsertOutcome::Conflict => {
                debug!("registration conflict");
                return Err(IssuerError::DuplicateIdentity);
            }
        };

        self.issue(record.user)
    }

    /// Verify an identity by username or email and issue a fresh credential.
    ///
    /// # Errors
    /// `InvalidCredentials` for an unknown identifier or wrong password,
    /// `AccountInactive` when the password matches a disabled account.
    #[instrument(skip(self, password))]
    pub async fn login(&self, identifier: &str, password: &str) -> Result<Issued, IssuerError> {
        validate_login(identifier, password)?;

        let record = self.store.find_by_identifier(identifier.trim()).await?;

        let passwords = self.passwords.clone();
        let candidate = password.to_string();
        let stored_hash = record.as_ref().map(|r| r.password_hash.clone());
        let matches = tokio::task::spawn_blocking(move || match stored_hash {
            Some(hash) => passwords.verify(&hash, &candidate),
            None => passwords.verify_dummy(&candidate),
        })
        .await
        .map_err(|e| anyhow::anyhow!("password verification task failed: {e}"))?;

        let Some(record) = record.filter(|_| matches) else {
            debug!("login rejected");
            return Err(IssuerError::InvalidCredentials);
        };

        if !record.user.is_active {
            warn!(user_id = %record.user.id, "login for inactive account");
            return Err(IssuerError::AccountInactive);
        }

        self.issue(record.user)
    }

    /// Resolve a credential into the identity it was issued for.
    ///
    /// # Errors
    /// `Unauthenticated` for bad signatures, expired or malformed tokens and
    /// unknown subjects; `AccountInactive` for disabled accounts.
    #[instrument(skip_all)]
    pub async fn validate(&self, credential: &str) -> Result<UserSnapshot, IssuerError> {
        let claims = self.signer.verify(credential).map_err(|err| {
            match err {
                TokenError::Expired => debug!("credential expired"),
                TokenError::Invalid(ref source) => debug!("credential rejected: {source}"),
                TokenError::Sign(_) | TokenError::Lifetime(_) => {}
            }
            IssuerError::Unauthenticated
        })?;

        let Ok(user_id) = Uuid::parse_str(&claims.sub) else {
            return Err(IssuerError::Unauthenticated);
        };

        let Some(record) = self.store.find_by_id(user_id).await? else {
            return Err(IssuerError::Unauthenticated);
        };

        if !record.user.is_active {
            return Err(IssuerError::AccountInactive);
        }

        Ok(record.user)
    }

    fn issue(&self, user: UserSnapshot) -> Result<Issued, IssuerError> {
        let access_token = self
            .signer
            .issue(&user)
            .map_err(|e| IssuerError::Internal(e.into()))?;
        Ok(Issued {
            user,
            access_token,
            token_type: self.signer.token_type(),
        })
    }
}
