//! Credential signing and verification (HS256 JWT).

use chrono::Utc;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use crate::types::{TokenType, UserSnapshot};

/// Claims carried by every issued credential.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// User id.
    pub sub: String,
    pub username: String,
    pub iat: i64,
    pub exp: i64,
    /// Unique per issuance so a new login never reuses a prior token.
    pub jti: String,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("failed to sign token")]
    Sign(#[source] jsonwebtoken::errors::Error),
    #[error("token lifetime of {0}s overflows the expiry timestamp")]
    Lifetime(i64),
    #[error("token expired")]
    Expired,
    #[error("invalid token")]
    Invalid(#[source] jsonwebtoken::errors::Error),
}

#[derive(Clone)]
pub struct TokenSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl_seconds: i64,
    token_type: TokenType,
}

impl fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSigner")
            .field("ttl_seconds", &self.ttl_seconds)
            .field("token_type", &self.token_type)
            .finish_non_exhaustive()
    }
}

impl TokenSigner {
    #[must_use]
    pub fn new(secret: &[u8], ttl_seconds: i64, token_type: TokenType) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl_seconds,
            token_type,
        }
    }

    #[must_use]
    pub fn token_type(&self) -> TokenType {
        self.token_type
    }

    /// Issue a fresh credential for `user`, valid for the configured lifetime.
    ///
    /// # Errors
    /// Returns an error if the claims cannot be signed.
    pub fn issue(&self, user: &UserSnapshot) -> Result<String, TokenError> {
        self.issue_at(user, Utc::now().timestamp())
    }

    /// Issue a credential as if the current time were `now` (unix seconds).
    ///
    /// # Errors
    /// Returns an error if the claims cannot be signed.
    pub fn issue_at(&self, user: &UserSnapshot, now: i64) -> Result<String, TokenError> {
        let exp = now
            .checked_add(self.ttl_seconds)
            .ok_or(TokenError::Lifetime(self.ttl_seconds))?;
        let claims = Claims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            iat: now,
            exp,
            jti: Uuid::new_v4().to_string(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(TokenError::Sign)
    }

    /// Verify the signature and expiry of a credential and return its claims.
    ///
    /// # Errors
    /// Returns [`TokenError::Expired`] once `exp` is reached and
    /// [`TokenError::Invalid`] for anything else that fails verification.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(token, Utc::now().timestamp())
    }

    /// Verify as if the current time were `now` (unix seconds).
    ///
    /// jsonwebtoken only rejects `exp < now`; a credential is also dead at
    /// `exp == now`, matching the client codec.
    ///
    /// # Errors
    /// See [`TokenSigner::verify`].
    pub fn verify_at(&self, token: &str, now: i64) -> Result<Claims, TokenError> {
        let claims = decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|err| match err.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(err),
            })?;
        if claims.exp <= now {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }
}
