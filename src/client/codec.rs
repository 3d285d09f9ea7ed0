//! Read-only credential inspection.
//!
//! Decoding never verifies the signature. The claims are only good for reading
//! `exp` ahead of a request and for display; they prove nothing.

use base64ct::{Base64Unpadded, Base64UrlUnpadded, Encoding};
use serde_json::{Map, Value};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

pub type ClaimsMap = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("expected 3 token segments, found {0}")]
    SegmentCount(usize),
    #[error("invalid base64 payload")]
    Base64,
    #[error("invalid json payload: {0}")]
    Json(String),
    #[error("claims payload is not an object")]
    NotAnObject,
    #[error("missing or invalid claim: {0}")]
    MissingClaim(&'static str),
}

/// Claims read from a credential payload, with `exp` and `sub` checked.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedClaims {
    pub sub: String,
    pub exp: i64,
    /// Full payload, including claims this client does not interpret.
    pub raw: ClaimsMap,
}

/// Decode the payload segment of a credential without verifying it.
///
/// # Errors
/// Returns a [`DecodeError`] for a wrong segment count, bad base64, bad JSON,
/// a non-object payload, or a missing `exp`/`sub`.
pub fn decode(credential: &str) -> Result<DecodedClaims, DecodeError> {
    let segments: Vec<&str> = credential.trim().split('.').collect();
    if segments.len() != 3 {
        return Err(DecodeError::SegmentCount(segments.len()));
    }

    let payload = segments[1].trim_end_matches('=');
    let bytes = Base64UrlUnpadded::decode_vec(payload)
        .or_else(|_| Base64Unpadded::decode_vec(payload))
        .map_err(|_| DecodeError::Base64)?;

    let value: Value =
        serde_json::from_slice(&bytes).map_err(|err| DecodeError::Json(err.to_string()))?;
    let Value::Object(raw) = value else {
        return Err(DecodeError::NotAnObject);
    };

    let exp = raw
        .get("exp")
        .and_then(|exp| exp.as_i64().or_else(|| exp.as_f64().map(|f| f.floor() as i64)))
        .ok_or(DecodeError::MissingClaim("exp"))?;
    let sub = raw
        .get("sub")
        .and_then(Value::as_str)
        .ok_or(DecodeError::MissingClaim("sub"))?
        .to_string();

    Ok(DecodedClaims { sub, exp, raw })
}

/// Current time in whole seconds since the unix epoch.
#[must_use]
pub fn now_unix_seconds() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| i64::try_from(duration.as_secs()).unwrap_or(i64::MAX))
}

/// True when the credential cannot be decoded or `now >= exp`.
#[must_use]
pub fn is_expired_at(credential: &str, now: i64) -> bool {
    decode(credential).map_or(true, |claims| now >= claims.exp)
}

/// Fail-closed expiry check against the system clock.
#[must_use]
pub fn is_expired(credential: &str) -> bool {
    is_expired_at(credential, now_unix_seconds())
}
