//! Identity input rules.
//!
//! The server enforces these as the authority; the client runs the same checks
//! before a request only to give faster feedback.

use regex::Regex;
use thiserror::Error;

pub const USERNAME_MIN_CHARS: usize = 3;
pub const USERNAME_MAX_CHARS: usize = 50;
pub const PASSWORD_MIN_CHARS: usize = 8;
pub const PASSWORD_MAX_CHARS: usize = 128;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("username must be between 3 and 50 characters")]
    UsernameLength,
    #[error("invalid email address")]
    Email,
    #[error("password must be between 8 and 128 characters")]
    PasswordLength,
    #[error("username or email is required")]
    MissingIdentifier,
    #[error("password is required")]
    MissingPassword,
}

/// Registration input after trimming and email normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewIdentity {
    pub username: String,
    pub email: String,
}

/// Normalize an email for lookup/uniqueness checks.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Basic email format check on already-normalized input.
#[must_use]
pub fn valid_email(email_normalized: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|re| re.is_match(email_normalized))
}

/// Validate and normalize registration input.
///
/// # Errors
/// Returns the first rule the input violates.
pub fn validate_registration(
    username: &str,
    email: &str,
    password: &str,
) -> Result<NewIdentity, ValidationError> {
    let username = username.trim();
    let length = username.chars().count();
    if !(USERNAME_MIN_CHARS..=USERNAME_MAX_CHARS).contains(&length) {
        return Err(ValidationError::UsernameLength);
    }

    let email = normalize_email(email);
    if !valid_email(&email) {
        return Err(ValidationError::Email);
    }

    let length = password.chars().count();
    if !(PASSWORD_MIN_CHARS..=PASSWORD_MAX_CHARS).contains(&length) {
        return Err(ValidationError::PasswordLength);
    }

    Ok(NewIdentity {
        username: username.to_string(),
        email,
    })
}

/// Login only checks presence; wrong values are reported as bad credentials.
///
/// # Errors
/// Returns an error when the identifier or password is blank.
pub fn validate_login(identifier: &str, password: &str) -> Result<(), ValidationError> {
    if identifier.trim().is_empty() {
        return Err(ValidationError::MissingIdentifier);
    }
    if password.is_empty() {
        return Err(ValidationError::MissingPassword);
    }
    Ok(())
}
