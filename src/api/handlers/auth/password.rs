//! One-way password hashing.
//!
//! Only PHC strings are stored. Verification runs against a dummy hash when an
//! identity is unknown so login latency does not reveal which part was wrong.

use anyhow::{anyhow, Context, Result};
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::RngCore;

const SALT_BYTES: usize = 16;

#[derive(Clone)]
pub struct Passwords {
    argon2: Argon2<'static>,
    dummy_hash: String,
}

impl Passwords {
    /// # Errors
    /// Returns an error if the Argon2 parameters are out of range.
    pub fn new(memory_kib: u32, iterations: u32, parallelism: u32) -> Result<Self> {
        let params = Params::new(memory_kib, iterations, parallelism, None)
            .map_err(|e| anyhow!("invalid argon2 params: {e}"))?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        let dummy_hash = hash_with(&argon2, "calcgate-dummy-password")?;
        Ok(Self { argon2, dummy_hash })
    }

    /// # Errors
    /// Returns an error if hashing fails.
    pub fn hash(&self, password: &str) -> Result<String> {
        hash_with(&self.argon2, password)
    }

    /// Check `password` against a stored PHC string. Unparseable hashes never match.
    #[must_use]
    pub fn verify(&self, hash: &str, password: &str) -> bool {
        PasswordHash::new(hash).is_ok_and(|parsed| {
            self.argon2
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
    }

    /// Burn the same work as a real verification; always false.
    pub fn verify_dummy(&self, password: &str) -> bool {
        let _ = self.verify(&self.dummy_hash, password);
        false
    }
}

fn hash_with(argon2: &Argon2<'_>, password: &str) -> Result<String> {
    let mut salt_bytes = [0u8; SALT_BYTES];
    rand::thread_rng().fill_bytes(&mut salt_bytes);
    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|e| anyhow!(e.to_string()))
        .context("failed to encode salt")?;
    let phc = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow!(e.to_string()))
        .context("failed to hash password")?
        .to_string();
    Ok(phc)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passwords() -> Passwords {
        Passwords::new(8, 1, 1).unwrap()
    }

    #[test]
    fn hash_never_contains_plaintext() {
        let hash = passwords().hash("securepass123").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(!hash.contains("securepass123"));
    }

    #[test]
    fn verify_matches_only_the_original_password() {
        let passwords = passwords();
        let hash = passwords.hash("securepass123").unwrap();
        assert!(passwords.verify(&hash, "securepass123"));
        assert!(!passwords.verify(&hash, "wrongpass123"));
    }

    #[test]
    fn same_password_hashes_differently() {
        let passwords = passwords();
        let first = passwords.hash("securepass123").unwrap();
        let second = passwords.hash("securepass123").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn malformed_hash_never_verifies() {
        assert!(!passwords().verify("not-a-phc-string", "securepass123"));
        assert!(!passwords().verify_dummy("securepass123"));
    }

    #[test]
    fn invalid_params_are_rejected() {
        assert!(Passwords::new(0, 0, 0).is_err());
    }
}
