//! Password Hashing and Verification
//!
//! Opaque `hash(password) -> digest` / `verify(password, digest) -> bool`
//! capability backed by Argon2id. Digests are stored as PHC strings,
//! which carry algorithm, parameters, and salt alongside the hash.

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use rand::rngs::OsRng;
use thiserror::Error;

/// Password hashing errors
#[derive(Debug, Error)]
pub enum PasswordHashError {
    /// Hashing operation failed
    #[error("Password hashing failed: {0}")]
    HashingFailed(String),

    /// Invalid digest format
    #[error("Invalid password digest format")]
    InvalidDigestFormat,
}

/// Hash a password into a PHC-formatted Argon2id digest
pub fn hash_password(password: &str) -> Result<String, PasswordHashError> {
    let salt = SaltString::generate(OsRng);
    let argon2 = Argon2::default();

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordHashError::HashingFailed(e.to_string()))?;

    Ok(hash.to_string())
}

/// Verify a password against a stored PHC digest
///
/// Returns false for malformed digests rather than erroring; a corrupt
/// stored digest must read as a failed authentication, not a 500.
pub fn verify_password(password: &str, digest: &str) -> bool {
    let parsed = match PasswordHash::new(digest) {
        Ok(h) => h,
        Err(_) => return false,
    };

    // Argon2 uses constant-time comparison internally
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let digest = hash_password("correct horse battery staple").unwrap();
        assert!(verify_password("correct horse battery staple", &digest));
        assert!(!verify_password("wrong password", &digest));
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_password("same input").unwrap();
        let b = hash_password("same input").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_malformed_digest_fails_closed() {
        assert!(!verify_password("anything", "not-a-phc-string"));
        assert!(!verify_password("anything", ""));
    }

    #[test]
    fn test_digest_is_phc_format() {
        let digest = hash_password("some password").unwrap();
        assert!(digest.starts_with("$argon2id$"));
    }
}
