//! Password hashing and verification

use bcrypt::{hash, verify, DEFAULT_COST};

use crate::errors::{DomainError, DomainResult};

/// Hash a password for storage
pub fn hash_password(password: &str) -> DomainResult<String> {
    hash(password, DEFAULT_COST).map_err(|_| DomainError::Internal {
        message: "Password hashing failed".to_string(),
    })
}

/// Verify a password against a stored hash
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    verify(password, password_hash).unwrap_or(false)
}

/// Burn comparable CPU time when no stored hash exists
///
/// Called on the unknown-identifier path of password login so its
/// latency stays close to the wrong-password path, keeping responses
/// useless for probing which emails are registered.
pub fn dummy_verify(password: &str) {
    let _ = hash(password, DEFAULT_COST);
}
