//! Phone helpers for the authentication flows

use sha2::{Digest, Sha256};

use ph_shared::utils::phone;

/// Validate a phone number for authentication (E.164)
pub fn validate_phone(value: &str) -> bool {
    phone::is_valid_e164(value)
}

/// Mask a phone number for logs and error messages
pub fn mask_phone(value: &str) -> String {
    phone::mask_phone_number(value)
}

/// One-way hash of a phone number for audit correlation
pub fn hash_phone(value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    format!("{:x}", hasher.finalize())
}
