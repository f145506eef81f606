//! One-time password entity for SMS-based authentication.
//!
//! Only a one-way hash of the code is ever stored; the plaintext exists
//! just long enough to be handed to the SMS dispatcher.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What a one-time password proves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OtpPurpose {
    /// Phone-based login (account may not exist yet)
    Login,
    /// Verifying the phone on an existing, authenticated account
    Verification,
}

impl OtpPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Verification => "verification",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "login" => Some(Self::Login),
            "verification" => Some(Self::Verification),
            _ => None,
        }
    }
}

/// One-time password record
///
/// A code is valid only while `used_at` is unset, `attempts` is below the
/// configured maximum, and `expires_at` is in the future. Successful
/// consumption sets `used_at` and permanently invalidates the code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OtpCode {
    /// Unique identifier for the code record
    pub id: Uuid,

    /// Phone number the code was sent to (E.164)
    pub phone: String,

    /// Owning user, when known; null during login-before-resolution
    pub user_id: Option<i64>,

    /// Peppered SHA-256 hash of the code; plaintext is never persisted
    pub code_hash: String,

    /// What this code proves
    pub purpose: OtpPurpose,

    /// Number of verification attempts made against this code
    pub attempts: i32,

    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,

    /// Set exactly once, on successful consumption
    pub used_at: Option<DateTime<Utc>>,

    /// One-way hash of the requesting IP, when available
    pub ip_hash: Option<String>,
}

impl OtpCode {
    /// Create a new code record from an already-hashed code
    pub fn new(
        phone: impl Into<String>,
        purpose: OtpPurpose,
        user_id: Option<i64>,
        code_hash: String,
        ttl_minutes: i64,
        ip_hash: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            phone: phone.into(),
            user_id,
            code_hash,
            purpose,
            attempts: 0,
            created_at: now,
            expires_at: now + Duration::minutes(ttl_minutes),
            used_at: None,
            ip_hash,
        }
    }

    /// Whether the code has expired
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Whether the code has already been consumed
    pub fn is_used(&self) -> bool {
        self.used_at.is_some()
    }

    /// Whether the attempt budget is spent
    pub fn is_exhausted(&self, max_attempts: i32) -> bool {
        self.attempts >= max_attempts
    }

    /// Whether the code can still be verified
    pub fn is_valid(&self, max_attempts: i32, now: DateTime<Utc>) -> bool {
        !self.is_used() && !self.is_exhausted(max_attempts) && !self.is_expired(now)
    }

    /// Remaining verification attempts
    pub fn remaining_attempts(&self, max_attempts: i32) -> i32 {
        (max_attempts - self.attempts).max(0)
    }

    /// Seconds until expiry, zero once expired
    pub fn expires_in_seconds(&self, now: DateTime<Utc>) -> i64 {
        (self.expires_at - now).num_seconds().max(0)
    }
}
