//! Authentication configuration: JWT, OTP, link tokens, and lockouts

use serde::{Deserialize, Serialize};

/// JWT session token configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JwtConfig {
    /// JWT secret key for signing tokens
    pub secret: String,

    /// Access token expiry time in seconds
    pub access_token_expiry: i64,

    /// JWT issuer claim
    pub issuer: String,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: String::from("change-me-in-production"),
            access_token_expiry: 1800, // 30 minutes
            issuer: String::from("partshub"),
        }
    }
}

impl JwtConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            secret: std::env::var("JWT_SECRET").unwrap_or(defaults.secret),
            access_token_expiry: std::env::var("JWT_ACCESS_TOKEN_EXPIRY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.access_token_expiry),
            issuer: std::env::var("JWT_ISSUER").unwrap_or(defaults.issuer),
        }
    }

    /// Check if using the default secret (security warning)
    pub fn is_using_default_secret(&self) -> bool {
        self.secret == "change-me-in-production"
    }
}

/// One-time password configuration
///
/// Code length and TTL are product decisions still under review, so both
/// are configuration parameters rather than constants.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OtpConfig {
    /// Number of digits in a generated code (4-6 supported)
    pub code_length: usize,

    /// Minutes until a code expires
    pub ttl_minutes: i64,

    /// Maximum verification attempts per code
    pub max_attempts: i32,

    /// Seconds a client must wait before requesting a new code
    pub resend_cooldown_seconds: i64,

    /// Application-wide pepper mixed into code hashes
    pub pepper: String,
}

impl Default for OtpConfig {
    fn default() -> Self {
        Self {
            code_length: 6,
            ttl_minutes: 5,
            max_attempts: 3,
            resend_cooldown_seconds: 60,
            pepper: String::from("dev-otp-pepper"),
        }
    }
}

impl OtpConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            code_length: std::env::var("OTP_CODE_LENGTH")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.code_length),
            ttl_minutes: std::env::var("OTP_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.ttl_minutes),
            max_attempts: std::env::var("OTP_MAX_ATTEMPTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_attempts),
            resend_cooldown_seconds: std::env::var("OTP_RESEND_COOLDOWN_SECONDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.resend_cooldown_seconds),
            pepper: std::env::var("OTP_PEPPER").unwrap_or(defaults.pepper),
        }
    }
}

/// Telegram link-token configuration
///
/// The TTL is deliberately shorter than the OTP TTL: a redeemed link token
/// grants a session, not merely a verification step.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LinkTokenConfig {
    /// Minutes until a link token expires
    pub ttl_minutes: i64,

    /// Length of the generated opaque token in characters
    pub token_length: usize,
}

impl Default for LinkTokenConfig {
    fn default() -> Self {
        Self {
            ttl_minutes: 3,
            token_length: 32,
        }
    }
}

impl LinkTokenConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            ttl_minutes: std::env::var("LINK_TOKEN_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.ttl_minutes),
            token_length: std::env::var("LINK_TOKEN_LENGTH")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.token_length),
        }
    }
}

/// Failed-login lockout configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LockoutConfig {
    /// Failed password attempts before the account locks
    pub max_failed_logins: i32,

    /// Minutes an account stays locked
    pub account_lock_minutes: i64,

    /// Seconds a phone identifier stays locked after exhausting OTP attempts
    pub phone_lock_seconds: u64,
}

impl Default for LockoutConfig {
    fn default() -> Self {
        Self {
            max_failed_logins: 5,
            account_lock_minutes: 30,
            phone_lock_seconds: 1800,
        }
    }
}

impl LockoutConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_failed_logins: std::env::var("AUTH_MAX_FAILED_LOGINS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_failed_logins),
            account_lock_minutes: std::env::var("AUTH_ACCOUNT_LOCK_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.account_lock_minutes),
            phone_lock_seconds: std::env::var("AUTH_PHONE_LOCK_SECONDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.phone_lock_seconds),
        }
    }
}
