//! Rate limiting configuration module

use serde::{Deserialize, Serialize};

/// Rate limiting configuration for OTP requests and login attempts
///
/// Phone-level budgets stop targeted abuse of a single account; IP-level
/// budgets stop distributed credential stuffing from one source across
/// many phone numbers.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    /// Enable rate limiting
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Max OTP requests per phone number per window
    pub otp_per_phone: u32,

    /// Max auth requests per IP address per window
    pub requests_per_ip: u32,

    /// Sliding window length in seconds
    pub window_seconds: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            otp_per_phone: 3,
            requests_per_ip: 10,
            window_seconds: 3600,
        }
    }
}

impl RateLimitConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            enabled: std::env::var("RATE_LIMIT_ENABLED")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.enabled),
            otp_per_phone: std::env::var("RATE_LIMIT_OTP_PER_PHONE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.otp_per_phone),
            requests_per_ip: std::env::var("RATE_LIMIT_REQUESTS_PER_IP")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.requests_per_ip),
            window_seconds: std::env::var("RATE_LIMIT_WINDOW_SECONDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.window_seconds),
        }
    }
}

fn default_enabled() -> bool {
    true
}
