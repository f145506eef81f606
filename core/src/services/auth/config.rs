//! Configuration for the authentication service

use ph_shared::config::LockoutConfig;

/// Configuration for the authentication service
///
/// Injected at construction so tests can supply deterministic
/// thresholds; nothing here lives in module-level globals.
#[derive(Debug, Clone)]
pub struct AuthServiceConfig {
    /// Whether phone OTP login may create accounts on first use
    pub allow_registration: bool,

    /// Whether one Telegram account may link to multiple users.
    /// Off by default (strict 1:1); deployments supporting shared
    /// family/business accounts flip this.
    pub allow_shared_telegram: bool,

    /// Failed-login and phone lockout thresholds
    pub lockout: LockoutConfig,
}

impl Default for AuthServiceConfig {
    fn default() -> Self {
        Self {
            allow_registration: true,
            allow_shared_telegram: false,
            lockout: LockoutConfig::default(),
        }
    }
}
