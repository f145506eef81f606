//! Application configuration loading

use ph_shared::config::{
    CacheConfig, CorsConfig, DatabaseConfig, JwtConfig, LinkTokenConfig, LockoutConfig,
    OtpConfig, RateLimitConfig, ServerConfig, SmsConfig, TelegramConfig,
};

/// Complete API configuration assembled from environment variables
///
/// `.env` files are honored via dotenvy before this is built.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub cors: CorsConfig,
    pub database: DatabaseConfig,
    pub cache: CacheConfig,
    pub jwt: JwtConfig,
    pub otp: OtpConfig,
    pub link_token: LinkTokenConfig,
    pub lockout: LockoutConfig,
    pub rate_limit: RateLimitConfig,
    pub sms: SmsConfig,
    pub telegram: TelegramConfig,
    /// Whether phone OTP login may create accounts on first use
    pub allow_registration: bool,
    /// Whether one Telegram account may link to multiple users
    pub allow_shared_telegram: bool,
}

impl AppConfig {
    /// Load configuration from the environment
    pub fn load() -> Self {
        Self {
            server: ServerConfig::from_env(),
            cors: CorsConfig::from_env(),
            database: DatabaseConfig::from_env(),
            cache: CacheConfig::from_env(),
            jwt: JwtConfig::from_env(),
            otp: OtpConfig::from_env(),
            link_token: LinkTokenConfig::from_env(),
            lockout: LockoutConfig::from_env(),
            rate_limit: RateLimitConfig::from_env(),
            sms: SmsConfig::from_env(),
            telegram: TelegramConfig::from_env(),
            allow_registration: std::env::var("AUTH_ALLOW_REGISTRATION")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
            allow_shared_telegram: std::env::var("AUTH_ALLOW_SHARED_TELEGRAM")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
        }
    }
}
