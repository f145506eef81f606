//! Configuration module with business-specific sub-modules
//!
//! This module organizes configuration into logical areas:
//! - `auth` - JWT, OTP, link-token, and lockout configuration
//! - `cache` - Redis configuration
//! - `database` - Database connection and pool configuration
//! - `rate_limit` - Rate limiting for OTP and login endpoints
//! - `server` - HTTP server and CORS configuration
//! - `sms` - SMS provider configuration
//! - `telegram` - Telegram bot/deep-link configuration

pub mod auth;
pub mod cache;
pub mod database;
pub mod rate_limit;
pub mod server;
pub mod sms;
pub mod telegram;

// Re-export commonly used types
pub use auth::{JwtConfig, LinkTokenConfig, LockoutConfig, OtpConfig};
pub use cache::CacheConfig;
pub use database::DatabaseConfig;
pub use rate_limit::RateLimitConfig;
pub use server::{CorsConfig, ServerConfig};
pub use sms::SmsConfig;
pub use telegram::TelegramConfig;
