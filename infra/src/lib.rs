//! # PartsHub Infrastructure
//!
//! Infrastructure layer for the PartsHub backend: MySQL repository
//! implementations, the Redis rate limiter, and SMS dispatch providers.
//! Everything here implements interfaces defined in `ph_core`.

pub mod cache;
pub mod database;
pub mod rate_limit;
pub mod sms;

pub use cache::RedisClient;
pub use database::connection::create_pool;
pub use database::mysql::{
    MySqlAuditRepository, MySqlLinkTokenRepository, MySqlOtpRepository, MySqlUserRepository,
};
pub use rate_limit::RedisRateLimiter;
pub use sms::{create_sms_service, HttpSmsService, MockSmsService, SmsDispatcher};
