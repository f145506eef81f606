//! Rate limiting infrastructure

pub mod redis_rate_limiter;

pub use redis_rate_limiter::RedisRateLimiter;
