//! Redis-based rate limiter for authentication flows
//!
//! Sliding windows are sorted sets of request timestamps; lockouts are
//! plain keys with a TTL. Identifiers are hashed before they become
//! Redis keys so raw phones and IPs never appear in the keyspace.

use async_trait::async_trait;
use chrono::Utc;
use redis::AsyncCommands;
use sha2::{Digest, Sha256};

use ph_core::services::auth::RateLimiterTrait;
use ph_shared::config::RateLimitConfig;

use crate::cache::RedisClient;

/// Redis-backed implementation of the rate limiter trait
pub struct RedisRateLimiter {
    redis: RedisClient,
    config: RateLimitConfig,
}

impl RedisRateLimiter {
    pub fn new(redis: RedisClient, config: RateLimitConfig) -> Self {
        Self { redis, config }
    }

    fn hashed(value: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(value.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    fn window_key(&self, kind: &str, identifier: &str) -> String {
        self.redis
            .key(&format!("rate:{}:{}", kind, Self::hashed(identifier)))
    }

    fn lock_key(&self, identifier: &str) -> String {
        self.redis
            .key(&format!("lock:{}", Self::hashed(identifier)))
    }

    /// Count entries inside the sliding window, dropping expired ones
    async fn window_count(&self, key: &str) -> Result<u32, String> {
        let mut conn = self.redis.connection();
        let now = Utc::now().timestamp_millis();
        let window_start = now - (self.config.window_seconds as i64 * 1000);

        let _: i64 = redis::cmd("ZREMRANGEBYSCORE")
            .arg(key)
            .arg("-inf")
            .arg(window_start)
            .query_async(&mut conn)
            .await
            .map_err(|e| format!("Failed to trim rate limit window: {}", e))?;

        conn.zcount(key, window_start, "+inf")
            .await
            .map_err(|e| format!("Failed to count rate limit window: {}", e))
    }

    /// Add the current instant to the window and refresh its expiry
    async fn window_add(&self, key: &str) -> Result<i64, String> {
        let mut conn = self.redis.connection();
        let now = Utc::now().timestamp_millis();

        let _: i64 = conn
            .zadd(key, now.to_string(), now)
            .await
            .map_err(|e| format!("Failed to update rate limit window: {}", e))?;
        let _: bool = conn
            .expire(key, self.config.window_seconds as i64)
            .await
            .map_err(|e| format!("Failed to set window expiry: {}", e))?;

        conn.zcard(key)
            .await
            .map_err(|e| format!("Failed to read window size: {}", e))
    }

    /// Seconds until the oldest entry leaves the window
    async fn window_reset_in(&self, key: &str) -> Result<Option<i64>, String> {
        let mut conn = self.redis.connection();
        let oldest: Vec<(String, i64)> = conn
            .zrange_withscores(key, 0, 0)
            .await
            .map_err(|e| format!("Failed to read window head: {}", e))?;

        Ok(oldest.first().map(|(_, timestamp)| {
            let now = Utc::now().timestamp_millis();
            let reset_at = timestamp + self.config.window_seconds as i64 * 1000;
            ((reset_at - now) / 1000).max(1)
        }))
    }
}

#[async_trait]
impl RateLimiterTrait for RedisRateLimiter {
    async fn check_phone_limit(&self, phone: &str) -> Result<bool, String> {
        if !self.config.enabled {
            return Ok(false);
        }
        let key = self.window_key("phone", phone);
        let count = self.window_count(&key).await?;
        Ok(count >= self.config.otp_per_phone)
    }

    async fn increment_phone_counter(&self, phone: &str) -> Result<i64, String> {
        let key = self.window_key("phone", phone);
        self.window_add(&key).await
    }

    async fn phone_limit_reset_in(&self, phone: &str) -> Result<Option<i64>, String> {
        let key = self.window_key("phone", phone);
        self.window_reset_in(&key).await
    }

    async fn check_ip_limit(&self, ip: &str) -> Result<bool, String> {
        if !self.config.enabled {
            return Ok(false);
        }
        let key = self.window_key("ip", ip);
        let count = self.window_count(&key).await?;
        Ok(count >= self.config.requests_per_ip)
    }

    async fn increment_ip_counter(&self, ip: &str) -> Result<i64, String> {
        let key = self.window_key("ip", ip);
        self.window_add(&key).await
    }

    async fn ip_limit_reset_in(&self, ip: &str) -> Result<Option<i64>, String> {
        let key = self.window_key("ip", ip);
        self.window_reset_in(&key).await
    }

    async fn lock(&self, identifier: &str, duration_seconds: u64) -> Result<(), String> {
        let key = self.lock_key(identifier);
        let mut conn = self.redis.connection();

        tracing::warn!(
            event = "identifier_locked",
            duration_seconds,
            "Locking identifier after repeated failures"
        );

        conn.set_ex(&key, "locked", duration_seconds)
            .await
            .map_err(|e| format!("Failed to set lock: {}", e))
    }

    async fn locked_for(&self, identifier: &str) -> Result<Option<i64>, String> {
        let key = self.lock_key(identifier);
        let mut conn = self.redis.connection();

        let ttl: i64 = conn
            .ttl(&key)
            .await
            .map_err(|e| format!("Failed to read lock TTL: {}", e))?;

        // -2 key missing, -1 no expiry
        Ok((ttl > 0).then_some(ttl))
    }
}
