//! Shared mocks for authentication service tests

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Mutex;

use crate::services::auth::rate_limiter::RateLimiterTrait;
use crate::services::otp::SmsServiceTrait;

/// SMS stub recording every dispatched code
pub struct RecordingSms {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingSms {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Last code dispatched, if any
    pub fn last_code(&self) -> Option<String> {
        self.sent.lock().unwrap().last().map(|(_, code)| code.clone())
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl SmsServiceTrait for RecordingSms {
    async fn send_otp(&self, phone: &str, code: &str) -> Result<String, String> {
        let mut sent = self.sent.lock().unwrap();
        sent.push((phone.to_string(), code.to_string()));
        Ok(format!("msg-{}", sent.len()))
    }
}

/// Deterministic in-memory rate limiter with sliding windows and locks
pub struct MemoryRateLimiter {
    phone_limit: u32,
    ip_limit: u32,
    window: Duration,
    phone_hits: Mutex<HashMap<String, Vec<DateTime<Utc>>>>,
    ip_hits: Mutex<HashMap<String, Vec<DateTime<Utc>>>>,
    locks: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl MemoryRateLimiter {
    pub fn new(phone_limit: u32, ip_limit: u32, window_seconds: i64) -> Self {
        Self {
            phone_limit,
            ip_limit,
            window: Duration::seconds(window_seconds),
            phone_hits: Mutex::new(HashMap::new()),
            ip_hits: Mutex::new(HashMap::new()),
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Effectively unlimited, for tests not exercising the limiter
    pub fn permissive() -> Self {
        Self::new(u32::MAX, u32::MAX, 3600)
    }

    /// Shift all recorded hits for a phone into the past, simulating an
    /// elapsed window
    pub fn backdate_phone(&self, phone: &str, seconds: i64) {
        if let Some(hits) = self.phone_hits.lock().unwrap().get_mut(phone) {
            for hit in hits.iter_mut() {
                *hit = *hit - Duration::seconds(seconds);
            }
        }
    }

    fn count_in_window(hits: &[DateTime<Utc>], window: Duration) -> u32 {
        let cutoff = Utc::now() - window;
        hits.iter().filter(|t| **t > cutoff).count() as u32
    }
}

#[async_trait]
impl RateLimiterTrait for MemoryRateLimiter {
    async fn check_phone_limit(&self, phone: &str) -> Result<bool, String> {
        let hits = self.phone_hits.lock().unwrap();
        let count = hits
            .get(phone)
            .map(|h| Self::count_in_window(h, self.window))
            .unwrap_or(0);
        Ok(count >= self.phone_limit)
    }

    async fn increment_phone_counter(&self, phone: &str) -> Result<i64, String> {
        let mut hits = self.phone_hits.lock().unwrap();
        let entry = hits.entry(phone.to_string()).or_default();
        entry.push(Utc::now());
        Ok(entry.len() as i64)
    }

    async fn phone_limit_reset_in(&self, _phone: &str) -> Result<Option<i64>, String> {
        Ok(Some(self.window.num_seconds()))
    }

    async fn check_ip_limit(&self, ip: &str) -> Result<bool, String> {
        let hits = self.ip_hits.lock().unwrap();
        let count = hits
            .get(ip)
            .map(|h| Self::count_in_window(h, self.window))
            .unwrap_or(0);
        Ok(count >= self.ip_limit)
    }

    async fn increment_ip_counter(&self, ip: &str) -> Result<i64, String> {
        let mut hits = self.ip_hits.lock().unwrap();
        let entry = hits.entry(ip.to_string()).or_default();
        entry.push(Utc::now());
        Ok(entry.len() as i64)
    }

    async fn ip_limit_reset_in(&self, _ip: &str) -> Result<Option<i64>, String> {
        Ok(Some(self.window.num_seconds()))
    }

    async fn lock(&self, identifier: &str, duration_seconds: u64) -> Result<(), String> {
        self.locks.lock().unwrap().insert(
            identifier.to_string(),
            Utc::now() + Duration::seconds(duration_seconds as i64),
        );
        Ok(())
    }

    async fn locked_for(&self, identifier: &str) -> Result<Option<i64>, String> {
        let locks = self.locks.lock().unwrap();
        Ok(locks.get(identifier).and_then(|until| {
            let remaining = (*until - Utc::now()).num_seconds();
            (remaining > 0).then_some(remaining)
        }))
    }
}
