//! Rate limiting trait for authentication flows

use async_trait::async_trait;

/// Admission control in front of OTP and login operations
///
/// An identifier (phone or IP) moves between three states: open
/// (requests pass and count against a sliding window), throttled (the
/// window budget is spent; requests are rejected until the window
/// slides), and locked (a fixed cooldown imposed after repeated failed
/// verifications, regardless of the window state).
#[async_trait]
pub trait RateLimiterTrait: Send + Sync {
    /// Check whether a phone number has spent its request budget
    ///
    /// # Returns
    /// `true` when the limit is exceeded and the request must be rejected.
    async fn check_phone_limit(&self, phone: &str) -> Result<bool, String>;

    /// Count a request against the phone's window
    async fn increment_phone_counter(&self, phone: &str) -> Result<i64, String>;

    /// Seconds until the phone's window has room again, if throttled
    async fn phone_limit_reset_in(&self, phone: &str) -> Result<Option<i64>, String>;

    /// Check whether an IP address has spent its request budget
    async fn check_ip_limit(&self, ip: &str) -> Result<bool, String>;

    /// Count a request against the IP's window
    async fn increment_ip_counter(&self, ip: &str) -> Result<i64, String>;

    /// Seconds until the IP's window has room again, if throttled
    async fn ip_limit_reset_in(&self, ip: &str) -> Result<Option<i64>, String>;

    /// Impose a fixed lockout on an identifier (failed-verification cooldown)
    async fn lock(&self, identifier: &str, duration_seconds: u64) -> Result<(), String>;

    /// Seconds remaining on an identifier's lockout, if locked
    async fn locked_for(&self, identifier: &str) -> Result<Option<i64>, String>;
}
