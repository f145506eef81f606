//! Trait for SMS service integration

use async_trait::async_trait;

/// Trait for SMS service integration
///
/// Implementations must bound their own dispatch time; a slow provider
/// must not hold an authentication request open indefinitely.
#[async_trait]
pub trait SmsServiceTrait: Send + Sync {
    /// Send a one-time password via SMS
    ///
    /// # Returns
    /// Provider message id on success, provider error text on failure.
    async fn send_otp(&self, phone: &str, code: &str) -> Result<String, String>;
}
