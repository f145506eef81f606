//! SMS dispatch implementations
//!
//! Two providers implement the core `SmsServiceTrait`: a log-only mock
//! for development and tests, and a generic HTTP gateway client for
//! production. `SmsDispatcher` wraps the configured choice behind one
//! concrete type.

pub mod http_sms;
pub mod mock_sms;

use async_trait::async_trait;

use ph_core::services::otp::SmsServiceTrait;
use ph_shared::config::sms::{SmsConfig, SmsProvider};

pub use http_sms::HttpSmsService;
pub use mock_sms::MockSmsService;

/// SMS provider selected by configuration
pub enum SmsDispatcher {
    Mock(MockSmsService),
    Http(HttpSmsService),
}

#[async_trait]
impl SmsServiceTrait for SmsDispatcher {
    async fn send_otp(&self, phone: &str, code: &str) -> Result<String, String> {
        match self {
            Self::Mock(mock) => mock.send_otp(phone, code).await,
            Self::Http(http) => http.send_otp(phone, code).await,
        }
    }
}

/// Build the SMS provider selected by configuration
pub fn create_sms_service(config: &SmsConfig) -> SmsDispatcher {
    match config.provider {
        SmsProvider::Mock => {
            tracing::info!("Using mock SMS provider");
            SmsDispatcher::Mock(MockSmsService::new())
        }
        SmsProvider::Http => {
            tracing::info!("Using HTTP SMS gateway provider");
            SmsDispatcher::Http(HttpSmsService::new(config.clone()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_factory_selects_mock_by_default() {
        let dispatcher = create_sms_service(&SmsConfig::default());
        let message_id = dispatcher.send_otp("+8613812345678", "123456").await.unwrap();
        assert!(message_id.starts_with("mock-"));
    }
}
