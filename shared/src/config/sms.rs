//! SMS provider configuration module

use serde::{Deserialize, Serialize};

/// SMS provider selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SmsProvider {
    /// Log-only mock, for development and tests
    Mock,
    /// Generic HTTP gateway provider
    Http,
}

/// SMS dispatch configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SmsConfig {
    /// Which provider implementation to use
    pub provider: SmsProvider,

    /// Provider gateway URL (HTTP provider only)
    #[serde(default)]
    pub gateway_url: Option<String>,

    /// Provider API key (HTTP provider only)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Sender id shown to the recipient
    pub sender_id: String,

    /// Dispatch timeout in seconds; a slow provider must not hold
    /// a request open past this bound
    pub timeout_seconds: u64,
}

impl Default for SmsConfig {
    fn default() -> Self {
        Self {
            provider: SmsProvider::Mock,
            gateway_url: None,
            api_key: None,
            sender_id: String::from("PartsHub"),
            timeout_seconds: 5,
        }
    }
}

impl SmsConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let provider = match std::env::var("SMS_PROVIDER").as_deref() {
            Ok("http") => SmsProvider::Http,
            _ => SmsProvider::Mock,
        };
        Self {
            provider,
            gateway_url: std::env::var("SMS_GATEWAY_URL").ok(),
            api_key: std::env::var("SMS_API_KEY").ok(),
            sender_id: std::env::var("SMS_SENDER_ID").unwrap_or(defaults.sender_id),
            timeout_seconds: std::env::var("SMS_TIMEOUT_SECONDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.timeout_seconds),
        }
    }
}
