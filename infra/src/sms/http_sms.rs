//! HTTP gateway SMS service implementation
//!
//! Posts messages to a provider-agnostic HTTP gateway. The request
//! timeout is enforced at the client level so a slow provider cannot
//! hold an authentication request open.

use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::Deserialize;

use ph_core::services::auth::mask_phone;
use ph_core::services::otp::SmsServiceTrait;
use ph_shared::config::SmsConfig;

/// SMS provider speaking a simple JSON gateway protocol
pub struct HttpSmsService {
    client: reqwest::Client,
    config: SmsConfig,
}

/// Gateway response body
#[derive(Debug, Deserialize)]
struct GatewayResponse {
    message_id: String,
}

impl HttpSmsService {
    pub fn new(config: SmsConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .unwrap_or_default();

        Self { client, config }
    }

    fn auth_header(&self) -> Option<String> {
        self.config
            .api_key
            .as_ref()
            .map(|key| format!("Basic {}", BASE64.encode(format!("api:{}", key))))
    }
}

#[async_trait]
impl SmsServiceTrait for HttpSmsService {
    async fn send_otp(&self, phone: &str, code: &str) -> Result<String, String> {
        let gateway_url = self
            .config
            .gateway_url
            .as_deref()
            .ok_or_else(|| "SMS gateway URL not configured".to_string())?;

        let body = serde_json::json!({
            "to": phone,
            "from": self.config.sender_id,
            "text": format!("Your PartsHub verification code is {}", code),
        });

        let mut request = self.client.post(gateway_url).json(&body);
        if let Some(auth) = self.auth_header() {
            request = request.header(reqwest::header::AUTHORIZATION, auth);
        }

        let response = request
            .send()
            .await
            .map_err(|e| format!("SMS gateway request failed: {}", e))?;

        if !response.status().is_success() {
            let status = response.status();
            tracing::error!(
                phone = %mask_phone(phone),
                status = %status,
                event = "sms_gateway_error",
                "SMS gateway rejected the message"
            );
            return Err(format!("SMS gateway returned {}", status));
        }

        let parsed: GatewayResponse = response
            .json()
            .await
            .map_err(|e| format!("Invalid SMS gateway response: {}", e))?;

        tracing::info!(
            phone = %mask_phone(phone),
            message_id = %parsed.message_id,
            event = "sms_sent",
            "SMS dispatched"
        );

        Ok(parsed.message_id)
    }
}
