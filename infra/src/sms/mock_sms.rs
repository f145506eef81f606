//! Mock SMS service implementation
//!
//! Logs messages instead of sending them. Used in development and by
//! tests that need to observe dispatched codes.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use ph_core::services::auth::mask_phone;
use ph_core::services::otp::SmsServiceTrait;

/// Mock SMS service for development and testing
#[derive(Clone, Default)]
pub struct MockSmsService {
    /// Counter for tracking number of messages sent
    message_count: Arc<AtomicU64>,
    /// Dispatched (phone, code) pairs, for test assertions
    sent: Arc<Mutex<Vec<(String, String)>>>,
    /// Whether to simulate provider failures
    simulate_failure: bool,
}

impl MockSmsService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mock that fails every dispatch, for failure-path tests
    pub fn failing() -> Self {
        Self {
            simulate_failure: true,
            ..Self::default()
        }
    }

    /// Total number of messages sent
    pub fn message_count(&self) -> u64 {
        self.message_count.load(Ordering::SeqCst)
    }

    /// Last code dispatched, if any
    pub fn last_code(&self) -> Option<String> {
        self.sent.lock().unwrap().last().map(|(_, code)| code.clone())
    }
}

#[async_trait]
impl SmsServiceTrait for MockSmsService {
    async fn send_otp(&self, phone: &str, code: &str) -> Result<String, String> {
        if self.simulate_failure {
            return Err("simulated provider failure".to_string());
        }

        let count = self.message_count.fetch_add(1, Ordering::SeqCst) + 1;
        self.sent
            .lock()
            .unwrap()
            .push((phone.to_string(), code.to_string()));

        tracing::info!(
            phone = %mask_phone(phone),
            event = "mock_sms_sent",
            "[MOCK SMS] verification code {} dispatched",
            code
        );

        Ok(format!("mock-{}", count))
    }
}
