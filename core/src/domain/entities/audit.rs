//! Audit event entity recording authentication decisions.
//!
//! Events are append-only and written by every authentication flow.
//! Phone numbers and IP addresses are one-way hashed before they reach
//! this entity; Telegram ids are stored as-is.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// Event types for authentication auditing
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditEventType {
    // OTP events
    OtpRequested,
    OtpFailed,
    PhoneVerified,

    // Password login events
    LoginSuccess,
    LoginFailure,
    AccountLocked,

    // Abuse control
    RateLimitExceeded,

    // Telegram linking events
    TelegramLinkRequested,
    TelegramLinked,
    TelegramLinkFailed,
    TelegramUnlinked,

    // Telegram login events
    TelegramLoginRequested,
    TelegramLoginSuccess,
    TelegramLoginFailed,
}

impl AuditEventType {
    /// Convert to string representation for database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OtpRequested => "OTP_REQUESTED",
            Self::OtpFailed => "OTP_FAILED",
            Self::PhoneVerified => "PHONE_VERIFIED",
            Self::LoginSuccess => "LOGIN_SUCCESS",
            Self::LoginFailure => "LOGIN_FAILURE",
            Self::AccountLocked => "ACCOUNT_LOCKED",
            Self::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
            Self::TelegramLinkRequested => "TELEGRAM_LINK_REQUESTED",
            Self::TelegramLinked => "TELEGRAM_LINKED",
            Self::TelegramLinkFailed => "TELEGRAM_LINK_FAILED",
            Self::TelegramUnlinked => "TELEGRAM_UNLINKED",
            Self::TelegramLoginRequested => "TELEGRAM_LOGIN_REQUESTED",
            Self::TelegramLoginSuccess => "TELEGRAM_LOGIN_SUCCESS",
            Self::TelegramLoginFailed => "TELEGRAM_LOGIN_FAILED",
        }
    }

    /// Parse from string representation
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "OTP_REQUESTED" => Some(Self::OtpRequested),
            "OTP_FAILED" => Some(Self::OtpFailed),
            "PHONE_VERIFIED" => Some(Self::PhoneVerified),
            "LOGIN_SUCCESS" => Some(Self::LoginSuccess),
            "LOGIN_FAILURE" => Some(Self::LoginFailure),
            "ACCOUNT_LOCKED" => Some(Self::AccountLocked),
            "RATE_LIMIT_EXCEEDED" => Some(Self::RateLimitExceeded),
            "TELEGRAM_LINK_REQUESTED" => Some(Self::TelegramLinkRequested),
            "TELEGRAM_LINKED" => Some(Self::TelegramLinked),
            "TELEGRAM_LINK_FAILED" => Some(Self::TelegramLinkFailed),
            "TELEGRAM_UNLINKED" => Some(Self::TelegramUnlinked),
            "TELEGRAM_LOGIN_REQUESTED" => Some(Self::TelegramLoginRequested),
            "TELEGRAM_LOGIN_SUCCESS" => Some(Self::TelegramLoginSuccess),
            "TELEGRAM_LOGIN_FAILED" => Some(Self::TelegramLoginFailed),
            _ => None,
        }
    }
}

/// Append-only audit record for an authentication decision
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditEvent {
    /// Unique identifier for the record
    pub id: Uuid,

    /// Type of authentication event
    pub event_type: AuditEventType,

    /// User involved, when resolved
    pub user_id: Option<i64>,

    /// One-way hashed phone number for correlation without exposure
    pub phone_hash: Option<String>,

    /// One-way hashed client IP
    pub ip_hash: Option<String>,

    /// Telegram account involved (not treated as sensitive PII)
    pub telegram_user_id: Option<i64>,

    /// Whether the operation succeeded
    pub success: bool,

    /// Machine-readable error code for failures
    pub error_code: Option<String>,

    /// Structured event data (attempt counts, login method, ...)
    pub metadata: Option<JsonValue>,

    /// Timestamp when the event occurred
    pub created_at: DateTime<Utc>,
}

impl AuditEvent {
    /// Create a new audit event
    pub fn new(event_type: AuditEventType, success: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_type,
            user_id: None,
            phone_hash: None,
            ip_hash: None,
            telegram_user_id: None,
            success,
            error_code: None,
            metadata: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_user(mut self, user_id: i64) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_phone_hash(mut self, phone_hash: impl Into<String>) -> Self {
        self.phone_hash = Some(phone_hash.into());
        self
    }

    pub fn with_ip_hash(mut self, ip_hash: impl Into<String>) -> Self {
        self.ip_hash = Some(ip_hash.into());
        self
    }

    pub fn with_telegram_user(mut self, telegram_user_id: i64) -> Self {
        self.telegram_user_id = Some(telegram_user_id);
        self
    }

    pub fn with_error_code(mut self, error_code: impl Into<String>) -> Self {
        self.error_code = Some(error_code.into());
        self
    }

    pub fn with_metadata(mut self, metadata: JsonValue) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let event = AuditEvent::new(AuditEventType::LoginFailure, false)
            .with_user(7)
            .with_ip_hash("iphash")
            .with_error_code("INVALID_CREDENTIALS")
            .with_metadata(serde_json::json!({"method": "email"}));

        assert_eq!(event.event_type, AuditEventType::LoginFailure);
        assert!(!event.success);
        assert_eq!(event.user_id, Some(7));
        assert_eq!(event.error_code.as_deref(), Some("INVALID_CREDENTIALS"));
        assert_eq!(event.metadata.unwrap()["method"], "email");
    }

    #[test]
    fn test_event_type_round_trip() {
        let all = [
            AuditEventType::OtpRequested,
            AuditEventType::OtpFailed,
            AuditEventType::PhoneVerified,
            AuditEventType::LoginSuccess,
            AuditEventType::LoginFailure,
            AuditEventType::AccountLocked,
            AuditEventType::RateLimitExceeded,
            AuditEventType::TelegramLinkRequested,
            AuditEventType::TelegramLinked,
            AuditEventType::TelegramLinkFailed,
            AuditEventType::TelegramUnlinked,
            AuditEventType::TelegramLoginRequested,
            AuditEventType::TelegramLoginSuccess,
            AuditEventType::TelegramLoginFailed,
        ];
        for event_type in all {
            assert_eq!(AuditEventType::parse(event_type.as_str()), Some(event_type));
        }
        assert_eq!(AuditEventType::parse("NOT_AN_EVENT"), None);
    }
}
