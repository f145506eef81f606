//! Authentication request and response DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use ph_core::domain::value_objects::UserSummary;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct EmailLoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PhoneOtpRequest {
    #[validate(length(min = 8, max = 20))]
    pub phone_number: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PhoneOtpVerifyRequest {
    #[validate(length(min = 8, max = 20))]
    pub phone_number: String,
    #[validate(length(min = 4, max = 8))]
    pub otp_code: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PhoneVerifyConfirmRequest {
    #[validate(length(min = 4, max = 8))]
    pub otp_code: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct TelegramLinkVerifyRequest {
    #[validate(length(min = 16, max = 128))]
    pub link_token: String,
    pub telegram_user_id: i64,
    pub telegram_username: Option<String>,
    pub telegram_first_name: Option<String>,
    pub telegram_last_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramLoginRequest {
    pub telegram_user_id: i64,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct TelegramLoginVerifyRequest {
    #[validate(length(min = 16, max = 128))]
    pub login_token: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct OtpRequestedResponse {
    /// Seconds until the code expires
    pub expires_in: i64,
    /// Seconds until a new code may be requested
    pub resend_available_in: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LinkRequestedResponse {
    pub link_token: String,
    /// Deep link opening the bot chat with the token payload
    pub deep_link_url: String,
    pub expires_in: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LinkVerifiedResponse {
    pub user: UserSummary,
    pub linked_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TelegramLoginRequestedResponse {
    pub login_token: String,
    /// Web URL that exchanges the token for a session
    pub web_login_url: String,
    pub expires_in: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PhoneVerifiedResponse {
    pub verified: bool,
    pub verified_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnlinkResponse {
    pub success: bool,
    pub was_linked: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn test_email_login_request_validation() {
        let valid = EmailLoginRequest {
            email: "buyer@example.com".to_string(),
            password: "hunter2!".to_string(),
        };
        assert!(valid.validate().is_ok());

        let bad_email = EmailLoginRequest {
            email: "not-an-email".to_string(),
            password: "hunter2!".to_string(),
        };
        assert!(bad_email.validate().is_err());

        let empty_password = EmailLoginRequest {
            email: "buyer@example.com".to_string(),
            password: String::new(),
        };
        assert!(empty_password.validate().is_err());
    }

    #[test]
    fn test_phone_request_validation() {
        let valid = PhoneOtpRequest {
            phone_number: "+989123456789".to_string(),
        };
        assert!(valid.validate().is_ok());

        let too_short = PhoneOtpRequest {
            phone_number: "+98".to_string(),
        };
        assert!(too_short.validate().is_err());
    }

    #[test]
    fn test_deserialize_telegram_link_verify() {
        let json = r#"{
            "link_token": "abcdefghij0123456789-deadbeef",
            "telegram_user_id": 555,
            "telegram_username": "wei"
        }"#;
        let request: TelegramLinkVerifyRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.telegram_user_id, 555);
        assert_eq!(request.telegram_username.as_deref(), Some("wei"));
        assert!(request.telegram_last_name.is_none());
    }
}
