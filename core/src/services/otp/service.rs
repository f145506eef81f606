//! OTP engine implementation

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::Utc;
use constant_time_eq::constant_time_eq;
use rand::Rng;
use sha2::{Digest, Sha256};

use ph_shared::config::OtpConfig;

use crate::domain::entities::otp_code::{OtpCode, OtpPurpose};
use crate::errors::{AuthError, DomainResult, ValidationError};
use crate::repositories::OtpRepository;

use super::traits::SmsServiceTrait;

/// Upper bound on SMS dispatch, on top of whatever timeout the provider
/// implementation enforces itself
const DISPATCH_TIMEOUT_SECS: u64 = 10;

/// Result of requesting a code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpRequestResult {
    /// Seconds until the code expires
    pub expires_in: i64,
    /// Seconds until a new code may be requested
    pub resend_available_in: i64,
    /// Provider message id; None when delivery failed or timed out
    /// (the code is persisted and valid regardless)
    pub message_id: Option<String>,
}

/// Result of successfully verifying a code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpVerification {
    /// Owning user recorded at generation time, when known
    pub user_id: Option<i64>,
}

/// Service generating and validating one-time passwords
///
/// Codes are numeric only (SMS-channel compatibility, faster mobile
/// entry) and stored as peppered SHA-256 hashes. Verification compares
/// against the most recently issued code only, so an outstanding newer
/// code cannot be brute-forced through a stale one.
pub struct OtpService<O: OtpRepository, S: SmsServiceTrait> {
    otp_repository: Arc<O>,
    sms_service: Arc<S>,
    config: OtpConfig,
}

impl<O: OtpRepository, S: SmsServiceTrait> OtpService<O, S> {
    pub fn new(otp_repository: Arc<O>, sms_service: Arc<S>, config: OtpConfig) -> Self {
        Self {
            otp_repository,
            sms_service,
            config,
        }
    }

    /// Generate a code for the phone, persist its hash, and dispatch it
    ///
    /// Issuing retires all prior active codes for the `(phone, purpose)`
    /// pair. The code is considered delivered once persisted: an SMS
    /// provider failure is logged but does not fail the request, since
    /// the persisted code stays valid and the client can retry the send.
    pub async fn generate(
        &self,
        phone: &str,
        purpose: OtpPurpose,
        user_id: Option<i64>,
        ip_hash: Option<String>,
    ) -> DomainResult<OtpRequestResult> {
        let now = Utc::now();

        // Resend cooldown against the latest outstanding code
        if let Some(existing) = self.otp_repository.find_latest(phone, purpose).await? {
            if !existing.is_used() && !existing.is_expired(now) {
                let elapsed = (now - existing.created_at).num_seconds();
                let remaining = self.config.resend_cooldown_seconds - elapsed;
                if remaining > 0 {
                    return Err(AuthError::RateLimited {
                        retry_after_seconds: remaining,
                    }
                    .into());
                }
            }
        }

        let code = self.generate_code();
        let code_hash = self.hash_code(&code);

        let otp = OtpCode::new(
            phone,
            purpose,
            user_id,
            code_hash,
            self.config.ttl_minutes,
            ip_hash,
        );
        let otp = self.otp_repository.create(otp).await?;

        tracing::info!(
            event = "otp_generated",
            purpose = purpose.as_str(),
            session_id = %otp.id,
            "Generated verification code"
        );

        // Dispatch after persistence; delivery failure does not invalidate
        // the stored code
        let message_id = match tokio::time::timeout(
            StdDuration::from_secs(DISPATCH_TIMEOUT_SECS),
            self.sms_service.send_otp(phone, &code),
        )
        .await
        {
            Ok(Ok(message_id)) => Some(message_id),
            Ok(Err(error)) => {
                tracing::error!(
                    event = "otp_dispatch_failed",
                    session_id = %otp.id,
                    error = %error,
                    "SMS dispatch failed; code remains valid"
                );
                None
            }
            Err(_) => {
                tracing::error!(
                    event = "otp_dispatch_timeout",
                    session_id = %otp.id,
                    "SMS dispatch timed out; code remains valid"
                );
                None
            }
        };

        Ok(OtpRequestResult {
            expires_in: otp.expires_in_seconds(now),
            resend_available_in: self.config.resend_cooldown_seconds,
            message_id,
        })
    }

    /// Verify a submitted code against the latest issued code
    pub async fn verify(
        &self,
        phone: &str,
        submitted_code: &str,
        purpose: OtpPurpose,
    ) -> DomainResult<OtpVerification> {
        // Malformed input is a validation error: no attempt is consumed
        if submitted_code.len() != self.config.code_length
            || !submitted_code.chars().all(|c| c.is_ascii_digit())
        {
            return Err(ValidationError::InvalidFormat {
                field: "otp_code".to_string(),
            }
            .into());
        }

        let now = Utc::now();
        let otp = self
            .otp_repository
            .find_latest(phone, purpose)
            .await?
            .ok_or(AuthError::OtpExpired)?;

        if otp.is_used() {
            return Err(AuthError::OtpReplay.into());
        }
        if otp.is_expired(now) {
            return Err(AuthError::OtpExpired.into());
        }
        if otp.is_exhausted(self.config.max_attempts) {
            return Err(AuthError::OtpMaxAttempts.into());
        }

        let submitted_hash = self.hash_code(submitted_code);
        if !constant_time_eq(submitted_hash.as_bytes(), otp.code_hash.as_bytes()) {
            // Atomic increment; the storage guard keeps concurrent
            // attempts from passing the limit together
            let attempts = self
                .otp_repository
                .register_attempt(otp.id, self.config.max_attempts)
                .await?;
            return match attempts {
                Some(n) if n >= self.config.max_attempts => {
                    Err(AuthError::OtpMaxAttempts.into())
                }
                Some(n) => Err(AuthError::OtpInvalid {
                    remaining_attempts: self.config.max_attempts - n,
                }
                .into()),
                None => Err(AuthError::OtpMaxAttempts.into()),
            };
        }

        // Single-use consumption: only one concurrent caller wins
        if !self.otp_repository.consume(otp.id, now).await? {
            return Err(AuthError::OtpReplay.into());
        }

        Ok(OtpVerification {
            user_id: otp.user_id,
        })
    }

    /// Uniform random numeric code of the configured length
    fn generate_code(&self) -> String {
        let mut rng = rand::thread_rng();
        let bound = 10u32.pow(self.config.code_length as u32);
        let code: u32 = rng.gen_range(0..bound);
        format!("{:0width$}", code, width = self.config.code_length)
    }

    /// Peppered one-way hash of a code
    fn hash_code(&self, code: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(code.as_bytes());
        hasher.update(self.config.pepper.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    use crate::errors::DomainError;
    use crate::repositories::MockOtpRepository;

    /// SMS stub recording every dispatched code
    struct RecordingSms {
        sent: Mutex<Vec<(String, String)>>,
        fail: bool,
    }

    impl RecordingSms {
        fn new() -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                fail: true,
            }
        }

        fn last_code(&self) -> Option<String> {
            self.sent.lock().unwrap().last().map(|(_, c)| c.clone())
        }
    }

    #[async_trait]
    impl SmsServiceTrait for RecordingSms {
        async fn send_otp(&self, phone: &str, code: &str) -> Result<String, String> {
            if self.fail {
                return Err("provider unavailable".to_string());
            }
            self.sent
                .lock()
                .unwrap()
                .push((phone.to_string(), code.to_string()));
            Ok(format!("msg-{}", self.sent.lock().unwrap().len()))
        }
    }

    fn service(
        sms: Arc<RecordingSms>,
    ) -> (OtpService<MockOtpRepository, RecordingSms>, Arc<MockOtpRepository>) {
        let repo = Arc::new(MockOtpRepository::new());
        let config = OtpConfig {
            resend_cooldown_seconds: 0,
            ..OtpConfig::default()
        };
        (OtpService::new(repo.clone(), sms, config), repo)
    }

    const PHONE: &str = "+8613812345678";

    #[tokio::test]
    async fn test_generate_then_verify() {
        let sms = Arc::new(RecordingSms::new());
        let (service, _repo) = service(sms.clone());

        let result = service
            .generate(PHONE, OtpPurpose::Login, None, None)
            .await
            .unwrap();
        assert!(result.message_id.is_some());
        assert_eq!(result.expires_in, 300);

        let code = sms.last_code().unwrap();
        assert_eq!(code.len(), 6);
        service.verify(PHONE, &code, OtpPurpose::Login).await.unwrap();
    }

    #[tokio::test]
    async fn test_plaintext_never_stored() {
        let sms = Arc::new(RecordingSms::new());
        let (service, repo) = service(sms.clone());

        service
            .generate(PHONE, OtpPurpose::Login, None, None)
            .await
            .unwrap();
        let code = sms.last_code().unwrap();
        let stored = repo.all().await;
        assert_eq!(stored.len(), 1);
        assert_ne!(stored[0].code_hash, code);
        // Hex SHA-256 digest
        assert_eq!(stored[0].code_hash.len(), 64);
    }

    #[tokio::test]
    async fn test_verify_consumed_code_is_replay() {
        let sms = Arc::new(RecordingSms::new());
        let (service, _repo) = service(sms.clone());

        service
            .generate(PHONE, OtpPurpose::Login, None, None)
            .await
            .unwrap();
        let code = sms.last_code().unwrap();
        service.verify(PHONE, &code, OtpPurpose::Login).await.unwrap();

        match service.verify(PHONE, &code, OtpPurpose::Login).await {
            Err(DomainError::Auth(AuthError::OtpReplay)) => {}
            other => panic!("expected OtpReplay, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_wrong_code_decrements_budget() {
        let sms = Arc::new(RecordingSms::new());
        let (service, _repo) = service(sms.clone());

        service
            .generate(PHONE, OtpPurpose::Login, None, None)
            .await
            .unwrap();

        match service.verify(PHONE, "000000", OtpPurpose::Login).await {
            Err(DomainError::Auth(AuthError::OtpInvalid {
                remaining_attempts: 2,
            })) => {}
            other => panic!("expected OtpInvalid(2), got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_max_attempts_then_correct_code_still_fails() {
        let sms = Arc::new(RecordingSms::new());
        let (service, _repo) = service(sms.clone());

        service
            .generate(PHONE, OtpPurpose::Login, None, None)
            .await
            .unwrap();
        let correct = sms.last_code().unwrap();
        let wrong = if correct == "000000" { "000001" } else { "000000" };

        for attempt in 1..=3 {
            let result = service.verify(PHONE, wrong, OtpPurpose::Login).await;
            match (attempt, result) {
                (3, Err(DomainError::Auth(AuthError::OtpMaxAttempts))) => {}
                (_, Err(DomainError::Auth(AuthError::OtpInvalid { .. }))) if attempt < 3 => {}
                (_, other) => panic!("attempt {}: unexpected {:?}", attempt, other),
            }
        }

        // The correct code is dead after the budget is spent
        match service.verify(PHONE, &correct, OtpPurpose::Login).await {
            Err(DomainError::Auth(AuthError::OtpMaxAttempts)) => {}
            other => panic!("expected OtpMaxAttempts, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_only_latest_code_verifies() {
        let sms = Arc::new(RecordingSms::new());
        let (service, _repo) = service(sms.clone());

        service
            .generate(PHONE, OtpPurpose::Login, None, None)
            .await
            .unwrap();
        let first = sms.last_code().unwrap();
        service
            .generate(PHONE, OtpPurpose::Login, None, None)
            .await
            .unwrap();
        let second = sms.last_code().unwrap();

        if first != second {
            // The stale code no longer verifies
            assert!(service.verify(PHONE, &first, OtpPurpose::Login).await.is_err());
        }
        service
            .verify(PHONE, &second, OtpPurpose::Login)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_resend_cooldown() {
        let sms = Arc::new(RecordingSms::new());
        let repo = Arc::new(MockOtpRepository::new());
        let config = OtpConfig {
            resend_cooldown_seconds: 60,
            ..OtpConfig::default()
        };
        let service = OtpService::new(repo, sms, config);

        service
            .generate(PHONE, OtpPurpose::Login, None, None)
            .await
            .unwrap();
        match service.generate(PHONE, OtpPurpose::Login, None, None).await {
            Err(DomainError::Auth(AuthError::RateLimited { retry_after_seconds })) => {
                assert!(retry_after_seconds > 0 && retry_after_seconds <= 60);
            }
            other => panic!("expected RateLimited, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_dispatch_failure_keeps_code_valid() {
        let sms = Arc::new(RecordingSms::failing());
        let repo = Arc::new(MockOtpRepository::new());
        let config = OtpConfig {
            resend_cooldown_seconds: 0,
            ..OtpConfig::default()
        };
        let service = OtpService::new(repo.clone(), sms, config);

        let result = service
            .generate(PHONE, OtpPurpose::Login, None, None)
            .await
            .unwrap();
        assert!(result.message_id.is_none());
        // Code is persisted despite the delivery failure
        assert_eq!(repo.all().await.len(), 1);
    }

    #[tokio::test]
    async fn test_malformed_code_is_validation_error() {
        let sms = Arc::new(RecordingSms::new());
        let (service, repo) = service(sms.clone());

        service
            .generate(PHONE, OtpPurpose::Login, None, None)
            .await
            .unwrap();

        match service.verify(PHONE, "12ab56", OtpPurpose::Login).await {
            Err(DomainError::ValidationErr(ValidationError::InvalidFormat { .. })) => {}
            other => panic!("expected InvalidFormat, got {:?}", other),
        }
        // No attempt consumed
        assert_eq!(repo.all().await[0].attempts, 0);
    }

    #[tokio::test]
    async fn test_verify_without_request_is_expired() {
        let sms = Arc::new(RecordingSms::new());
        let (service, _repo) = service(sms.clone());

        match service.verify(PHONE, "123456", OtpPurpose::Login).await {
            Err(DomainError::Auth(AuthError::OtpExpired)) => {}
            other => panic!("expected OtpExpired, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_purposes_are_isolated() {
        let sms = Arc::new(RecordingSms::new());
        let (service, _repo) = service(sms.clone());

        service
            .generate(PHONE, OtpPurpose::Login, None, None)
            .await
            .unwrap();
        let code = sms.last_code().unwrap();

        // A login code does not confirm phone verification
        assert!(service
            .verify(PHONE, &code, OtpPurpose::Verification)
            .await
            .is_err());
    }
}
