//! End-to-end authentication flow tests against in-memory repositories

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use ph_core::domain::entities::user::TelegramProfile;
use ph_core::errors::{AuthError, DomainError, TokenError};
use ph_core::repositories::{
    MockAuditRepository, MockLinkTokenRepository, MockOtpRepository, MockUserRepository,
    UserRepository,
};
use ph_core::services::audit::{AuditService, AuditServiceConfig};
use ph_core::services::auth::{AuthService, AuthServiceConfig, RateLimiterTrait};
use ph_core::services::link::LinkTokenService;
use ph_core::services::otp::{OtpService, SmsServiceTrait};
use ph_core::services::token::{JwtCodec, TokenService, TokenSubject};
use ph_shared::config::{JwtConfig, LinkTokenConfig, OtpConfig};

/// SMS transport stub capturing dispatched codes
struct CapturingSms {
    sent: Mutex<Vec<(String, String)>>,
}

impl CapturingSms {
    fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
        }
    }

    fn last_code(&self) -> Option<String> {
        self.sent.lock().unwrap().last().map(|(_, c)| c.clone())
    }
}

#[async_trait]
impl SmsServiceTrait for CapturingSms {
    async fn send_otp(&self, phone: &str, code: &str) -> Result<String, String> {
        self.sent
            .lock()
            .unwrap()
            .push((phone.to_string(), code.to_string()));
        Ok("msg-1".to_string())
    }
}

/// Rate limiter with a per-phone request budget and lock support
struct CountingRateLimiter {
    phone_limit: u32,
    counts: Mutex<HashMap<String, u32>>,
    locks: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl CountingRateLimiter {
    fn new(phone_limit: u32) -> Self {
        Self {
            phone_limit,
            counts: Mutex::new(HashMap::new()),
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Simulate an elapsed window
    fn reset_window(&self) {
        self.counts.lock().unwrap().clear();
    }
}

#[async_trait]
impl RateLimiterTrait for CountingRateLimiter {
    async fn check_phone_limit(&self, phone: &str) -> Result<bool, String> {
        let counts = self.counts.lock().unwrap();
        Ok(counts.get(phone).copied().unwrap_or(0) >= self.phone_limit)
    }

    async fn increment_phone_counter(&self, phone: &str) -> Result<i64, String> {
        let mut counts = self.counts.lock().unwrap();
        let count = counts.entry(phone.to_string()).or_insert(0);
        *count += 1;
        Ok(*count as i64)
    }

    async fn phone_limit_reset_in(&self, _phone: &str) -> Result<Option<i64>, String> {
        Ok(Some(3600))
    }

    async fn check_ip_limit(&self, _ip: &str) -> Result<bool, String> {
        Ok(false)
    }

    async fn increment_ip_counter(&self, _ip: &str) -> Result<i64, String> {
        Ok(1)
    }

    async fn ip_limit_reset_in(&self, _ip: &str) -> Result<Option<i64>, String> {
        Ok(Some(3600))
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

struct Stack {
    auth: AuthService<
        MockUserRepository,
        MockOtpRepository,
        CapturingSms,
        MockLinkTokenRepository,
        CountingRateLimiter,
        MockAuditRepository,
    >,
    users: Arc<MockUserRepository>,
    sms: Arc<CapturingSms>,
    rate_limiter: Arc<CountingRateLimiter>,
    tokens: Arc<TokenService>,
}

fn stack(phone_budget: u32) -> Stack {
    let users = Arc::new(MockUserRepository::new());
    let sms = Arc::new(CapturingSms::new());
    let rate_limiter = Arc::new(CountingRateLimiter::new(phone_budget));

    let otp_service = Arc::new(OtpService::new(
        Arc::new(MockOtpRepository::new()),
        sms.clone(),
        OtpConfig {
            resend_cooldown_seconds: 0,
            ..OtpConfig::default()
        },
    ));
    let link_service = Arc::new(LinkTokenService::new(
        Arc::new(MockLinkTokenRepository::new()),
        LinkTokenConfig::default(),
    ));
    let jwt_config = JwtConfig {
        secret: "integration-secret".to_string(),
        access_token_expiry: 1800,
        issuer: "partshub".to_string(),
    };
    let tokens = Arc::new(TokenService::new(
        Box::new(JwtCodec::new(&jwt_config.secret, &jwt_config.issuer)),
        jwt_config,
    ));
    let audit = Arc::new(AuditService::new(
        Arc::new(MockAuditRepository::new()),
        AuditServiceConfig {
            async_writes: false,
        },
    ));

    let auth = AuthService::new(
        users.clone(),
        otp_service,
        link_service,
        tokens.clone(),
        rate_limiter.clone(),
        audit,
        AuthServiceConfig::default(),
    );

    Stack {
        auth,
        users,
        sms,
        rate_limiter,
        tokens,
    }
}

const PHONE: &str = "+989123456789";

/// Scenario: request an OTP, verify the delivered code, and receive a
/// JWT whose subject resolves to the phone's account
#[tokio::test]
async fn otp_login_issues_token_for_phone_user() {
    let stack = stack(10);

    stack.auth.request_phone_otp(PHONE, None).await.unwrap();
    let code = stack.sms.last_code().expect("code dispatched");

    let response = stack.auth.verify_phone_otp(PHONE, &code, None).await.unwrap();

    let user = stack.users.find_by_phone(PHONE).await.unwrap().unwrap();
    let validated = stack.tokens.validate(&response.access_token).unwrap();
    assert_eq!(validated.subject, TokenSubject::UserId(user.id));
}

/// Scenario: three wrong codes exhaust the budget; the originally
/// correct code is dead afterwards
#[tokio::test]
async fn wrong_code_three_times_kills_the_code() {
    let stack = stack(10);

    stack.auth.request_phone_otp(PHONE, None).await.unwrap();
    let correct = stack.sms.last_code().unwrap();
    let wrong = if correct == "000000" { "999999" } else { "000000" };

    for attempt in 1..=3 {
        let result = stack.auth.verify_phone_otp(PHONE, wrong, None).await;
        match (attempt, result) {
            (3, Err(DomainError::Auth(AuthError::OtpMaxAttempts))) => {}
            (_, Err(DomainError::Auth(AuthError::OtpInvalid { .. }))) if attempt < 3 => {}
            (_, other) => panic!("attempt {}: unexpected {:?}", attempt, other),
        }
    }

    // Fourth attempt with the correct code still fails (phone is locked)
    let result = stack.auth.verify_phone_otp(PHONE, &correct, None).await;
    assert!(result.is_err());
}

/// Scenario: a web_to_bot token issued for user 42 links telegram 555,
/// and redeeming the same token again is a replay
#[tokio::test]
async fn link_token_binds_telegram_exactly_once() {
    let stack = stack(10);

    // Log the user in via phone first so an account exists
    stack.auth.request_phone_otp(PHONE, None).await.unwrap();
    let code = stack.sms.last_code().unwrap();
    stack.auth.verify_phone_otp(PHONE, &code, None).await.unwrap();
    let user = stack.users.find_by_phone(PHONE).await.unwrap().unwrap();

    let issued = stack.auth.request_telegram_link(user.id, None).await.unwrap();
    let result = stack
        .auth
        .verify_telegram_link(&issued.token, 555, TelegramProfile::default())
        .await
        .unwrap();
    assert_eq!(result.user.id, user.id);

    let linked = stack.users.find_by_id(user.id).await.unwrap().unwrap();
    assert_eq!(linked.telegram_user_id, Some(555));

    match stack
        .auth
        .verify_telegram_link(&issued.token, 555, TelegramProfile::default())
        .await
    {
        Err(DomainError::Token(TokenError::TokenReplay)) => {}
        other => panic!("expected TokenReplay, got {:?}", other),
    }
}

/// Rate-limit boundary: exactly N requests pass, N+1 is rejected, and a
/// fresh window admits again
#[tokio::test]
async fn phone_budget_boundary() {
    let stack = stack(3);

    for _ in 0..3 {
        stack.auth.request_phone_otp(PHONE, None).await.unwrap();
    }
    match stack.auth.request_phone_otp(PHONE, None).await {
        Err(DomainError::Auth(AuthError::RateLimited { .. })) => {}
        other => panic!("expected RateLimited, got {:?}", other),
    }

    stack.rate_limiter.reset_window();
    stack.auth.request_phone_otp(PHONE, None).await.unwrap();
}
