//! Authentication service tests covering the full orchestration flows

use std::sync::Arc;

use ph_shared::config::{JwtConfig, LinkTokenConfig, LockoutConfig, OtpConfig};

use crate::domain::entities::audit::AuditEventType;
use crate::domain::entities::user::{NewUser, TelegramProfile, UserRole};
use crate::errors::{AuthError, DomainError, TokenError};
use crate::repositories::{
    MockAuditRepository, MockLinkTokenRepository, MockOtpRepository, MockUserRepository,
    UserRepository,
};
use crate::services::audit::{AuditService, AuditServiceConfig};
use crate::services::auth::password::hash_password;
use crate::services::auth::{AuthService, AuthServiceConfig};
use crate::services::link::LinkTokenService;
use crate::services::otp::OtpService;
use crate::services::token::{JwtCodec, TokenService, TokenSubject};

use super::mocks::{MemoryRateLimiter, RecordingSms};

type TestAuthService = AuthService<
    MockUserRepository,
    MockOtpRepository,
    RecordingSms,
    MockLinkTokenRepository,
    MemoryRateLimiter,
    MockAuditRepository,
>;

struct Harness {
    service: TestAuthService,
    users: Arc<MockUserRepository>,
    sms: Arc<RecordingSms>,
    rate_limiter: Arc<MemoryRateLimiter>,
    audit: Arc<MockAuditRepository>,
    token_service: Arc<TokenService>,
}

fn harness_with(rate_limiter: MemoryRateLimiter, link_ttl_minutes: i64) -> Harness {
    let config = AuthServiceConfig {
        lockout: LockoutConfig {
            max_failed_logins: 3,
            account_lock_minutes: 30,
            phone_lock_seconds: 1800,
        },
        ..AuthServiceConfig::default()
    };
    harness_with_config(rate_limiter, link_ttl_minutes, config)
}

fn harness_with_config(
    rate_limiter: MemoryRateLimiter,
    link_ttl_minutes: i64,
    config: AuthServiceConfig,
) -> Harness {
    let users = Arc::new(MockUserRepository::new());
    let otp_repo = Arc::new(MockOtpRepository::new());
    let link_repo = Arc::new(MockLinkTokenRepository::new());
    let audit_repo = Arc::new(MockAuditRepository::new());
    let sms = Arc::new(RecordingSms::new());
    let rate_limiter = Arc::new(rate_limiter);

    let otp_config = OtpConfig {
        resend_cooldown_seconds: 0,
        ..OtpConfig::default()
    };
    let otp_service = Arc::new(OtpService::new(otp_repo, sms.clone(), otp_config));

    let link_config = LinkTokenConfig {
        ttl_minutes: link_ttl_minutes,
        ..LinkTokenConfig::default()
    };
    let link_service = Arc::new(LinkTokenService::new(link_repo, link_config));

    let jwt_config = JwtConfig {
        secret: "test-secret".to_string(),
        access_token_expiry: 1800,
        issuer: "partshub".to_string(),
    };
    let token_service = Arc::new(TokenService::new(
        Box::new(JwtCodec::new(&jwt_config.secret, &jwt_config.issuer)),
        jwt_config,
    ));

    // Synchronous audit writes so tests can assert immediately
    let audit_service = Arc::new(AuditService::new(
        audit_repo.clone(),
        AuditServiceConfig {
            async_writes: false,
        },
    ));

    let service = AuthService::new(
        users.clone(),
        otp_service,
        link_service,
        token_service.clone(),
        rate_limiter.clone(),
        audit_service,
        config,
    );

    Harness {
        service,
        users,
        sms,
        rate_limiter,
        audit: audit_repo,
        token_service,
    }
}

fn harness() -> Harness {
    harness_with(MemoryRateLimiter::permissive(), 3)
}

async fn seed_password_user(harness: &Harness, email: &str, password: &str) -> i64 {
    harness
        .users
        .create(NewUser {
            email: Some(email.to_string()),
            phone: None,
            password_hash: Some(hash_password(password).unwrap()),
            role: UserRole::User,
            phone_verified: false,
        })
        .await
        .unwrap()
        .id
}

const PHONE: &str = "+989123456789";
const IP: &str = "203.0.113.7";

// ---- password login ----

#[tokio::test]
async fn test_password_login_success() {
    let harness = harness();
    let user_id = seed_password_user(&harness, "buyer@example.com", "hunter2!").await;

    let response = harness
        .service
        .login_with_password("buyer@example.com", "hunter2!", Some(IP.to_string()))
        .await
        .unwrap();

    assert_eq!(response.user.id, user_id);
    assert_eq!(response.token_type, "Bearer");
    assert_eq!(response.expires_in, 1800);

    // Token subject resolves back to the user
    let validated = harness.token_service.validate(&response.access_token).unwrap();
    assert_eq!(validated.subject, TokenSubject::UserId(user_id));

    let events = harness.audit.recorded_of_type(AuditEventType::LoginSuccess).await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].user_id, Some(user_id));
}

#[tokio::test]
async fn test_unknown_email_and_wrong_password_return_same_error() {
    let harness = harness();
    seed_password_user(&harness, "buyer@example.com", "hunter2!").await;

    let unknown = harness
        .service
        .login_with_password("ghost@example.com", "hunter2!", None)
        .await;
    let wrong = harness
        .service
        .login_with_password("buyer@example.com", "not-the-password", None)
        .await;

    // Identical error for both causes: no account enumeration
    match (unknown, wrong) {
        (
            Err(DomainError::Auth(AuthError::InvalidCredentials)),
            Err(DomainError::Auth(AuthError::InvalidCredentials)),
        ) => {}
        other => panic!("expected InvalidCredentials for both, got {:?}", other),
    }
}

#[tokio::test]
async fn test_repeated_failures_lock_the_account() {
    let harness = harness();
    seed_password_user(&harness, "buyer@example.com", "hunter2!").await;

    for _ in 0..3 {
        let result = harness
            .service
            .login_with_password("buyer@example.com", "wrong", None)
            .await;
        assert!(matches!(
            result,
            Err(DomainError::Auth(AuthError::InvalidCredentials))
        ));
    }

    // The lock now rejects even the correct password
    match harness
        .service
        .login_with_password("buyer@example.com", "hunter2!", None)
        .await
    {
        Err(DomainError::Auth(AuthError::AccountLocked { minutes })) => {
            assert!(minutes > 0 && minutes <= 30);
        }
        other => panic!("expected AccountLocked, got {:?}", other),
    }

    let locked_events = harness.audit.recorded_of_type(AuditEventType::AccountLocked).await;
    assert_eq!(locked_events.len(), 1);
}

#[tokio::test]
async fn test_success_resets_failure_counter() {
    let harness = harness();
    seed_password_user(&harness, "buyer@example.com", "hunter2!").await;

    for _ in 0..2 {
        let _ = harness
            .service
            .login_with_password("buyer@example.com", "wrong", None)
            .await;
    }
    harness
        .service
        .login_with_password("buyer@example.com", "hunter2!", None)
        .await
        .unwrap();

    // The counter restarted; two more failures stay below the threshold
    for _ in 0..2 {
        let _ = harness
            .service
            .login_with_password("buyer@example.com", "wrong", None)
            .await;
    }
    harness
        .service
        .login_with_password("buyer@example.com", "hunter2!", None)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_login_ip_budget() {
    let harness = harness_with(MemoryRateLimiter::new(u32::MAX, 2, 3600), 3);
    seed_password_user(&harness, "buyer@example.com", "hunter2!").await;

    for _ in 0..2 {
        let _ = harness
            .service
            .login_with_password("buyer@example.com", "wrong", Some(IP.to_string()))
            .await;
    }
    match harness
        .service
        .login_with_password("buyer@example.com", "hunter2!", Some(IP.to_string()))
        .await
    {
        Err(DomainError::Auth(AuthError::RateLimited { .. })) => {}
        other => panic!("expected RateLimited, got {:?}", other),
    }
}

// ---- phone OTP login ----

#[tokio::test]
async fn test_phone_otp_end_to_end() {
    let harness = harness();

    let requested = harness
        .service
        .request_phone_otp(PHONE, Some(IP.to_string()))
        .await
        .unwrap();
    assert_eq!(requested.expires_in, 300);
    assert!(requested.message_id.is_some());

    let code = harness.sms.last_code().unwrap();
    let response = harness
        .service
        .verify_phone_otp(PHONE, &code, Some(IP.to_string()))
        .await
        .unwrap();

    // First-time login created a verified account
    let user = harness.users.find_by_phone(PHONE).await.unwrap().unwrap();
    assert!(user.is_phone_verified());
    assert_eq!(response.user.id, user.id);
    assert!(response.user.phone_verified);

    // JWT subject resolves to the new account
    let validated = harness.token_service.validate(&response.access_token).unwrap();
    assert_eq!(validated.subject, TokenSubject::UserId(user.id));
}

#[tokio::test]
async fn test_phone_otp_request_rate_limit_boundary() {
    // Budget of exactly 3 requests per window
    let harness = harness_with(MemoryRateLimiter::new(3, u32::MAX, 3600), 3);

    for _ in 0..3 {
        harness.service.request_phone_otp(PHONE, None).await.unwrap();
    }
    assert_eq!(harness.sms.sent_count(), 3);

    // Request 4 inside the window is rejected
    match harness.service.request_phone_otp(PHONE, None).await {
        Err(DomainError::Auth(AuthError::RateLimited { retry_after_seconds })) => {
            assert!(retry_after_seconds > 0);
        }
        other => panic!("expected RateLimited, got {:?}", other),
    }
    assert_eq!(harness.sms.sent_count(), 3);

    // Once the window elapses the budget refills
    harness.rate_limiter.backdate_phone(PHONE, 3601);
    harness.service.request_phone_otp(PHONE, None).await.unwrap();
    assert_eq!(harness.sms.sent_count(), 4);

    let rate_events = harness
        .audit
        .recorded_of_type(AuditEventType::RateLimitExceeded)
        .await;
    assert_eq!(rate_events.len(), 1);
}

#[tokio::test]
async fn test_invalid_phone_rejected_without_audit_or_sms() {
    let harness = harness();

    match harness.service.request_phone_otp("12345", None).await {
        Err(DomainError::Auth(AuthError::InvalidPhoneFormat { phone })) => {
            // Error carries only the masked number
            assert!(!phone.contains("12345"));
        }
        other => panic!("expected InvalidPhoneFormat, got {:?}", other),
    }
    assert_eq!(harness.sms.sent_count(), 0);
    assert!(harness.audit.recorded().await.is_empty());
}

#[tokio::test]
async fn test_otp_max_attempts_locks_phone() {
    let harness = harness();
    harness.service.request_phone_otp(PHONE, None).await.unwrap();
    let correct = harness.sms.last_code().unwrap();
    let wrong = if correct == "000000" { "111111" } else { "000000" };

    // Three wrong attempts exhaust the budget
    for attempt in 1..=3 {
        let result = harness.service.verify_phone_otp(PHONE, wrong, None).await;
        match (attempt, result) {
            (3, Err(DomainError::Auth(AuthError::OtpMaxAttempts))) => {}
            (_, Err(DomainError::Auth(AuthError::OtpInvalid { .. }))) if attempt < 3 => {}
            (_, other) => panic!("attempt {}: unexpected {:?}", attempt, other),
        }
    }

    // The correct code is dead, and the phone identifier is now locked
    match harness.service.verify_phone_otp(PHONE, &correct, None).await {
        Err(DomainError::Auth(AuthError::RateLimited { .. })) => {}
        other => panic!("expected RateLimited (locked phone), got {:?}", other),
    }
    match harness.service.request_phone_otp(PHONE, None).await {
        Err(DomainError::Auth(AuthError::RateLimited { .. })) => {}
        other => panic!("expected RateLimited (locked phone), got {:?}", other),
    }
}

#[tokio::test]
async fn test_otp_reuse_after_success_is_replay() {
    let harness = harness();
    harness.service.request_phone_otp(PHONE, None).await.unwrap();
    let code = harness.sms.last_code().unwrap();

    harness.service.verify_phone_otp(PHONE, &code, None).await.unwrap();
    match harness.service.verify_phone_otp(PHONE, &code, None).await {
        Err(DomainError::Auth(AuthError::OtpReplay)) => {}
        other => panic!("expected OtpReplay, got {:?}", other),
    }
}

#[tokio::test]
async fn test_registration_disabled_rejects_unknown_phone() {
    let harness = harness_with_config(
        MemoryRateLimiter::permissive(),
        3,
        AuthServiceConfig {
            allow_registration: false,
            ..AuthServiceConfig::default()
        },
    );

    harness.service.request_phone_otp(PHONE, None).await.unwrap();
    let code = harness.sms.last_code().unwrap();

    match harness.service.verify_phone_otp(PHONE, &code, None).await {
        Err(DomainError::Auth(AuthError::RegistrationDisabled)) => {}
        other => panic!("expected RegistrationDisabled, got {:?}", other),
    }
    // No account was created along the way
    assert!(harness.users.find_by_phone(PHONE).await.unwrap().is_none());
}

// ---- phone verification (authenticated) ----

#[tokio::test]
async fn test_phone_verification_flow() {
    let harness = harness();
    let user = harness
        .users
        .create(NewUser {
            email: Some("pro@example.com".to_string()),
            phone: Some(PHONE.to_string()),
            password_hash: Some(hash_password("secret123").unwrap()),
            role: UserRole::Pro,
            phone_verified: false,
        })
        .await
        .unwrap();

    harness.service.request_phone_verification(user.id).await.unwrap();
    let code = harness.sms.last_code().unwrap();

    let result = harness
        .service
        .confirm_phone_verification(user.id, &code)
        .await
        .unwrap();
    assert!(result.verified);

    let stored = harness.users.find_by_id(user.id).await.unwrap().unwrap();
    assert!(stored.is_phone_verified());

    let events = harness.audit.recorded_of_type(AuditEventType::PhoneVerified).await;
    assert_eq!(events.len(), 1);
}

#[tokio::test]
async fn test_phone_verification_requires_phone_on_account() {
    let harness = harness();
    let user_id = seed_password_user(&harness, "nophone@example.com", "secret123").await;

    match harness.service.request_phone_verification(user_id).await {
        Err(DomainError::Auth(AuthError::PhoneNotSet)) => {}
        other => panic!("expected PhoneNotSet, got {:?}", other),
    }
}

// ---- telegram linking ----

#[tokio::test]
async fn test_telegram_link_end_to_end() {
    let harness = harness();
    let user_id = seed_password_user(&harness, "buyer@example.com", "hunter2!").await;

    let issued = harness
        .service
        .request_telegram_link(user_id, None)
        .await
        .unwrap();
    assert_eq!(issued.expires_in, 180);

    let result = harness
        .service
        .verify_telegram_link(
            &issued.token,
            555,
            TelegramProfile {
                username: Some("wei".to_string()),
                first_name: Some("Wei".to_string()),
                last_name: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(result.user.id, user_id);

    let stored = harness.users.find_by_id(user_id).await.unwrap().unwrap();
    assert_eq!(stored.telegram_user_id, Some(555));
    assert_eq!(stored.telegram_username.as_deref(), Some("wei"));

    // Redeeming the same token again is a replay
    match harness
        .service
        .verify_telegram_link(&issued.token, 555, TelegramProfile::default())
        .await
    {
        Err(DomainError::Token(TokenError::TokenReplay)) => {}
        other => panic!("expected TokenReplay, got {:?}", other),
    }
}

#[tokio::test]
async fn test_double_link_request_rejected() {
    let harness = harness();
    let user_id = seed_password_user(&harness, "buyer@example.com", "hunter2!").await;

    let issued = harness
        .service
        .request_telegram_link(user_id, None)
        .await
        .unwrap();
    harness
        .service
        .verify_telegram_link(&issued.token, 555, TelegramProfile::default())
        .await
        .unwrap();

    match harness.service.request_telegram_link(user_id, None).await {
        Err(DomainError::Auth(AuthError::AlreadyLinked)) => {}
        other => panic!("expected AlreadyLinked, got {:?}", other),
    }
}

#[tokio::test]
async fn test_telegram_identity_cannot_bind_two_accounts() {
    let harness = harness();
    let first = seed_password_user(&harness, "first@example.com", "hunter2!").await;
    let second = seed_password_user(&harness, "second@example.com", "hunter2!").await;

    let issued = harness.service.request_telegram_link(first, None).await.unwrap();
    harness
        .service
        .verify_telegram_link(&issued.token, 555, TelegramProfile::default())
        .await
        .unwrap();

    let issued = harness.service.request_telegram_link(second, None).await.unwrap();
    match harness
        .service
        .verify_telegram_link(&issued.token, 555, TelegramProfile::default())
        .await
    {
        Err(DomainError::Auth(AuthError::TelegramAlreadyLinked)) => {}
        other => panic!("expected TelegramAlreadyLinked, got {:?}", other),
    }
}

#[tokio::test]
async fn test_expired_link_token_rejected() {
    let harness = harness_with(MemoryRateLimiter::permissive(), 0);
    let user_id = seed_password_user(&harness, "buyer@example.com", "hunter2!").await;

    let issued = harness
        .service
        .request_telegram_link(user_id, None)
        .await
        .unwrap();
    match harness
        .service
        .verify_telegram_link(&issued.token, 555, TelegramProfile::default())
        .await
    {
        Err(DomainError::Token(TokenError::TokenExpired)) => {}
        other => panic!("expected TokenExpired, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unlink_is_idempotent() {
    let harness = harness();
    let user_id = seed_password_user(&harness, "buyer@example.com", "hunter2!").await;

    let issued = harness
        .service
        .request_telegram_link(user_id, None)
        .await
        .unwrap();
    harness
        .service
        .verify_telegram_link(&issued.token, 555, TelegramProfile::default())
        .await
        .unwrap();

    let first = harness.service.unlink_telegram(user_id).await.unwrap();
    assert!(first.success);
    assert!(first.was_linked);

    let second = harness.service.unlink_telegram(user_id).await.unwrap();
    assert!(second.success);
    assert!(!second.was_linked);
}

#[tokio::test]
async fn test_unlink_refused_for_last_auth_method() {
    let harness = harness();

    // Telegram-only account: no password, no verified phone
    let user = harness
        .users
        .create(NewUser {
            email: None,
            phone: None,
            password_hash: None,
            role: UserRole::User,
            phone_verified: false,
        })
        .await
        .unwrap();
    let mut user = user;
    user.link_telegram(777, TelegramProfile::default());
    harness.users.update(&user).await.unwrap();

    match harness.service.unlink_telegram(user.id).await {
        Err(DomainError::BusinessRule { .. }) => {}
        other => panic!("expected BusinessRule, got {:?}", other),
    }

    // Still linked
    let stored = harness.users.find_by_id(user.id).await.unwrap().unwrap();
    assert!(stored.is_telegram_linked());
}

// ---- telegram login ----

#[tokio::test]
async fn test_telegram_login_end_to_end() {
    let harness = harness();
    let user_id = seed_password_user(&harness, "buyer@example.com", "hunter2!").await;

    let issued = harness
        .service
        .request_telegram_link(user_id, None)
        .await
        .unwrap();
    harness
        .service
        .verify_telegram_link(&issued.token, 555, TelegramProfile::default())
        .await
        .unwrap();

    let login = harness.service.request_telegram_login(555).await.unwrap();
    let response = harness
        .service
        .verify_telegram_login(&login.token, Some(IP.to_string()))
        .await
        .unwrap();
    assert_eq!(response.user.id, user_id);

    let stored = harness.users.find_by_id(user_id).await.unwrap().unwrap();
    assert_eq!(
        stored.last_login_method,
        Some(crate::domain::entities::user::LoginMethod::Telegram)
    );
}

#[tokio::test]
async fn test_telegram_login_requires_existing_link() {
    let harness = harness();
    match harness.service.request_telegram_login(999).await {
        Err(DomainError::Auth(AuthError::TelegramNotLinked)) => {}
        other => panic!("expected TelegramNotLinked, got {:?}", other),
    }
}

#[tokio::test]
async fn test_telegram_login_token_single_use() {
    let harness = harness();
    let user_id = seed_password_user(&harness, "buyer@example.com", "hunter2!").await;

    let issued = harness
        .service
        .request_telegram_link(user_id, None)
        .await
        .unwrap();
    harness
        .service
        .verify_telegram_link(&issued.token, 555, TelegramProfile::default())
        .await
        .unwrap();

    let login = harness.service.request_telegram_login(555).await.unwrap();
    harness
        .service
        .verify_telegram_login(&login.token, None)
        .await
        .unwrap();

    match harness.service.verify_telegram_login(&login.token, None).await {
        Err(DomainError::Token(TokenError::TokenReplay)) => {}
        other => panic!("expected TokenReplay, got {:?}", other),
    }
}
