//! Main authentication service implementation
//!
//! Every authentication operation enters through this service, so no
//! endpoint can bypass rate limiting or audit logging. Each operation
//! writes exactly one audit event before returning; input-validation
//! rejections are the only outcomes that skip both the audit sink and
//! the rate-limit counters.

use std::sync::Arc;

use chrono::{Duration, Utc};

use crate::domain::entities::audit::{AuditEvent, AuditEventType};
use crate::domain::entities::link_token::LinkTokenPurpose;
use crate::domain::entities::otp_code::OtpPurpose;
use crate::domain::entities::user::{LoginMethod, NewUser, TelegramProfile, User};
use crate::domain::value_objects::{AuthResponse, UserSummary};
use crate::errors::{AuthError, DomainError, DomainResult};
use crate::repositories::{AuditRepository, LinkTokenRepository, OtpRepository, UserRepository};
use crate::services::audit::{hash_identifier, AuditService};
use crate::services::link::{IssuedLinkToken, LinkTokenService};
use crate::services::otp::{OtpRequestResult, OtpService, SmsServiceTrait};
use crate::services::token::TokenService;

use super::config::AuthServiceConfig;
use super::password::{dummy_verify, verify_password};
use super::phone_utils::{hash_phone, mask_phone, validate_phone};
use super::rate_limiter::RateLimiterTrait;

/// Result of verifying a Telegram link token
#[derive(Debug, Clone, PartialEq)]
pub struct LinkResult {
    pub user: UserSummary,
    pub linked_at: chrono::DateTime<Utc>,
}

/// Result of confirming phone verification
#[derive(Debug, Clone, PartialEq)]
pub struct PhoneVerificationResult {
    pub verified: bool,
    pub verified_at: chrono::DateTime<Utc>,
}

/// Result of unlinking Telegram
///
/// Unlinking is idempotent: the second call succeeds with
/// `was_linked == false` instead of erroring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnlinkResult {
    pub success: bool,
    pub was_linked: bool,
}

/// Authentication service orchestrating all login and linking flows
pub struct AuthService<U, O, S, L, R, A>
where
    U: UserRepository,
    O: OtpRepository,
    S: SmsServiceTrait,
    L: LinkTokenRepository,
    R: RateLimiterTrait,
    A: AuditRepository + 'static,
{
    /// User repository for credential-store operations
    user_repository: Arc<U>,
    /// OTP engine for phone codes
    otp_service: Arc<OtpService<O, S>>,
    /// Link-token engine for Telegram binding
    link_service: Arc<LinkTokenService<L>>,
    /// Session token issuer/validator
    token_service: Arc<TokenService>,
    /// Rate limiter gating OTP and login attempts
    rate_limiter: Arc<R>,
    /// Audit sink
    audit_service: Arc<AuditService<A>>,
    /// Service configuration
    config: AuthServiceConfig,
}

impl<U, O, S, L, R, A> AuthService<U, O, S, L, R, A>
where
    U: UserRepository,
    O: OtpRepository,
    S: SmsServiceTrait,
    L: LinkTokenRepository,
    R: RateLimiterTrait,
    A: AuditRepository + 'static,
{
    pub fn new(
        user_repository: Arc<U>,
        otp_service: Arc<OtpService<O, S>>,
        link_service: Arc<LinkTokenService<L>>,
        token_service: Arc<TokenService>,
        rate_limiter: Arc<R>,
        audit_service: Arc<AuditService<A>>,
        config: AuthServiceConfig,
    ) -> Self {
        Self {
            user_repository,
            otp_service,
            link_service,
            token_service,
            rate_limiter,
            audit_service,
            config,
        }
    }

    /// Authenticate with email and password
    ///
    /// Unknown email and wrong password return the same
    /// `InvalidCredentials` error, and the unknown-email path burns a
    /// comparable amount of hashing time, so responses cannot be used
    /// to enumerate accounts.
    ///
    /// # Errors
    /// * `InvalidCredentials` - unknown email or wrong password
    /// * `AccountLocked` - failed-attempt lockout window still active
    /// * `AccountDisabled` - account soft-disabled
    /// * `RateLimited` - IP budget exhausted
    pub async fn login_with_password(
        &self,
        email: &str,
        password: &str,
        client_ip: Option<String>,
    ) -> DomainResult<AuthResponse> {
        let ip_hash = client_ip.as_deref().map(hash_identifier);

        // Step 1: IP budget gate, counting this attempt
        if let Some(ref ip) = client_ip {
            self.gate_ip(ip, ip_hash.clone()).await?;
            let _ = self.rate_limiter.increment_ip_counter(ip).await;
        }

        // Step 2: look up the account
        let user = match self.user_repository.find_by_email(email).await? {
            Some(user) => user,
            None => {
                // Equalize latency with the wrong-password path
                dummy_verify(password);
                self.audit(
                    AuditEvent::new(AuditEventType::LoginFailure, false)
                        .with_error_code(AuthError::InvalidCredentials.code())
                        .maybe_ip(ip_hash),
                )
                .await;
                return Err(AuthError::InvalidCredentials.into());
            }
        };

        // Step 3: account state gates
        if user.is_disabled {
            self.audit(
                AuditEvent::new(AuditEventType::LoginFailure, false)
                    .with_user(user.id)
                    .with_error_code(AuthError::AccountDisabled.code())
                    .maybe_ip(ip_hash),
            )
            .await;
            return Err(AuthError::AccountDisabled.into());
        }

        let now = Utc::now();
        if let Some(seconds) = user.lock_remaining_seconds(now) {
            self.audit(
                AuditEvent::new(AuditEventType::LoginFailure, false)
                    .with_user(user.id)
                    .with_error_code("ACCOUNT_LOCKED")
                    .maybe_ip(ip_hash),
            )
            .await;
            return Err(AuthError::AccountLocked {
                minutes: (seconds + 59) / 60,
            }
            .into());
        }

        // Step 4: password check
        let password_ok = match user.password_hash.as_deref() {
            Some(stored) => verify_password(password, stored),
            None => {
                // Phone/Telegram-only account; same cost, same error
                dummy_verify(password);
                false
            }
        };

        if !password_ok {
            // Transactional counter increment; may lock the account
            let after = self
                .user_repository
                .register_login_failure(
                    user.id,
                    self.config.lockout.max_failed_logins,
                    Duration::minutes(self.config.lockout.account_lock_minutes),
                )
                .await?;

            let locked_now = after.is_locked(Utc::now());
            let event_type = if locked_now {
                AuditEventType::AccountLocked
            } else {
                AuditEventType::LoginFailure
            };
            self.audit(
                AuditEvent::new(event_type, false)
                    .with_user(user.id)
                    .with_error_code(AuthError::InvalidCredentials.code())
                    .maybe_ip(ip_hash),
            )
            .await;
            return Err(AuthError::InvalidCredentials.into());
        }

        // Step 5: success - clear counters, stamp the login, issue a token
        let mut user = user;
        user.reset_login_failures();
        user.touch_login(LoginMethod::Email);
        let user = self.user_repository.update(&user).await?;

        let response = self.issue_session(&user)?;
        self.audit(
            AuditEvent::new(AuditEventType::LoginSuccess, true)
                .with_user(user.id)
                .with_metadata(serde_json::json!({"method": "email"}))
                .maybe_ip(ip_hash),
        )
        .await;
        Ok(response)
    }

    /// Request a login OTP for a phone number
    ///
    /// # Errors
    /// * `InvalidPhoneFormat` - not E.164 (no audit or rate-limit cost)
    /// * `RateLimited` - phone locked, phone budget or IP budget spent,
    ///   or the resend cooldown is still running
    pub async fn request_phone_otp(
        &self,
        phone: &str,
        client_ip: Option<String>,
    ) -> DomainResult<OtpRequestResult> {
        // Step 1: format validation, before any counters are touched
        if !validate_phone(phone) {
            return Err(AuthError::InvalidPhoneFormat {
                phone: mask_phone(phone),
            }
            .into());
        }

        let phone_hash = hash_phone(phone);
        let ip_hash = client_ip.as_deref().map(hash_identifier);

        // Step 2: phone lockout and budget
        self.gate_phone(phone, &phone_hash, ip_hash.clone()).await?;

        // Step 3: IP budget
        if let Some(ref ip) = client_ip {
            self.gate_ip(ip, ip_hash.clone()).await?;
        }

        // Step 4: generate and dispatch; user resolution happens at verify
        let result = match self
            .otp_service
            .generate(phone, OtpPurpose::Login, None, ip_hash.clone())
            .await
        {
            Ok(result) => result,
            Err(error) => {
                if let DomainError::Auth(AuthError::RateLimited { .. }) = error {
                    self.audit(
                        AuditEvent::new(AuditEventType::RateLimitExceeded, false)
                            .with_phone_hash(phone_hash.clone())
                            .maybe_ip(ip_hash),
                    )
                    .await;
                }
                return Err(error);
            }
        };

        // Step 5: count the request against both budgets
        let _ = self.rate_limiter.increment_phone_counter(phone).await;
        if let Some(ref ip) = client_ip {
            let _ = self.rate_limiter.increment_ip_counter(ip).await;
        }

        self.audit(
            AuditEvent::new(AuditEventType::OtpRequested, true)
                .with_phone_hash(phone_hash)
                .with_metadata(serde_json::json!({
                    "purpose": "login",
                    "delivered": result.message_id.is_some(),
                }))
                .maybe_ip(ip_hash),
        )
        .await;
        Ok(result)
    }

    /// Verify a login OTP and authenticate, creating the account on
    /// first login when registration is open
    ///
    /// # Errors
    /// * `OtpInvalid` / `OtpExpired` / `OtpReplay` - code rejected
    /// * `OtpMaxAttempts` - attempt budget spent; the phone is locked
    ///   for the configured cooldown
    /// * `RateLimited` - phone locked or IP budget spent
    /// * `RegistrationDisabled` - unknown phone and registration closed
    pub async fn verify_phone_otp(
        &self,
        phone: &str,
        code: &str,
        client_ip: Option<String>,
    ) -> DomainResult<AuthResponse> {
        // Step 1: format validation
        if !validate_phone(phone) {
            return Err(AuthError::InvalidPhoneFormat {
                phone: mask_phone(phone),
            }
            .into());
        }

        let phone_hash = hash_phone(phone);
        let ip_hash = client_ip.as_deref().map(hash_identifier);

        // Step 2: phone lockout gate
        if let Some(seconds) = self.locked_for(phone).await? {
            self.audit(
                AuditEvent::new(AuditEventType::RateLimitExceeded, false)
                    .with_phone_hash(phone_hash)
                    .maybe_ip(ip_hash),
            )
            .await;
            return Err(AuthError::RateLimited {
                retry_after_seconds: seconds,
            }
            .into());
        }

        // Step 3: IP gate
        if let Some(ref ip) = client_ip {
            self.gate_ip(ip, ip_hash.clone()).await?;
        }

        // Step 4: check the code; only real attempts consume the IP budget
        // (malformed input is a validation error with no rate-limit cost)
        match self.otp_service.verify(phone, code, OtpPurpose::Login).await {
            Ok(_) => {
                if let Some(ref ip) = client_ip {
                    let _ = self.rate_limiter.increment_ip_counter(ip).await;
                }
            }
            Err(error) => {
                if let (Some(ip), false) =
                    (client_ip.as_ref(), matches!(error, DomainError::ValidationErr(_)))
                {
                    let _ = self.rate_limiter.increment_ip_counter(ip).await;
                }
                return Err(self
                    .handle_otp_failure(error, phone, &phone_hash, ip_hash)
                    .await);
            }
        }

        // Step 5: resolve or create the account
        let user = match self.user_repository.find_by_phone(phone).await? {
            Some(user) => {
                if user.is_disabled {
                    self.audit(
                        AuditEvent::new(AuditEventType::LoginFailure, false)
                            .with_user(user.id)
                            .with_phone_hash(phone_hash)
                            .with_error_code(AuthError::AccountDisabled.code())
                            .maybe_ip(ip_hash),
                    )
                    .await;
                    return Err(AuthError::AccountDisabled.into());
                }
                user
            }
            None => {
                if !self.config.allow_registration {
                    self.audit(
                        AuditEvent::new(AuditEventType::LoginFailure, false)
                            .with_phone_hash(phone_hash)
                            .with_error_code(AuthError::RegistrationDisabled.code())
                            .maybe_ip(ip_hash),
                    )
                    .await;
                    return Err(AuthError::RegistrationDisabled.into());
                }
                self.user_repository.create(NewUser::from_phone(phone)).await?
            }
        };

        // Step 6: proving code possession also proves the phone
        let mut user = user;
        if !user.is_phone_verified() {
            user.verify_phone();
        }
        user.touch_login(LoginMethod::Phone);
        let user = self.user_repository.update(&user).await?;

        let response = self.issue_session(&user)?;
        self.audit(
            AuditEvent::new(AuditEventType::LoginSuccess, true)
                .with_user(user.id)
                .with_phone_hash(phone_hash)
                .with_metadata(serde_json::json!({"method": "phone"}))
                .maybe_ip(ip_hash),
        )
        .await;
        Ok(response)
    }

    /// Request a verification OTP for the authenticated user's own phone
    pub async fn request_phone_verification(
        &self,
        user_id: i64,
    ) -> DomainResult<OtpRequestResult> {
        let user = self.require_user(user_id, AuditEventType::OtpRequested).await?;

        let phone = match user.phone.as_deref() {
            Some(phone) => phone.to_string(),
            None => {
                self.audit(
                    AuditEvent::new(AuditEventType::OtpRequested, false)
                        .with_user(user.id)
                        .with_error_code(AuthError::PhoneNotSet.code()),
                )
                .await;
                return Err(AuthError::PhoneNotSet.into());
            }
        };
        let phone_hash = hash_phone(&phone);

        self.gate_phone(&phone, &phone_hash, None).await?;

        let result = self
            .otp_service
            .generate(&phone, OtpPurpose::Verification, Some(user.id), None)
            .await?;
        let _ = self.rate_limiter.increment_phone_counter(&phone).await;

        self.audit(
            AuditEvent::new(AuditEventType::OtpRequested, true)
                .with_user(user.id)
                .with_phone_hash(phone_hash)
                .with_metadata(serde_json::json!({
                    "purpose": "verification",
                    "delivered": result.message_id.is_some(),
                })),
        )
        .await;
        Ok(result)
    }

    /// Confirm phone verification with the code delivered to the
    /// account's phone
    pub async fn confirm_phone_verification(
        &self,
        user_id: i64,
        code: &str,
    ) -> DomainResult<PhoneVerificationResult> {
        let user = self.require_user(user_id, AuditEventType::PhoneVerified).await?;
        let phone = user.phone.clone().ok_or(AuthError::PhoneNotSet)?;
        let phone_hash = hash_phone(&phone);

        if let Err(error) = self
            .otp_service
            .verify(&phone, code, OtpPurpose::Verification)
            .await
        {
            return Err(self
                .handle_otp_failure(error, &phone, &phone_hash, None)
                .await);
        }

        let mut user = user;
        user.verify_phone();
        let user = self.user_repository.update(&user).await?;

        self.audit(
            AuditEvent::new(AuditEventType::PhoneVerified, true)
                .with_user(user.id)
                .with_phone_hash(phone_hash),
        )
        .await;

        Ok(PhoneVerificationResult {
            verified: true,
            // verify_phone just set this
            verified_at: user.phone_verified_at.unwrap_or_else(Utc::now),
        })
    }

    /// Issue a web-to-bot link token for the authenticated user
    ///
    /// # Errors
    /// * `AlreadyLinked` - the account already has a Telegram identity
    pub async fn request_telegram_link(
        &self,
        user_id: i64,
        client_ip: Option<String>,
    ) -> DomainResult<IssuedLinkToken> {
        let ip_hash = client_ip.as_deref().map(hash_identifier);
        let user = self
            .require_user(user_id, AuditEventType::TelegramLinkRequested)
            .await?;

        if user.is_telegram_linked() {
            self.audit(
                AuditEvent::new(AuditEventType::TelegramLinkRequested, false)
                    .with_user(user.id)
                    .with_error_code(AuthError::AlreadyLinked.code())
                    .maybe_ip(ip_hash),
            )
            .await;
            return Err(AuthError::AlreadyLinked.into());
        }

        let issued = self
            .link_service
            .issue(LinkTokenPurpose::WebToBot, Some(user.id), None, ip_hash.clone())
            .await?;

        self.audit(
            AuditEvent::new(AuditEventType::TelegramLinkRequested, true)
                .with_user(user.id)
                .maybe_ip(ip_hash),
        )
        .await;
        Ok(issued)
    }

    /// Redeem a web-to-bot token from the bot side, attaching the
    /// Telegram identity to the stored account
    ///
    /// # Errors
    /// * `TokenInvalid` / `TokenExpired` / `TokenReplay` - token rejected
    /// * `AlreadyLinked` - the account linked elsewhere while the token
    ///   was outstanding
    /// * `TelegramAlreadyLinked` - this Telegram account is bound to a
    ///   different user (strict 1:1 unless configured otherwise)
    pub async fn verify_telegram_link(
        &self,
        link_token: &str,
        telegram_user_id: i64,
        profile: TelegramProfile,
    ) -> DomainResult<LinkResult> {
        // Step 1: redeem (single use enforced by the engine)
        let token = match self
            .link_service
            .redeem(link_token, LinkTokenPurpose::WebToBot)
            .await
        {
            Ok(token) => token,
            Err(error) => {
                self.audit(
                    AuditEvent::new(AuditEventType::TelegramLinkFailed, false)
                        .with_telegram_user(telegram_user_id)
                        .with_error_code(error_code_of(&error)),
                )
                .await;
                return Err(error);
            }
        };

        // Step 2: resolve the web account the token was issued for
        let user_id = token.user_id.ok_or_else(|| DomainError::Internal {
            message: "web_to_bot token missing user id".to_string(),
        })?;
        let user = self
            .require_user(user_id, AuditEventType::TelegramLinkFailed)
            .await?;

        if user.is_telegram_linked() {
            self.audit(
                AuditEvent::new(AuditEventType::TelegramLinkFailed, false)
                    .with_user(user.id)
                    .with_telegram_user(telegram_user_id)
                    .with_error_code(AuthError::AlreadyLinked.code()),
            )
            .await;
            return Err(AuthError::AlreadyLinked.into());
        }

        // Step 3: strict 1:1 unless the deployment allows sharing
        if !self.config.allow_shared_telegram {
            if let Some(other) = self
                .user_repository
                .find_by_telegram_id(telegram_user_id)
                .await?
            {
                if other.id != user.id {
                    self.audit(
                        AuditEvent::new(AuditEventType::TelegramLinkFailed, false)
                            .with_user(user.id)
                            .with_telegram_user(telegram_user_id)
                            .with_error_code(AuthError::TelegramAlreadyLinked.code()),
                    )
                    .await;
                    return Err(AuthError::TelegramAlreadyLinked.into());
                }
            }
        }

        // Step 4: bind
        let mut user = user;
        user.link_telegram(telegram_user_id, profile);
        let user = self.user_repository.update(&user).await?;

        self.audit(
            AuditEvent::new(AuditEventType::TelegramLinked, true)
                .with_user(user.id)
                .with_telegram_user(telegram_user_id),
        )
        .await;

        Ok(LinkResult {
            user: UserSummary::from(&user),
            // link_telegram just set this
            linked_at: user.telegram_linked_at.unwrap_or_else(Utc::now),
        })
    }

    /// Issue a bot-to-web login token for a linked Telegram account
    ///
    /// # Errors
    /// * `TelegramNotLinked` - no account has this Telegram identity
    pub async fn request_telegram_login(
        &self,
        telegram_user_id: i64,
    ) -> DomainResult<IssuedLinkToken> {
        let user = match self
            .user_repository
            .find_by_telegram_id(telegram_user_id)
            .await?
        {
            Some(user) => user,
            None => {
                self.audit(
                    AuditEvent::new(AuditEventType::TelegramLoginRequested, false)
                        .with_telegram_user(telegram_user_id)
                        .with_error_code(AuthError::TelegramNotLinked.code()),
                )
                .await;
                return Err(AuthError::TelegramNotLinked.into());
            }
        };

        if user.is_disabled {
            self.audit(
                AuditEvent::new(AuditEventType::TelegramLoginRequested, false)
                    .with_user(user.id)
                    .with_telegram_user(telegram_user_id)
                    .with_error_code(AuthError::AccountDisabled.code()),
            )
            .await;
            return Err(AuthError::AccountDisabled.into());
        }

        // User already resolved, so the token stores both identities
        let issued = self
            .link_service
            .issue(
                LinkTokenPurpose::BotToWeb,
                Some(user.id),
                Some(telegram_user_id),
                None,
            )
            .await?;

        self.audit(
            AuditEvent::new(AuditEventType::TelegramLoginRequested, true)
                .with_user(user.id)
                .with_telegram_user(telegram_user_id),
        )
        .await;
        Ok(issued)
    }

    /// Exchange a bot-to-web token for a web session
    pub async fn verify_telegram_login(
        &self,
        login_token: &str,
        client_ip: Option<String>,
    ) -> DomainResult<AuthResponse> {
        let ip_hash = client_ip.as_deref().map(hash_identifier);

        let token = match self
            .link_service
            .redeem(login_token, LinkTokenPurpose::BotToWeb)
            .await
        {
            Ok(token) => token,
            Err(error) => {
                self.audit(
                    AuditEvent::new(AuditEventType::TelegramLoginFailed, false)
                        .with_error_code(error_code_of(&error))
                        .maybe_ip(ip_hash),
                )
                .await;
                return Err(error);
            }
        };

        let user_id = token.user_id.ok_or_else(|| DomainError::Internal {
            message: "bot_to_web token missing user id".to_string(),
        })?;
        let user = self
            .require_user(user_id, AuditEventType::TelegramLoginFailed)
            .await?;

        if user.is_disabled {
            self.audit(
                AuditEvent::new(AuditEventType::TelegramLoginFailed, false)
                    .with_user(user.id)
                    .with_error_code(AuthError::AccountDisabled.code())
                    .maybe_ip(ip_hash),
            )
            .await;
            return Err(AuthError::AccountDisabled.into());
        }

        let mut user = user;
        user.touch_login(LoginMethod::Telegram);
        let user = self.user_repository.update(&user).await?;

        let response = self.issue_session(&user)?;
        self.audit(
            AuditEvent::new(AuditEventType::TelegramLoginSuccess, true)
                .with_user(user.id)
                .with_metadata(serde_json::json!({"method": "telegram"}))
                .maybe_ip(ip_hash),
        )
        .await;
        Ok(response)
    }

    /// Detach the Telegram identity from the account
    ///
    /// Idempotent: succeeds whether or not anything was linked. Refused
    /// only when Telegram is the account's last authentication method.
    pub async fn unlink_telegram(&self, user_id: i64) -> DomainResult<UnlinkResult> {
        let user = self
            .require_user(user_id, AuditEventType::TelegramUnlinked)
            .await?;

        let telegram_user_id = user.telegram_user_id;
        let mut user = user;
        let was_linked = user.unlink_telegram();

        if was_linked {
            // An account must keep at least one way to authenticate
            if !user.has_auth_method() {
                self.audit(
                    AuditEvent::new(AuditEventType::TelegramUnlinked, false)
                        .with_user(user.id)
                        .with_error_code("LAST_AUTH_METHOD"),
                )
                .await;
                return Err(DomainError::BusinessRule {
                    message: "Cannot unlink the only remaining authentication method"
                        .to_string(),
                });
            }
            self.user_repository.update(&user).await?;
        }

        let mut event = AuditEvent::new(AuditEventType::TelegramUnlinked, true)
            .with_user(user.id)
            .with_metadata(serde_json::json!({"was_linked": was_linked}));
        if let Some(telegram_user_id) = telegram_user_id {
            event = event.with_telegram_user(telegram_user_id);
        }
        self.audit(event).await;

        Ok(UnlinkResult {
            success: true,
            was_linked,
        })
    }

    // ---- internal helpers ----

    /// Issue a session token for the user
    fn issue_session(&self, user: &User) -> DomainResult<AuthResponse> {
        let access_token = self.token_service.issue(user.id, user.role)?;
        Ok(AuthResponse::new(
            access_token,
            self.token_service.expires_in(),
            user,
        ))
    }

    /// Fetch a user or audit-and-fail with `UserNotFound`
    async fn require_user(
        &self,
        user_id: i64,
        failure_event: AuditEventType,
    ) -> DomainResult<User> {
        match self.user_repository.find_by_id(user_id).await? {
            Some(user) => Ok(user),
            None => {
                self.audit(
                    AuditEvent::new(failure_event, false)
                        .with_error_code(AuthError::UserNotFound.code()),
                )
                .await;
                Err(AuthError::UserNotFound.into())
            }
        }
    }

    /// Phone lockout and sliding-window budget gate
    async fn gate_phone(
        &self,
        phone: &str,
        phone_hash: &str,
        ip_hash: Option<String>,
    ) -> DomainResult<()> {
        if let Some(seconds) = self.locked_for(phone).await? {
            self.audit(
                AuditEvent::new(AuditEventType::RateLimitExceeded, false)
                    .with_phone_hash(phone_hash)
                    .maybe_ip(ip_hash),
            )
            .await;
            return Err(AuthError::RateLimited {
                retry_after_seconds: seconds,
            }
            .into());
        }

        let exceeded = self
            .rate_limiter
            .check_phone_limit(phone)
            .await
            .map_err(rate_limiter_error)?;
        if exceeded {
            let retry_after = self
                .rate_limiter
                .phone_limit_reset_in(phone)
                .await
                .unwrap_or(None)
                .unwrap_or(3600);
            self.audit(
                AuditEvent::new(AuditEventType::RateLimitExceeded, false)
                    .with_phone_hash(phone_hash)
                    .maybe_ip(ip_hash),
            )
            .await;
            return Err(AuthError::RateLimited {
                retry_after_seconds: retry_after,
            }
            .into());
        }
        Ok(())
    }

    /// IP sliding-window budget gate
    async fn gate_ip(&self, ip: &str, ip_hash: Option<String>) -> DomainResult<()> {
        let exceeded = self
            .rate_limiter
            .check_ip_limit(ip)
            .await
            .map_err(rate_limiter_error)?;
        if exceeded {
            let retry_after = self
                .rate_limiter
                .ip_limit_reset_in(ip)
                .await
                .unwrap_or(None)
                .unwrap_or(3600);
            self.audit(
                AuditEvent::new(AuditEventType::RateLimitExceeded, false).maybe_ip(ip_hash),
            )
            .await;
            return Err(AuthError::RateLimited {
                retry_after_seconds: retry_after,
            }
            .into());
        }
        Ok(())
    }

    async fn locked_for(&self, identifier: &str) -> DomainResult<Option<i64>> {
        self.rate_limiter
            .locked_for(identifier)
            .await
            .map_err(rate_limiter_error)
    }

    /// Audit an OTP verification failure; exhausting the budget also
    /// locks the phone identifier for the configured cooldown
    async fn handle_otp_failure(
        &self,
        error: DomainError,
        phone: &str,
        phone_hash: &str,
        ip_hash: Option<String>,
    ) -> DomainError {
        // Malformed input never reaches the audit sink
        if matches!(error, DomainError::ValidationErr(_)) {
            return error;
        }

        if matches!(error, DomainError::Auth(AuthError::OtpMaxAttempts)) {
            let _ = self
                .rate_limiter
                .lock(phone, self.config.lockout.phone_lock_seconds)
                .await;
        }

        self.audit(
            AuditEvent::new(AuditEventType::OtpFailed, false)
                .with_phone_hash(phone_hash)
                .with_error_code(error_code_of(&error))
                .maybe_ip(ip_hash),
        )
        .await;
        error
    }

    async fn audit(&self, event: AuditEvent) {
        self.audit_service.record(event).await;
    }
}

/// Machine-readable code for an error heading to the audit log
fn error_code_of(error: &DomainError) -> String {
    match error {
        DomainError::Auth(auth_error) => auth_error.code().to_string(),
        DomainError::Token(token_error) => token_error.code().to_string(),
        other => format!("{:?}", other),
    }
}

fn rate_limiter_error(message: String) -> DomainError {
    DomainError::Internal {
        message: format!("Rate limiter failure: {}", message),
    }
}

/// Small extension so optional IP hashes read cleanly at call sites
trait MaybeIp {
    fn maybe_ip(self, ip_hash: Option<String>) -> Self;
}

impl MaybeIp for AuditEvent {
    fn maybe_ip(self, ip_hash: Option<String>) -> Self {
        match ip_hash {
            Some(ip_hash) => self.with_ip_hash(ip_hash),
            None => self,
        }
    }
}
