//! User entity representing a registered account in the PartsHub system.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Role assigned to a user account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    SuperAdmin,
    Admin,
    Manager,
    Operator,
    /// Professional buyer (workshop)
    Pro,
    /// Fleet account
    Fleet,
    User,
}

impl UserRole {
    /// Convert to string representation for storage and JWT claims
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SuperAdmin => "super_admin",
            Self::Admin => "admin",
            Self::Manager => "manager",
            Self::Operator => "operator",
            Self::Pro => "pro",
            Self::Fleet => "fleet",
            Self::User => "user",
        }
    }

    /// Parse from string representation
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "super_admin" => Some(Self::SuperAdmin),
            "admin" => Some(Self::Admin),
            "manager" => Some(Self::Manager),
            "operator" => Some(Self::Operator),
            "pro" => Some(Self::Pro),
            "fleet" => Some(Self::Fleet),
            "user" => Some(Self::User),
            _ => None,
        }
    }
}

/// Authentication channel used for the most recent login
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoginMethod {
    Email,
    Phone,
    Telegram,
}

impl LoginMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Phone => "phone",
            Self::Telegram => "telegram",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "email" => Some(Self::Email),
            "phone" => Some(Self::Phone),
            "telegram" => Some(Self::Telegram),
            _ => None,
        }
    }
}

/// Display fields supplied by Telegram when an account is linked
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelegramProfile {
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// User entity representing a registered account
///
/// An account is usable only while at least one authentication method
/// exists: a password, a verified phone, or a linked Telegram identity.
/// Accounts are never hard-deleted; `is_disabled` soft-disables them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Immutable numeric identifier (database primary key, JWT subject)
    pub id: i64,

    /// Email address, unique when present
    pub email: Option<String>,

    /// Phone number in E.164 format, unique when present
    pub phone: Option<String>,

    /// Bcrypt password hash; absent for phone/Telegram-only accounts
    pub password_hash: Option<String>,

    /// Role assigned to the account
    pub role: UserRole,

    /// When the phone number was verified, if ever
    pub phone_verified_at: Option<DateTime<Utc>>,

    /// Linked Telegram account id, unique when present
    pub telegram_user_id: Option<i64>,

    /// Telegram display fields captured at link time
    pub telegram_username: Option<String>,
    pub telegram_first_name: Option<String>,
    pub telegram_last_name: Option<String>,

    /// When the Telegram account was linked
    pub telegram_linked_at: Option<DateTime<Utc>>,

    /// Channel used for the most recent successful login
    pub last_login_method: Option<LoginMethod>,

    /// Consecutive failed password attempts since the last success
    pub failed_login_attempts: i32,

    /// Account lockout expiry; the account rejects password logins until then
    pub locked_until: Option<DateTime<Utc>>,

    /// Soft-disable flag
    pub is_disabled: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Attributes for creating a new user record; the repository assigns the id
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub password_hash: Option<String>,
    pub role: UserRole,
    /// Mark the phone verified at creation (phone-OTP registration path)
    pub phone_verified: bool,
}

impl NewUser {
    /// New account registered through phone OTP login
    pub fn from_phone(phone: impl Into<String>) -> Self {
        Self {
            email: None,
            phone: Some(phone.into()),
            password_hash: None,
            role: UserRole::User,
            phone_verified: true,
        }
    }
}

impl User {
    /// Whether the account is currently locked out of password login
    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        matches!(self.locked_until, Some(until) if until > now)
    }

    /// Seconds remaining on an active lockout, if any
    pub fn lock_remaining_seconds(&self, now: DateTime<Utc>) -> Option<i64> {
        self.locked_until
            .filter(|until| *until > now)
            .map(|until| (until - now).num_seconds().max(1))
    }

    /// Record a failed password attempt
    ///
    /// Returns `true` when this failure reaches the threshold and locks
    /// the account for `lock_duration`.
    pub fn record_login_failure(&mut self, max_attempts: i32, lock_duration: Duration) -> bool {
        self.failed_login_attempts += 1;
        self.updated_at = Utc::now();
        if self.failed_login_attempts >= max_attempts {
            self.locked_until = Some(Utc::now() + lock_duration);
            self.failed_login_attempts = 0;
            true
        } else {
            false
        }
    }

    /// Clear the failure counter and any lockout after a successful login
    pub fn reset_login_failures(&mut self) {
        self.failed_login_attempts = 0;
        self.locked_until = None;
        self.updated_at = Utc::now();
    }

    /// Mark the phone number as verified
    pub fn verify_phone(&mut self) {
        self.phone_verified_at = Some(Utc::now());
        self.updated_at = Utc::now();
    }

    /// Whether the phone number has been verified
    pub fn is_phone_verified(&self) -> bool {
        self.phone_verified_at.is_some()
    }

    /// Attach a Telegram identity to the account
    pub fn link_telegram(&mut self, telegram_user_id: i64, profile: TelegramProfile) {
        self.telegram_user_id = Some(telegram_user_id);
        self.telegram_username = profile.username;
        self.telegram_first_name = profile.first_name;
        self.telegram_last_name = profile.last_name;
        self.telegram_linked_at = Some(Utc::now());
        self.updated_at = Utc::now();
    }

    /// Detach the Telegram identity
    ///
    /// Returns `true` when an identity was actually linked; calling this on
    /// an unlinked account is a no-op returning `false`.
    pub fn unlink_telegram(&mut self) -> bool {
        let was_linked = self.telegram_user_id.is_some();
        self.telegram_user_id = None;
        self.telegram_username = None;
        self.telegram_first_name = None;
        self.telegram_last_name = None;
        self.telegram_linked_at = None;
        if was_linked {
            self.updated_at = Utc::now();
        }
        was_linked
    }

    /// Whether the Telegram identity is linked
    pub fn is_telegram_linked(&self) -> bool {
        self.telegram_user_id.is_some()
    }

    /// Record a successful login over the given channel
    pub fn touch_login(&mut self, method: LoginMethod) {
        self.last_login_method = Some(method);
        self.updated_at = Utc::now();
    }

    /// Whether at least one usable authentication method remains
    pub fn has_auth_method(&self) -> bool {
        self.password_hash.is_some()
            || (self.phone.is_some() && self.phone_verified_at.is_some())
            || self.telegram_user_id.is_some()
    }
}
