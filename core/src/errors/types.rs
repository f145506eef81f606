//! Domain-specific error types for authentication and related operations
//!
//! This module defines typed errors for the authentication flows. Only the
//! presentation layer translates these into HTTP status codes and response
//! bodies, so the taxonomy stays stable if the transport changes.

use thiserror::Error;

/// Authentication-related errors
///
/// `InvalidCredentials` deliberately covers both "no such account" and
/// "wrong password" so responses cannot be used to enumerate accounts.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account locked, retry in {minutes} minutes")]
    AccountLocked { minutes: i64 },

    #[error("Account disabled")]
    AccountDisabled,

    #[error("Invalid phone format: {phone}")]
    InvalidPhoneFormat { phone: String },

    #[error("Invalid verification code, {remaining_attempts} attempt(s) remaining")]
    OtpInvalid { remaining_attempts: i32 },

    #[error("Verification code expired")]
    OtpExpired,

    #[error("Verification code already used")]
    OtpReplay,

    #[error("Maximum verification attempts exceeded")]
    OtpMaxAttempts,

    #[error("Too many requests, retry in {retry_after_seconds} seconds")]
    RateLimited { retry_after_seconds: i64 },

    #[error("No phone number on the account")]
    PhoneNotSet,

    #[error("Account already linked to Telegram")]
    AlreadyLinked,

    #[error("Telegram account already linked to another user")]
    TelegramAlreadyLinked,

    #[error("Telegram account not linked")]
    TelegramNotLinked,

    #[error("Registration disabled")]
    RegistrationDisabled,

    #[error("User not found")]
    UserNotFound,
}

impl AuthError {
    /// Machine-readable error code exposed by the API layer
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::AccountLocked { .. } => "ACCOUNT_LOCKED",
            Self::AccountDisabled => "ACCOUNT_DISABLED",
            Self::InvalidPhoneFormat { .. } => "INVALID_PHONE_FORMAT",
            Self::OtpInvalid { .. } => "OTP_INVALID",
            Self::OtpExpired => "OTP_EXPIRED",
            Self::OtpReplay => "OTP_REPLAY",
            Self::OtpMaxAttempts => "OTP_MAX_ATTEMPTS",
            Self::RateLimited { .. } => "RATE_LIMITED",
            Self::PhoneNotSet => "PHONE_NOT_SET",
            Self::AlreadyLinked => "ALREADY_LINKED",
            Self::TelegramAlreadyLinked => "TELEGRAM_ALREADY_LINKED",
            Self::TelegramNotLinked => "TELEGRAM_NOT_LINKED",
            Self::RegistrationDisabled => "REGISTRATION_DISABLED",
            Self::UserNotFound => "USER_NOT_FOUND",
        }
    }
}

/// Session and link token errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TokenError {
    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token")]
    TokenInvalid,

    #[error("Token already used")]
    TokenReplay,
}

impl TokenError {
    /// Machine-readable error code exposed by the API layer
    pub fn code(&self) -> &'static str {
        match self {
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::TokenInvalid => "TOKEN_INVALID",
            Self::TokenReplay => "TOKEN_REPLAY",
        }
    }
}

/// Input validation errors
///
/// These are rejected before any rate-limit or audit cost is paid.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field: {field}")]
    RequiredField { field: String },

    #[error("Invalid format: {field}")]
    InvalidFormat { field: String },
}
