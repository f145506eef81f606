//! Session token service

use chrono::{Duration, Utc};
use uuid::Uuid;

use ph_shared::config::JwtConfig;

use crate::domain::entities::user::UserRole;
use crate::errors::{DomainError, DomainResult, TokenError};

use super::codec::{TokenCodec, WireClaims};

/// Parsed subject of a validated token
///
/// Canonical tokens carry the numeric user id. Legacy tokens issued by
/// the previous stack carry a username; they are accepted during the
/// migration window and resolved to an id with a single user lookup at
/// the call site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenSubject {
    UserId(i64),
    Username(String),
}

/// Result of validating a session token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedToken {
    pub subject: TokenSubject,
    pub role: UserRole,
    /// Expiry as a unix timestamp
    pub expires_at: i64,
}

/// Service issuing and validating stateless session tokens
///
/// There is no server-side revocation in this design: logout is
/// client-side token discard, and tokens simply expire.
pub struct TokenService {
    codec: Box<dyn TokenCodec>,
    config: JwtConfig,
}

impl TokenService {
    pub fn new(codec: Box<dyn TokenCodec>, config: JwtConfig) -> Self {
        Self { codec, config }
    }

    /// Issue a session token for a user
    ///
    /// Claims are fixed at issuance and never renewed in place.
    pub fn issue(&self, user_id: i64, role: UserRole) -> DomainResult<String> {
        let now = Utc::now();
        let expiry = now + Duration::seconds(self.config.access_token_expiry);

        let claims = WireClaims {
            sub: user_id.to_string(),
            role: role.as_str().to_string(),
            iat: now.timestamp(),
            exp: expiry.timestamp(),
            iss: self.config.issuer.clone(),
            jti: Uuid::new_v4().to_string(),
        };
        self.codec.encode(&claims)
    }

    /// Validate a session token and normalize its claims
    pub fn validate(&self, token: &str) -> DomainResult<ValidatedToken> {
        let claims = self.codec.decode(token)?;

        let subject = match claims.sub.parse::<i64>() {
            Ok(user_id) => TokenSubject::UserId(user_id),
            // Legacy format: sub carries a username
            Err(_) => TokenSubject::Username(claims.sub),
        };

        let role = UserRole::parse(&claims.role)
            .ok_or(DomainError::Token(TokenError::TokenInvalid))?;

        Ok(ValidatedToken {
            subject,
            role,
            expires_at: claims.exp,
        })
    }

    /// Seconds a freshly issued token stays valid
    pub fn expires_in(&self) -> i64 {
        self.config.access_token_expiry
    }
}
