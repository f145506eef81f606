//! Link token entity binding a web account to a Telegram identity.
//!
//! A link token is a single-use credential flowing in one of two
//! directions: web-to-bot (a logged-in web user proves ownership inside
//! the bot chat) or bot-to-web (a known Telegram user obtains a web
//! session). Storage keeps a one-way hash of the token plus a nonce that
//! is re-validated on redemption.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Direction of the cross-channel binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkTokenPurpose {
    /// Issued to a web user; redeemed from the bot with a Telegram id
    WebToBot,
    /// Issued to a linked Telegram user; redeemed on the web for a session
    BotToWeb,
}

impl LinkTokenPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WebToBot => "web_to_bot",
            Self::BotToWeb => "bot_to_web",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "web_to_bot" => Some(Self::WebToBot),
            "bot_to_web" => Some(Self::BotToWeb),
            _ => None,
        }
    }
}

/// Single-use cross-channel binding token
///
/// The purpose determines which identity was authoritative at issuance:
/// `WebToBot` stores `user_id` and receives the Telegram id at
/// redemption; `BotToWeb` stores both (the user was resolved from the
/// Telegram id when the token was issued).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkToken {
    pub id: Uuid,

    /// SHA-256 hash of the opaque token; plaintext is never persisted
    pub token_hash: String,

    /// Random nonce re-validated at redemption alongside the hash match
    pub nonce: String,

    pub purpose: LinkTokenPurpose,

    /// Web account being linked (set for web-initiated tokens)
    pub user_id: Option<i64>,

    /// Telegram identity (set for bot-initiated tokens)
    pub telegram_user_id: Option<i64>,

    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,

    /// Set exactly once, on successful redemption
    pub used_at: Option<DateTime<Utc>>,

    /// One-way hash of the requesting IP, when available
    pub ip_hash: Option<String>,
}

impl LinkToken {
    pub fn new(
        purpose: LinkTokenPurpose,
        user_id: Option<i64>,
        telegram_user_id: Option<i64>,
        token_hash: String,
        nonce: String,
        ttl_minutes: i64,
        ip_hash: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            token_hash,
            nonce,
            purpose,
            user_id,
            telegram_user_id,
            created_at: now,
            expires_at: now + Duration::minutes(ttl_minutes),
            used_at: None,
            ip_hash,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn is_used(&self) -> bool {
        self.used_at.is_some()
    }

    /// Seconds until expiry, zero once expired
    pub fn expires_in_seconds(&self, now: DateTime<Utc>) -> i64 {
        (self.expires_at - now).num_seconds().max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_token() -> LinkToken {
        LinkToken::new(
            LinkTokenPurpose::WebToBot,
            Some(42),
            None,
            "tokenhash".to_string(),
            "nonce123".to_string(),
            3,
            None,
        )
    }

    #[test]
    fn test_new_token_state() {
        let token = test_token();
        assert!(!token.is_used());
        assert!(!token.is_expired(Utc::now()));
        assert_eq!(token.user_id, Some(42));
        assert_eq!(token.telegram_user_id, None);
    }

    #[test]
    fn test_expiry_boundary() {
        let token = test_token();
        assert!(token.is_expired(token.expires_at + Duration::seconds(1)));
        assert!(token.is_expired(token.expires_at));
        assert!(!token.is_expired(token.expires_at - Duration::seconds(1)));
    }

    #[test]
    fn test_used_token() {
        let mut token = test_token();
        token.used_at = Some(Utc::now());
        assert!(token.is_used());
    }

    #[test]
    fn test_purpose_round_trip() {
        assert_eq!(
            LinkTokenPurpose::parse("web_to_bot"),
            Some(LinkTokenPurpose::WebToBot)
        );
        assert_eq!(
            LinkTokenPurpose::parse("bot_to_web"),
            Some(LinkTokenPurpose::BotToWeb)
        );
        assert_eq!(LinkTokenPurpose::parse("sideways"), None);
    }
}
