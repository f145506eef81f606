//! Link-token engine implementation

use std::sync::Arc;

use chrono::Utc;
use constant_time_eq::constant_time_eq;
use rand::Rng;
use sha2::{Digest, Sha256};

use ph_shared::config::LinkTokenConfig;

use crate::domain::entities::link_token::{LinkToken, LinkTokenPurpose};
use crate::errors::{DomainResult, TokenError};
use crate::repositories::LinkTokenRepository;

/// Length of the random nonce in bytes (hex-encoded for the wire)
///
/// The wire form must stay a valid Telegram deep-link payload
/// (`[A-Za-z0-9_-]`, at most 64 characters including any prefix), which
/// also fixes the separator below.
const NONCE_BYTES: usize = 8;

/// Separator between the opaque token and the nonce on the wire
const WIRE_SEPARATOR: char = '-';

/// A freshly minted link token
///
/// `token` is the wire form handed to the client: the opaque value and
/// the nonce joined by a dash. Only its hash and the nonce are stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedLinkToken {
    pub token: String,
    /// Seconds until the token expires
    pub expires_in: i64,
}

/// Service minting and redeeming single-use cross-channel tokens
///
/// Redemption requires both the token-hash match and the nonce match;
/// the nonce guards against hash-collision and log-leak scenarios where
/// an attacker recovered only the stored hash.
pub struct LinkTokenService<L: LinkTokenRepository> {
    link_repository: Arc<L>,
    config: LinkTokenConfig,
}

impl<L: LinkTokenRepository> LinkTokenService<L> {
    pub fn new(link_repository: Arc<L>, config: LinkTokenConfig) -> Self {
        Self {
            link_repository,
            config,
        }
    }

    /// Mint a token for the given direction
    ///
    /// `user_id` is set for web-initiated tokens; `telegram_user_id` for
    /// bot-initiated ones (where the user was already resolved).
    pub async fn issue(
        &self,
        purpose: LinkTokenPurpose,
        user_id: Option<i64>,
        telegram_user_id: Option<i64>,
        ip_hash: Option<String>,
    ) -> DomainResult<IssuedLinkToken> {
        let opaque = self.generate_opaque(self.config.token_length);
        let nonce = self.generate_nonce();
        let token_hash = hash_token(&opaque);

        let token = LinkToken::new(
            purpose,
            user_id,
            telegram_user_id,
            token_hash,
            nonce.clone(),
            self.config.ttl_minutes,
            ip_hash,
        );
        let token = self.link_repository.create(token).await?;

        tracing::info!(
            event = "link_token_issued",
            purpose = purpose.as_str(),
            token_id = %token.id,
            "Issued link token"
        );

        Ok(IssuedLinkToken {
            token: format!("{}{}{}", opaque, WIRE_SEPARATOR, nonce),
            expires_in: token.expires_in_seconds(Utc::now()),
        })
    }

    /// Redeem a token, consuming it
    ///
    /// Fails closed: unknown value or wrong direction is `TokenInvalid`,
    /// a consumed token is `TokenReplay`, a stale one `TokenExpired`.
    pub async fn redeem(
        &self,
        wire_token: &str,
        purpose: LinkTokenPurpose,
    ) -> DomainResult<LinkToken> {
        let (opaque, nonce) = wire_token
            .split_once(WIRE_SEPARATOR)
            .ok_or(TokenError::TokenInvalid)?;

        let token = self
            .link_repository
            .find_by_hash(&hash_token(opaque))
            .await?
            .ok_or(TokenError::TokenInvalid)?;

        if token.purpose != purpose {
            return Err(TokenError::TokenInvalid.into());
        }
        if token.is_used() {
            return Err(TokenError::TokenReplay.into());
        }
        let now = Utc::now();
        if token.is_expired(now) {
            return Err(TokenError::TokenExpired.into());
        }
        if !constant_time_eq(nonce.as_bytes(), token.nonce.as_bytes()) {
            return Err(TokenError::TokenInvalid.into());
        }

        // Single-use consumption: only one concurrent caller wins
        if !self.link_repository.consume(token.id, now).await? {
            return Err(TokenError::TokenReplay.into());
        }

        Ok(token)
    }

    /// Random alphanumeric token of the configured length
    fn generate_opaque(&self, length: usize) -> String {
        let mut rng = rand::thread_rng();
        (0..length)
            .map(|_| {
                let idx = rng.gen_range(0..62);
                match idx {
                    0..10 => (b'0' + idx) as char,
                    10..36 => (b'a' + idx - 10) as char,
                    36..62 => (b'A' + idx - 36) as char,
                    _ => unreachable!(),
                }
            })
            .collect()
    }

    /// Random hex nonce
    fn generate_nonce(&self) -> String {
        let mut bytes = [0u8; NONCE_BYTES];
        rand::thread_rng().fill(&mut bytes);
        hex::encode(bytes)
    }
}

/// One-way hash of the opaque token value for storage
fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}
