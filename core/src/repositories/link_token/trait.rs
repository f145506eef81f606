//! Link token repository trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::entities::link_token::LinkToken;
use crate::errors::DomainError;

/// Repository trait for LinkToken persistence operations
#[async_trait]
pub trait LinkTokenRepository: Send + Sync {
    /// Persist a newly issued token
    async fn create(&self, token: LinkToken) -> Result<LinkToken, DomainError>;

    /// Look up a token by the hash of its opaque value
    async fn find_by_hash(&self, token_hash: &str) -> Result<Option<LinkToken>, DomainError>;

    /// Consume the token, enforcing single use
    ///
    /// Must be a conditional update (`SET used_at = ? WHERE id = ? AND
    /// used_at IS NULL`); exactly one of any set of concurrent callers
    /// observes `true`.
    async fn consume(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool, DomainError>;

    /// Storage hygiene: delete tokens created before the cutoff
    async fn delete_expired(&self, older_than: DateTime<Utc>) -> Result<u64, DomainError>;
}
