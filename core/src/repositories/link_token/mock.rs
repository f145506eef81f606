//! Mock implementation of LinkTokenRepository for testing

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::entities::link_token::LinkToken;
use crate::errors::DomainError;

use super::trait_::LinkTokenRepository;

/// In-memory link token repository for testing
pub struct MockLinkTokenRepository {
    tokens: Arc<RwLock<Vec<LinkToken>>>,
}

impl MockLinkTokenRepository {
    pub fn new() -> Self {
        Self {
            tokens: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// All stored tokens, for assertions
    pub async fn all(&self) -> Vec<LinkToken> {
        self.tokens.read().await.clone()
    }
}

impl Default for MockLinkTokenRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LinkTokenRepository for MockLinkTokenRepository {
    async fn create(&self, token: LinkToken) -> Result<LinkToken, DomainError> {
        self.tokens.write().await.push(token.clone());
        Ok(token)
    }

    async fn find_by_hash(&self, token_hash: &str) -> Result<Option<LinkToken>, DomainError> {
        let tokens = self.tokens.read().await;
        Ok(tokens.iter().find(|t| t.token_hash == token_hash).cloned())
    }

    async fn consume(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool, DomainError> {
        let mut tokens = self.tokens.write().await;
        let token = tokens
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| DomainError::NotFound {
                resource: "LinkToken".to_string(),
            })?;
        if token.used_at.is_some() {
            return Ok(false);
        }
        token.used_at = Some(at);
        Ok(true)
    }

    async fn delete_expired(&self, older_than: DateTime<Utc>) -> Result<u64, DomainError> {
        let mut tokens = self.tokens.write().await;
        let before = tokens.len();
        tokens.retain(|t| t.created_at >= older_than);
        Ok((before - tokens.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::link_token::LinkTokenPurpose;

    #[tokio::test]
    async fn test_find_by_hash_and_consume() {
        let repo = MockLinkTokenRepository::new();
        let token = LinkToken::new(
            LinkTokenPurpose::WebToBot,
            Some(42),
            None,
            "hash-a".to_string(),
            "nonce".to_string(),
            3,
            None,
        );
        repo.create(token.clone()).await.unwrap();

        let found = repo.find_by_hash("hash-a").await.unwrap().unwrap();
        assert_eq!(found.id, token.id);
        assert!(repo.find_by_hash("hash-b").await.unwrap().is_none());

        assert!(repo.consume(token.id, Utc::now()).await.unwrap());
        assert!(!repo.consume(token.id, Utc::now()).await.unwrap());
    }
}
