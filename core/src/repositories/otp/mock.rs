//! Mock implementation of OtpRepository for testing

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::entities::otp_code::{OtpCode, OtpPurpose};
use crate::errors::DomainError;

use super::trait_::OtpRepository;

/// In-memory OTP repository for testing
pub struct MockOtpRepository {
    codes: Arc<RwLock<Vec<OtpCode>>>,
}

impl MockOtpRepository {
    pub fn new() -> Self {
        Self {
            codes: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// All stored codes, for assertions
    pub async fn all(&self) -> Vec<OtpCode> {
        self.codes.read().await.clone()
    }
}

impl Default for MockOtpRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OtpRepository for MockOtpRepository {
    async fn create(&self, code: OtpCode) -> Result<OtpCode, DomainError> {
        let mut codes = self.codes.write().await;
        // Issuing a new code retires prior active codes for the pair
        let now = Utc::now();
        for existing in codes.iter_mut() {
            if existing.phone == code.phone
                && existing.purpose == code.purpose
                && existing.used_at.is_none()
            {
                existing.expires_at = now;
            }
        }
        codes.push(code.clone());
        Ok(code)
    }

    async fn find_latest(
        &self,
        phone: &str,
        purpose: OtpPurpose,
    ) -> Result<Option<OtpCode>, DomainError> {
        let codes = self.codes.read().await;
        Ok(codes
            .iter()
            .filter(|c| c.phone == phone && c.purpose == purpose)
            .max_by_key(|c| c.created_at)
            .cloned())
    }

    async fn register_attempt(
        &self,
        id: Uuid,
        max_attempts: i32,
    ) -> Result<Option<i32>, DomainError> {
        let mut codes = self.codes.write().await;
        let code = codes
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| DomainError::NotFound {
                resource: "OtpCode".to_string(),
            })?;
        if code.attempts >= max_attempts {
            return Ok(None);
        }
        code.attempts += 1;
        Ok(Some(code.attempts))
    }

    async fn consume(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool, DomainError> {
        let mut codes = self.codes.write().await;
        let code = codes
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| DomainError::NotFound {
                resource: "OtpCode".to_string(),
            })?;
        if code.used_at.is_some() {
            return Ok(false);
        }
        code.used_at = Some(at);
        Ok(true)
    }

    async fn delete_expired(&self, older_than: DateTime<Utc>) -> Result<u64, DomainError> {
        let mut codes = self.codes.write().await;
        let before = codes.len();
        codes.retain(|c| c.created_at >= older_than);
        Ok((before - codes.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn make_code(phone: &str) -> OtpCode {
        OtpCode::new(phone, OtpPurpose::Login, None, "hash".to_string(), 5, None)
    }

    #[tokio::test]
    async fn test_create_retires_previous_codes() {
        let repo = MockOtpRepository::new();
        let first = repo.create(make_code("+8613812345678")).await.unwrap();
        let second = repo.create(make_code("+8613812345678")).await.unwrap();

        let latest = repo
            .find_latest("+8613812345678", OtpPurpose::Login)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(latest.id, second.id);

        // The earlier code is now expired
        let stored = repo.all().await;
        let old = stored.iter().find(|c| c.id == first.id).unwrap();
        assert!(old.is_expired(Utc::now() + Duration::seconds(1)));
    }

    #[tokio::test]
    async fn test_register_attempt_guard() {
        let repo = MockOtpRepository::new();
        let code = repo.create(make_code("+8613812345678")).await.unwrap();

        assert_eq!(repo.register_attempt(code.id, 2).await.unwrap(), Some(1));
        assert_eq!(repo.register_attempt(code.id, 2).await.unwrap(), Some(2));
        // Guard holds: counter never passes the limit
        assert_eq!(repo.register_attempt(code.id, 2).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_consume_is_single_use() {
        let repo = MockOtpRepository::new();
        let code = repo.create(make_code("+8613812345678")).await.unwrap();

        assert!(repo.consume(code.id, Utc::now()).await.unwrap());
        assert!(!repo.consume(code.id, Utc::now()).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_expired() {
        let repo = MockOtpRepository::new();
        repo.create(make_code("+8613812345678")).await.unwrap();
        let deleted = repo
            .delete_expired(Utc::now() + Duration::hours(1))
            .await
            .unwrap();
        assert_eq!(deleted, 1);
        assert!(repo.all().await.is_empty());
    }
}
