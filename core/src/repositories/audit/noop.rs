//! No-op implementation of AuditRepository
//!
//! Used when audit persistence is disabled; every write succeeds and
//! records nothing.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::entities::audit::AuditEvent;
use crate::errors::DomainError;

use super::trait_::AuditRepository;

/// Audit repository that discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpAuditRepository;

impl NoOpAuditRepository {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AuditRepository for NoOpAuditRepository {
    async fn append(&self, _event: &AuditEvent) -> Result<(), DomainError> {
        Ok(())
    }

    async fn delete_older_than(&self, _cutoff: DateTime<Utc>) -> Result<u64, DomainError> {
        Ok(0)
    }
}
