//! Audit repository trait defining the interface for event persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::entities::audit::AuditEvent;
use crate::errors::DomainError;

/// Repository trait for append-only audit event persistence
///
/// The authentication path only ever writes; querying audit data belongs
/// to a separate reporting surface. Records are immutable within the
/// retention window.
#[async_trait]
pub trait AuditRepository: Send + Sync {
    /// Append an event
    async fn append(&self, event: &AuditEvent) -> Result<(), DomainError>;

    /// Retention: delete events created before the cutoff (e.g. 90 days)
    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, DomainError>;
}
