//! Audit service for recording authentication events.
//!
//! Writes are best-effort: with `async_writes` enabled the repository
//! append runs on a spawned task, so a sink failure can never fail the
//! authentication response it belongs to.

use std::sync::Arc;

use sha2::{Digest, Sha256};

use crate::domain::entities::audit::AuditEvent;
use crate::repositories::AuditRepository;

/// One-way hash for PII identifiers (phones, IPs) before storage
pub fn hash_identifier(value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Configuration for the audit service
#[derive(Debug, Clone)]
pub struct AuditServiceConfig {
    /// Run repository appends on a spawned task (disable in tests for
    /// deterministic assertions)
    pub async_writes: bool,
}

impl Default for AuditServiceConfig {
    fn default() -> Self {
        Self { async_writes: true }
    }
}

/// Service recording auth events without blocking the caller
pub struct AuditService<A>
where
    A: AuditRepository,
{
    repository: Arc<A>,
    config: AuditServiceConfig,
}

impl<A> AuditService<A>
where
    A: AuditRepository + 'static,
{
    pub fn new(repository: Arc<A>, config: AuditServiceConfig) -> Self {
        Self { repository, config }
    }

    /// Record an event
    ///
    /// PII must already be hashed by the caller (see [`hash_identifier`]);
    /// this method never inspects or transforms the event.
    pub async fn record(&self, event: AuditEvent) {
        if self.config.async_writes {
            let repository = Arc::clone(&self.repository);
            tokio::spawn(async move {
                if let Err(error) = repository.append(&event).await {
                    tracing::warn!(
                        event = "audit_write_failed",
                        event_type = event.event_type.as_str(),
                        error = %error,
                        "Failed to persist audit event"
                    );
                }
            });
        } else if let Err(error) = self.repository.append(&event).await {
            tracing::warn!(
                event = "audit_write_failed",
                event_type = event.event_type.as_str(),
                error = %error,
                "Failed to persist audit event"
            );
        }
    }
}
