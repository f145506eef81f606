//! Mock implementation of AuditRepository for testing

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::entities::audit::{AuditEvent, AuditEventType};
use crate::errors::DomainError;

use super::trait_::AuditRepository;

/// In-memory audit repository for testing
pub struct MockAuditRepository {
    events: Arc<RwLock<Vec<AuditEvent>>>,
}

impl MockAuditRepository {
    pub fn new() -> Self {
        Self {
            events: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// All recorded events, for assertions
    pub async fn recorded(&self) -> Vec<AuditEvent> {
        self.events.read().await.clone()
    }

    /// Events of a given type, for assertions
    pub async fn recorded_of_type(&self, event_type: AuditEventType) -> Vec<AuditEvent> {
        self.events
            .read()
            .await
            .iter()
            .filter(|e| e.event_type == event_type)
            .cloned()
            .collect()
    }
}

impl Default for MockAuditRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuditRepository for MockAuditRepository {
    async fn append(&self, event: &AuditEvent) -> Result<(), DomainError> {
        self.events.write().await.push(event.clone());
        Ok(())
    }

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, DomainError> {
        let mut events = self.events.write().await;
        let before = events.len();
        events.retain(|e| e.created_at >= cutoff);
        Ok((before - events.len()) as u64)
    }
}
