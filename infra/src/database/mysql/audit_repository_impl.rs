//! MySQL implementation of the AuditRepository trait.
//!
//! Events are append-only; nothing here mutates or reads them back on
//! the authentication path.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::MySqlPool;

use ph_core::domain::entities::audit::AuditEvent;
use ph_core::errors::DomainError;
use ph_core::repositories::AuditRepository;

/// MySQL implementation of AuditRepository
pub struct MySqlAuditRepository {
    pool: MySqlPool,
}

impl MySqlAuditRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditRepository for MySqlAuditRepository {
    async fn append(&self, event: &AuditEvent) -> Result<(), DomainError> {
        let metadata = event
            .metadata
            .as_ref()
            .map(|m| m.to_string());

        sqlx::query(
            r#"
            INSERT INTO auth_audit_events (
                id, event_type, user_id, phone_hash, ip_hash,
                telegram_user_id, success, error_code, metadata, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(event.id.to_string())
        .bind(event.event_type.as_str())
        .bind(event.user_id)
        .bind(&event.phone_hash)
        .bind(&event.ip_hash)
        .bind(event.telegram_user_id)
        .bind(event.success)
        .bind(&event.error_code)
        .bind(metadata)
        .bind(event.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::Internal {
            message: format!("Failed to append audit event: {}", e),
        })?;

        Ok(())
    }

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, DomainError> {
        let result = sqlx::query("DELETE FROM auth_audit_events WHERE created_at < ?")
            .bind(cutoff)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::Internal {
                message: format!("Failed to purge audit events: {}", e),
            })?;
        Ok(result.rows_affected())
    }
}
