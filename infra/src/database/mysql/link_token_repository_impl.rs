//! MySQL implementation of the LinkTokenRepository trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row};
use uuid::Uuid;

use ph_core::domain::entities::link_token::{LinkToken, LinkTokenPurpose};
use ph_core::errors::DomainError;
use ph_core::repositories::LinkTokenRepository;

/// MySQL implementation of LinkTokenRepository
pub struct MySqlLinkTokenRepository {
    pool: MySqlPool,
}

impl MySqlLinkTokenRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    fn row_to_token(row: &sqlx::mysql::MySqlRow) -> Result<LinkToken, DomainError> {
        let id: String = row.try_get("id").map_err(|e| db_error("id", e))?;
        let purpose_str: String = row
            .try_get("purpose")
            .map_err(|e| db_error("purpose", e))?;
        let purpose =
            LinkTokenPurpose::parse(&purpose_str).ok_or_else(|| DomainError::Internal {
                message: format!("Unknown link token purpose in database: {}", purpose_str),
            })?;

        Ok(LinkToken {
            id: Uuid::parse_str(&id).map_err(|e| DomainError::Internal {
                message: format!("Invalid UUID: {}", e),
            })?,
            token_hash: row
                .try_get("token_hash")
                .map_err(|e| db_error("token_hash", e))?,
            nonce: row.try_get("nonce").map_err(|e| db_error("nonce", e))?,
            purpose,
            user_id: row.try_get("user_id").map_err(|e| db_error("user_id", e))?,
            telegram_user_id: row
                .try_get("telegram_user_id")
                .map_err(|e| db_error("telegram_user_id", e))?,
            created_at: row
                .try_get::<DateTime<Utc>, _>("created_at")
                .map_err(|e| db_error("created_at", e))?,
            expires_at: row
                .try_get::<DateTime<Utc>, _>("expires_at")
                .map_err(|e| db_error("expires_at", e))?,
            used_at: row.try_get("used_at").map_err(|e| db_error("used_at", e))?,
            ip_hash: row.try_get("ip_hash").map_err(|e| db_error("ip_hash", e))?,
        })
    }
}

#[async_trait]
impl LinkTokenRepository for MySqlLinkTokenRepository {
    async fn create(&self, token: LinkToken) -> Result<LinkToken, DomainError> {
        sqlx::query(
            r#"
            INSERT INTO link_tokens (
                id, token_hash, nonce, purpose, user_id, telegram_user_id,
                created_at, expires_at, used_at, ip_hash
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(token.id.to_string())
        .bind(&token.token_hash)
        .bind(&token.nonce)
        .bind(token.purpose.as_str())
        .bind(token.user_id)
        .bind(token.telegram_user_id)
        .bind(token.created_at)
        .bind(token.expires_at)
        .bind(token.used_at)
        .bind(&token.ip_hash)
        .execute(&self.pool)
        .await
        .map_err(query_error)?;

        Ok(token)
    }

    async fn find_by_hash(&self, token_hash: &str) -> Result<Option<LinkToken>, DomainError> {
        let result = sqlx::query(
            r#"
            SELECT id, token_hash, nonce, purpose, user_id, telegram_user_id,
                   created_at, expires_at, used_at, ip_hash
            FROM link_tokens
            WHERE token_hash = ?
            LIMIT 1
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(query_error)?;

        match result {
            Some(row) => Ok(Some(Self::row_to_token(&row)?)),
            None => Ok(None),
        }
    }

    async fn consume(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool, DomainError> {
        // Conditional update enforces single use under concurrency
        let result = sqlx::query(
            "UPDATE link_tokens SET used_at = ? WHERE id = ? AND used_at IS NULL",
        )
        .bind(at)
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(query_error)?;

        Ok(result.rows_affected() == 1)
    }

    async fn delete_expired(&self, older_than: DateTime<Utc>) -> Result<u64, DomainError> {
        let result = sqlx::query("DELETE FROM link_tokens WHERE created_at < ?")
            .bind(older_than)
            .execute(&self.pool)
            .await
            .map_err(query_error)?;
        Ok(result.rows_affected())
    }
}

fn db_error(column: &str, error: sqlx::Error) -> DomainError {
    DomainError::Internal {
        message: format!("Failed to read column {}: {}", column, error),
    }
}

fn query_error(error: sqlx::Error) -> DomainError {
    DomainError::Internal {
        message: format!("Database query failed: {}", error),
    }
}
