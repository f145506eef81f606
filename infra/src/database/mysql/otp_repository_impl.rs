//! MySQL implementation of the OtpRepository trait.
//!
//! Attempt counting and consumption are single guarded UPDATEs, so the
//! check-then-act races the trait contract warns about cannot occur.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row};
use uuid::Uuid;

use ph_core::domain::entities::otp_code::{OtpCode, OtpPurpose};
use ph_core::errors::DomainError;
use ph_core::repositories::OtpRepository;

/// MySQL implementation of OtpRepository
pub struct MySqlOtpRepository {
    pool: MySqlPool,
}

impl MySqlOtpRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    fn row_to_code(row: &sqlx::mysql::MySqlRow) -> Result<OtpCode, DomainError> {
        let id: String = row.try_get("id").map_err(|e| db_error("id", e))?;
        let purpose_str: String = row
            .try_get("purpose")
            .map_err(|e| db_error("purpose", e))?;
        let purpose = OtpPurpose::parse(&purpose_str).ok_or_else(|| DomainError::Internal {
            message: format!("Unknown OTP purpose in database: {}", purpose_str),
        })?;

        Ok(OtpCode {
            id: Uuid::parse_str(&id).map_err(|e| DomainError::Internal {
                message: format!("Invalid UUID: {}", e),
            })?,
            phone: row.try_get("phone").map_err(|e| db_error("phone", e))?,
            user_id: row.try_get("user_id").map_err(|e| db_error("user_id", e))?,
            code_hash: row
                .try_get("code_hash")
                .map_err(|e| db_error("code_hash", e))?,
            purpose,
            attempts: row
                .try_get("attempts")
                .map_err(|e| db_error("attempts", e))?,
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
impl OtpRepository for MySqlOtpRepository {
    async fn create(&self, code: OtpCode) -> Result<OtpCode, DomainError> {
        let mut tx = self.pool.begin().await.map_err(query_error)?;

        // Retire every prior active code for the pair; verification only
        // ever considers the newest one
        sqlx::query(
            r#"
            UPDATE otp_codes SET expires_at = ?
            WHERE phone = ? AND purpose = ? AND used_at IS NULL AND expires_at > ?
            "#,
        )
        .bind(code.created_at)
        .bind(&code.phone)
        .bind(code.purpose.as_str())
        .bind(code.created_at)
        .execute(&mut *tx)
        .await
        .map_err(query_error)?;

        sqlx::query(
            r#"
            INSERT INTO otp_codes (
                id, phone, user_id, code_hash, purpose, attempts,
                created_at, expires_at, used_at, ip_hash
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(code.id.to_string())
        .bind(&code.phone)
        .bind(code.user_id)
        .bind(&code.code_hash)
        .bind(code.purpose.as_str())
        .bind(code.attempts)
        .bind(code.created_at)
        .bind(code.expires_at)
        .bind(code.used_at)
        .bind(&code.ip_hash)
        .execute(&mut *tx)
        .await
        .map_err(query_error)?;

        tx.commit().await.map_err(query_error)?;
        Ok(code)
    }

    async fn find_latest(
        &self,
        phone: &str,
        purpose: OtpPurpose,
    ) -> Result<Option<OtpCode>, DomainError> {
        let result = sqlx::query(
            r#"
            SELECT id, phone, user_id, code_hash, purpose, attempts,
                   created_at, expires_at, used_at, ip_hash
            FROM otp_codes
            WHERE phone = ? AND purpose = ?
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(phone)
        .bind(purpose.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(query_error)?;

        match result {
            Some(row) => Ok(Some(Self::row_to_code(&row)?)),
            None => Ok(None),
        }
    }

    async fn register_attempt(
        &self,
        id: Uuid,
        max_attempts: i32,
    ) -> Result<Option<i32>, DomainError> {
        // Guarded increment: the WHERE clause keeps concurrent attempts
        // from pushing the counter past the limit
        let result = sqlx::query(
            "UPDATE otp_codes SET attempts = attempts + 1 WHERE id = ? AND attempts < ?",
        )
        .bind(id.to_string())
        .bind(max_attempts)
        .execute(&self.pool)
        .await
        .map_err(query_error)?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        let row = sqlx::query("SELECT attempts FROM otp_codes WHERE id = ?")
            .bind(id.to_string())
            .fetch_one(&self.pool)
            .await
            .map_err(query_error)?;
        let attempts: i32 = row.try_get("attempts").map_err(|e| db_error("attempts", e))?;
        Ok(Some(attempts))
    }

    async fn consume(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool, DomainError> {
        // Conditional update enforces single use under concurrency
        let result = sqlx::query(
            "UPDATE otp_codes SET used_at = ? WHERE id = ? AND used_at IS NULL",
        )
        .bind(at)
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(query_error)?;

        Ok(result.rows_affected() == 1)
    }

    async fn delete_expired(&self, older_than: DateTime<Utc>) -> Result<u64, DomainError> {
        let result = sqlx::query("DELETE FROM otp_codes WHERE created_at < ?")
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
