//! MySQL implementation of the UserRepository trait.
//!
//! The failed-login counter and lock decision run inside a single UPDATE
//! so concurrent login attempts for the same account cannot lose updates.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::{MySqlPool, Row};

use ph_core::domain::entities::user::{LoginMethod, NewUser, User, UserRole};
use ph_core::errors::DomainError;
use ph_core::repositories::UserRepository;

/// MySQL implementation of UserRepository
pub struct MySqlUserRepository {
    pool: MySqlPool,
}

const USER_COLUMNS: &str = r#"
    id, email, phone, password_hash, role,
    phone_verified_at, telegram_user_id, telegram_username,
    telegram_first_name, telegram_last_name, telegram_linked_at,
    last_login_method, failed_login_attempts, locked_until,
    is_disabled, created_at, updated_at
"#;

impl MySqlUserRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Convert a database row to a User entity
    fn row_to_user(row: &sqlx::mysql::MySqlRow) -> Result<User, DomainError> {
        let role_str: String = row
            .try_get("role")
            .map_err(|e| db_error("role", e))?;
        let role = UserRole::parse(&role_str).ok_or_else(|| DomainError::Internal {
            message: format!("Unknown role in database: {}", role_str),
        })?;

        let login_method_str: Option<String> = row
            .try_get("last_login_method")
            .map_err(|e| db_error("last_login_method", e))?;
        let last_login_method = login_method_str.as_deref().and_then(LoginMethod::parse);

        Ok(User {
            id: row.try_get("id").map_err(|e| db_error("id", e))?,
            email: row.try_get("email").map_err(|e| db_error("email", e))?,
            phone: row.try_get("phone").map_err(|e| db_error("phone", e))?,
            password_hash: row
                .try_get("password_hash")
                .map_err(|e| db_error("password_hash", e))?,
            role,
            phone_verified_at: row
                .try_get("phone_verified_at")
                .map_err(|e| db_error("phone_verified_at", e))?,
            telegram_user_id: row
                .try_get("telegram_user_id")
                .map_err(|e| db_error("telegram_user_id", e))?,
            telegram_username: row
                .try_get("telegram_username")
                .map_err(|e| db_error("telegram_username", e))?,
            telegram_first_name: row
                .try_get("telegram_first_name")
                .map_err(|e| db_error("telegram_first_name", e))?,
            telegram_last_name: row
                .try_get("telegram_last_name")
                .map_err(|e| db_error("telegram_last_name", e))?,
            telegram_linked_at: row
                .try_get("telegram_linked_at")
                .map_err(|e| db_error("telegram_linked_at", e))?,
            last_login_method,
            failed_login_attempts: row
                .try_get("failed_login_attempts")
                .map_err(|e| db_error("failed_login_attempts", e))?,
            locked_until: row
                .try_get("locked_until")
                .map_err(|e| db_error("locked_until", e))?,
            is_disabled: row
                .try_get("is_disabled")
                .map_err(|e| db_error("is_disabled", e))?,
            created_at: row
                .try_get::<DateTime<Utc>, _>("created_at")
                .map_err(|e| db_error("created_at", e))?,
            updated_at: row
                .try_get::<DateTime<Utc>, _>("updated_at")
                .map_err(|e| db_error("updated_at", e))?,
        })
    }

    fn map_optional(
        result: Option<sqlx::mysql::MySqlRow>,
    ) -> Result<Option<User>, DomainError> {
        match result {
            Some(row) => Ok(Some(Self::row_to_user(&row)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl UserRepository for MySqlUserRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, DomainError> {
        let sql = format!("SELECT {} FROM users WHERE id = ? LIMIT 1", USER_COLUMNS);
        let result = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(query_error)?;
        Self::map_optional(result)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        let sql = format!("SELECT {} FROM users WHERE email = ? LIMIT 1", USER_COLUMNS);
        let result = sqlx::query(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(query_error)?;
        Self::map_optional(result)
    }

    async fn find_by_phone(&self, phone: &str) -> Result<Option<User>, DomainError> {
        let sql = format!("SELECT {} FROM users WHERE phone = ? LIMIT 1", USER_COLUMNS);
        let result = sqlx::query(&sql)
            .bind(phone)
            .fetch_optional(&self.pool)
            .await
            .map_err(query_error)?;
        Self::map_optional(result)
    }

    async fn find_by_telegram_id(
        &self,
        telegram_user_id: i64,
    ) -> Result<Option<User>, DomainError> {
        let sql = format!(
            "SELECT {} FROM users WHERE telegram_user_id = ? LIMIT 1",
            USER_COLUMNS
        );
        let result = sqlx::query(&sql)
            .bind(telegram_user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(query_error)?;
        Self::map_optional(result)
    }

    async fn create(&self, user: NewUser) -> Result<User, DomainError> {
        let now = Utc::now();
        let phone_verified_at = user.phone_verified.then_some(now);

        let result = sqlx::query(
            r#"
            INSERT INTO users (
                email, phone, password_hash, role,
                phone_verified_at, failed_login_attempts, is_disabled,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, 0, FALSE, ?, ?)
            "#,
        )
        .bind(&user.email)
        .bind(&user.phone)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(phone_verified_at)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                DomainError::Validation {
                    message: "Email or phone already registered".to_string(),
                }
            }
            other => DomainError::Internal {
                message: format!("Failed to create user: {}", other),
            },
        })?;

        let id = result.last_insert_id() as i64;
        self.find_by_id(id).await?.ok_or_else(|| DomainError::Internal {
            message: "Created user not found".to_string(),
        })
    }

    async fn update(&self, user: &User) -> Result<User, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE users SET
                email = ?, phone = ?, password_hash = ?, role = ?,
                phone_verified_at = ?, telegram_user_id = ?,
                telegram_username = ?, telegram_first_name = ?,
                telegram_last_name = ?, telegram_linked_at = ?,
                last_login_method = ?, failed_login_attempts = ?,
                locked_until = ?, is_disabled = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&user.email)
        .bind(&user.phone)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.phone_verified_at)
        .bind(user.telegram_user_id)
        .bind(&user.telegram_username)
        .bind(&user.telegram_first_name)
        .bind(&user.telegram_last_name)
        .bind(user.telegram_linked_at)
        .bind(user.last_login_method.map(|m| m.as_str()))
        .bind(user.failed_login_attempts)
        .bind(user.locked_until)
        .bind(user.is_disabled)
        .bind(Utc::now())
        .bind(user.id)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::Internal {
            message: format!("Failed to update user: {}", e),
        })?;

        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound {
                resource: "User".to_string(),
            });
        }

        self.find_by_id(user.id).await?.ok_or_else(|| DomainError::NotFound {
            resource: "User".to_string(),
        })
    }

    async fn register_login_failure(
        &self,
        id: i64,
        max_attempts: i32,
        lock_duration: Duration,
    ) -> Result<User, DomainError> {
        let now = Utc::now();
        let lock_until = now + lock_duration;

        // Increment and lock decision in one statement: concurrent
        // failures cannot both read the pre-increment counter
        sqlx::query(
            r#"
            UPDATE users SET
                locked_until = IF(failed_login_attempts + 1 >= ?, ?, locked_until),
                failed_login_attempts = IF(failed_login_attempts + 1 >= ?, 0,
                                           failed_login_attempts + 1),
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(max_attempts)
        .bind(lock_until)
        .bind(max_attempts)
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::Internal {
            message: format!("Failed to record login failure: {}", e),
        })?;

        self.find_by_id(id).await?.ok_or_else(|| DomainError::NotFound {
            resource: "User".to_string(),
        })
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
