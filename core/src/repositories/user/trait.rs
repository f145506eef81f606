//! User repository trait defining the interface for account persistence.

use async_trait::async_trait;
use chrono::Duration;

use crate::domain::entities::user::{NewUser, User};
use crate::errors::DomainError;

/// Repository trait for User entity persistence operations
///
/// The credential store is the single source of truth for
/// `telegram_user_id`, `phone_verified_at` and the failed-login counter;
/// implementations must apply mutations transactionally so concurrent
/// logins for the same account cannot lose updates.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a user by their numeric identifier
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, DomainError>;

    /// Find a user by email address
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError>;

    /// Find a user by phone number (E.164)
    async fn find_by_phone(&self, phone: &str) -> Result<Option<User>, DomainError>;

    /// Find a user by linked Telegram account id
    async fn find_by_telegram_id(
        &self,
        telegram_user_id: i64,
    ) -> Result<Option<User>, DomainError>;

    /// Create a new user record
    ///
    /// # Returns
    /// The created user with its assigned id, or an error on duplicate
    /// email/phone.
    async fn create(&self, user: NewUser) -> Result<User, DomainError>;

    /// Persist updated user state
    async fn update(&self, user: &User) -> Result<User, DomainError>;

    /// Record a failed password attempt for the account
    ///
    /// The increment and the lock decision must happen in one transaction:
    /// two concurrent failures may not both observe the pre-increment
    /// counter. When the counter reaches `max_attempts` the account is
    /// locked for `lock_duration` and the counter resets.
    ///
    /// # Returns
    /// The user state after the increment.
    async fn register_login_failure(
        &self,
        id: i64,
        max_attempts: i32,
        lock_duration: Duration,
    ) -> Result<User, DomainError>;
}
