//! OTP repository trait defining the interface for code persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::entities::otp_code::{OtpCode, OtpPurpose};
use crate::errors::DomainError;

/// Repository trait for OtpCode persistence operations
///
/// Verification only ever considers the most recently issued code for a
/// `(phone, purpose)` pair, so issuing a new code invalidates all prior
/// active codes for that pair. Attempt counting and consumption must be
/// atomic at the storage layer; see the individual methods.
#[async_trait]
pub trait OtpRepository: Send + Sync {
    /// Persist a new code, invalidating prior active codes for the same
    /// `(phone, purpose)` pair
    async fn create(&self, code: OtpCode) -> Result<OtpCode, DomainError>;

    /// The most recently issued code for the pair, consumed or not
    async fn find_latest(
        &self,
        phone: &str,
        purpose: OtpPurpose,
    ) -> Result<Option<OtpCode>, DomainError>;

    /// Register a failed verification attempt
    ///
    /// Must be an atomic increment guarded by `attempts < max_attempts`
    /// (e.g. `UPDATE ... SET attempts = attempts + 1 WHERE id = ? AND
    /// attempts < ?`) so two concurrent attempts cannot both pass the
    /// limit check and push the counter beyond it.
    ///
    /// # Returns
    /// * `Ok(Some(attempts))` - the new attempt count
    /// * `Ok(None)` - the guard failed; the budget was already spent
    async fn register_attempt(
        &self,
        id: Uuid,
        max_attempts: i32,
    ) -> Result<Option<i32>, DomainError>;

    /// Consume the code, enforcing single use
    ///
    /// Must be a conditional update (`SET used_at = ? WHERE id = ? AND
    /// used_at IS NULL`); exactly one of any set of concurrent callers
    /// observes `true`.
    async fn consume(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool, DomainError>;

    /// Storage hygiene: delete codes created before the cutoff
    ///
    /// Expiry itself is checked lazily at verification time; this only
    /// bounds table growth.
    async fn delete_expired(&self, older_than: DateTime<Utc>) -> Result<u64, DomainError>;
}
