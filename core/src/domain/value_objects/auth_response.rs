//! Authentication response value object

use serde::{Deserialize, Serialize};

use crate::domain::entities::user::{User, UserRole};

/// Public view of a user returned alongside a session token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: i64,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: UserRole,
    pub phone_verified: bool,
    pub telegram_linked: bool,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            phone: user.phone.clone(),
            role: user.role,
            phone_verified: user.is_phone_verified(),
            telegram_linked: user.is_telegram_linked(),
        }
    }
}

/// Successful authentication result: a bearer session token plus the
/// authenticated user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: String,
    /// Seconds until the access token expires
    pub expires_in: i64,
    pub user: UserSummary,
}

impl AuthResponse {
    pub fn new(access_token: String, expires_in: i64, user: &User) -> Self {
        Self {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in,
            user: UserSummary::from(user),
        }
    }
}
