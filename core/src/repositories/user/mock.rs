//! Mock implementation of UserRepository for testing

use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::entities::user::{NewUser, User};
use crate::errors::DomainError;

use super::trait_::UserRepository;

/// In-memory user repository for testing
pub struct MockUserRepository {
    users: Arc<RwLock<HashMap<i64, User>>>,
    next_id: Arc<RwLock<i64>>,
}

impl MockUserRepository {
    /// Create a new mock repository
    pub fn new() -> Self {
        Self {
            users: Arc::new(RwLock::new(HashMap::new())),
            next_id: Arc::new(RwLock::new(1)),
        }
    }

    /// Seed the repository with an existing user, keeping its id
    pub async fn insert(&self, user: User) {
        let mut next_id = self.next_id.write().await;
        if user.id >= *next_id {
            *next_id = user.id + 1;
        }
        self.users.write().await.insert(user.id, user);
    }
}

impl Default for MockUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserRepository for MockUserRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, DomainError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|u| u.email.as_deref() == Some(email))
            .cloned())
    }

    async fn find_by_phone(&self, phone: &str) -> Result<Option<User>, DomainError> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|u| u.phone.as_deref() == Some(phone))
            .cloned())
    }

    async fn find_by_telegram_id(
        &self,
        telegram_user_id: i64,
    ) -> Result<Option<User>, DomainError> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|u| u.telegram_user_id == Some(telegram_user_id))
            .cloned())
    }

    async fn create(&self, new_user: NewUser) -> Result<User, DomainError> {
        let mut users = self.users.write().await;

        if let Some(ref email) = new_user.email {
            if users.values().any(|u| u.email.as_deref() == Some(email)) {
                return Err(DomainError::Validation {
                    message: "Email already registered".to_string(),
                });
            }
        }
        if let Some(ref phone) = new_user.phone {
            if users.values().any(|u| u.phone.as_deref() == Some(phone)) {
                return Err(DomainError::Validation {
                    message: "Phone number already registered".to_string(),
                });
            }
        }

        let mut next_id = self.next_id.write().await;
        let id = *next_id;
        *next_id += 1;

        let now = Utc::now();
        let user = User {
            id,
            email: new_user.email,
            phone: new_user.phone,
            password_hash: new_user.password_hash,
            role: new_user.role,
            phone_verified_at: new_user.phone_verified.then_some(now),
            telegram_user_id: None,
            telegram_username: None,
            telegram_first_name: None,
            telegram_last_name: None,
            telegram_linked_at: None,
            last_login_method: None,
            failed_login_attempts: 0,
            locked_until: None,
            is_disabled: false,
            created_at: now,
            updated_at: now,
        };
        users.insert(id, user.clone());
        Ok(user)
    }

    async fn update(&self, user: &User) -> Result<User, DomainError> {
        let mut users = self.users.write().await;
        if !users.contains_key(&user.id) {
            return Err(DomainError::NotFound {
                resource: "User".to_string(),
            });
        }
        users.insert(user.id, user.clone());
        Ok(user.clone())
    }

    async fn register_login_failure(
        &self,
        id: i64,
        max_attempts: i32,
        lock_duration: Duration,
    ) -> Result<User, DomainError> {
        let mut users = self.users.write().await;
        let user = users.get_mut(&id).ok_or_else(|| DomainError::NotFound {
            resource: "User".to_string(),
        })?;
        user.record_login_failure(max_attempts, lock_duration);
        Ok(user.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::user::UserRole;

    #[tokio::test]
    async fn test_create_assigns_sequential_ids() {
        let repo = MockUserRepository::new();
        let first = repo.create(NewUser::from_phone("+8613812345678")).await.unwrap();
        let second = repo.create(NewUser::from_phone("+8613812345679")).await.unwrap();
        assert_eq!(second.id, first.id + 1);
    }

    #[tokio::test]
    async fn test_duplicate_phone_rejected() {
        let repo = MockUserRepository::new();
        repo.create(NewUser::from_phone("+8613812345678")).await.unwrap();
        let result = repo.create(NewUser::from_phone("+8613812345678")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_find_by_email() {
        let repo = MockUserRepository::new();
        let created = repo
            .create(NewUser {
                email: Some("ops@example.com".to_string()),
                phone: None,
                password_hash: Some("hash".to_string()),
                role: UserRole::Operator,
                phone_verified: false,
            })
            .await
            .unwrap();

        let found = repo.find_by_email("ops@example.com").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert!(repo.find_by_email("nobody@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_register_login_failure_locks() {
        let repo = MockUserRepository::new();
        let user = repo
            .create(NewUser {
                email: Some("a@example.com".to_string()),
                phone: None,
                password_hash: Some("hash".to_string()),
                role: UserRole::User,
                phone_verified: false,
            })
            .await
            .unwrap();

        let after = repo
            .register_login_failure(user.id, 1, Duration::minutes(30))
            .await
            .unwrap();
        assert!(after.is_locked(Utc::now()));
    }
}
