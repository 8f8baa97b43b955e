//! Credential store port and its in-memory adapter.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::models::{NewUser, PublicUser, User, UserId};

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Hash the password and persist a new account. Email and username are
    /// unique; a collision yields [`StoreError::Duplicate`].
    async fn create(&self, new_user: NewUser) -> Result<User, StoreError>;

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    /// Fetch a user without the password field.
    async fn find_public_by_id(&self, id: &UserId) -> Result<Option<PublicUser>, StoreError> {
        Ok(self.find_by_id(id).await?.map(|user| user.public()))
    }
}

/// Process-local user store.
pub struct InMemoryUserStore {
    users: RwLock<HashMap<UserId, User>>,
    hash_cost: u32,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::with_hash_cost(bcrypt::DEFAULT_COST)
    }

    /// Use a specific bcrypt cost (4..=31).
    pub fn with_hash_cost(hash_cost: u32) -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            hash_cost,
        }
    }
}

impl Default for InMemoryUserStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn create(&self, new_user: NewUser) -> Result<User, StoreError> {
        let cost = self.hash_cost;
        let password = new_user.password;
        let password_hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|err| StoreError::unavailable(format!("hashing task failed: {err}")))??;

        let mut users = self.users.write().await;
        if users.values().any(|user| user.email == new_user.email) {
            return Err(StoreError::Duplicate { field: "email" });
        }
        if users.values().any(|user| user.username == new_user.username) {
            return Err(StoreError::Duplicate { field: "username" });
        }

        let now = Utc::now();
        let user = User {
            id: UserId::generate(),
            email: new_user.email,
            username: new_user.username,
            password_hash,
            profile_image: new_user.profile_image,
            created_at: now,
            updated_at: now,
        };
        users.insert(user.id, user.clone());

        tracing::debug!(user_id = %user.id, "user persisted");
        Ok(user)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users.values().find(|user| user.email == email).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users.values().find(|user| user.username == username).cloned())
    }
}
