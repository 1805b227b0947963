//! In-memory credential store for tests and local experiments.

use super::{CredentialStore, NewUser, StoreError, UserRecord};
use async_trait::async_trait;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    users: RwLock<Vec<UserRecord>>,
}

impl InMemoryCredentialStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .find(|user| user.email == email)
            .cloned())
    }

    async fn email_exists(&self, email: &str) -> Result<bool, StoreError> {
        Ok(self.users.read().await.iter().any(|user| user.email == email))
    }

    async fn create(&self, user: &NewUser) -> Result<u64, StoreError> {
        let mut users = self.users.write().await;

        // Mirrors the UNIQUE constraint on `Correo`.
        if users.iter().any(|existing| existing.email == user.email) {
            return Err(StoreError::Duplicate);
        }

        let id = users.iter().map(|existing| existing.id).max().unwrap_or(0) + 1;
        users.push(UserRecord {
            id,
            name: user.name.clone(),
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            age: user.age,
        });

        Ok(id)
    }

    async fn update_password_hash(&self, id: u64, password_hash: &str) -> Result<(), StoreError> {
        if let Some(user) = self.users.write().await.iter_mut().find(|user| user.id == id) {
            user.password_hash = password_hash.to_string();
        }
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
