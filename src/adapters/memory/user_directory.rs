//! In-memory user directory.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::chat::ChatError;
use crate::domain::foundation::{UserId, UserRole};
use crate::ports::{UserDirectory, UserProfile};

/// Map-backed user directory.
///
/// Seeded via the builder-style `with_user`, and able to simulate a
/// directory outage via `fail_lookups` for degrade-path tests.
#[derive(Debug, Default)]
pub struct InMemoryUserDirectory {
    users: RwLock<HashMap<UserId, UserProfile>>,
    fail_lookups: RwLock<bool>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a user profile.
    pub fn with_user(self, id: &str, display_name: &str, email: &str, role: UserRole) -> Self {
        let id = UserId::new(id).expect("seeded user id must be non-blank");
        // Builder runs before the directory is shared; the lock is free.
        self.users.try_write().expect("directory builder lock").insert(
            id.clone(),
            UserProfile {
                id,
                display_name: display_name.to_string(),
                email: email.to_string(),
                role,
            },
        );
        self
    }

    /// Makes every subsequent lookup fail with a storage error.
    pub async fn fail_lookups(&self) {
        *self.fail_lookups.write().await = true;
    }

    async fn check_available(&self) -> Result<(), ChatError> {
        if *self.fail_lookups.read().await {
            return Err(ChatError::storage("user directory unavailable"));
        }
        Ok(())
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<UserProfile>, ChatError> {
        self.check_available().await?;
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserProfile>, ChatError> {
        self.check_available().await?;
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|p| p.email == email)
            .cloned())
    }
}
