//! PostgreSQL implementation of UserDirectory.
//!
//! Reads the platform's `users` table directly. This service never writes
//! it; signup and profile management belong to the user service.

use async_trait::async_trait;
use sqlx::{postgres::PgRow, PgPool, Row};

use crate::adapters::postgres::storage_error;
use crate::domain::chat::ChatError;
use crate::domain::foundation::{UserId, UserRole};
use crate::ports::{UserDirectory, UserProfile};

/// PostgreSQL user directory.
#[derive(Clone)]
pub struct PostgresUserDirectory {
    pool: PgPool,
}

impl PostgresUserDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for PostgresUserDirectory {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<UserProfile>, ChatError> {
        let row = sqlx::query(
            "SELECT id, display_name, email, role FROM users WHERE id = $1",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to fetch user", e))?;

        row.map(row_to_profile).transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserProfile>, ChatError> {
        let row = sqlx::query(
            "SELECT id, display_name, email, role FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to fetch user by email", e))?;

        row.map(row_to_profile).transpose()
    }
}

fn row_to_profile(row: PgRow) -> Result<UserProfile, ChatError> {
    let id: String = row
        .try_get("id")
        .map_err(|e| storage_error("Corrupt user row", e))?;
    let display_name: String = row
        .try_get("display_name")
        .map_err(|e| storage_error("Corrupt user row", e))?;
    let email: String = row
        .try_get("email")
        .map_err(|e| storage_error("Corrupt user row", e))?;
    let role: String = row
        .try_get("role")
        .map_err(|e| storage_error("Corrupt user row", e))?;

    Ok(UserProfile {
        id: UserId::new(id).map_err(ChatError::storage)?,
        display_name,
        email,
        role: role.parse::<UserRole>().map_err(ChatError::storage)?,
    })
}
