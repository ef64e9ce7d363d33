//! User directory port.
//!
//! The rest of the platform owns users, signup, and credentials. This core
//! only ever needs to check that a participant exists and to fetch display
//! metadata, so the collaborator is reduced to this lookup interface.

use async_trait::async_trait;

use crate::domain::chat::ChatError;
use crate::domain::foundation::{UserId, UserRole};

/// Profile data the directory exposes for a platform user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub id: UserId,
    pub display_name: String,
    pub email: String,
    pub role: UserRole,
}

/// Read-only lookup into the platform's user records.
///
/// # Contract
///
/// - `Ok(None)` means the user definitively does not exist.
/// - `Err(ChatError::Storage)` means the directory was unreachable; callers
///   on degrade-gracefully paths treat this the same as an unknown name.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Looks up a user by identifier.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<UserProfile>, ChatError>;

    /// Looks up a user by email address.
    async fn find_by_email(&self, email: &str) -> Result<Option<UserProfile>, ChatError>;
}
