//! PostgreSQL adapters - sqlx-backed implementations of the persistence
//! ports and the user directory.

mod conversation_store;
mod message_store;
mod user_directory;

pub use conversation_store::PostgresConversationStore;
pub use message_store::PostgresMessageStore;
pub use user_directory::PostgresUserDirectory;

use crate::domain::chat::ChatError;

/// True when the database error is a unique-constraint violation.
///
/// Code 23505 is PostgreSQL's `unique_violation`; the conversation store
/// relies on it to detect a lost creation race.
pub(crate) fn is_unique_violation(error: &sqlx::Error) -> bool {
    error
        .as_database_error()
        .and_then(|db| db.code())
        .map(|code| code == "23505")
        .unwrap_or(false)
}

/// Maps any sqlx error onto the domain's storage error.
pub(crate) fn storage_error(context: &str, error: sqlx::Error) -> ChatError {
    ChatError::storage(format!("{}: {}", context, error))
}
