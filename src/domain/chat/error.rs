//! Chat-specific error types.

use thiserror::Error;

use crate::domain::foundation::{ConversationId, UserId};

/// Errors surfaced by the messaging engine and its stores.
///
/// The REST facade maps these onto status codes (404/409/403/400/503); the
/// engine's degrade-gracefully operations catch `Storage` locally instead of
/// propagating it (see the service documentation for which operations do so).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChatError {
    /// A referenced user does not exist in the user directory.
    #[error("User not found: {0}")]
    UserNotFound(UserId),

    /// No conversation exists for the referenced pair or id.
    #[error("Conversation not found")]
    ConversationNotFound,

    /// A conversation already exists between the two participants.
    #[error("A conversation already exists between these users")]
    ConversationExists,

    /// The actor is not a participant of the conversation.
    #[error("User {user} is not a participant of conversation {conversation}")]
    NotParticipant {
        user: UserId,
        conversation: ConversationId,
    },

    /// Degenerate participant pair (both sides are the same user).
    #[error("A conversation requires two distinct participants")]
    InvalidParticipants,

    /// Message content is empty or whitespace-only.
    #[error("Message content cannot be blank")]
    EmptyContent,

    /// The underlying store is unavailable or misbehaving.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl ChatError {
    /// Creates a storage error from any displayable cause.
    pub fn storage(cause: impl std::fmt::Display) -> Self {
        ChatError::Storage(cause.to_string())
    }

    /// Stable machine-readable code, shared by REST error bodies and
    /// WebSocket error frames.
    pub fn code(&self) -> &'static str {
        match self {
            ChatError::UserNotFound(_) => "USER_NOT_FOUND",
            ChatError::ConversationNotFound => "CONVERSATION_NOT_FOUND",
            ChatError::ConversationExists => "CONVERSATION_EXISTS",
            ChatError::NotParticipant { .. } => "FORBIDDEN",
            ChatError::InvalidParticipants => "INVALID_PARTICIPANTS",
            ChatError::EmptyContent => "EMPTY_CONTENT",
            ChatError::Storage(_) => "STORAGE_ERROR",
        }
    }

    /// Returns true if this error indicates a transient infrastructure
    /// failure rather than a domain outcome.
    pub fn is_transient(&self) -> bool {
        matches!(self, ChatError::Storage(_))
    }
}
