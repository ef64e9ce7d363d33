//! Conversation persistence port.

use async_trait::async_trait;

use crate::domain::chat::{ChatError, Conversation, ParticipantPair};
use crate::domain::foundation::{ConversationId, UserId};

/// Durable store of conversations, keyed by id and by participant pair.
///
/// # Contract
///
/// Implementations must enforce the pair-uniqueness invariant: `insert` for a
/// pair that already has a conversation fails with
/// `ChatError::ConversationExists`, and two concurrent inserts for the same
/// pair must not both succeed. In PostgreSQL this is a unique index on the
/// canonical `(participant_lo, participant_hi)` columns; in memory it is a
/// keyed map behind a lock.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Inserts a new conversation.
    ///
    /// Fails with `ChatError::ConversationExists` when the participant pair
    /// already owns a conversation (including when a concurrent insert won).
    async fn insert(&self, conversation: &Conversation) -> Result<(), ChatError>;

    /// Looks up a conversation by id.
    async fn find_by_id(&self, id: &ConversationId) -> Result<Option<Conversation>, ChatError>;

    /// Looks up the conversation owned by a participant pair.
    async fn find_by_pair(&self, pair: &ParticipantPair)
        -> Result<Option<Conversation>, ChatError>;

    /// All conversations the user participates in, most recent message first
    /// (conversations that never had a message sort last).
    async fn list_for_user(&self, user: &UserId) -> Result<Vec<Conversation>, ChatError>;

    /// Persists the denormalized last-message cache and `updated_at`.
    async fn update_summary(&self, conversation: &Conversation) -> Result<(), ChatError>;

    /// Deletes a conversation record. Deleting a missing id is a no-op.
    async fn delete(&self, id: &ConversationId) -> Result<(), ChatError>;
}
