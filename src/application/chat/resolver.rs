//! Conversation resolver - find-or-create with race convergence.

use std::sync::Arc;

use crate::domain::chat::{ChatError, Conversation, ParticipantPair};
use crate::domain::foundation::UserId;
use crate::ports::ConversationStore;

/// Resolves the single conversation owned by a participant pair.
///
/// The store's pair-uniqueness constraint does the heavy lifting; the
/// resolver layers the two access patterns on top:
///
/// - the implicit path (`find_or_create`) converges concurrent callers onto
///   one record: the insert loser observes `ConversationExists` and re-reads
///   the winner's row instead of surfacing an error;
/// - the explicit path (`create_explicit`) surfaces the duplicate as a
///   conflict for the caller to handle (HTTP 409).
#[derive(Clone)]
pub struct ConversationResolver {
    conversations: Arc<dyn ConversationStore>,
}

impl ConversationResolver {
    pub fn new(conversations: Arc<dyn ConversationStore>) -> Self {
        Self { conversations }
    }

    /// Finds the conversation for `{a, b}`, creating it if absent.
    ///
    /// Rejects `a == b` with `ChatError::InvalidParticipants`. Concurrent
    /// calls for the same unordered pair all return the same conversation.
    pub async fn find_or_create(&self, a: &UserId, b: &UserId) -> Result<Conversation, ChatError> {
        let pair = ParticipantPair::new(a.clone(), b.clone())?;

        if let Some(existing) = self.conversations.find_by_pair(&pair).await? {
            return Ok(existing);
        }

        let fresh = Conversation::new(pair.clone());
        match self.conversations.insert(&fresh).await {
            Ok(()) => {
                tracing::debug!(conversation_id = %fresh.id(), "Created conversation");
                Ok(fresh)
            }
            Err(ChatError::ConversationExists) => {
                // Lost the creation race; the winner's record must exist now.
                tracing::debug!(
                    lo = %pair.lo(),
                    hi = %pair.hi(),
                    "Conversation creation race lost, returning winner"
                );
                self.conversations
                    .find_by_pair(&pair)
                    .await?
                    .ok_or_else(|| {
                        ChatError::storage("Conversation vanished after losing creation race")
                    })
            }
            Err(e) => Err(e),
        }
    }

    /// Looks up the conversation between the two users without creating it.
    pub async fn find(&self, a: &UserId, b: &UserId) -> Result<Option<Conversation>, ChatError> {
        let pair = ParticipantPair::new(a.clone(), b.clone())?;
        self.conversations.find_by_pair(&pair).await
    }

    /// Whether a conversation exists between the two users.
    pub async fn exists(&self, a: &UserId, b: &UserId) -> Result<bool, ChatError> {
        Ok(self.find(a, b).await?.is_some())
    }

    /// Creates a conversation, failing with `ChatError::ConversationExists`
    /// if the pair already owns one.
    pub async fn create_explicit(
        &self,
        a: &UserId,
        b: &UserId,
    ) -> Result<Conversation, ChatError> {
        let pair = ParticipantPair::new(a.clone(), b.clone())?;
        let fresh = Conversation::new(pair);
        self.conversations.insert(&fresh).await?;
        tracing::debug!(conversation_id = %fresh.id(), "Created conversation explicitly");
        Ok(fresh)
    }
}
