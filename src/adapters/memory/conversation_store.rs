//! In-memory conversation store.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::chat::{ChatError, Conversation, ParticipantPair};
use crate::domain::foundation::{ConversationId, UserId};
use crate::ports::ConversationStore;

/// Map-backed conversation store.
///
/// The pair index plays the role of the database's unique index: `insert`
/// holds the write lock across the duplicate check and the insertion, so two
/// concurrent inserts for one pair serialize and the loser sees
/// `ConversationExists` exactly like it would from PostgreSQL.
#[derive(Debug, Default)]
pub struct InMemoryConversationStore {
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    by_id: HashMap<ConversationId, Conversation>,
    by_pair: HashMap<ParticipantPair, ConversationId>,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored conversations (test helper).
    pub async fn len(&self) -> usize {
        self.inner.read().await.by_id.len()
    }

    /// Whether the store holds no conversations (test helper).
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.by_id.is_empty()
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn insert(&self, conversation: &Conversation) -> Result<(), ChatError> {
        let mut inner = self.inner.write().await;
        if inner.by_pair.contains_key(conversation.participants()) {
            return Err(ChatError::ConversationExists);
        }
        inner
            .by_pair
            .insert(conversation.participants().clone(), *conversation.id());
        inner.by_id.insert(*conversation.id(), conversation.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &ConversationId) -> Result<Option<Conversation>, ChatError> {
        Ok(self.inner.read().await.by_id.get(id).cloned())
    }

    async fn find_by_pair(
        &self,
        pair: &ParticipantPair,
    ) -> Result<Option<Conversation>, ChatError> {
        let inner = self.inner.read().await;
        Ok(inner
            .by_pair
            .get(pair)
            .and_then(|id| inner.by_id.get(id))
            .cloned())
    }

    async fn list_for_user(&self, user: &UserId) -> Result<Vec<Conversation>, ChatError> {
        let inner = self.inner.read().await;
        let mut conversations: Vec<Conversation> = inner
            .by_id
            .values()
            .filter(|c| c.is_participant(user))
            .cloned()
            .collect();
        // Most recent message first; conversations without one sort last.
        conversations.sort_by(|a, b| {
            b.last_message_at()
                .cmp(&a.last_message_at())
                .then_with(|| b.updated_at().cmp(a.updated_at()))
        });
        Ok(conversations)
    }

    async fn update_summary(&self, conversation: &Conversation) -> Result<(), ChatError> {
        let mut inner = self.inner.write().await;
        match inner.by_id.get_mut(conversation.id()) {
            Some(stored) => {
                *stored = conversation.clone();
                Ok(())
            }
            None => Err(ChatError::ConversationNotFound),
        }
    }

    async fn delete(&self, id: &ConversationId) -> Result<(), ChatError> {
        let mut inner = self.inner.write().await;
        if let Some(conversation) = inner.by_id.remove(id) {
            inner.by_pair.remove(conversation.participants());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(a: &str, b: &str) -> ParticipantPair {
        ParticipantPair::new(UserId::new(a).unwrap(), UserId::new(b).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn insert_enforces_pair_uniqueness() {
        let store = InMemoryConversationStore::new();
        store
            .insert(&Conversation::new(pair("a", "b")))
            .await
            .unwrap();

        // Same pair built the other way around still collides.
        let err = store
            .insert(&Conversation::new(pair("b", "a")))
            .await
            .unwrap_err();
        assert_eq!(err, ChatError::ConversationExists);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn find_by_pair_is_order_independent() {
        let store = InMemoryConversationStore::new();
        let conversation = Conversation::new(pair("a", "b"));
        store.insert(&conversation).await.unwrap();

        let found = store.find_by_pair(&pair("b", "a")).await.unwrap().unwrap();
        assert_eq!(found.id(), conversation.id());
    }

    #[tokio::test]
    async fn list_for_user_orders_by_last_message_desc() {
        let store = InMemoryConversationStore::new();

        let mut old = Conversation::new(pair("me", "old-friend"));
        let mut fresh = Conversation::new(pair("me", "new-friend"));
        let never = Conversation::new(pair("me", "stranger"));

        let base = *old.created_at();
        old.record_message("old", base.plus_seconds(10));
        fresh.record_message("new", base.plus_seconds(20));

        store.insert(&old).await.unwrap();
        store.insert(&fresh).await.unwrap();
        store.insert(&never).await.unwrap();

        let me = UserId::new("me").unwrap();
        let listed = store.list_for_user(&me).await.unwrap();
        assert_eq!(listed.len(), 3);
        assert_eq!(listed[0].id(), fresh.id());
        assert_eq!(listed[1].id(), old.id());
        assert_eq!(listed[2].id(), never.id());
    }

    #[tokio::test]
    async fn delete_frees_the_pair_for_reuse() {
        let store = InMemoryConversationStore::new();
        let conversation = Conversation::new(pair("a", "b"));
        store.insert(&conversation).await.unwrap();

        store.delete(conversation.id()).await.unwrap();

        assert!(store.is_empty().await);
        assert!(store
            .insert(&Conversation::new(pair("a", "b")))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn update_summary_rejects_unknown_conversation() {
        let store = InMemoryConversationStore::new();
        let conversation = Conversation::new(pair("a", "b"));
        let err = store.update_summary(&conversation).await.unwrap_err();
        assert_eq!(err, ChatError::ConversationNotFound);
    }
}
