//! In-memory message store.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::chat::{ChatError, Message};
use crate::domain::foundation::{ConversationId, UserId};
use crate::ports::{MessagePage, MessageStore};

/// Vec-backed message store.
///
/// The backing vector preserves append order, which is exactly the
/// insertion-order tie-break the ordering contract asks for: sorting by
/// `created_at` with a stable sort keeps equal timestamps in append order.
#[derive(Debug, Default)]
pub struct InMemoryMessageStore {
    messages: RwLock<Vec<Message>>,
}

impl InMemoryMessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of stored messages across conversations (test helper).
    pub async fn len(&self) -> usize {
        self.messages.read().await.len()
    }

    /// Whether the store holds no messages (test helper).
    pub async fn is_empty(&self) -> bool {
        self.messages.read().await.is_empty()
    }

    /// Messages of one conversation in append order, ascending by creation.
    async fn conversation_ascending(&self, conversation_id: &ConversationId) -> Vec<Message> {
        let messages = self.messages.read().await;
        let mut selected: Vec<Message> = messages
            .iter()
            .filter(|m| m.conversation_id() == conversation_id)
            .cloned()
            .collect();
        selected.sort_by_key(|m| *m.created_at());
        selected
    }
}

#[async_trait]
impl MessageStore for InMemoryMessageStore {
    async fn append(&self, message: &Message) -> Result<(), ChatError> {
        self.messages.write().await.push(message.clone());
        Ok(())
    }

    async fn list_by_conversation(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Vec<Message>, ChatError> {
        Ok(self.conversation_ascending(conversation_id).await)
    }

    async fn page_by_conversation(
        &self,
        conversation_id: &ConversationId,
        page: u32,
        per_page: u32,
    ) -> Result<MessagePage, ChatError> {
        let mut all = self.conversation_ascending(conversation_id).await;
        // Newest first; reversing the stable ascending order puts the later
        // insert first among equal timestamps.
        all.reverse();

        let total = all.len() as u64;
        let start = page as usize * per_page as usize;
        let messages = all
            .into_iter()
            .skip(start)
            .take(per_page as usize)
            .collect();

        Ok(MessagePage {
            messages,
            page,
            per_page,
            total,
        })
    }

    async fn count_unread(
        &self,
        conversation_id: &ConversationId,
        reader: &UserId,
    ) -> Result<u64, ChatError> {
        let messages = self.messages.read().await;
        Ok(messages
            .iter()
            .filter(|m| {
                m.conversation_id() == conversation_id
                    && m.receiver_id() == reader
                    && !m.is_read()
            })
            .count() as u64)
    }

    async fn mark_read(
        &self,
        conversation_id: &ConversationId,
        reader: &UserId,
    ) -> Result<u64, ChatError> {
        let mut messages = self.messages.write().await;
        let mut flipped = 0;
        for message in messages.iter_mut() {
            if message.conversation_id() == conversation_id
                && message.receiver_id() == reader
                && !message.is_read()
            {
                message.mark_read();
                flipped += 1;
            }
        }
        Ok(flipped)
    }

    async fn unread_for_receiver(&self, reader: &UserId) -> Result<Vec<Message>, ChatError> {
        let messages = self.messages.read().await;
        let mut unread: Vec<Message> = messages
            .iter()
            .filter(|m| m.receiver_id() == reader && !m.is_read())
            .cloned()
            .collect();
        unread.sort_by_key(|m| *m.created_at());
        unread.reverse();
        Ok(unread)
    }

    async fn count_unread_for_receiver(&self, reader: &UserId) -> Result<u64, ChatError> {
        let messages = self.messages.read().await;
        Ok(messages
            .iter()
            .filter(|m| m.receiver_id() == reader && !m.is_read())
            .count() as u64)
    }

    async fn delete_by_conversation(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<u64, ChatError> {
        let mut messages = self.messages.write().await;
        let before = messages.len();
        messages.retain(|m| m.conversation_id() != conversation_id);
        Ok((before - messages.len()) as u64)
    }
}
