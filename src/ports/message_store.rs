//! Message persistence port.

use async_trait::async_trait;

use crate::domain::chat::{ChatError, Message};
use crate::domain::foundation::{ConversationId, UserId};

/// One page of a conversation's history, newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessagePage {
    pub messages: Vec<Message>,
    /// Zero-based page index this page was requested with.
    pub page: u32,
    pub per_page: u32,
    /// Total number of messages in the conversation.
    pub total: u64,
}

impl MessagePage {
    /// An empty page, used when storage fails and the caller degrades.
    pub fn empty(page: u32, per_page: u32) -> Self {
        Self {
            messages: Vec::new(),
            page,
            per_page,
            total: 0,
        }
    }

    /// Total number of pages at the requested page size.
    pub fn total_pages(&self) -> u64 {
        if self.per_page == 0 {
            return 0;
        }
        self.total.div_ceil(self.per_page as u64)
    }
}

/// Durable, append-mostly store of messages.
///
/// # Contract
///
/// - `append` is a single atomic write; ordering for readers is by
///   `created_at` with ties broken by insertion order (implementations keep a
///   storage-level sequence for the tie-break).
/// - The only mutation after append is the monotonic read flip performed by
///   `mark_read`.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Appends a new message.
    async fn append(&self, message: &Message) -> Result<(), ChatError>;

    /// All messages of a conversation, oldest first.
    async fn list_by_conversation(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Vec<Message>, ChatError>;

    /// One page of a conversation's messages, newest first (serves
    /// "load older history" scrolling).
    async fn page_by_conversation(
        &self,
        conversation_id: &ConversationId,
        page: u32,
        per_page: u32,
    ) -> Result<MessagePage, ChatError>;

    /// Number of unread messages addressed to `reader` in one conversation.
    async fn count_unread(
        &self,
        conversation_id: &ConversationId,
        reader: &UserId,
    ) -> Result<u64, ChatError>;

    /// Marks every unread message addressed to `reader` in the conversation
    /// as read. Returns how many were flipped; repeating the call flips zero.
    async fn mark_read(
        &self,
        conversation_id: &ConversationId,
        reader: &UserId,
    ) -> Result<u64, ChatError>;

    /// All unread messages addressed to `reader` across conversations,
    /// newest first.
    async fn unread_for_receiver(&self, reader: &UserId) -> Result<Vec<Message>, ChatError>;

    /// Count of unread messages addressed to `reader` across conversations.
    async fn count_unread_for_receiver(&self, reader: &UserId) -> Result<u64, ChatError>;

    /// Deletes every message of a conversation. Returns how many were removed.
    async fn delete_by_conversation(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<u64, ChatError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_page_has_no_messages_and_zero_total() {
        let page = MessagePage::empty(3, 20);
        assert!(page.messages.is_empty());
        assert_eq!(page.page, 3);
        assert_eq!(page.per_page, 20);
        assert_eq!(page.total, 0);
        assert_eq!(page.total_pages(), 0);
    }

    #[test]
    fn total_pages_rounds_up() {
        let page = MessagePage {
            messages: Vec::new(),
            page: 0,
            per_page: 20,
            total: 41,
        };
        assert_eq!(page.total_pages(), 3);
    }

    #[test]
    fn total_pages_handles_zero_page_size() {
        let page = MessagePage {
            messages: Vec::new(),
            page: 0,
            per_page: 0,
            total: 10,
        };
        assert_eq!(page.total_pages(), 0);
    }
}
