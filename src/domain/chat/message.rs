//! Message entity.

use crate::domain::chat::ChatError;
use crate::domain::foundation::{ConversationId, MessageId, Timestamp, UserId};

/// A single directed message within a conversation.
///
/// Sender and receiver are both canonical fields: the receiver is fixed at
/// send time from the conversation's other participant, so "who is this for"
/// never has to be re-derived downstream.
///
/// The read flag is monotonic. It starts false and the only mutation this
/// type offers is `mark_read`; nothing ever flips it back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    id: MessageId,
    conversation_id: ConversationId,
    sender_id: UserId,
    receiver_id: UserId,
    content: String,
    is_read: bool,
    created_at: Timestamp,
}

impl Message {
    /// Creates a new unread message, rejecting blank content.
    pub fn new(
        conversation_id: ConversationId,
        sender_id: UserId,
        receiver_id: UserId,
        content: impl Into<String>,
    ) -> Result<Self, ChatError> {
        let content = content.into();
        if content.trim().is_empty() {
            return Err(ChatError::EmptyContent);
        }
        Ok(Self {
            id: MessageId::new(),
            conversation_id,
            sender_id,
            receiver_id,
            content,
            is_read: false,
            created_at: Timestamp::now(),
        })
    }

    /// Reconstitutes a message from stored fields.
    pub fn restore(
        id: MessageId,
        conversation_id: ConversationId,
        sender_id: UserId,
        receiver_id: UserId,
        content: String,
        is_read: bool,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id,
            conversation_id,
            sender_id,
            receiver_id,
            content,
            is_read,
            created_at,
        }
    }

    /// Flips the read flag to true. Idempotent, never reverts.
    pub fn mark_read(&mut self) {
        self.is_read = true;
    }

    pub fn id(&self) -> &MessageId {
        &self.id
    }

    pub fn conversation_id(&self) -> &ConversationId {
        &self.conversation_id
    }

    pub fn sender_id(&self) -> &UserId {
        &self.sender_id
    }

    pub fn receiver_id(&self) -> &UserId {
        &self.receiver_id
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn is_read(&self) -> bool {
        self.is_read
    }

    pub fn created_at(&self) -> &Timestamp {
        &self.created_at
    }

    /// Whether the message was authored by the given user.
    pub fn is_from(&self, user: &UserId) -> bool {
        &self.sender_id == user
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uid(s: &str) -> UserId {
        UserId::new(s).unwrap()
    }

    fn sample() -> Message {
        Message::new(ConversationId::new(), uid("sender"), uid("receiver"), "hi").unwrap()
    }

    #[test]
    fn new_message_starts_unread() {
        let message = sample();
        assert!(!message.is_read());
        assert_eq!(message.content(), "hi");
    }

    #[test]
    fn blank_content_is_rejected() {
        let err = Message::new(ConversationId::new(), uid("a"), uid("b"), "   ").unwrap_err();
        assert_eq!(err, ChatError::EmptyContent);
    }

    #[test]
    fn mark_read_is_monotonic_and_idempotent() {
        let mut message = sample();
        message.mark_read();
        assert!(message.is_read());
        message.mark_read();
        assert!(message.is_read());
    }

    #[test]
    fn is_from_matches_sender_only() {
        let message = sample();
        assert!(message.is_from(&uid("sender")));
        assert!(!message.is_from(&uid("receiver")));
    }
}
