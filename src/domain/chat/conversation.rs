//! Conversation entity.

use crate::domain::chat::ParticipantPair;
use crate::domain::foundation::{ConversationId, Timestamp, UserId};

/// Durable record of a two-participant conversation.
///
/// Carries a denormalized cache of the most recent message (`last_message` /
/// `last_message_at`) so conversation lists render without touching the
/// message store. The message store stays the source of truth for ordering
/// and content; a stale cache self-heals on the next send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    id: ConversationId,
    participants: ParticipantPair,
    last_message: Option<String>,
    last_message_at: Option<Timestamp>,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl Conversation {
    /// Creates a fresh conversation between two participants.
    pub fn new(participants: ParticipantPair) -> Self {
        let now = Timestamp::now();
        Self {
            id: ConversationId::new(),
            participants,
            last_message: None,
            last_message_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Reconstitutes a conversation from stored fields.
    pub fn restore(
        id: ConversationId,
        participants: ParticipantPair,
        last_message: Option<String>,
        last_message_at: Option<Timestamp>,
        created_at: Timestamp,
        updated_at: Timestamp,
    ) -> Self {
        Self {
            id,
            participants,
            last_message,
            last_message_at,
            created_at,
            updated_at,
        }
    }

    /// Refreshes the last-message cache after a send.
    pub fn record_message(&mut self, content: &str, at: Timestamp) {
        self.last_message = Some(content.to_string());
        self.last_message_at = Some(at);
        self.updated_at = at;
    }

    pub fn id(&self) -> &ConversationId {
        &self.id
    }

    pub fn participants(&self) -> &ParticipantPair {
        &self.participants
    }

    pub fn last_message(&self) -> Option<&str> {
        self.last_message.as_deref()
    }

    pub fn last_message_at(&self) -> Option<&Timestamp> {
        self.last_message_at.as_ref()
    }

    pub fn created_at(&self) -> &Timestamp {
        &self.created_at
    }

    pub fn updated_at(&self) -> &Timestamp {
        &self.updated_at
    }

    /// Whether the given user is one of the two participants.
    pub fn is_participant(&self, user: &UserId) -> bool {
        self.participants.contains(user)
    }

    /// The participant other than `user`, if `user` belongs to the pair.
    pub fn other_participant(&self, user: &UserId) -> Option<&UserId> {
        self.participants.other(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(a: &str, b: &str) -> ParticipantPair {
        ParticipantPair::new(UserId::new(a).unwrap(), UserId::new(b).unwrap()).unwrap()
    }

    #[test]
    fn new_conversation_has_no_last_message() {
        let conversation = Conversation::new(pair("1", "2"));
        assert!(conversation.last_message().is_none());
        assert!(conversation.last_message_at().is_none());
        assert_eq!(conversation.created_at(), conversation.updated_at());
    }

    #[test]
    fn record_message_refreshes_cache_and_updated_at() {
        let mut conversation = Conversation::new(pair("1", "2"));
        let at = conversation.created_at().plus_seconds(5);

        conversation.record_message("see you at 6", at);

        assert_eq!(conversation.last_message(), Some("see you at 6"));
        assert_eq!(conversation.last_message_at(), Some(&at));
        assert_eq!(conversation.updated_at(), &at);
    }

    #[test]
    fn other_participant_resolves_counterpart() {
        let conversation = Conversation::new(pair("coach", "athlete"));
        let coach = UserId::new("coach").unwrap();
        assert_eq!(
            conversation.other_participant(&coach).unwrap().as_str(),
            "athlete"
        );
    }

    #[test]
    fn is_participant_rejects_outsiders() {
        let conversation = Conversation::new(pair("1", "2"));
        assert!(conversation.is_participant(&UserId::new("1").unwrap()));
        assert!(!conversation.is_participant(&UserId::new("3").unwrap()));
    }
}
