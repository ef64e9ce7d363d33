//! Read models returned by the messaging engine.
//!
//! These types decouple what the engine computes from how the HTTP and
//! WebSocket adapters serialize it. Enrichment fields (display names, roles,
//! presence) are filled best-effort: a failed lookup degrades to the
//! placeholders rather than failing the operation.

use crate::domain::chat::Message;
use crate::domain::foundation::{ConversationId, MessageId, Timestamp, UserId, UserRole};

/// Placeholder display name used when a directory lookup fails.
pub const UNKNOWN_NAME: &str = "Unknown";

/// A message enriched with its sender's display metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageView {
    pub id: MessageId,
    pub conversation_id: ConversationId,
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub content: String,
    pub is_read: bool,
    pub created_at: Timestamp,
    pub sender_name: String,
    pub sender_role: Option<UserRole>,
    /// True when the viewing user authored this message. Only meaningful on
    /// paths with a known viewer (conversation detail); false elsewhere.
    pub is_own_message: bool,
}

impl MessageView {
    /// Builds a view from a message plus optional sender metadata.
    pub fn from_message(
        message: &Message,
        sender_name: Option<String>,
        sender_role: Option<UserRole>,
        viewer: Option<&UserId>,
    ) -> Self {
        Self {
            id: *message.id(),
            conversation_id: *message.conversation_id(),
            sender_id: message.sender_id().clone(),
            receiver_id: message.receiver_id().clone(),
            content: message.content().to_string(),
            is_read: message.is_read(),
            created_at: *message.created_at(),
            sender_name: sender_name.unwrap_or_else(|| UNKNOWN_NAME.to_string()),
            sender_role,
            is_own_message: viewer.is_some_and(|v| message.is_from(v)),
        }
    }
}

/// One entry of a user's conversation list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationSummaryView {
    pub id: ConversationId,
    pub participants: Vec<UserId>,
    pub last_message: Option<String>,
    pub last_message_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub other_participant_id: Option<UserId>,
    pub other_participant_name: String,
    pub unread_count: u64,
    pub online: bool,
}

/// Full view of one conversation, as opened by a participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationDetailView {
    pub id: ConversationId,
    pub participants: Vec<UserId>,
    pub messages: Vec<MessageView>,
    pub other_participant_id: Option<UserId>,
    pub other_participant_name: String,
    pub other_participant_role: Option<UserRole>,
    pub total_messages: u64,
    /// Unread count for the viewer after the read-on-open side effect; 0 on
    /// the happy path.
    pub unread_count: u64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// One page of conversation history, newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessagePageView {
    pub messages: Vec<MessageView>,
    pub page: u32,
    pub per_page: u32,
    pub total: u64,
    pub total_pages: u64,
}

impl MessagePageView {
    /// The degraded result for a failed history fetch.
    pub fn empty(page: u32, per_page: u32) -> Self {
        Self {
            messages: Vec::new(),
            page,
            per_page,
            total: 0,
            total_pages: 0,
        }
    }
}
