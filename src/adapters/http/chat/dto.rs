//! HTTP DTOs for the chat endpoints.
//!
//! These types decouple the HTTP API from domain types. Field names are
//! camelCase on the wire, matching what the web frontend consumes.

use serde::{Deserialize, Serialize};

use crate::application::chat::{
    ConversationDetailView, ConversationSummaryView, MessagePageView, MessageView,
};

// ════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════

/// Body of `POST /api/messages`. The sender is always the authenticated
/// principal; only the receiver and content come from the payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub receiver_id: String,
    pub content: String,
}

/// Query parameters for the paginated history endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryQuery {
    #[serde(default)]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub size: u32,
}

fn default_page_size() -> u32 {
    20
}

// ════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════

/// A message as returned by the API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub id: String,
    pub conversation_id: String,
    pub sender_id: String,
    pub receiver_id: String,
    pub content: String,
    pub is_read: bool,
    pub created_at: String,
    pub sender_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender_role: Option<String>,
    pub is_own_message: bool,
}

impl From<MessageView> for MessageResponse {
    fn from(view: MessageView) -> Self {
        Self {
            id: view.id.to_string(),
            conversation_id: view.conversation_id.to_string(),
            sender_id: view.sender_id.to_string(),
            receiver_id: view.receiver_id.to_string(),
            content: view.content,
            is_read: view.is_read,
            created_at: view.created_at.to_rfc3339(),
            sender_name: view.sender_name,
            sender_role: view.sender_role.map(|r| r.to_string()),
            is_own_message: view.is_own_message,
        }
    }
}

/// One entry of `GET /api/conversations`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummaryResponse {
    pub id: String,
    pub participants: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_message_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub other_participant_id: Option<String>,
    pub other_participant_name: String,
    pub unread_count: u64,
    pub is_online: bool,
}

impl From<ConversationSummaryView> for ConversationSummaryResponse {
    fn from(view: ConversationSummaryView) -> Self {
        Self {
            id: view.id.to_string(),
            participants: view.participants.iter().map(|u| u.to_string()).collect(),
            last_message: view.last_message,
            last_message_at: view.last_message_at.map(|t| t.to_rfc3339()),
            created_at: view.created_at.to_rfc3339(),
            updated_at: view.updated_at.to_rfc3339(),
            other_participant_id: view.other_participant_id.map(|u| u.to_string()),
            other_participant_name: view.other_participant_name,
            unread_count: view.unread_count,
            is_online: view.online,
        }
    }
}

/// Body of `GET /api/conversations/{otherUserId}`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationDetailResponse {
    pub conversation_id: String,
    pub participants: Vec<String>,
    pub messages: Vec<MessageResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub other_participant_id: Option<String>,
    pub other_participant_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub other_participant_role: Option<String>,
    pub total_messages: u64,
    pub unread_count: u64,
    pub created_at: String,
    pub updated_at: String,
}

impl From<ConversationDetailView> for ConversationDetailResponse {
    fn from(view: ConversationDetailView) -> Self {
        Self {
            conversation_id: view.id.to_string(),
            participants: view.participants.iter().map(|u| u.to_string()).collect(),
            messages: view.messages.into_iter().map(Into::into).collect(),
            other_participant_id: view.other_participant_id.map(|u| u.to_string()),
            other_participant_name: view.other_participant_name,
            other_participant_role: view.other_participant_role.map(|r| r.to_string()),
            total_messages: view.total_messages,
            unread_count: view.unread_count,
            created_at: view.created_at.to_rfc3339(),
            updated_at: view.updated_at.to_rfc3339(),
        }
    }
}

/// One page of `GET /api/conversations/{id}/messages`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePageResponse {
    pub content: Vec<MessageResponse>,
    pub page: u32,
    pub size: u32,
    pub total_elements: u64,
    pub total_pages: u64,
}

impl From<MessagePageView> for MessagePageResponse {
    fn from(view: MessagePageView) -> Self {
        Self {
            content: view.messages.into_iter().map(Into::into).collect(),
            page: view.page,
            size: view.per_page,
            total_elements: view.total,
            total_pages: view.total_pages,
        }
    }
}

/// Standard error envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_request_deserializes_camel_case() {
        let json = r#"{"receiverId": "7", "content": "see you at 6"}"#;
        let request: SendMessageRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.receiver_id, "7");
        assert_eq!(request.content, "see you at 6");
    }

    #[test]
    fn history_query_defaults_to_first_page_of_twenty() {
        let query: HistoryQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query.page, 0);
        assert_eq!(query.size, 20);
    }

    #[test]
    fn page_response_serializes_spring_style_fields() {
        let page = MessagePageResponse {
            content: Vec::new(),
            page: 0,
            size: 20,
            total_elements: 3,
            total_pages: 1,
        };
        let json = serde_json::to_string(&page).unwrap();
        assert!(json.contains(r#""totalElements":3"#));
        assert!(json.contains(r#""totalPages":1"#));
    }
}
