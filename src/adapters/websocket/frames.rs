//! Wire protocol for the real-time gateway.
//!
//! Frames are a closed tagged union in both directions; the handler matches
//! exhaustively, so adding a frame kind is a compile-visible change:
//! - Client → Server: send, typing, read, join, disconnect
//! - Server → Client: message, sent, typing, read, presence, error

use serde::{Deserialize, Serialize};

use crate::application::chat::MessageView;

// ============================================
// Client → Server Frames
// ============================================

/// All frames a connected client may send after authentication.
///
/// The sender identity is always the principal bound at handshake time;
/// payloads deliberately have no sender field to trust.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    /// Send a message to another user.
    Send {
        #[serde(rename = "receiverId")]
        receiver_id: String,
        content: String,
    },

    /// Notify the receiver that the sender is typing. Fire-and-forget,
    /// never persisted.
    Typing {
        #[serde(rename = "receiverId")]
        receiver_id: String,
    },

    /// Mark a conversation's messages as read.
    Read {
        #[serde(rename = "conversationId")]
        conversation_id: String,
    },

    /// Announce presence on the shared broadcast channel.
    Join,

    /// Graceful goodbye; the server tears the channel down.
    Disconnect,
}

// ============================================
// Server → Client Frames
// ============================================

/// All frames the server may push to a connected client.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    /// A new message addressed to this client.
    Message(MessagePayload),

    /// Acknowledgement of this client's own send.
    Sent(MessagePayload),

    /// The other participant is typing.
    Typing(TypingPayload),

    /// The other participant read this client's messages.
    Read(ReadPayload),

    /// A user came online or went offline (broadcast).
    Presence(PresencePayload),

    /// A frame-level failure; the connection stays open.
    Error(ErrorPayload),
}

/// A persisted message on the wire.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePayload {
    pub id: String,
    pub conversation_id: String,
    pub sender_id: String,
    pub receiver_id: String,
    pub content: String,
    pub sender_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender_role: Option<String>,
    pub created_at: String,
}

impl From<&MessageView> for MessagePayload {
    fn from(view: &MessageView) -> Self {
        Self {
            id: view.id.to_string(),
            conversation_id: view.conversation_id.to_string(),
            sender_id: view.sender_id.to_string(),
            receiver_id: view.receiver_id.to_string(),
            content: view.content.clone(),
            sender_name: view.sender_name.clone(),
            sender_role: view.sender_role.map(|r| r.to_string()),
            created_at: view.created_at.to_rfc3339(),
        }
    }
}

/// Typing indicator payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingPayload {
    pub sender_id: String,
}

/// Read receipt payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadPayload {
    pub conversation_id: String,
    pub reader_id: String,
}

/// Presence change payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresencePayload {
    pub user_id: String,
    pub online: bool,
}

/// Frame-level error payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPayload {
    pub code: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_send_frame_deserializes() {
        let json = r#"{"type": "send", "receiverId": "7", "content": "hello"}"#;
        let frame: ClientFrame = serde_json::from_str(json).unwrap();
        match frame {
            ClientFrame::Send {
                receiver_id,
                content,
            } => {
                assert_eq!(receiver_id, "7");
                assert_eq!(content, "hello");
            }
            other => panic!("unexpected frame: {:?}", other),
        }
    }

    #[test]
    fn client_read_frame_deserializes() {
        let json = r#"{"type": "read", "conversationId": "3d9b7a3e-6d1f-4a8a-8f93-0a8f3f6b2c10"}"#;
        let frame: ClientFrame = serde_json::from_str(json).unwrap();
        assert!(matches!(frame, ClientFrame::Read { .. }));
    }

    #[test]
    fn client_join_and_disconnect_are_bare_frames() {
        assert!(matches!(
            serde_json::from_str::<ClientFrame>(r#"{"type": "join"}"#).unwrap(),
            ClientFrame::Join
        ));
        assert!(matches!(
            serde_json::from_str::<ClientFrame>(r#"{"type": "disconnect"}"#).unwrap(),
            ClientFrame::Disconnect
        ));
    }

    #[test]
    fn unknown_frame_kinds_fail_to_parse() {
        let json = r#"{"type": "shrug"}"#;
        assert!(serde_json::from_str::<ClientFrame>(json).is_err());
    }

    #[test]
    fn presence_frame_serializes_with_type_tag() {
        let frame = ServerFrame::Presence(PresencePayload {
            user_id: "7".to_string(),
            online: true,
        });
        let json = serde_json::to_string(&frame).unwrap();
        assert!(json.contains(r#""type":"presence""#));
        assert!(json.contains(r#""userId":"7""#));
        assert!(json.contains(r#""online":true"#));
    }

    #[test]
    fn error_frame_serializes_code_and_message() {
        let frame = ServerFrame::Error(ErrorPayload {
            code: "USER_NOT_FOUND".to_string(),
            message: "User not found: 9".to_string(),
        });
        let json = serde_json::to_string(&frame).unwrap();
        assert!(json.contains(r#""type":"error""#));
        assert!(json.contains(r#""code":"USER_NOT_FOUND""#));
    }
}
