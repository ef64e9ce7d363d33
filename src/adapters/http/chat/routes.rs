//! HTTP routes for the chat endpoints.
//!
//! The `/conversations/:id` segment is deliberately shared: GET and POST
//! interpret it as the other participant's user id, DELETE as the
//! conversation id, mirroring the platform's public API.

use axum::{
    routing::{get, post, put},
    Router,
};

use super::handlers::{
    create_conversation, delete_conversation, get_conversation, get_conversation_messages,
    list_conversations, mark_messages_as_read, send_message, unread_count, unread_messages,
    ChatHandlers,
};

/// Creates the chat router with all endpoints.
pub fn chat_routes(handlers: ChatHandlers) -> Router {
    Router::new()
        .route("/messages", post(send_message))
        .route("/messages/unread-count", get(unread_count))
        .route("/messages/unread", get(unread_messages))
        .route("/conversations", get(list_conversations))
        .route(
            "/conversations/:id",
            get(get_conversation)
                .post(create_conversation)
                .delete(delete_conversation),
        )
        .route("/conversations/:id/messages", get(get_conversation_messages))
        .route("/conversations/:id/read", put(mark_messages_as_read))
        .with_state(handlers)
}
