//! HTTP handlers for the chat endpoints.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::adapters::http::middleware::RequireAuth;
use crate::application::chat::{ChatService, MessagePageView};
use crate::domain::chat::ChatError;
use crate::domain::foundation::{ConversationId, UserId};

use super::dto::{
    ConversationDetailResponse, ConversationSummaryResponse, ErrorResponse, HistoryQuery,
    MessagePageResponse, MessageResponse, SendMessageRequest,
};

/// Handler state - the messaging engine.
#[derive(Clone)]
pub struct ChatHandlers {
    service: Arc<ChatService>,
}

impl ChatHandlers {
    pub fn new(service: Arc<ChatService>) -> Self {
        Self { service }
    }
}

/// POST /api/messages - send a message.
///
/// The sender is the authenticated principal; trusting a sender id from the
/// payload would let any caller impersonate anyone.
pub async fn send_message(
    State(handlers): State<ChatHandlers>,
    RequireAuth(user): RequireAuth,
    Json(request): Json<SendMessageRequest>,
) -> Response {
    let receiver = match UserId::new(request.receiver_id) {
        Ok(receiver) => receiver,
        Err(_) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new("Receiver id cannot be blank", "BAD_REQUEST")),
            )
                .into_response()
        }
    };

    match handlers
        .service
        .send_message(&user.id, &receiver, &request.content)
        .await
    {
        Ok(view) => (StatusCode::OK, Json(MessageResponse::from(view))).into_response(),
        Err(e) => chat_error_response(e),
    }
}

/// GET /api/conversations - list the caller's conversations.
pub async fn list_conversations(
    State(handlers): State<ChatHandlers>,
    RequireAuth(user): RequireAuth,
) -> Response {
    let conversations = handlers.service.list_conversations(&user.id).await;
    let body: Vec<ConversationSummaryResponse> =
        conversations.into_iter().map(Into::into).collect();
    (StatusCode::OK, Json(body)).into_response()
}

/// GET /api/conversations/{otherUserId} - open the conversation with another
/// user (read-on-open).
pub async fn get_conversation(
    State(handlers): State<ChatHandlers>,
    RequireAuth(user): RequireAuth,
    Path(other_user_id): Path<String>,
) -> Response {
    let other = match UserId::new(other_user_id) {
        Ok(other) => other,
        Err(_) => return chat_error_response(ChatError::ConversationNotFound),
    };

    match handlers.service.get_conversation(&user.id, &other).await {
        Ok(view) => (StatusCode::OK, Json(ConversationDetailResponse::from(view))).into_response(),
        Err(e) => chat_error_response(e),
    }
}

/// GET /api/conversations/{id}/messages - paginated history, newest first.
///
/// Malformed conversation ids degrade to an empty page just like storage
/// failures do: this endpoint never blocks the chat UI.
pub async fn get_conversation_messages(
    State(handlers): State<ChatHandlers>,
    RequireAuth(_user): RequireAuth,
    Path(conversation_id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Response {
    let page = match conversation_id.parse::<ConversationId>() {
        Ok(conversation_id) => {
            handlers
                .service
                .get_conversation_messages(&conversation_id, query.page, query.size)
                .await
        }
        Err(_) => MessagePageView::empty(query.page, query.size),
    };

    (StatusCode::OK, Json(MessagePageResponse::from(page))).into_response()
}

/// PUT /api/conversations/{id}/read - mark the caller's unread messages read.
///
/// Always 200: read-state is best-effort telemetry.
pub async fn mark_messages_as_read(
    State(handlers): State<ChatHandlers>,
    RequireAuth(user): RequireAuth,
    Path(conversation_id): Path<String>,
) -> Response {
    if let Ok(conversation_id) = conversation_id.parse::<ConversationId>() {
        handlers
            .service
            .mark_messages_as_read(&user.id, &conversation_id)
            .await;
    }
    StatusCode::OK.into_response()
}

/// GET /api/messages/unread-count - total unread messages for the caller.
pub async fn unread_count(
    State(handlers): State<ChatHandlers>,
    RequireAuth(user): RequireAuth,
) -> Response {
    let count = handlers.service.unread_count(&user.id).await;
    (StatusCode::OK, Json(count)).into_response()
}

/// GET /api/messages/unread - all unread messages for the caller.
pub async fn unread_messages(
    State(handlers): State<ChatHandlers>,
    RequireAuth(user): RequireAuth,
) -> Response {
    let messages = handlers.service.unread_messages(&user.id).await;
    let body: Vec<MessageResponse> = messages.into_iter().map(Into::into).collect();
    (StatusCode::OK, Json(body)).into_response()
}

/// POST /api/conversations/{otherUserId} - explicitly create a conversation.
pub async fn create_conversation(
    State(handlers): State<ChatHandlers>,
    RequireAuth(user): RequireAuth,
    Path(other_user_id): Path<String>,
) -> Response {
    let other = match UserId::new(other_user_id) {
        Ok(other) => other,
        Err(_) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new("User id cannot be blank", "BAD_REQUEST")),
            )
                .into_response()
        }
    };

    match handlers.service.create_conversation(&user.id, &other).await {
        Ok(view) => (
            StatusCode::OK,
            Json(ConversationSummaryResponse::from(view)),
        )
            .into_response(),
        Err(e) => chat_error_response(e),
    }
}

/// DELETE /api/conversations/{id} - delete a conversation and its messages.
pub async fn delete_conversation(
    State(handlers): State<ChatHandlers>,
    RequireAuth(user): RequireAuth,
    Path(conversation_id): Path<String>,
) -> Response {
    let conversation_id = match conversation_id.parse::<ConversationId>() {
        Ok(conversation_id) => conversation_id,
        Err(_) => return chat_error_response(ChatError::ConversationNotFound),
    };

    match handlers
        .service
        .delete_conversation(&user.id, &conversation_id)
        .await
    {
        Ok(()) => StatusCode::OK.into_response(),
        Err(e) => chat_error_response(e),
    }
}

/// Maps engine errors onto the REST status contract.
fn chat_error_response(error: ChatError) -> Response {
    let status = match &error {
        ChatError::UserNotFound(_) | ChatError::ConversationNotFound => StatusCode::NOT_FOUND,
        ChatError::ConversationExists => StatusCode::CONFLICT,
        ChatError::NotParticipant { .. } => StatusCode::FORBIDDEN,
        ChatError::InvalidParticipants | ChatError::EmptyContent => StatusCode::BAD_REQUEST,
        ChatError::Storage(_) => StatusCode::SERVICE_UNAVAILABLE,
    };

    (
        status,
        Json(ErrorResponse::new(error.to_string(), error.code())),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_mapping_matches_the_rest_contract() {
        let cases = [
            (
                ChatError::UserNotFound(UserId::new("9").unwrap()),
                StatusCode::NOT_FOUND,
            ),
            (ChatError::ConversationNotFound, StatusCode::NOT_FOUND),
            (ChatError::ConversationExists, StatusCode::CONFLICT),
            (
                ChatError::NotParticipant {
                    user: UserId::new("9").unwrap(),
                    conversation: ConversationId::new(),
                },
                StatusCode::FORBIDDEN,
            ),
            (ChatError::InvalidParticipants, StatusCode::BAD_REQUEST),
            (ChatError::EmptyContent, StatusCode::BAD_REQUEST),
            (
                ChatError::storage("down"),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
        ];

        for (error, expected) in cases {
            let response = chat_error_response(error);
            assert_eq!(response.status(), expected);
        }
    }
}
