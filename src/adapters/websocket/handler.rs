//! WebSocket upgrade handler for the real-time gateway.
//!
//! Connection lifecycle:
//! 1. The client opens `GET /ws` with a bearer credential in the
//!    `Authorization` header.
//! 2. The credential is verified through the `SessionValidator` port before
//!    any upgrade happens. Missing or invalid credentials reject the
//!    connection outright (fail-closed, no principal bound).
//! 3. On success the verified principal is bound to the connection for its
//!    lifetime; frame payloads never override it.
//! 4. Frames are handled one at a time; a failing frame produces an error
//!    frame but leaves the channel open. Only transport failure, a close
//!    frame, or an explicit disconnect tears the connection down.
//! 5. Teardown unregisters the connection and broadcasts offline presence.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message as WsMessage, WebSocket, WebSocketUpgrade},
        State,
    },
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::{broadcast, mpsc};

use crate::adapters::websocket::frames::{
    ClientFrame, ErrorPayload, MessagePayload, ReadPayload, ServerFrame, TypingPayload,
};
use crate::adapters::websocket::registry::{ConnectionId, ConnectionRegistry};
use crate::application::chat::ChatService;
use crate::domain::foundation::{AuthError, AuthenticatedUser, ConversationId, UserId};
use crate::ports::SessionValidator;

/// State required by the gateway.
#[derive(Clone)]
pub struct GatewayState {
    pub service: Arc<ChatService>,
    pub registry: Arc<ConnectionRegistry>,
    pub validator: Arc<dyn SessionValidator>,
}

impl GatewayState {
    pub fn new(
        service: Arc<ChatService>,
        registry: Arc<ConnectionRegistry>,
        validator: Arc<dyn SessionValidator>,
    ) -> Self {
        Self {
            service,
            registry,
            validator,
        }
    }
}

/// Creates the router exposing the gateway's single upgrade endpoint.
pub fn gateway_router(state: GatewayState) -> Router {
    Router::new().route("/ws", get(ws_handler)).with_state(state)
}

/// Handles `GET /ws`: authenticate, then upgrade.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<GatewayState>,
    headers: HeaderMap,
) -> Response {
    let principal = match authenticate(state.validator.as_ref(), &headers).await {
        Ok(principal) => principal,
        Err(e) => {
            tracing::warn!(error = %e, "WebSocket handshake rejected");
            return reject(e);
        }
    };

    tracing::info!(user = %principal.id, "WebSocket authenticated");
    ws.on_upgrade(move |socket| handle_socket(socket, principal, state))
}

/// Extracts and verifies the bearer credential from the handshake headers.
async fn authenticate(
    validator: &dyn SessionValidator,
    headers: &HeaderMap,
) -> Result<AuthenticatedUser, AuthError> {
    let token = headers
        .get(http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or(AuthError::MissingCredentials)?;

    validator.validate(token).await
}

fn reject(error: AuthError) -> Response {
    let status = match &error {
        AuthError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::UNAUTHORIZED,
    };
    (
        status,
        Json(serde_json::json!({
            "error": error.to_string(),
            "code": "AUTH_ERROR"
        })),
    )
        .into_response()
}

/// What the receive loop should do after a frame.
#[derive(Debug, PartialEq, Eq)]
enum FrameOutcome {
    Continue,
    Disconnect,
}

/// Runs for the lifetime of one authenticated connection.
async fn handle_socket(socket: WebSocket, principal: AuthenticatedUser, state: GatewayState) {
    let (mut sink, mut stream) = socket.split();
    let connection_id = ConnectionId::new();

    let (tx, mut rx) = mpsc::unbounded_channel::<ServerFrame>();
    // Keep a handle for acks and per-frame errors addressed to this client.
    let ack_tx = tx.clone();

    let mut presence_rx = state
        .registry
        .register(&principal.id, connection_id, tx)
        .await;

    // Forward private frames and presence broadcasts to the peer.
    let user_for_send = principal.id.clone();
    let send_task = tokio::spawn(async move {
        loop {
            let frame = tokio::select! {
                maybe = rx.recv() => match maybe {
                    Some(frame) => frame,
                    None => break,
                },
                result = presence_rx.recv() => match result {
                    Ok(frame) => frame,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::debug!(user = %user_for_send, skipped, "Presence stream lagged");
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
            };

            let json = match serde_json::to_string(&frame) {
                Ok(json) => json,
                Err(e) => {
                    tracing::error!(error = %e, "Frame serialization failed");
                    continue;
                }
            };
            if sink.send(WsMessage::Text(json)).await.is_err() {
                break;
            }
        }
    });

    // Process inbound frames until the transport closes or the client says
    // goodbye.
    while let Some(result) = stream.next().await {
        match result {
            Ok(WsMessage::Text(text)) => {
                let outcome = handle_frame(&state, &principal, &ack_tx, &text).await;
                if outcome == FrameOutcome::Disconnect {
                    break;
                }
            }
            Ok(WsMessage::Close(_)) => {
                tracing::debug!(user = %principal.id, "Client sent close frame");
                break;
            }
            Ok(WsMessage::Binary(_)) => {
                tracing::warn!(user = %principal.id, "Ignoring unsupported binary frame");
            }
            // Protocol ping/pong handled by axum.
            Ok(WsMessage::Ping(_)) | Ok(WsMessage::Pong(_)) => {}
            Err(e) => {
                tracing::debug!(user = %principal.id, error = %e, "WebSocket receive error");
                break;
            }
        }
    }

    send_task.abort();
    state
        .registry
        .unregister(&principal.id, &connection_id)
        .await;
    state.registry.broadcast_presence(&principal.id, false);
    tracing::info!(user = %principal.id, "WebSocket disconnected");
}

/// Handles one application frame. Errors are isolated per frame: the client
/// gets an error frame and the channel stays open.
async fn handle_frame(
    state: &GatewayState,
    principal: &AuthenticatedUser,
    ack_tx: &mpsc::UnboundedSender<ServerFrame>,
    text: &str,
) -> FrameOutcome {
    let frame: ClientFrame = match serde_json::from_str(text) {
        Ok(frame) => frame,
        Err(e) => {
            tracing::debug!(user = %principal.id, error = %e, "Unparseable frame");
            send_error(ack_tx, "BAD_FRAME", "Unrecognized frame");
            return FrameOutcome::Continue;
        }
    };

    match frame {
        ClientFrame::Send {
            receiver_id,
            content,
        } => {
            let Ok(receiver) = UserId::new(receiver_id) else {
                send_error(ack_tx, "BAD_FRAME", "Blank receiver id");
                return FrameOutcome::Continue;
            };
            match state
                .service
                .send_message(&principal.id, &receiver, &content)
                .await
            {
                Ok(view) => {
                    // The engine already pushed the message to the receiver;
                    // acknowledge the sender.
                    let _ = ack_tx.send(ServerFrame::Sent(MessagePayload::from(&view)));
                }
                Err(e) => {
                    tracing::debug!(user = %principal.id, error = %e, "Send frame failed");
                    send_error(ack_tx, e.code(), &e.to_string());
                }
            }
        }

        ClientFrame::Typing { receiver_id } => {
            let Ok(receiver) = UserId::new(receiver_id) else {
                return FrameOutcome::Continue;
            };
            // Relayed directly, never persisted, no acknowledgement.
            state
                .registry
                .send_to_user(
                    &receiver,
                    ServerFrame::Typing(TypingPayload {
                        sender_id: principal.id.to_string(),
                    }),
                )
                .await;
        }

        ClientFrame::Read { conversation_id } => {
            let Ok(conversation_id) = conversation_id.parse::<ConversationId>() else {
                send_error(ack_tx, "BAD_FRAME", "Malformed conversation id");
                return FrameOutcome::Continue;
            };

            state
                .service
                .mark_messages_as_read(&principal.id, &conversation_id)
                .await;

            // Tell the other participant their messages were read.
            match state.service.find_conversation(&conversation_id).await {
                Ok(Some(conversation)) => {
                    if let Some(other) = conversation.other_participant(&principal.id) {
                        state
                            .registry
                            .send_to_user(
                                other,
                                ServerFrame::Read(ReadPayload {
                                    conversation_id: conversation_id.to_string(),
                                    reader_id: principal.id.to_string(),
                                }),
                            )
                            .await;
                    }
                }
                Ok(None) => {
                    tracing::debug!(conversation = %conversation_id, "Read frame for unknown conversation");
                }
                Err(e) => {
                    tracing::warn!(conversation = %conversation_id, error = %e, "Read receipt lookup failed");
                }
            }
        }

        ClientFrame::Join => {
            state.registry.broadcast_presence(&principal.id, true);
        }

        ClientFrame::Disconnect => {
            return FrameOutcome::Disconnect;
        }
    }

    FrameOutcome::Continue
}

fn send_error(ack_tx: &mpsc::UnboundedSender<ServerFrame>, code: &str, message: &str) {
    let _ = ack_tx.send(ServerFrame::Error(ErrorPayload {
        code: code.to_string(),
        message: message.to_string(),
    }));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::auth::MockSessionValidator;
    use crate::adapters::memory::{
        InMemoryConversationStore, InMemoryMessageStore, InMemoryUserDirectory,
    };
    use crate::domain::foundation::UserRole;

    fn uid(s: &str) -> UserId {
        UserId::new(s).unwrap()
    }

    fn gateway() -> GatewayState {
        let registry = Arc::new(ConnectionRegistry::with_default_capacity());
        let directory = Arc::new(
            InMemoryUserDirectory::new()
                .with_user("1", "Alice Dupont", "alice@gymlink.io", UserRole::Coach)
                .with_user("2", "Bob Morel", "bob@gymlink.io", UserRole::Athlete),
        );
        let service = Arc::new(ChatService::new(
            Arc::new(InMemoryConversationStore::new()),
            Arc::new(InMemoryMessageStore::new()),
            directory,
            registry.clone(),
            registry.clone(),
        ));
        let validator = Arc::new(MockSessionValidator::new());
        GatewayState::new(service, registry, validator)
    }

    fn principal(id: &str) -> AuthenticatedUser {
        AuthenticatedUser::new(uid(id), format!("{}@gymlink.io", id), UserRole::Coach)
    }

    async fn connect(state: &GatewayState, user: &str) -> mpsc::UnboundedReceiver<ServerFrame> {
        let (tx, rx) = mpsc::unbounded_channel();
        state
            .registry
            .register(&uid(user), ConnectionId::new(), tx)
            .await;
        rx
    }

    #[tokio::test]
    async fn missing_credentials_fail_closed() {
        let state = gateway();
        let err = authenticate(state.validator.as_ref(), &HeaderMap::new())
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::MissingCredentials);
    }

    #[tokio::test]
    async fn invalid_token_fails_closed() {
        let state = gateway();
        let mut headers = HeaderMap::new();
        headers.insert(
            http::header::AUTHORIZATION,
            "Bearer forged-token".parse().unwrap(),
        );
        let err = authenticate(state.validator.as_ref(), &headers)
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::InvalidToken);
    }

    #[tokio::test]
    async fn expired_token_is_rejected_before_any_frame() {
        let validator = Arc::new(MockSessionValidator::new().failing_with(AuthError::TokenExpired));
        let mut headers = HeaderMap::new();
        headers.insert(
            http::header::AUTHORIZATION,
            "Bearer stale-token".parse().unwrap(),
        );

        let err = authenticate(validator.as_ref(), &headers).await.unwrap_err();
        assert_eq!(err, AuthError::TokenExpired);
        assert_eq!(reject(err).status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn send_frame_persists_acks_and_delivers() {
        let state = gateway();
        let (ack_tx, mut ack_rx) = mpsc::unbounded_channel();
        let mut receiver_rx = connect(&state, "2").await;

        let outcome = handle_frame(
            &state,
            &principal("1"),
            &ack_tx,
            r#"{"type": "send", "receiverId": "2", "content": "hello"}"#,
        )
        .await;

        assert_eq!(outcome, FrameOutcome::Continue);
        assert!(matches!(ack_rx.recv().await, Some(ServerFrame::Sent(_))));
        match receiver_rx.recv().await.unwrap() {
            ServerFrame::Message(p) => assert_eq!(p.content, "hello"),
            other => panic!("unexpected frame: {:?}", other),
        }
        assert_eq!(state.service.unread_count(&uid("2")).await, 1);
    }

    #[tokio::test]
    async fn send_frame_to_unknown_user_reports_error_and_keeps_channel() {
        let state = gateway();
        let (ack_tx, mut ack_rx) = mpsc::unbounded_channel();

        let outcome = handle_frame(
            &state,
            &principal("1"),
            &ack_tx,
            r#"{"type": "send", "receiverId": "404", "content": "hi"}"#,
        )
        .await;

        assert_eq!(outcome, FrameOutcome::Continue);
        match ack_rx.recv().await.unwrap() {
            ServerFrame::Error(e) => assert_eq!(e.code, "USER_NOT_FOUND"),
            other => panic!("unexpected frame: {:?}", other),
        }
    }

    #[tokio::test]
    async fn typing_frame_relays_without_persistence() {
        let state = gateway();
        let (ack_tx, _ack_rx) = mpsc::unbounded_channel();
        let mut receiver_rx = connect(&state, "2").await;

        handle_frame(
            &state,
            &principal("1"),
            &ack_tx,
            r#"{"type": "typing", "receiverId": "2"}"#,
        )
        .await;

        match receiver_rx.recv().await.unwrap() {
            ServerFrame::Typing(p) => assert_eq!(p.sender_id, "1"),
            other => panic!("unexpected frame: {:?}", other),
        }
        assert_eq!(state.service.unread_count(&uid("2")).await, 0);
    }

    #[tokio::test]
    async fn read_frame_marks_read_and_notifies_the_sender() {
        let state = gateway();
        let (ack_tx, _ack_rx) = mpsc::unbounded_channel();
        let mut alice_rx = connect(&state, "1").await;

        let view = state
            .service
            .send_message(&uid("1"), &uid("2"), "read me")
            .await
            .unwrap();

        handle_frame(
            &state,
            &principal("2"),
            &ack_tx,
            &format!(r#"{{"type": "read", "conversationId": "{}"}}"#, view.conversation_id),
        )
        .await;

        assert_eq!(state.service.unread_count(&uid("2")).await, 0);
        match alice_rx.recv().await.unwrap() {
            ServerFrame::Read(p) => {
                assert_eq!(p.reader_id, "2");
                assert_eq!(p.conversation_id, view.conversation_id.to_string());
            }
            other => panic!("unexpected frame: {:?}", other),
        }
    }

    #[tokio::test]
    async fn unparseable_frame_reports_error_and_keeps_channel() {
        let state = gateway();
        let (ack_tx, mut ack_rx) = mpsc::unbounded_channel();

        let outcome = handle_frame(&state, &principal("1"), &ack_tx, "not json").await;

        assert_eq!(outcome, FrameOutcome::Continue);
        match ack_rx.recv().await.unwrap() {
            ServerFrame::Error(e) => assert_eq!(e.code, "BAD_FRAME"),
            other => panic!("unexpected frame: {:?}", other),
        }
    }

    #[tokio::test]
    async fn disconnect_frame_ends_the_loop() {
        let state = gateway();
        let (ack_tx, _ack_rx) = mpsc::unbounded_channel();

        let outcome =
            handle_frame(&state, &principal("1"), &ack_tx, r#"{"type": "disconnect"}"#).await;

        assert_eq!(outcome, FrameOutcome::Disconnect);
    }

    #[tokio::test]
    async fn join_frame_broadcasts_online_presence() {
        let state = gateway();
        let (ack_tx, _ack_rx) = mpsc::unbounded_channel();

        // Bob subscribes to the presence channel via registration.
        let (bob_tx, _bob_rx) = mpsc::unbounded_channel();
        let mut presence_rx = state
            .registry
            .register(&uid("2"), ConnectionId::new(), bob_tx)
            .await;

        handle_frame(&state, &principal("1"), &ack_tx, r#"{"type": "join"}"#).await;

        match presence_rx.recv().await.unwrap() {
            ServerFrame::Presence(p) => {
                assert_eq!(p.user_id, "1");
                assert!(p.online);
            }
            other => panic!("unexpected frame: {:?}", other),
        }
    }
}
