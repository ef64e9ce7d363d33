//! Connection registry for the real-time gateway.
//!
//! Tracks which users hold live WebSocket connections and fans events out to
//! them. The registry also implements the engine-facing real-time ports:
//! `ChatNotifier` (push new messages) and `PresenceProbe` (online flag for
//! conversation lists).

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc, RwLock};
use uuid::Uuid;

use crate::adapters::websocket::frames::{MessagePayload, PresencePayload, ServerFrame};
use crate::domain::chat::Message;
use crate::domain::foundation::UserId;
use crate::ports::{ChatNotifier, PresenceProbe, UserProfile};

/// Unique identifier for one WebSocket connection.
///
/// Generated server-side at upgrade time; a user with several tabs open holds
/// several connection ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// Creates a new random connection id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-connection outbound channel.
type ConnectionSender = mpsc::UnboundedSender<ServerFrame>;

/// Shared registry of live connections.
///
/// # Thread safety
///
/// The user → connections map is written only on connect/disconnect and read
/// on every fan-out, so it sits behind an `RwLock`. Delivery to a connection
/// whose receiver is already gone simply drops the event ("offline"); closed
/// senders are pruned lazily on the next delivery attempt, so a disconnect
/// racing a notification can neither block nor error.
pub struct ConnectionRegistry {
    connections: RwLock<HashMap<UserId, Vec<(ConnectionId, ConnectionSender)>>>,

    /// Shared channel for presence events; every connection subscribes.
    presence_tx: broadcast::Sender<ServerFrame>,
}

impl ConnectionRegistry {
    /// Creates a registry with the given presence-channel capacity.
    ///
    /// A slow client that falls more than `capacity` presence events behind
    /// misses the older ones, which is acceptable for best-effort presence.
    pub fn new(presence_capacity: usize) -> Self {
        let (presence_tx, _) = broadcast::channel(presence_capacity);
        Self {
            connections: RwLock::new(HashMap::new()),
            presence_tx,
        }
    }

    /// Creates a registry with default presence capacity (128 events).
    pub fn with_default_capacity() -> Self {
        Self::new(128)
    }

    /// Registers a connection for a user.
    ///
    /// Returns a subscription to the shared presence channel for the
    /// connection's send loop to forward.
    pub async fn register(
        &self,
        user: &UserId,
        connection_id: ConnectionId,
        sender: ConnectionSender,
    ) -> broadcast::Receiver<ServerFrame> {
        let mut connections = self.connections.write().await;
        connections
            .entry(user.clone())
            .or_default()
            .push((connection_id, sender));
        tracing::debug!(user = %user, connection = %connection_id, "Connection registered");
        self.presence_tx.subscribe()
    }

    /// Removes a connection. The user counts as offline once their last
    /// connection is gone.
    pub async fn unregister(&self, user: &UserId, connection_id: &ConnectionId) {
        let mut connections = self.connections.write().await;
        if let Some(list) = connections.get_mut(user) {
            list.retain(|(id, _)| id != connection_id);
            if list.is_empty() {
                connections.remove(user);
            }
        }
        tracing::debug!(user = %user, connection = %connection_id, "Connection unregistered");
    }

    /// Delivers a frame to every live connection of a user.
    ///
    /// Returns how many connections accepted the frame; 0 means offline.
    /// Senders whose receiver has been dropped are pruned as a side effect.
    pub async fn send_to_user(&self, user: &UserId, frame: ServerFrame) -> usize {
        let mut connections = self.connections.write().await;
        let Some(list) = connections.get_mut(user) else {
            return 0;
        };

        let mut delivered = 0;
        list.retain(|(connection_id, sender)| match sender.send(frame.clone()) {
            Ok(()) => {
                delivered += 1;
                true
            }
            Err(_) => {
                tracing::debug!(user = %user, connection = %connection_id, "Dropping closed connection");
                false
            }
        });
        if list.is_empty() {
            connections.remove(user);
        }
        delivered
    }

    /// Announces a presence change on the shared broadcast channel.
    pub fn broadcast_presence(&self, user: &UserId, online: bool) {
        let frame = ServerFrame::Presence(PresencePayload {
            user_id: user.to_string(),
            online,
        });
        // No subscribers is fine: nobody is connected to care.
        let _ = self.presence_tx.send(frame);
    }

    /// Number of live connections across all users.
    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.values().map(Vec::len).sum()
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

#[async_trait]
impl ChatNotifier for ConnectionRegistry {
    async fn notify_new_message(&self, message: &Message, sender: &UserProfile) {
        let payload = MessagePayload {
            id: message.id().to_string(),
            conversation_id: message.conversation_id().to_string(),
            sender_id: message.sender_id().to_string(),
            receiver_id: message.receiver_id().to_string(),
            content: message.content().to_string(),
            sender_name: sender.display_name.clone(),
            sender_role: Some(sender.role.to_string()),
            created_at: message.created_at().to_rfc3339(),
        };

        let delivered = self
            .send_to_user(message.receiver_id(), ServerFrame::Message(payload))
            .await;
        if delivered == 0 {
            tracing::debug!(
                receiver = %message.receiver_id(),
                message_id = %message.id(),
                "Receiver offline, dropping real-time event"
            );
        }
    }
}

#[async_trait]
impl PresenceProbe for ConnectionRegistry {
    async fn is_online(&self, user: &UserId) -> bool {
        self.connections.read().await.contains_key(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{ConversationId, UserRole};

    fn uid(s: &str) -> UserId {
        UserId::new(s).unwrap()
    }

    fn profile(id: &str, name: &str) -> UserProfile {
        UserProfile {
            id: uid(id),
            display_name: name.to_string(),
            email: format!("{}@gymlink.io", id),
            role: UserRole::Coach,
        }
    }

    fn typing_frame(sender: &str) -> ServerFrame {
        ServerFrame::Typing(crate::adapters::websocket::frames::TypingPayload {
            sender_id: sender.to_string(),
        })
    }

    #[tokio::test]
    async fn registered_user_counts_as_online() {
        let registry = ConnectionRegistry::with_default_capacity();
        let (tx, _rx) = mpsc::unbounded_channel();
        let connection = ConnectionId::new();

        assert!(!registry.is_online(&uid("7")).await);
        registry.register(&uid("7"), connection, tx).await;
        assert!(registry.is_online(&uid("7")).await);

        registry.unregister(&uid("7"), &connection).await;
        assert!(!registry.is_online(&uid("7")).await);
    }

    #[tokio::test]
    async fn send_to_user_reaches_every_connection() {
        let registry = ConnectionRegistry::with_default_capacity();
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        registry.register(&uid("7"), ConnectionId::new(), tx1).await;
        registry.register(&uid("7"), ConnectionId::new(), tx2).await;

        let delivered = registry.send_to_user(&uid("7"), typing_frame("9")).await;

        assert_eq!(delivered, 2);
        assert!(matches!(rx1.recv().await, Some(ServerFrame::Typing(_))));
        assert!(matches!(rx2.recv().await, Some(ServerFrame::Typing(_))));
    }

    #[tokio::test]
    async fn send_to_offline_user_drops_the_event() {
        let registry = ConnectionRegistry::with_default_capacity();
        let delivered = registry.send_to_user(&uid("ghost"), typing_frame("9")).await;
        assert_eq!(delivered, 0);
    }

    #[tokio::test]
    async fn closed_connections_are_pruned_on_delivery() {
        let registry = ConnectionRegistry::with_default_capacity();
        let (tx, rx) = mpsc::unbounded_channel();
        registry.register(&uid("7"), ConnectionId::new(), tx).await;
        drop(rx);

        // The receiver is gone: delivery drops the event and prunes the entry.
        let delivered = registry.send_to_user(&uid("7"), typing_frame("9")).await;
        assert_eq!(delivered, 0);
        assert!(!registry.is_online(&uid("7")).await);
        assert_eq!(registry.connection_count().await, 0);
    }

    #[tokio::test]
    async fn presence_broadcast_reaches_subscribers() {
        let registry = ConnectionRegistry::with_default_capacity();
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut presence_rx = registry.register(&uid("7"), ConnectionId::new(), tx).await;

        registry.broadcast_presence(&uid("9"), true);

        match presence_rx.recv().await.unwrap() {
            ServerFrame::Presence(p) => {
                assert_eq!(p.user_id, "9");
                assert!(p.online);
            }
            other => panic!("unexpected frame: {:?}", other),
        }
    }

    #[tokio::test]
    async fn notifier_delivers_message_frames_to_the_receiver() {
        let registry = ConnectionRegistry::with_default_capacity();
        let (tx, mut rx) = mpsc::unbounded_channel();
        registry.register(&uid("2"), ConnectionId::new(), tx).await;

        let message = Message::new(ConversationId::new(), uid("1"), uid("2"), "hello").unwrap();
        registry
            .notify_new_message(&message, &profile("1", "Alice Dupont"))
            .await;

        match rx.recv().await.unwrap() {
            ServerFrame::Message(p) => {
                assert_eq!(p.content, "hello");
                assert_eq!(p.sender_name, "Alice Dupont");
                assert_eq!(p.receiver_id, "2");
            }
            other => panic!("unexpected frame: {:?}", other),
        }
    }
}
