//! Real-time ports consumed by the messaging engine.
//!
//! The gateway's connection registry implements both traits. The engine only
//! ever talks to these interfaces, so the REST-only test wiring can swap in a
//! recording stub without touching any WebSocket machinery.

use async_trait::async_trait;

use crate::domain::chat::Message;
use crate::domain::foundation::UserId;
use crate::ports::UserProfile;

/// Best-effort push of a freshly persisted message to its receiver.
///
/// Delivery is at-most-once with no retry and no persistence of undelivered
/// events: the stores are the source of truth, and a missed push is
/// recoverable by the receiver's next list call. Implementations therefore
/// return nothing; an offline receiver is not an error.
#[async_trait]
pub trait ChatNotifier: Send + Sync {
    /// Pushes a new-message event to the receiver's live connections, if any.
    ///
    /// `sender` carries the display metadata the receiving client renders.
    async fn notify_new_message(&self, message: &Message, sender: &UserProfile);
}

/// Online/offline lookup for conversation-list enrichment.
#[async_trait]
pub trait PresenceProbe: Send + Sync {
    /// Whether the user currently holds at least one live connection.
    async fn is_online(&self, user: &UserId) -> bool;
}
