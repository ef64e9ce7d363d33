//! ChatService - the messaging engine.
//!
//! Orchestrates sends, conversation listing, history, read tracking, and
//! deletion over the persistence ports, and pushes best-effort notifications
//! through the real-time ports.
//!
//! # Failure policy
//!
//! Operations whose failure would corrupt user-visible correctness (send,
//! create, delete, open-conversation) propagate errors. Operations that only
//! serve convenience (listing, history pages, unread counters, read marking)
//! catch storage failures, log the cause, and degrade to empty/zero results
//! so the chat UI keeps rendering.

use std::collections::HashMap;
use std::sync::Arc;

use crate::application::chat::resolver::ConversationResolver;
use crate::application::chat::views::{
    ConversationDetailView, ConversationSummaryView, MessagePageView, MessageView, UNKNOWN_NAME,
};
use crate::domain::chat::{ChatError, Conversation, Message};
use crate::domain::foundation::{ConversationId, UserId};
use crate::ports::{
    ChatNotifier, ConversationStore, MessageStore, PresenceProbe, UserDirectory, UserProfile,
};

/// The messaging engine shared by the REST facade and the WebSocket gateway.
///
/// Every operation takes the caller's verified identity as an explicit
/// argument; nothing is read from ambient state.
#[derive(Clone)]
pub struct ChatService {
    conversations: Arc<dyn ConversationStore>,
    messages: Arc<dyn MessageStore>,
    directory: Arc<dyn UserDirectory>,
    notifier: Arc<dyn ChatNotifier>,
    presence: Arc<dyn PresenceProbe>,
    resolver: ConversationResolver,
}

impl ChatService {
    pub fn new(
        conversations: Arc<dyn ConversationStore>,
        messages: Arc<dyn MessageStore>,
        directory: Arc<dyn UserDirectory>,
        notifier: Arc<dyn ChatNotifier>,
        presence: Arc<dyn PresenceProbe>,
    ) -> Self {
        let resolver = ConversationResolver::new(conversations.clone());
        Self {
            conversations,
            messages,
            directory,
            notifier,
            presence,
            resolver,
        }
    }

    /// Sends a message from `sender_id` to `receiver_id`.
    ///
    /// Validates both parties against the user directory (the error names
    /// whichever party is missing), resolves the conversation (creating it on
    /// first contact), appends the message, refreshes the conversation's
    /// last-message cache, and best-effort notifies the receiver's live
    /// connections.
    pub async fn send_message(
        &self,
        sender_id: &UserId,
        receiver_id: &UserId,
        content: &str,
    ) -> Result<MessageView, ChatError> {
        let sender = self
            .directory
            .find_by_id(sender_id)
            .await?
            .ok_or_else(|| ChatError::UserNotFound(sender_id.clone()))?;
        self.directory
            .find_by_id(receiver_id)
            .await?
            .ok_or_else(|| ChatError::UserNotFound(receiver_id.clone()))?;

        let mut conversation = self.resolver.find_or_create(sender_id, receiver_id).await?;

        let message = Message::new(
            *conversation.id(),
            sender_id.clone(),
            receiver_id.clone(),
            content,
        )?;
        self.messages.append(&message).await?;

        conversation.record_message(message.content(), *message.created_at());
        self.conversations.update_summary(&conversation).await?;

        tracing::info!(
            conversation_id = %conversation.id(),
            message_id = %message.id(),
            sender = %sender_id,
            receiver = %receiver_id,
            "Message sent"
        );

        // Best-effort: an offline receiver or a torn-down channel is not an
        // error, the stores already hold the truth.
        self.notifier.notify_new_message(&message, &sender).await;

        Ok(MessageView::from_message(
            &message,
            Some(sender.display_name),
            Some(sender.role),
            Some(sender_id),
        ))
    }

    /// Lists the user's conversations, most recent message first.
    ///
    /// Each entry is enriched with the other participant's name, the viewer's
    /// unread count, and a live presence flag. Any enrichment failure
    /// degrades that entry; a failure listing the conversations themselves
    /// degrades to an empty list.
    pub async fn list_conversations(&self, user: &UserId) -> Vec<ConversationSummaryView> {
        let conversations = match self.conversations.list_for_user(user).await {
            Ok(conversations) => conversations,
            Err(e) => {
                tracing::warn!(user = %user, error = %e, "Listing conversations failed, returning empty list");
                return Vec::new();
            }
        };

        let mut views = Vec::with_capacity(conversations.len());
        for conversation in &conversations {
            views.push(self.summary_view(conversation, user).await);
        }
        views
    }

    /// Opens the conversation between `user` and `other_user`.
    ///
    /// Returns the full message history (oldest first) and, as a side effect,
    /// marks the viewer's unread messages as read ("read-on-open"). The
    /// returned unread count is recomputed after that side effect, so it is 0
    /// unless the read marking itself failed.
    pub async fn get_conversation(
        &self,
        user: &UserId,
        other_user: &UserId,
    ) -> Result<ConversationDetailView, ChatError> {
        let conversation = self
            .resolver
            .find(user, other_user)
            .await?
            .ok_or(ChatError::ConversationNotFound)?;

        let messages = self.messages.list_by_conversation(conversation.id()).await?;

        self.mark_messages_as_read(user, conversation.id()).await;

        let unread_count = match self.messages.count_unread(conversation.id(), user).await {
            Ok(count) => count,
            Err(e) => {
                tracing::warn!(conversation_id = %conversation.id(), error = %e, "Unread recount failed, reporting 0");
                0
            }
        };

        let profiles = self.participant_profiles(&conversation).await;
        let other_id = conversation.other_participant(user).cloned();
        let (other_name, other_role) = match other_id.as_ref().and_then(|id| profiles.get(id)) {
            Some(profile) => (profile.display_name.clone(), Some(profile.role)),
            None => (UNKNOWN_NAME.to_string(), None),
        };

        let message_views: Vec<MessageView> = messages
            .iter()
            .map(|m| {
                let sender = profiles.get(m.sender_id());
                MessageView::from_message(
                    m,
                    sender.map(|p| p.display_name.clone()),
                    sender.map(|p| p.role),
                    Some(user),
                )
            })
            .collect();

        Ok(ConversationDetailView {
            id: *conversation.id(),
            participants: conversation
                .participants()
                .both()
                .iter()
                .map(|u| (*u).clone())
                .collect(),
            total_messages: message_views.len() as u64,
            messages: message_views,
            other_participant_id: other_id,
            other_participant_name: other_name,
            other_participant_role: other_role,
            unread_count,
            created_at: *conversation.created_at(),
            updated_at: *conversation.updated_at(),
        })
    }

    /// One page of a conversation's history, newest first.
    ///
    /// Serves "load older history" scrolling, hence the opposite order of
    /// `get_conversation`. Storage failures degrade to an empty page so the
    /// chat UI never blocks on history.
    pub async fn get_conversation_messages(
        &self,
        conversation_id: &ConversationId,
        page: u32,
        per_page: u32,
    ) -> MessagePageView {
        let result = self
            .messages
            .page_by_conversation(conversation_id, page, per_page)
            .await;

        let message_page = match result {
            Ok(message_page) => message_page,
            Err(e) => {
                tracing::warn!(
                    conversation_id = %conversation_id,
                    error = %e,
                    "History page fetch failed, returning empty page"
                );
                return MessagePageView::empty(page, per_page);
            }
        };

        let profiles = self.sender_profiles(&message_page.messages).await;
        let messages = message_page
            .messages
            .iter()
            .map(|m| {
                let sender = profiles.get(m.sender_id());
                MessageView::from_message(
                    m,
                    sender.map(|p| p.display_name.clone()),
                    sender.map(|p| p.role),
                    None,
                )
            })
            .collect();

        MessagePageView {
            messages,
            page: message_page.page,
            per_page: message_page.per_page,
            total: message_page.total,
            total_pages: message_page.total_pages(),
        }
    }

    /// Marks every message in the conversation not authored by `user` as
    /// read. Idempotent; storage errors are logged and swallowed because
    /// read-state is advisory telemetry, not a correctness-critical write.
    pub async fn mark_messages_as_read(&self, user: &UserId, conversation_id: &ConversationId) {
        match self.messages.mark_read(conversation_id, user).await {
            Ok(0) => {}
            Ok(flipped) => {
                tracing::debug!(
                    conversation_id = %conversation_id,
                    reader = %user,
                    flipped,
                    "Marked messages read"
                );
            }
            Err(e) => {
                tracing::warn!(
                    conversation_id = %conversation_id,
                    reader = %user,
                    error = %e,
                    "Marking messages read failed, ignoring"
                );
            }
        }
    }

    /// Total unread messages addressed to the user, 0 on storage failure.
    pub async fn unread_count(&self, user: &UserId) -> u64 {
        match self.messages.count_unread_for_receiver(user).await {
            Ok(count) => count,
            Err(e) => {
                tracing::warn!(user = %user, error = %e, "Unread count failed, reporting 0");
                0
            }
        }
    }

    /// All unread messages addressed to the user, enriched with sender
    /// metadata; empty on storage failure.
    pub async fn unread_messages(&self, user: &UserId) -> Vec<MessageView> {
        let messages = match self.messages.unread_for_receiver(user).await {
            Ok(messages) => messages,
            Err(e) => {
                tracing::warn!(user = %user, error = %e, "Unread listing failed, returning empty list");
                return Vec::new();
            }
        };

        let profiles = self.sender_profiles(&messages).await;
        messages
            .iter()
            .map(|m| {
                let sender = profiles.get(m.sender_id());
                MessageView::from_message(
                    m,
                    sender.map(|p| p.display_name.clone()),
                    sender.map(|p| p.role),
                    None,
                )
            })
            .collect()
    }

    /// Explicitly creates a conversation between the two users.
    ///
    /// Fails with `ChatError::ConversationExists` when the pair already owns
    /// one, and `ChatError::InvalidParticipants` for a degenerate pair.
    pub async fn create_conversation(
        &self,
        user: &UserId,
        other_user: &UserId,
    ) -> Result<ConversationSummaryView, ChatError> {
        let conversation = self.resolver.create_explicit(user, other_user).await?;
        Ok(self.summary_view(&conversation, user).await)
    }

    /// Deletes a conversation and all its messages.
    ///
    /// Only a participant may delete. Message cleanup is best-effort: a
    /// failure there is logged and the conversation record is still removed.
    pub async fn delete_conversation(
        &self,
        user: &UserId,
        conversation_id: &ConversationId,
    ) -> Result<(), ChatError> {
        let conversation = self
            .conversations
            .find_by_id(conversation_id)
            .await?
            .ok_or(ChatError::ConversationNotFound)?;

        if !conversation.is_participant(user) {
            return Err(ChatError::NotParticipant {
                user: user.clone(),
                conversation: *conversation_id,
            });
        }

        match self.messages.delete_by_conversation(conversation_id).await {
            Ok(removed) => {
                tracing::debug!(conversation_id = %conversation_id, removed, "Deleted conversation messages");
            }
            Err(e) => {
                tracing::warn!(
                    conversation_id = %conversation_id,
                    error = %e,
                    "Deleting conversation messages failed, removing conversation anyway"
                );
            }
        }

        self.conversations.delete(conversation_id).await?;
        tracing::info!(conversation_id = %conversation_id, deleted_by = %user, "Conversation deleted");
        Ok(())
    }

    /// Looks up a conversation by id. Used by the gateway to resolve the
    /// other participant when relaying read receipts.
    pub async fn find_conversation(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Option<Conversation>, ChatError> {
        self.conversations.find_by_id(conversation_id).await
    }

    /// Builds a list entry for one conversation, degrading every enrichment
    /// independently.
    async fn summary_view(
        &self,
        conversation: &Conversation,
        viewer: &UserId,
    ) -> ConversationSummaryView {
        let other_id = conversation.other_participant(viewer).cloned();

        let other_name = match &other_id {
            Some(id) => self
                .profile_or_none(id)
                .await
                .map(|p| p.display_name)
                .unwrap_or_else(|| UNKNOWN_NAME.to_string()),
            None => UNKNOWN_NAME.to_string(),
        };

        let unread_count = match self.messages.count_unread(conversation.id(), viewer).await {
            Ok(count) => count,
            Err(e) => {
                tracing::warn!(conversation_id = %conversation.id(), error = %e, "Unread count failed, reporting 0");
                0
            }
        };

        let online = match &other_id {
            Some(id) => self.presence.is_online(id).await,
            None => false,
        };

        ConversationSummaryView {
            id: *conversation.id(),
            participants: conversation
                .participants()
                .both()
                .iter()
                .map(|u| (*u).clone())
                .collect(),
            last_message: conversation.last_message().map(str::to_string),
            last_message_at: conversation.last_message_at().copied(),
            created_at: *conversation.created_at(),
            updated_at: *conversation.updated_at(),
            other_participant_id: other_id,
            other_participant_name: other_name,
            unread_count,
            online,
        }
    }

    /// Profiles of both conversation participants, keyed by id. Lookup
    /// failures simply leave the entry out.
    async fn participant_profiles(
        &self,
        conversation: &Conversation,
    ) -> HashMap<UserId, UserProfile> {
        let mut profiles = HashMap::with_capacity(2);
        for participant in conversation.participants().both() {
            if let Some(profile) = self.profile_or_none(participant).await {
                profiles.insert(participant.clone(), profile);
            }
        }
        profiles
    }

    /// Profiles of the distinct senders of a batch of messages.
    async fn sender_profiles(&self, messages: &[Message]) -> HashMap<UserId, UserProfile> {
        let mut profiles = HashMap::new();
        for message in messages {
            if profiles.contains_key(message.sender_id()) {
                continue;
            }
            if let Some(profile) = self.profile_or_none(message.sender_id()).await {
                profiles.insert(message.sender_id().clone(), profile);
            }
        }
        profiles
    }

    async fn profile_or_none(&self, user: &UserId) -> Option<UserProfile> {
        match self.directory.find_by_id(user).await {
            Ok(profile) => profile,
            Err(e) => {
                tracing::warn!(user = %user, error = %e, "Directory lookup failed, degrading to unknown");
                None
            }
        }
    }
}
