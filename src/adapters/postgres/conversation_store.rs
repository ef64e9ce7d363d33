//! PostgreSQL implementation of ConversationStore.

use async_trait::async_trait;
use sqlx::{postgres::PgRow, PgPool, Row};

use crate::adapters::postgres::{is_unique_violation, storage_error};
use crate::domain::chat::{ChatError, Conversation, ParticipantPair};
use crate::domain::foundation::{ConversationId, Timestamp, UserId};
use crate::ports::ConversationStore;

/// PostgreSQL conversation store.
///
/// The `conversations_participants_key` unique index on
/// `(participant_lo, participant_hi)` is the serialization point for the
/// creation race: of two concurrent inserts for one pair, exactly one
/// commits and the other surfaces `ConversationExists`.
#[derive(Clone)]
pub struct PostgresConversationStore {
    pool: PgPool,
}

impl PostgresConversationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConversationStore for PostgresConversationStore {
    async fn insert(&self, conversation: &Conversation) -> Result<(), ChatError> {
        sqlx::query(
            r#"
            INSERT INTO conversations (
                id, participant_lo, participant_hi,
                last_message, last_message_at, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(conversation.id().as_uuid())
        .bind(conversation.participants().lo().as_str())
        .bind(conversation.participants().hi().as_str())
        .bind(conversation.last_message())
        .bind(conversation.last_message_at().map(|t| *t.as_datetime()))
        .bind(conversation.created_at().as_datetime())
        .bind(conversation.updated_at().as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ChatError::ConversationExists
            } else {
                storage_error("Failed to insert conversation", e)
            }
        })?;

        Ok(())
    }

    async fn find_by_id(&self, id: &ConversationId) -> Result<Option<Conversation>, ChatError> {
        let row = sqlx::query(
            r#"
            SELECT id, participant_lo, participant_hi,
                   last_message, last_message_at, created_at, updated_at
            FROM conversations
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to fetch conversation", e))?;

        row.map(row_to_conversation).transpose()
    }

    async fn find_by_pair(
        &self,
        pair: &ParticipantPair,
    ) -> Result<Option<Conversation>, ChatError> {
        let row = sqlx::query(
            r#"
            SELECT id, participant_lo, participant_hi,
                   last_message, last_message_at, created_at, updated_at
            FROM conversations
            WHERE participant_lo = $1 AND participant_hi = $2
            "#,
        )
        .bind(pair.lo().as_str())
        .bind(pair.hi().as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to fetch conversation by pair", e))?;

        row.map(row_to_conversation).transpose()
    }

    async fn list_for_user(&self, user: &UserId) -> Result<Vec<Conversation>, ChatError> {
        let rows = sqlx::query(
            r#"
            SELECT id, participant_lo, participant_hi,
                   last_message, last_message_at, created_at, updated_at
            FROM conversations
            WHERE participant_lo = $1 OR participant_hi = $1
            ORDER BY last_message_at DESC NULLS LAST, updated_at DESC
            "#,
        )
        .bind(user.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to list conversations", e))?;

        rows.into_iter().map(row_to_conversation).collect()
    }

    async fn update_summary(&self, conversation: &Conversation) -> Result<(), ChatError> {
        let result = sqlx::query(
            r#"
            UPDATE conversations SET
                last_message = $2,
                last_message_at = $3,
                updated_at = $4
            WHERE id = $1
            "#,
        )
        .bind(conversation.id().as_uuid())
        .bind(conversation.last_message())
        .bind(conversation.last_message_at().map(|t| *t.as_datetime()))
        .bind(conversation.updated_at().as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to update conversation summary", e))?;

        if result.rows_affected() == 0 {
            return Err(ChatError::ConversationNotFound);
        }
        Ok(())
    }

    async fn delete(&self, id: &ConversationId) -> Result<(), ChatError> {
        sqlx::query("DELETE FROM conversations WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| storage_error("Failed to delete conversation", e))?;
        Ok(())
    }
}

fn row_to_conversation(row: PgRow) -> Result<Conversation, ChatError> {
    let id: uuid::Uuid = row
        .try_get("id")
        .map_err(|e| storage_error("Corrupt conversation row", e))?;
    let lo: String = row
        .try_get("participant_lo")
        .map_err(|e| storage_error("Corrupt conversation row", e))?;
    let hi: String = row
        .try_get("participant_hi")
        .map_err(|e| storage_error("Corrupt conversation row", e))?;
    let last_message: Option<String> = row
        .try_get("last_message")
        .map_err(|e| storage_error("Corrupt conversation row", e))?;
    let last_message_at: Option<chrono::DateTime<chrono::Utc>> = row
        .try_get("last_message_at")
        .map_err(|e| storage_error("Corrupt conversation row", e))?;
    let created_at: chrono::DateTime<chrono::Utc> = row
        .try_get("created_at")
        .map_err(|e| storage_error("Corrupt conversation row", e))?;
    let updated_at: chrono::DateTime<chrono::Utc> = row
        .try_get("updated_at")
        .map_err(|e| storage_error("Corrupt conversation row", e))?;

    let lo = UserId::new(lo).map_err(|e| ChatError::storage(e))?;
    let hi = UserId::new(hi).map_err(|e| ChatError::storage(e))?;
    let participants = ParticipantPair::new(lo, hi)?;

    Ok(Conversation::restore(
        ConversationId::from_uuid(id),
        participants,
        last_message,
        last_message_at.map(Timestamp::from_datetime),
        Timestamp::from_datetime(created_at),
        Timestamp::from_datetime(updated_at),
    ))
}
