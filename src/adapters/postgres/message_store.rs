//! PostgreSQL implementation of MessageStore.

use async_trait::async_trait;
use sqlx::{postgres::PgRow, PgPool, Row};

use crate::adapters::postgres::storage_error;
use crate::domain::chat::{ChatError, Message};
use crate::domain::foundation::{ConversationId, MessageId, Timestamp, UserId};
use crate::ports::{MessagePage, MessageStore};

/// PostgreSQL message store.
///
/// Rows carry a `seq` bigserial next to `created_at`; every ordered query
/// sorts by `(created_at, seq)` so timestamp ties resolve to insertion
/// order, exactly what the ordering contract requires.
#[derive(Clone)]
pub struct PostgresMessageStore {
    pool: PgPool,
}

impl PostgresMessageStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const MESSAGE_COLUMNS: &str =
    "id, conversation_id, sender_id, receiver_id, content, is_read, created_at";

#[async_trait]
impl MessageStore for PostgresMessageStore {
    async fn append(&self, message: &Message) -> Result<(), ChatError> {
        sqlx::query(
            r#"
            INSERT INTO messages (
                id, conversation_id, sender_id, receiver_id,
                content, is_read, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(message.id().as_uuid())
        .bind(message.conversation_id().as_uuid())
        .bind(message.sender_id().as_str())
        .bind(message.receiver_id().as_str())
        .bind(message.content())
        .bind(message.is_read())
        .bind(message.created_at().as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to insert message", e))?;

        Ok(())
    }

    async fn list_by_conversation(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Vec<Message>, ChatError> {
        let rows = sqlx::query(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages \
             WHERE conversation_id = $1 ORDER BY created_at ASC, seq ASC"
        ))
        .bind(conversation_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to list messages", e))?;

        rows.into_iter().map(row_to_message).collect()
    }

    async fn page_by_conversation(
        &self,
        conversation_id: &ConversationId,
        page: u32,
        per_page: u32,
    ) -> Result<MessagePage, ChatError> {
        let total: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM messages WHERE conversation_id = $1")
                .bind(conversation_id.as_uuid())
                .fetch_one(&self.pool)
                .await
                .map_err(|e| storage_error("Failed to count messages", e))?;

        let rows = sqlx::query(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages \
             WHERE conversation_id = $1 \
             ORDER BY created_at DESC, seq DESC \
             LIMIT $2 OFFSET $3"
        ))
        .bind(conversation_id.as_uuid())
        .bind(per_page as i64)
        .bind(page as i64 * per_page as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to fetch message page", e))?;

        let messages: Result<Vec<Message>, ChatError> =
            rows.into_iter().map(row_to_message).collect();

        Ok(MessagePage {
            messages: messages?,
            page,
            per_page,
            total: total.0 as u64,
        })
    }

    async fn count_unread(
        &self,
        conversation_id: &ConversationId,
        reader: &UserId,
    ) -> Result<u64, ChatError> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM messages \
             WHERE conversation_id = $1 AND receiver_id = $2 AND is_read = FALSE",
        )
        .bind(conversation_id.as_uuid())
        .bind(reader.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to count unread messages", e))?;

        Ok(count.0 as u64)
    }

    async fn mark_read(
        &self,
        conversation_id: &ConversationId,
        reader: &UserId,
    ) -> Result<u64, ChatError> {
        let result = sqlx::query(
            "UPDATE messages SET is_read = TRUE \
             WHERE conversation_id = $1 AND receiver_id = $2 AND is_read = FALSE",
        )
        .bind(conversation_id.as_uuid())
        .bind(reader.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to mark messages read", e))?;

        Ok(result.rows_affected())
    }

    async fn unread_for_receiver(&self, reader: &UserId) -> Result<Vec<Message>, ChatError> {
        let rows = sqlx::query(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages \
             WHERE receiver_id = $1 AND is_read = FALSE \
             ORDER BY created_at DESC, seq DESC"
        ))
        .bind(reader.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to list unread messages", e))?;

        rows.into_iter().map(row_to_message).collect()
    }

    async fn count_unread_for_receiver(&self, reader: &UserId) -> Result<u64, ChatError> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM messages WHERE receiver_id = $1 AND is_read = FALSE",
        )
        .bind(reader.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to count unread messages", e))?;

        Ok(count.0 as u64)
    }

    async fn delete_by_conversation(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<u64, ChatError> {
        let result = sqlx::query("DELETE FROM messages WHERE conversation_id = $1")
            .bind(conversation_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| storage_error("Failed to delete conversation messages", e))?;

        Ok(result.rows_affected())
    }
}

fn row_to_message(row: PgRow) -> Result<Message, ChatError> {
    let id: uuid::Uuid = row
        .try_get("id")
        .map_err(|e| storage_error("Corrupt message row", e))?;
    let conversation_id: uuid::Uuid = row
        .try_get("conversation_id")
        .map_err(|e| storage_error("Corrupt message row", e))?;
    let sender_id: String = row
        .try_get("sender_id")
        .map_err(|e| storage_error("Corrupt message row", e))?;
    let receiver_id: String = row
        .try_get("receiver_id")
        .map_err(|e| storage_error("Corrupt message row", e))?;
    let content: String = row
        .try_get("content")
        .map_err(|e| storage_error("Corrupt message row", e))?;
    let is_read: bool = row
        .try_get("is_read")
        .map_err(|e| storage_error("Corrupt message row", e))?;
    let created_at: chrono::DateTime<chrono::Utc> = row
        .try_get("created_at")
        .map_err(|e| storage_error("Corrupt message row", e))?;

    Ok(Message::restore(
        MessageId::from_uuid(id),
        ConversationId::from_uuid(conversation_id),
        UserId::new(sender_id).map_err(ChatError::storage)?,
        UserId::new(receiver_id).map_err(ChatError::storage)?,
        content,
        is_read,
        Timestamp::from_datetime(created_at),
    ))
}
