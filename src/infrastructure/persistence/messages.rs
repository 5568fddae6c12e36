use crate::domain::entities::{MessageRole, StoredMessage};
use crate::domain::ports::message_repository::MessageRepository;
use crate::infrastructure::http::middleware::error::ApiResult;
use crate::infrastructure::persistence::Database;
use async_trait::async_trait;
use sqlx::Row;

#[async_trait]
impl MessageRepository for Database {
    async fn append_message(&self, message: &StoredMessage) -> ApiResult<()> {
        sqlx::query(
            "INSERT INTO messages (id, chat_id, role, body, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&message.id)
        .bind(&message.chat_id)
        .bind(message.role.as_str())
        .bind(&message.body)
        .bind(&message.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn recent_messages(&self, chat_id: &str, limit: i64) -> ApiResult<Vec<StoredMessage>> {
        let rows = sqlx::query(
            "SELECT id, chat_id, role, body, created_at FROM messages
             WHERE chat_id = ?
             ORDER BY created_at DESC, rowid DESC
             LIMIT ?",
        )
        .bind(chat_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let mut messages = Vec::with_capacity(rows.len());
        for row in rows {
            messages.push(StoredMessage {
                id: row.try_get("id")?,
                chat_id: row.try_get("chat_id")?,
                role: MessageRole::from(row.try_get::<String, _>("role")?),
                body: row.try_get("body")?,
                created_at: row.try_get("created_at")?,
            });
        }
        messages.reverse();
        Ok(messages)
    }
}
