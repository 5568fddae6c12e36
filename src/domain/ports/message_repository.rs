use crate::domain::entities::StoredMessage;
use crate::infrastructure::http::middleware::error::ApiResult;

#[async_trait::async_trait]
pub trait MessageRepository: Send + Sync {
    async fn append_message(&self, message: &StoredMessage) -> ApiResult<()>;

    /// The last `limit` messages of a conversation, oldest first.
    async fn recent_messages(&self, chat_id: &str, limit: i64) -> ApiResult<Vec<StoredMessage>>;
}
