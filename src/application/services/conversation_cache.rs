use crate::domain::entities::{
    ConversationPhase, ConversationState, ConversationTurn, MessageRole, StoredMessage,
};
use crate::domain::ports::message_repository::MessageRepository;
use crate::domain::ports::time_service::Clock;
use crate::infrastructure::http::middleware::error::ApiResult;
use crate::shared::utils::format_timestamp;
use chrono::Duration;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Read-through cache of recent turns and the conversation phase per chat.
///
/// The `messages` table is the source of truth: a missing or expired entry
/// is rebuilt from it. The phase lives only here and lapses with the entry.
#[derive(Clone)]
pub struct ConversationCache {
    message_repo: Arc<dyn MessageRepository>,
    clock: Arc<dyn Clock>,
    entries: Arc<RwLock<HashMap<String, ConversationState>>>,
    ttl: Duration,
    history_limit: usize,
}

impl ConversationCache {
    pub fn new(
        message_repo: Arc<dyn MessageRepository>,
        clock: Arc<dyn Clock>,
        ttl: Duration,
        history_limit: usize,
    ) -> Self {
        Self {
            message_repo,
            clock,
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl,
            history_limit: history_limit.max(1),
        }
    }

    /// Recent turns, oldest first.
    pub async fn history(&self, chat_id: &str) -> ApiResult<Vec<ConversationTurn>> {
        let now = self.clock.now();
        {
            let entries = self.entries.read().await;
            if let Some(state) = entries.get(chat_id).filter(|s| !s.is_expired(now)) {
                return Ok(state.turns.clone());
            }
        }

        let state = self.rebuild(chat_id).await?;
        let turns = state.turns.clone();
        self.entries.write().await.insert(chat_id.to_string(), state);
        Ok(turns)
    }

    /// Appends a turn to the durable history, then to the cached entry if
    /// one is live.
    pub async fn record_turn(&self, chat_id: &str, role: MessageRole, text: &str) -> ApiResult<()> {
        let now = self.clock.now();
        let message = StoredMessage {
            id: uuid::Uuid::new_v4().to_string(),
            chat_id: chat_id.to_string(),
            role,
            body: text.to_string(),
            created_at: format_timestamp(now),
        };
        self.message_repo.append_message(&message).await?;

        let mut entries = self.entries.write().await;
        if let Some(state) = entries.get_mut(chat_id).filter(|s| !s.is_expired(now)) {
            state.turns.push(ConversationTurn {
                role,
                text: text.to_string(),
            });
            let overflow = state.turns.len().saturating_sub(self.history_limit);
            state.turns.drain(..overflow);
            state.expires_at = now + self.ttl;
        }
        Ok(())
    }

    pub async fn phase(&self, chat_id: &str) -> ConversationPhase {
        let now = self.clock.now();
        self.entries
            .read()
            .await
            .get(chat_id)
            .filter(|s| !s.is_expired(now))
            .map(|s| s.phase.clone())
            .unwrap_or_default()
    }

    pub async fn set_phase(&self, chat_id: &str, phase: ConversationPhase) -> ApiResult<()> {
        let now = self.clock.now();
        let live = {
            let entries = self.entries.read().await;
            entries.get(chat_id).map(|s| !s.is_expired(now)).unwrap_or(false)
        };
        if !live {
            let state = self.rebuild(chat_id).await?;
            self.entries.write().await.insert(chat_id.to_string(), state);
        }

        let mut entries = self.entries.write().await;
        if let Some(state) = entries.get_mut(chat_id) {
            tracing::debug!("Chat {} phase -> {}", chat_id, phase.label());
            state.phase = phase;
            state.expires_at = now + self.ttl;
        }
        Ok(())
    }

    pub async fn clear_phase(&self, chat_id: &str) {
        if let Some(state) = self.entries.write().await.get_mut(chat_id) {
            state.phase = ConversationPhase::Idle;
        }
    }

    /// Drops expired entries; returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, state| !state.is_expired(now));
        before - entries.len()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    async fn rebuild(&self, chat_id: &str) -> ApiResult<ConversationState> {
        let messages = self
            .message_repo
            .recent_messages(chat_id, self.history_limit as i64)
            .await?;
        tracing::debug!(
            "Rebuilt conversation cache for {} from {} stored messages",
            chat_id,
            messages.len()
        );

        Ok(ConversationState {
            chat_id: chat_id.to_string(),
            turns: messages
                .into_iter()
                .map(|m| ConversationTurn {
                    role: m.role,
                    text: m.body,
                })
                .collect(),
            phase: ConversationPhase::Idle,
            expires_at: self.clock.now() + self.ttl,
        })
    }
}
