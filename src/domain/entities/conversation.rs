use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<String> for MessageRole {
    fn from(s: String) -> Self {
        match s.as_str() {
            "assistant" => MessageRole::Assistant,
            _ => MessageRole::User,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: MessageRole,
    pub text: String,
}

impl ConversationTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            text: text.into(),
        }
    }
}

/// Durable history row; the source of truth the cache is rebuilt from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredMessage {
    pub id: String,
    pub chat_id: String,
    pub role: MessageRole,
    pub body: String,
    pub created_at: String,
}

/// Short-lived conversation phase kept only in the cache.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConversationPhase {
    #[default]
    Idle,
    /// The customer just rated a job; their next text is a review comment.
    AwaitingReview { lead_id: String },
}

impl ConversationPhase {
    pub fn label(&self) -> &'static str {
        match self {
            ConversationPhase::Idle => "idle",
            ConversationPhase::AwaitingReview { .. } => "awaiting_review",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConversationState {
    pub chat_id: String,
    pub turns: Vec<ConversationTurn>,
    pub phase: ConversationPhase,
    pub expires_at: DateTime<Utc>,
}

impl ConversationState {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// One inbound message as handed over by a gateway webhook.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InboundMessage {
    pub chat_id: String,
    #[serde(default)]
    pub text: Option<String>,
    /// Reply-button id when the message is an interactive reply.
    #[serde(default)]
    pub button_id: Option<String>,
    #[serde(default)]
    pub media_url: Option<String>,
    #[serde(default)]
    pub sender_name: Option<String>,
}

impl InboundMessage {
    pub fn text(chat_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            chat_id: chat_id.into(),
            text: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn button(chat_id: impl Into<String>, button_id: impl Into<String>) -> Self {
        Self {
            chat_id: chat_id.into(),
            button_id: Some(button_id.into()),
            ..Default::default()
        }
    }

    pub fn trimmed_text(&self) -> Option<&str> {
        self.text
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

/// Reply button offered through the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyButton {
    pub id: String,
    pub title: String,
}

impl ReplyButton {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
        }
    }
}
