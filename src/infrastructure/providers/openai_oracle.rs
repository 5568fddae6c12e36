//! OpenAI-compatible chat-completions client used as the language oracle.

use crate::domain::entities::{ConversationTurn, MessageRole, NluInput, NluOutcome};
use crate::domain::ports::nlu_oracle::{NluError, NluOracle};
use async_trait::async_trait;
use serde_json::{json, Value};

const SYSTEM_PROMPT: &str = "You are the dispatcher of a home-services network. \
Talk to the customer in their language, find out the city, the issue, the full \
address and a visit time. Answer ONLY with a JSON object of the form \
{\"reply_text\": string, \"transcription\": string|null, \"extracted\": \
{\"city\": string|null, \"issue\": string|null, \"full_address\": string|null, \
\"appointment_time\": string|null}, \"is_deal\": boolean}. When the customer has \
agreed on time and address, set is_deal to true and end reply_text with \
[DEAL: <time> | <address> | <issue>].";

#[derive(Debug, Clone)]
pub struct OpenAiOracleConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

pub struct OpenAiOracle {
    config: OpenAiOracleConfig,
    client: reqwest::Client,
}

impl OpenAiOracle {
    pub fn new(config: OpenAiOracleConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    fn build_messages(history: &[ConversationTurn], input: &NluInput) -> Vec<Value> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(json!({ "role": "system", "content": SYSTEM_PROMPT }));
        for turn in history {
            messages.push(json!({ "role": turn.role.as_str(), "content": turn.text }));
        }

        let mut content = input.text.clone().unwrap_or_default();
        if let Some(media) = &input.media_url {
            if !content.is_empty() {
                content.push('\n');
            }
            content.push_str(&format!("[media attached: {}]", media));
        }
        messages.push(json!({ "role": MessageRole::User.as_str(), "content": content }));
        messages
    }
}

/// Parses the model's message content, tolerating a fenced code block.
pub fn parse_outcome(content: &str) -> Result<NluOutcome, NluError> {
    let trimmed = content.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .unwrap_or(trimmed)
        .trim();

    let outcome: NluOutcome =
        serde_json::from_str(body).map_err(|e| NluError::Malformed(e.to_string()))?;
    if outcome.reply_text.trim().is_empty() {
        return Err(NluError::Malformed("empty reply_text".to_string()));
    }
    Ok(outcome)
}

#[async_trait]
impl NluOracle for OpenAiOracle {
    async fn analyze(
        &self,
        history: &[ConversationTurn],
        input: &NluInput,
    ) -> Result<NluOutcome, NluError> {
        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));
        let body = json!({
            "model": self.config.model,
            "messages": Self::build_messages(history, input),
            "response_format": { "type": "json_object" },
            "temperature": 0.3,
        });

        let mut request = self.client.post(&url).json(&body);
        if !self.config.api_key.is_empty() {
            request = request.bearer_auth(&self.config.api_key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| NluError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(NluError::Unavailable(format!("{}: {}", status, text)));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| NluError::Malformed(e.to_string()))?;
        let content = payload["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| NluError::Malformed("missing choices[0].message.content".to_string()))?;

        tracing::debug!("Oracle replied with {} chars", content.len());
        parse_outcome(content)
    }
}

/// Stand-in oracle for deployments without credentials; every call fails
/// so conversations fall back to the clarifying reply.
#[derive(Clone, Default)]
pub struct UnconfiguredOracle;

#[async_trait]
impl NluOracle for UnconfiguredOracle {
    async fn analyze(
        &self,
        _history: &[ConversationTurn],
        _input: &NluInput,
    ) -> Result<NluOutcome, NluError> {
        Err(NluError::Unavailable("no oracle configured".to_string()))
    }
}
