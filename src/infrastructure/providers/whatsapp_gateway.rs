//! WhatsApp Business Cloud API gateway.
//!
//! Outbound text, interactive reply buttons and navigation links, plus the
//! parser that turns a Meta webhook payload into inbound messages.

use crate::domain::entities::{InboundMessage, ReplyButton};
use crate::domain::ports::messaging_gateway::{GatewayError, MessagingGateway};
use async_trait::async_trait;
use serde_json::{json, Value};

const GRAPH_API_BASE: &str = "https://graph.facebook.com/v21.0";

/// Interactive reply messages accept at most this many buttons.
pub const MAX_BUTTONS: usize = 3;
/// Button titles longer than this are rejected by the API.
pub const MAX_BUTTON_TITLE_CHARS: usize = 20;

#[derive(Debug, Clone)]
pub struct WhatsAppConfig {
    pub access_token: String,
    pub phone_number_id: String,
}

pub struct WhatsAppGateway {
    config: WhatsAppConfig,
    base_url: String,
    client: reqwest::Client,
}

impl WhatsAppGateway {
    pub fn new(config: WhatsAppConfig) -> Self {
        Self::with_base_url(config, GRAPH_API_BASE)
    }

    pub fn with_base_url(config: WhatsAppConfig, base_url: &str) -> Self {
        Self {
            config,
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    async fn post_message(&self, to: &str, body: Value) -> Result<(), GatewayError> {
        if self.config.access_token.is_empty() || self.config.phone_number_id.is_empty() {
            return Err(GatewayError::Config(
                "WhatsApp access token or phone number id missing".to_string(),
            ));
        }
        let url = format!("{}/{}/messages", self.base_url, self.config.phone_number_id);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!("WhatsApp message delivered to {}", to);
        Ok(())
    }
}

pub fn text_payload(to: &str, text: &str) -> Value {
    json!({
        "messaging_product": "whatsapp",
        "recipient_type": "individual",
        "to": to,
        "type": "text",
        "text": { "preview_url": true, "body": text }
    })
}

pub fn buttons_payload(to: &str, text: &str, buttons: &[ReplyButton]) -> Value {
    if buttons.len() > MAX_BUTTONS {
        tracing::warn!(
            "Dropping {} reply buttons over the limit of {}",
            buttons.len() - MAX_BUTTONS,
            MAX_BUTTONS
        );
    }
    let buttons: Vec<Value> = buttons
        .iter()
        .take(MAX_BUTTONS)
        .map(|b| {
            json!({
                "type": "reply",
                "reply": { "id": b.id, "title": truncate_title(&b.title) }
            })
        })
        .collect();

    json!({
        "messaging_product": "whatsapp",
        "recipient_type": "individual",
        "to": to,
        "type": "interactive",
        "interactive": {
            "type": "button",
            "body": { "text": text },
            "action": { "buttons": buttons }
        }
    })
}

fn truncate_title(title: &str) -> String {
    title.chars().take(MAX_BUTTON_TITLE_CHARS).collect()
}

/// Waze deep link that starts navigation to `address`.
pub fn navigation_url(address: &str) -> String {
    match reqwest::Url::parse_with_params(
        "https://waze.com/ul",
        &[("q", address), ("navigate", "yes")],
    ) {
        Ok(url) => url.to_string(),
        Err(_) => format!("https://waze.com/ul?q={}", address.replace(' ', "+")),
    }
}

#[async_trait]
impl MessagingGateway for WhatsAppGateway {
    async fn send_text(&self, channel_id: &str, text: &str) -> Result<(), GatewayError> {
        self.post_message(channel_id, text_payload(channel_id, text))
            .await
    }

    async fn send_buttons(
        &self,
        channel_id: &str,
        text: &str,
        buttons: &[ReplyButton],
    ) -> Result<(), GatewayError> {
        if buttons.is_empty() {
            return self.send_text(channel_id, text).await;
        }
        self.post_message(channel_id, buttons_payload(channel_id, text, buttons))
            .await
    }

    async fn send_location_link(
        &self,
        channel_id: &str,
        address: &str,
        prefix: &str,
    ) -> Result<(), GatewayError> {
        let text = format!("{}\n{}", prefix, navigation_url(address));
        self.send_text(channel_id, &text).await
    }

    fn provider_name(&self) -> &'static str {
        "whatsapp"
    }
}

/// Extracts inbound messages from a Meta webhook body. Status callbacks and
/// unsupported message types are skipped.
pub fn parse_webhook_payload(body: &Value) -> Vec<InboundMessage> {
    let mut inbound = Vec::new();

    let Some(entries) = body["entry"].as_array() else {
        return inbound;
    };
    for entry in entries {
        let Some(changes) = entry["changes"].as_array() else {
            continue;
        };
        for change in changes {
            let value = &change["value"];
            let sender_name = value["contacts"][0]["profile"]["name"]
                .as_str()
                .map(str::to_string);
            let Some(messages) = value["messages"].as_array() else {
                continue;
            };

            for msg in messages {
                let Some(from) = msg["from"].as_str().filter(|f| !f.is_empty()) else {
                    continue;
                };
                let mut message = InboundMessage {
                    chat_id: from.to_string(),
                    sender_name: sender_name.clone(),
                    ..Default::default()
                };

                match msg["type"].as_str().unwrap_or("") {
                    "text" => {
                        message.text = msg["text"]["body"].as_str().map(str::to_string);
                    }
                    "interactive" => {
                        let reply = &msg["interactive"]["button_reply"];
                        message.button_id = reply["id"].as_str().map(str::to_string);
                        message.text = reply["title"].as_str().map(str::to_string);
                    }
                    "button" => {
                        message.button_id = msg["button"]["payload"].as_str().map(str::to_string);
                        message.text = msg["button"]["text"].as_str().map(str::to_string);
                    }
                    kind @ ("audio" | "image" | "voice") => {
                        message.media_url = msg[kind]["id"].as_str().map(str::to_string);
                        message.text = msg[kind]["caption"].as_str().map(str::to_string);
                    }
                    other => {
                        tracing::debug!("Skipping unsupported WhatsApp message type {}", other);
                        continue;
                    }
                }

                if message.text.is_none() && message.button_id.is_none() && message.media_url.is_none() {
                    continue;
                }
                inbound.push(message);
            }
        }
    }

    inbound
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buttons_are_capped_and_titles_truncated() {
        let buttons = vec![
            ReplyButton::new("a", "Approve this job right now please"),
            ReplyButton::new("b", "Reject"),
            ReplyButton::new("c", "Later"),
            ReplyButton::new("d", "Never"),
        ];
        let payload = buttons_payload("972500000001", "New job", &buttons);
        let sent = payload["interactive"]["action"]["buttons"].as_array().unwrap();
        assert_eq!(sent.len(), MAX_BUTTONS);
        let title = sent[0]["reply"]["title"].as_str().unwrap();
        assert_eq!(title.chars().count(), MAX_BUTTON_TITLE_CHARS);
    }

    #[test]
    fn test_hebrew_titles_truncate_on_chars() {
        let title = truncate_title("אישור עבודה חדשה עכשיו מיד בבקשה");
        assert_eq!(title.chars().count(), MAX_BUTTON_TITLE_CHARS);
    }

    #[test]
    fn test_navigation_url_is_encoded() {
        let url = navigation_url("Rothschild Blvd 10, Tel Aviv");
        assert!(url.starts_with("https://waze.com/ul?q="));
        assert!(url.contains("navigate=yes"));
        assert!(!url.contains(' '));
    }

    #[test]
    fn test_parse_text_and_button_messages() {
        let body = json!({
            "entry": [{
                "changes": [{
                    "value": {
                        "contacts": [{ "profile": { "name": "Dana" } }],
                        "messages": [
                            { "from": "972500000001", "type": "text", "text": { "body": "Leak in Haifa" } },
                            { "from": "972500000002", "type": "interactive",
                              "interactive": { "button_reply": { "id": "approve_job", "title": "Approve" } } },
                            { "from": "972500000003", "type": "sticker", "sticker": {} }
                        ]
                    }
                }]
            }]
        });

        let parsed = parse_webhook_payload(&body);
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].text.as_deref(), Some("Leak in Haifa"));
        assert_eq!(parsed[0].sender_name.as_deref(), Some("Dana"));
        assert_eq!(parsed[1].button_id.as_deref(), Some("approve_job"));
    }

    #[test]
    fn test_status_callbacks_are_ignored() {
        let body = json!({
            "entry": [{ "changes": [{ "value": { "statuses": [{ "status": "delivered" }] } }] }]
        });
        assert!(parse_webhook_payload(&body).is_empty());
    }
}
