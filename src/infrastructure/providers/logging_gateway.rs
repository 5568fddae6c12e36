use crate::domain::entities::ReplyButton;
use crate::domain::ports::messaging_gateway::{GatewayError, MessagingGateway};
use async_trait::async_trait;

/// Development gateway: writes every outbound message to the log.
#[derive(Clone, Default)]
pub struct LoggingGateway;

impl LoggingGateway {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MessagingGateway for LoggingGateway {
    async fn send_text(&self, channel_id: &str, text: &str) -> Result<(), GatewayError> {
        tracing::info!(channel = channel_id, "Outbound text: {}", text);
        Ok(())
    }

    async fn send_buttons(
        &self,
        channel_id: &str,
        text: &str,
        buttons: &[ReplyButton],
    ) -> Result<(), GatewayError> {
        let ids: Vec<&str> = buttons.iter().map(|b| b.id.as_str()).collect();
        tracing::info!(channel = channel_id, buttons = ?ids, "Outbound buttons: {}", text);
        Ok(())
    }

    async fn send_location_link(
        &self,
        channel_id: &str,
        address: &str,
        prefix: &str,
    ) -> Result<(), GatewayError> {
        tracing::info!(channel = channel_id, "Outbound location: {} {}", prefix, address);
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "log"
    }
}
