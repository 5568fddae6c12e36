use crate::domain::entities::ReplyButton;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Gateway request failed: {0}")]
    Transport(String),
    #[error("Gateway rejected message ({status}): {body}")]
    Rejected { status: u16, body: String },
    #[error("Gateway misconfigured: {0}")]
    Config(String),
}

/// Outbound chat channel.
#[async_trait]
pub trait MessagingGateway: Send + Sync {
    async fn send_text(&self, channel_id: &str, text: &str) -> Result<(), GatewayError>;

    async fn send_buttons(
        &self,
        channel_id: &str,
        text: &str,
        buttons: &[ReplyButton],
    ) -> Result<(), GatewayError>;

    /// Sends a navigation link for `address`, preceded by `prefix`.
    async fn send_location_link(
        &self,
        channel_id: &str,
        address: &str,
        prefix: &str,
    ) -> Result<(), GatewayError>;

    fn provider_name(&self) -> &'static str;
}
