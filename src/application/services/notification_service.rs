use crate::domain::entities::ReplyButton;
use crate::domain::events::SystemEvent;
use crate::domain::ports::event_bus::EventBus;
use crate::domain::ports::messaging_gateway::{GatewayError, MessagingGateway};
use crate::domain::ports::time_service::{Clock, TimeService};
use crate::shared::utils::format_timestamp;
use rand::Rng;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

const MAX_ATTEMPTS: u32 = 3;
const RETRY_DELAYS_MS: [u64; 3] = [500, 1000, 2000]; // Exponential backoff
const MAX_JITTER_MS: u64 = 250;

/// Best-effort outbound delivery. Every call retries a bounded number of
/// times, then logs and reports `false`; it never fails the caller.
#[derive(Clone)]
pub struct NotificationService {
    gateway: Arc<dyn MessagingGateway>,
    time_service: Arc<dyn TimeService>,
    clock: Arc<dyn Clock>,
    event_bus: Arc<dyn EventBus>,
}

impl NotificationService {
    pub fn new(
        gateway: Arc<dyn MessagingGateway>,
        time_service: Arc<dyn TimeService>,
        clock: Arc<dyn Clock>,
        event_bus: Arc<dyn EventBus>,
    ) -> Self {
        Self {
            gateway,
            time_service,
            clock,
            event_bus,
        }
    }

    pub async fn send_text(&self, channel_id: &str, text: &str) -> bool {
        self.deliver(channel_id, || self.gateway.send_text(channel_id, text))
            .await
    }

    pub async fn send_buttons(&self, channel_id: &str, text: &str, buttons: &[ReplyButton]) -> bool {
        self.deliver(channel_id, || {
            self.gateway.send_buttons(channel_id, text, buttons)
        })
        .await
    }

    pub async fn send_location_link(&self, channel_id: &str, address: &str, prefix: &str) -> bool {
        self.deliver(channel_id, || {
            self.gateway.send_location_link(channel_id, address, prefix)
        })
        .await
    }

    async fn deliver<F, Fut>(&self, channel_id: &str, send: F) -> bool
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<(), GatewayError>>,
    {
        if channel_id.trim().is_empty() {
            tracing::warn!("Skipping notification with empty channel id");
            return false;
        }

        let mut attempt = 0;
        loop {
            attempt += 1;
            match send().await {
                Ok(()) => return true,
                Err(GatewayError::Config(reason)) => {
                    tracing::error!(
                        "Gateway {} misconfigured, not retrying message to {}: {}",
                        self.gateway.provider_name(),
                        channel_id,
                        reason
                    );
                    break;
                }
                Err(e) if attempt < MAX_ATTEMPTS => {
                    let delay_ms = RETRY_DELAYS_MS[(attempt - 1) as usize] + jitter_ms();
                    tracing::warn!(
                        "Delivery to {} failed on attempt {}, retrying in {}ms: {}",
                        channel_id,
                        attempt,
                        delay_ms,
                        e
                    );
                    self.time_service
                        .sleep(Duration::from_millis(delay_ms))
                        .await;
                }
                Err(e) => {
                    tracing::error!(
                        "Giving up on message to {} after {} attempts: {}",
                        channel_id,
                        attempt,
                        e
                    );
                    break;
                }
            }
        }

        self.event_bus.publish(SystemEvent::NotificationFailed {
            channel_id: channel_id.to_string(),
            attempts: attempt,
            timestamp: format_timestamp(self.clock.now()),
        });
        false
    }
}

fn jitter_ms() -> u64 {
    rand::thread_rng().gen_range(0..=MAX_JITTER_MS)
}
