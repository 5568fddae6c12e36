use crate::application::services::*;
use crate::config::Config;
use crate::domain::ports::event_bus::EventBus;
use crate::domain::ports::lead_repository::LeadRepository;
use crate::domain::ports::message_repository::MessageRepository;
use crate::domain::ports::messaging_gateway::MessagingGateway;
use crate::domain::ports::nlu_oracle::NluOracle;
use crate::domain::ports::professional_repository::ProfessionalRepository;
use crate::domain::ports::slot_repository::SlotRepository;
use crate::domain::ports::system_config_repository::SystemConfigRepository;
use crate::domain::ports::time_service::{Clock, TimeService};
use crate::domain::services::escalation::BusinessHours;
use crate::infrastructure::http::middleware::{AppState, WebhookSettings};
use crate::infrastructure::persistence::Database;
use crate::infrastructure::providers::{
    LoggingGateway, OpenAiOracle, OpenAiOracleConfig, UnconfiguredOracle, WhatsAppConfig,
    WhatsAppGateway,
};
use crate::infrastructure::runtime::{SystemClock, TokioTimeService};
use crate::infrastructure::workers::{PeriodicTask, Scheduler};
use crate::shared::events::LocalEventBus;
use std::sync::Arc;

const EVENT_BUS_CAPACITY: usize = 1000;
const CACHE_PURGE_INTERVAL_SECS: u64 = 300;

fn select_gateway(config: &Config) -> Arc<dyn MessagingGateway> {
    match &config.whatsapp {
        Some(settings) => {
            tracing::info!("Outbound messages go through the WhatsApp Cloud API");
            Arc::new(WhatsAppGateway::new(WhatsAppConfig {
                access_token: settings.access_token.clone(),
                phone_number_id: settings.phone_number_id.clone(),
            }))
        }
        None => {
            tracing::warn!("WhatsApp credentials not set; outbound messages are only logged");
            Arc::new(LoggingGateway::new())
        }
    }
}

fn select_oracle(config: &Config) -> Arc<dyn NluOracle> {
    match &config.oracle {
        Some(settings) => {
            tracing::info!("Language oracle at {} (model {})", settings.base_url, settings.model);
            Arc::new(OpenAiOracle::new(OpenAiOracleConfig {
                base_url: settings.base_url.clone(),
                api_key: settings.api_key.clone(),
                model: settings.model.clone(),
            }))
        }
        None => {
            tracing::warn!("NLU_BASE_URL not set; customers will get the clarifying reply");
            Arc::new(UnconfiguredOracle)
        }
    }
}

/// Wires repositories, providers and services, and starts the background tasks.
pub async fn build_app_state(
    db: Database,
    config: &Config,
) -> Result<AppState, Box<dyn std::error::Error>> {
    let lead_repo: Arc<dyn LeadRepository> = Arc::new(db.clone());
    let professional_repo: Arc<dyn ProfessionalRepository> = Arc::new(db.clone());
    let slot_repo: Arc<dyn SlotRepository> = Arc::new(db.clone());
    let message_repo: Arc<dyn MessageRepository> = Arc::new(db.clone());
    let config_repo: Arc<dyn SystemConfigRepository> = Arc::new(db.clone());

    let clock: Arc<dyn Clock> = Arc::new(SystemClock::new());
    let time_service: Arc<dyn TimeService> = Arc::new(TokioTimeService::new());

    let event_bus: Arc<dyn EventBus> = Arc::new(LocalEventBus::new(EVENT_BUS_CAPACITY));
    tracing::info!("Event bus initialized with capacity {}", EVENT_BUS_CAPACITY);

    let metrics_bus = event_bus.clone();
    tokio::spawn(async move {
        crate::application::listeners::run_metrics_listener(metrics_bus).await;
    });

    let notifications = NotificationService::new(
        select_gateway(config),
        time_service,
        clock.clone(),
        event_bus.clone(),
    );
    let matching = MatchingService::new(professional_repo.clone(), lead_repo.clone());
    let slots = SlotService::new(slot_repo);

    let lifecycle_service = LeadLifecycleService::new(
        lead_repo.clone(),
        professional_repo.clone(),
        matching.clone(),
        slots,
        notifications.clone(),
        event_bus.clone(),
        clock.clone(),
    );

    let cache = ConversationCache::new(
        message_repo,
        clock.clone(),
        chrono::Duration::seconds(config.conversation_cache_ttl_secs),
        config.conversation_history_limit,
    );

    let chat_service = ChatService::new(
        lifecycle_service.clone(),
        lead_repo.clone(),
        professional_repo.clone(),
        cache.clone(),
        select_oracle(config),
        notifications.clone(),
    );

    let daily_summary = DailySummaryService::new(
        lead_repo.clone(),
        config_repo.clone(),
        notifications.clone(),
        config.timezone,
        config.operator_chat_id.clone(),
    );

    let recovery_service = RecoveryService::new(
        lead_repo.clone(),
        config_repo,
        lifecycle_service.clone(),
        matching,
        notifications,
        daily_summary,
        clock,
        RecoveryConfig {
            business_hours: BusinessHours {
                timezone: config.timezone,
                start_hour: config.business_hours_start,
                end_hour: config.business_hours_end,
            },
            sos_timeout: chrono::Duration::minutes(config.sos_timeout_minutes),
            operator_chat_id: config.operator_chat_id.clone(),
        },
    );

    Scheduler::new(recovery_service.clone(), PeriodicTask::from_config(config)).start();
    tracing::info!("Recovery scheduler started");

    tokio::spawn(async move {
        use tokio::time::{interval, Duration};
        let mut purge_interval = interval(Duration::from_secs(CACHE_PURGE_INTERVAL_SECS));
        loop {
            purge_interval.tick().await;
            let purged = cache.purge_expired().await;
            if purged > 0 {
                tracing::debug!("Purged {} idle conversation cache entries", purged);
            }
        }
    });

    Ok(AppState {
        chat_service,
        lifecycle_service,
        recovery_service,
        lead_repo,
        professional_repo,
        webhook: WebhookSettings {
            verify_token: config.webhook_verify_token.clone(),
            app_secret: config.webhook_app_secret.clone(),
        },
    })
}
