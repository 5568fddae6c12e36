pub mod error;
pub mod webhook_signature;

pub use error::*;

use crate::application::services::{ChatService, LeadLifecycleService, RecoveryService};
use crate::domain::ports::lead_repository::LeadRepository;
use crate::domain::ports::professional_repository::ProfessionalRepository;
use std::sync::Arc;

#[derive(Clone, Debug, Default)]
pub struct WebhookSettings {
    pub verify_token: String,
    pub app_secret: Option<String>,
}

#[derive(Clone)]
pub struct AppState {
    pub chat_service: ChatService,
    pub lifecycle_service: LeadLifecycleService,
    pub recovery_service: RecoveryService,
    pub lead_repo: Arc<dyn LeadRepository>,
    pub professional_repo: Arc<dyn ProfessionalRepository>,
    pub webhook: WebhookSettings,
}
