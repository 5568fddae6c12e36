#![allow(dead_code)]
pub mod fakes;
pub mod test_db;

pub use fakes::*;
pub use test_db::*;

use chrono::{DateTime, Duration, TimeZone, Utc};
use leaddesk::application::services::*;
use leaddesk::domain::entities::{GeoPoint, Lead, LeadStatus, Professional, Slot};
use leaddesk::domain::ports::event_bus::EventBus;
use leaddesk::domain::ports::lead_repository::LeadRepository;
use leaddesk::domain::ports::message_repository::MessageRepository;
use leaddesk::domain::ports::professional_repository::ProfessionalRepository;
use leaddesk::domain::ports::slot_repository::SlotRepository;
use leaddesk::domain::ports::system_config_repository::SystemConfigRepository;
use leaddesk::domain::ports::time_service::Clock;
use leaddesk::domain::services::escalation::BusinessHours;
use leaddesk::domain::services::geo::resolve_place;
use leaddesk::infrastructure::persistence::Database;
use leaddesk::shared::utils::format_timestamp;
use leaddesk::LocalEventBus;
use std::sync::Arc;

pub const OPERATOR_CHAT: &str = "972500009999";
pub const CUSTOMER_CHAT: &str = "972500000001";

/// 12:00 in Jerusalem, inside business hours.
pub fn midday() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 10, 10, 0, 0).unwrap()
}

/// Every service wired over one test database and the recording fakes.
pub struct TestApp {
    pub db: Database,
    pub gateway: Arc<RecordingGateway>,
    pub oracle: Arc<ScriptedOracle>,
    pub clock: Arc<FixedClock>,
    pub event_bus: Arc<dyn EventBus>,
    pub lead_repo: Arc<dyn LeadRepository>,
    pub professional_repo: Arc<dyn ProfessionalRepository>,
    pub slot_repo: Arc<dyn SlotRepository>,
    pub config_repo: Arc<dyn SystemConfigRepository>,
    pub message_repo: Arc<dyn MessageRepository>,
    pub matching: MatchingService,
    pub slots: SlotService,
    pub lifecycle: LeadLifecycleService,
    pub cache: ConversationCache,
    pub chat: ChatService,
    pub recovery: RecoveryService,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::at(midday()).await
    }

    pub async fn at(now: DateTime<Utc>) -> Self {
        let db = setup_test_db().await;
        let gateway = Arc::new(RecordingGateway::new());
        let oracle = Arc::new(ScriptedOracle::new());
        let clock = Arc::new(FixedClock::new(now));
        let event_bus: Arc<dyn EventBus> = Arc::new(LocalEventBus::new(100));

        let lead_repo: Arc<dyn LeadRepository> = Arc::new(db.clone());
        let professional_repo: Arc<dyn ProfessionalRepository> = Arc::new(db.clone());
        let slot_repo: Arc<dyn SlotRepository> = Arc::new(db.clone());
        let config_repo: Arc<dyn SystemConfigRepository> = Arc::new(db.clone());
        let message_repo: Arc<dyn MessageRepository> = Arc::new(db.clone());

        let notifications = NotificationService::new(
            gateway.clone(),
            Arc::new(InstantTimeService),
            clock.clone(),
            event_bus.clone(),
        );
        let matching = MatchingService::new(professional_repo.clone(), lead_repo.clone());
        let slots = SlotService::new(slot_repo.clone());
        let lifecycle = LeadLifecycleService::new(
            lead_repo.clone(),
            professional_repo.clone(),
            matching.clone(),
            slots.clone(),
            notifications.clone(),
            event_bus.clone(),
            clock.clone(),
        );
        let cache = ConversationCache::new(
            message_repo.clone(),
            clock.clone(),
            Duration::minutes(30),
            20,
        );
        let chat = ChatService::new(
            lifecycle.clone(),
            lead_repo.clone(),
            professional_repo.clone(),
            cache.clone(),
            oracle.clone(),
            notifications.clone(),
        );
        let daily_summary = DailySummaryService::new(
            lead_repo.clone(),
            config_repo.clone(),
            notifications.clone(),
            chrono_tz::Asia::Jerusalem,
            OPERATOR_CHAT.to_string(),
        );
        let recovery = RecoveryService::new(
            lead_repo.clone(),
            config_repo.clone(),
            lifecycle.clone(),
            matching.clone(),
            notifications,
            daily_summary,
            clock.clone(),
            RecoveryConfig {
                business_hours: BusinessHours {
                    timezone: chrono_tz::Asia::Jerusalem,
                    start_hour: 8,
                    end_hour: 21,
                },
                sos_timeout: Duration::minutes(30),
                operator_chat_id: OPERATOR_CHAT.to_string(),
            },
        );

        Self {
            db,
            gateway,
            oracle,
            clock,
            event_bus,
            lead_repo,
            professional_repo,
            slot_repo,
            config_repo,
            message_repo,
            matching,
            slots,
            lifecycle,
            cache,
            chat,
            recovery,
        }
    }

    /// Active professional located at a known place.
    pub async fn add_professional(&self, name: &str, phone: &str, place: &str) -> Professional {
        let location = resolve_place(place);
        self.add_professional_with(name, phone, vec![place.to_string()], location, 5.0)
            .await
    }

    pub async fn add_professional_with(
        &self,
        name: &str,
        phone: &str,
        service_areas: Vec<String>,
        location: Option<GeoPoint>,
        rating: f64,
    ) -> Professional {
        let mut pro = Professional::new(
            name.to_string(),
            phone.to_string(),
            service_areas,
            vec!["plumbing".to_string(), "pipe".to_string()],
            location,
        )
        .unwrap();
        pro.rating = rating;
        self.professional_repo.create_professional(&pro).await.unwrap();
        pro
    }

    /// Stores a lead directly in `status`, created `age` before the clock's now.
    pub async fn add_lead(
        &self,
        chat_id: &str,
        status: LeadStatus,
        pro_id: Option<&str>,
        age: Duration,
    ) -> Lead {
        let created = format_timestamp(self.clock.now() - age);
        let lead = Lead {
            id: uuid::Uuid::new_v4().to_string(),
            chat_id: chat_id.to_string(),
            status,
            pro_id: pro_id.map(str::to_string),
            city: Some("Tel Aviv".to_string()),
            issue_type: Some("Broken Pipe".to_string()),
            full_address: Some("Rothschild Blvd 10, Tel Aviv".to_string()),
            appointment_time: Some("Tomorrow 10:00 AM".to_string()),
            created_at: created.clone(),
            updated_at: created,
            completed_at: None,
            waiting_for_rating: false,
            rating_given: None,
            review_comment: None,
            flag: None,
            reassigned_from: None,
        };
        self.lead_repo.create_lead(&lead).await.unwrap();
        lead
    }

    pub async fn add_slot(&self, pro_id: &str, start: DateTime<Utc>) -> Slot {
        let slot = Slot::new(pro_id.to_string(), start, start + Duration::hours(1)).unwrap();
        self.slot_repo.create_slot(&slot).await.unwrap();
        slot
    }

    pub async fn lead(&self, id: &str) -> Lead {
        self.lead_repo.get_lead_by_id(id).await.unwrap().unwrap()
    }

    pub async fn professional(&self, id: &str) -> Professional {
        self.professional_repo
            .get_professional_by_id(id)
            .await
            .unwrap()
            .unwrap()
    }
}
