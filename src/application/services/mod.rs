pub mod chat_service;
pub mod conversation_cache;
pub mod daily_summary_service;
pub mod lead_lifecycle_service;
pub mod matching_service;
pub mod notification_service;
pub mod recovery_service;
pub mod slot_service;

pub use chat_service::ChatService;
pub use conversation_cache::ConversationCache;
pub use daily_summary_service::DailySummaryService;
pub use lead_lifecycle_service::{CommandOutcome, LeadLifecycleService, RatingApplied};
pub use matching_service::{MatchStrategy, MatchingService, MAX_PRO_LOAD};
pub use notification_service::NotificationService;
pub use recovery_service::{RecoveryConfig, RecoveryService};
pub use slot_service::SlotService;
