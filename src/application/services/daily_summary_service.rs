use crate::application::services::NotificationService;
use crate::domain::entities::{LeadStatus, RecoverySettings};
use crate::domain::ports::lead_repository::LeadRepository;
use crate::domain::ports::system_config_repository::SystemConfigRepository;
use crate::infrastructure::http::middleware::error::ApiResult;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::sync::Arc;

/// The once-a-day operator summary. Replicas race on the `last_run_date`
/// guard; exactly one of them sends per local date.
#[derive(Clone)]
pub struct DailySummaryService {
    lead_repo: Arc<dyn LeadRepository>,
    config_repo: Arc<dyn SystemConfigRepository>,
    notifications: NotificationService,
    timezone: Tz,
    operator_chat_id: String,
}

impl DailySummaryService {
    pub fn new(
        lead_repo: Arc<dyn LeadRepository>,
        config_repo: Arc<dyn SystemConfigRepository>,
        notifications: NotificationService,
        timezone: Tz,
        operator_chat_id: String,
    ) -> Self {
        Self {
            lead_repo,
            config_repo,
            notifications,
            timezone,
            operator_chat_id,
        }
    }

    /// True when this call won today's run and sent the summary.
    pub async fn run(&self, now: DateTime<Utc>, settings: &RecoverySettings) -> ApiResult<bool> {
        let local = now.with_timezone(&self.timezone);
        if local.time() < settings.daily_report_time {
            return Ok(false);
        }
        let today = local.date_naive();
        if settings.last_run_date == Some(today) {
            return Ok(false);
        }

        let today = today.format("%Y-%m-%d").to_string();
        if !self.config_repo.try_mark_daily_run(&today).await? {
            tracing::debug!("Daily summary for {} already taken by another runner", today);
            return Ok(false);
        }

        let counts = self.lead_repo.count_leads_by_status().await?;
        let flagged = self.lead_repo.count_flagged_leads().await?;
        let text = summary_text(&today, &counts, flagged);

        tracing::info!("Sending daily summary for {}", today);
        self.notifications
            .send_text(&self.operator_chat_id, &text)
            .await;
        Ok(true)
    }
}

pub fn summary_text(date: &str, counts: &[(LeadStatus, i64)], flagged: i64) -> String {
    let mut text = format!("Daily summary {}", date);
    if counts.is_empty() {
        text.push_str("\nNo leads yet.");
    }
    for (status, total) in counts {
        text.push_str(&format!("\n{}: {}", status, total));
    }
    text.push_str(&format!("\nNeeding admin attention: {}", flagged));
    text
}
