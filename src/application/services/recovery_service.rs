//! Stale-lead recovery: the booked-job monitor, the healer and the reporter.
//!
//! Every sweep reads its toggle from `system_config` on each run and is safe
//! to repeat: the only repeated side effects are duplicate notifications.

use crate::application::services::lead_lifecycle_service::{
    job_button_id, CONFIRM_DONE_PREFIX, FINISH_BUTTON_ID, NOT_DONE_PREFIX,
};
use crate::application::services::{
    DailySummaryService, LeadLifecycleService, MatchingService, NotificationService,
};
use crate::domain::entities::{
    parse_toggle, HealerReport, Lead, LeadStatus, MonitorReport, RecoverySettings, ReplyButton,
    ReporterReport, SweepKind, SweepOutcome, DAILY_LAST_RUN_KEY, DAILY_REPORT_TIME_KEY,
    HEALER_ENABLED_KEY, MONITOR_ENABLED_KEY, REPORTER_ENABLED_KEY,
};
use crate::domain::ports::lead_repository::LeadRepository;
use crate::domain::ports::system_config_repository::SystemConfigRepository;
use crate::domain::ports::time_service::Clock;
use crate::domain::services::escalation::{
    classify_booked_age, BookedTier, BusinessHours, REMIND_PROFESSIONAL_AFTER_HOURS,
};
use crate::infrastructure::http::middleware::error::ApiResult;
use crate::shared::utils::format_timestamp;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct RecoveryConfig {
    pub business_hours: BusinessHours,
    /// Age after which a pre-booking lead counts as stuck.
    pub sos_timeout: Duration,
    pub operator_chat_id: String,
}

#[derive(Clone)]
pub struct RecoveryService {
    lead_repo: Arc<dyn LeadRepository>,
    config_repo: Arc<dyn SystemConfigRepository>,
    lifecycle: LeadLifecycleService,
    matching: MatchingService,
    notifications: NotificationService,
    daily_summary: DailySummaryService,
    clock: Arc<dyn Clock>,
    config: RecoveryConfig,
}

impl RecoveryService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        lead_repo: Arc<dyn LeadRepository>,
        config_repo: Arc<dyn SystemConfigRepository>,
        lifecycle: LeadLifecycleService,
        matching: MatchingService,
        notifications: NotificationService,
        daily_summary: DailySummaryService,
        clock: Arc<dyn Clock>,
        config: RecoveryConfig,
    ) -> Self {
        Self {
            lead_repo,
            config_repo,
            lifecycle,
            matching,
            notifications,
            daily_summary,
            clock,
            config,
        }
    }

    /// Reads the shared configuration record. Unset or unparsable values
    /// fall back to their defaults.
    pub async fn load_settings(&self) -> ApiResult<RecoverySettings> {
        let mut settings = RecoverySettings::default();

        if let Some(v) = self.config_repo.get_config_value(MONITOR_ENABLED_KEY).await? {
            settings.monitor_enabled = parse_toggle(&v);
        }
        if let Some(v) = self.config_repo.get_config_value(HEALER_ENABLED_KEY).await? {
            settings.healer_enabled = parse_toggle(&v);
        }
        if let Some(v) = self.config_repo.get_config_value(REPORTER_ENABLED_KEY).await? {
            settings.reporter_enabled = parse_toggle(&v);
        }
        if let Some(v) = self.config_repo.get_config_value(DAILY_REPORT_TIME_KEY).await? {
            match NaiveTime::parse_from_str(v.trim(), "%H:%M") {
                Ok(time) => settings.daily_report_time = time,
                Err(_) => tracing::warn!("Ignoring malformed {}: '{}'", DAILY_REPORT_TIME_KEY, v),
            }
        }
        if let Some(v) = self.config_repo.get_config_value(DAILY_LAST_RUN_KEY).await? {
            settings.last_run_date = NaiveDate::parse_from_str(v.trim(), "%Y-%m-%d").ok();
        }

        Ok(settings)
    }

    pub async fn run_sweep(&self, kind: SweepKind) -> ApiResult<SweepOutcome> {
        let settings = self.load_settings().await?;
        if !settings.is_enabled(kind) {
            tracing::debug!("Sweep {} is disabled", kind);
            return Ok(SweepOutcome::Disabled);
        }

        let now = self.clock.now();
        let outcome = match kind {
            SweepKind::BookedMonitor => SweepOutcome::BookedMonitor(self.run_booked_monitor(now).await?),
            SweepKind::Healer => SweepOutcome::Healer(self.run_healer(now).await?),
            SweepKind::Reporter => SweepOutcome::Reporter(self.run_reporter(now).await?),
            SweepKind::DailySummary => SweepOutcome::DailySummary {
                sent: self.daily_summary.run(now, &settings).await?,
            },
        };
        tracing::info!("Sweep {} finished: {:?}", kind, outcome);
        Ok(outcome)
    }

    /// Tiered follow-up on booked jobs; only inside business hours.
    pub async fn run_booked_monitor(&self, now: DateTime<Utc>) -> ApiResult<MonitorReport> {
        let mut report = MonitorReport::default();
        if !self.config.business_hours.contains(now) {
            report.skipped_outside_hours = true;
            return Ok(report);
        }

        let cutoff = format_timestamp(now - Duration::hours(REMIND_PROFESSIONAL_AFTER_HOURS));
        let booked = self
            .lead_repo
            .find_leads_created_before(&[LeadStatus::Booked], &cutoff)
            .await?;

        for lead in booked {
            let Some(age) = lead.age(now) else {
                tracing::warn!("Lead {} has unreadable created_at {}", lead.id, lead.created_at);
                continue;
            };

            match classify_booked_age(age) {
                BookedTier::TooFresh => {}
                BookedTier::RemindProfessional => {
                    if self.remind_professional(&lead).await? {
                        report.reminders_sent += 1;
                    }
                }
                BookedTier::AskCustomer => {
                    if self.ask_customer_to_confirm(&lead).await {
                        report.completion_checks_sent += 1;
                    }
                }
                BookedTier::Escalate => {
                    if self.lifecycle.flag_requires_admin(&lead).await? {
                        report.newly_flagged += 1;
                        self.notifications
                            .send_text(
                                &self.config.operator_chat_id,
                                &format!(
                                    "Lead {} (chat {}) has been booked for over 24h without completion.",
                                    lead.id, lead.chat_id
                                ),
                            )
                            .await;
                    }
                }
            }
        }

        Ok(report)
    }

    async fn remind_professional(&self, lead: &Lead) -> ApiResult<bool> {
        let Some(pro) = self.lifecycle.assigned_professional(lead).await? else {
            tracing::warn!("Booked lead {} has no reachable professional", lead.id);
            return Ok(false);
        };
        let text = format!(
            "Reminder: the {} job at {} is still open. Tap when it is done.",
            lead.issue_type.as_deref().unwrap_or("booked"),
            lead.full_address
                .as_deref()
                .or(lead.city.as_deref())
                .unwrap_or("the customer's address")
        );
        Ok(self
            .notifications
            .send_buttons(
                &pro.phone,
                &text,
                &[ReplyButton::new(
                    job_button_id(FINISH_BUTTON_ID, &lead.id),
                    "Job done",
                )],
            )
            .await)
    }

    async fn ask_customer_to_confirm(&self, lead: &Lead) -> bool {
        self.notifications
            .send_buttons(
                &lead.chat_id,
                "Was the job completed?",
                &[
                    ReplyButton::new(format!("{}{}", CONFIRM_DONE_PREFIX, lead.id), "Yes, done"),
                    ReplyButton::new(format!("{}{}", NOT_DONE_PREFIX, lead.id), "Not yet"),
                ],
            )
            .await
    }

    /// Pre-booking leads older than the SOS timeout.
    async fn stale_leads(&self, now: DateTime<Utc>) -> ApiResult<Vec<Lead>> {
        let cutoff = format_timestamp(now - self.config.sos_timeout);
        self.lead_repo
            .find_leads_created_before(&LeadStatus::PRE_BOOKING, &cutoff)
            .await
    }

    /// Moves stuck leads to another professional. Unmatched leads stay as
    /// they are for the next sweep and the reporter.
    pub async fn run_healer(&self, now: DateTime<Utc>) -> ApiResult<HealerReport> {
        let mut report = HealerReport::default();

        for lead in self.stale_leads(now).await? {
            report.examined += 1;
            self.notifications
                .send_text(
                    &lead.chat_id,
                    "Sorry for the wait! We are connecting you with another professional.",
                )
                .await;

            let Some(location) = lead.routing_location() else {
                tracing::warn!("Stale lead {} has no location to route on", lead.id);
                report.unmatched += 1;
                continue;
            };
            let exclude: Vec<String> = lead.pro_id.iter().cloned().collect();
            let issue = lead.issue_type.as_deref().unwrap_or_default();

            let Some(new_pro) = self.matching.find_professional(issue, location, &exclude).await else {
                report.unmatched += 1;
                continue;
            };

            match self.lifecycle.reassign(&lead, &new_pro).await {
                Ok(true) => {
                    report.reassigned += 1;
                    self.lifecycle.offer_job(&new_pro, &lead).await;
                    if let Ok(Some(previous)) = self.lifecycle.assigned_professional(&lead).await {
                        self.notifications
                            .send_text(
                                &previous.phone,
                                &format!(
                                    "The {} request in {} was passed to another professional.",
                                    issue, location
                                ),
                            )
                            .await;
                    }
                }
                Ok(false) => {
                    tracing::info!("Lead {} changed during healing; skipping", lead.id);
                }
                Err(e) => {
                    tracing::error!("Reassigning lead {} failed: {}", lead.id, e);
                    report.unmatched += 1;
                }
            }
        }

        Ok(report)
    }

    /// One digest of leads still stuck, sent to the operator.
    pub async fn run_reporter(&self, now: DateTime<Utc>) -> ApiResult<ReporterReport> {
        let stuck = self.stale_leads(now).await?;
        let mut report = ReporterReport {
            stuck_leads: stuck.len(),
            digest_sent: false,
        };
        if stuck.is_empty() {
            return Ok(report);
        }

        report.digest_sent = self
            .notifications
            .send_text(&self.config.operator_chat_id, &stuck_digest(&stuck, now))
            .await;
        Ok(report)
    }
}

pub fn stuck_digest(leads: &[Lead], now: DateTime<Utc>) -> String {
    let mut digest = format!("{} leads are still waiting for a professional:", leads.len());
    for lead in leads {
        let waited = lead.age(now).unwrap_or_else(Duration::zero);
        digest.push_str(&format!(
            "\n- {} | {} | {} | waiting {}h {}m",
            lead.chat_id,
            lead.issue_type.as_deref().unwrap_or("?"),
            lead.routing_location().unwrap_or("?"),
            waited.num_hours(),
            waited.num_minutes() % 60
        ));
    }
    digest
}
