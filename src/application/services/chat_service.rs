//! Inbound message pipeline.
//!
//! Routing order: professional commands, customer buttons, cancel keyword,
//! rating digit, review window, then the language-oracle conversation.

use crate::application::services::lead_lifecycle_service::{
    CommandOutcome, APPROVE_BUTTON_ID, CONFIRM_DONE_PREFIX, FINISH_BUTTON_ID, NOT_DONE_PREFIX,
    REJECT_BUTTON_ID,
};
use crate::application::services::{ConversationCache, LeadLifecycleService, NotificationService};
use crate::domain::entities::{
    ConversationPhase, InboundMessage, Lead, LeadStatus, MessageRole, NluInput, Professional,
};
use crate::domain::ports::lead_repository::LeadRepository;
use crate::domain::ports::nlu_oracle::NluOracle;
use crate::domain::ports::professional_repository::ProfessionalRepository;
use crate::domain::services::deal::{strip_deal_marker, DealSignals};
use crate::domain::services::rating::parse_rating;
use crate::infrastructure::http::middleware::error::ApiResult;
use std::sync::Arc;

pub const CLARIFYING_REPLY: &str =
    "Sorry, I didn't quite get that. Could you tell me which city you are in and what needs fixing?";
pub const APOLOGY_REPLY: &str =
    "We are experiencing high load right now. Please try again in a few minutes.";
pub const NOTHING_PENDING_REPLY: &str = "You have nothing pending right now.";
pub const PRO_HELP_REPLY: &str =
    "Commands: 'approve' or 'reject' for a new job, 'finish' when a booked job is done.";

const CANCEL_KEYWORDS: &[&str] = &["cancel", "ביטול"];
const APPROVE_KEYWORDS: &[&str] = &["approve", "אשר", APPROVE_BUTTON_ID];
const REJECT_KEYWORDS: &[&str] = &["reject", "דחה", REJECT_BUTTON_ID];
const FINISH_KEYWORDS: &[&str] = &["finish", "done", "סיום", FINISH_BUTTON_ID];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProAction {
    Approve,
    Reject,
    Finish,
}

impl ProAction {
    fn from_keyword(raw: &str) -> Option<Self> {
        if APPROVE_KEYWORDS.contains(&raw) {
            Some(ProAction::Approve)
        } else if REJECT_KEYWORDS.contains(&raw) {
            Some(ProAction::Reject)
        } else if FINISH_KEYWORDS.contains(&raw) {
            Some(ProAction::Finish)
        } else {
            None
        }
    }

    fn from_button(button_id: &str) -> Option<Self> {
        match button_id {
            APPROVE_BUTTON_ID => Some(ProAction::Approve),
            REJECT_BUTTON_ID => Some(ProAction::Reject),
            FINISH_BUTTON_ID => Some(ProAction::Finish),
            _ => None,
        }
    }
}

/// A professional's command. Job-card buttons name their lead; free text
/// and bare button ids act on the professional's latest matching lead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProCommand {
    pub action: ProAction,
    pub lead_id: Option<String>,
}

impl ProCommand {
    /// Button ids take precedence over free text.
    pub fn parse(message: &InboundMessage) -> Option<Self> {
        if let Some((action, lead_id)) = message
            .button_id
            .as_deref()
            .and_then(|id| id.trim().split_once(':'))
        {
            let action = ProAction::from_button(action)?;
            let lead_id = lead_id.trim();
            return (!lead_id.is_empty()).then(|| ProCommand {
                action,
                lead_id: Some(lead_id.to_string()),
            });
        }

        let raw = message
            .button_id
            .as_deref()
            .or(message.trimmed_text())?
            .trim()
            .to_lowercase();
        ProAction::from_keyword(&raw).map(|action| ProCommand {
            action,
            lead_id: None,
        })
    }
}

/// Customer reply to the completion prompt sent by the booked-job monitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionReply {
    Done(String),
    NotDone(String),
}

impl CompletionReply {
    pub fn parse(button_id: &str) -> Option<Self> {
        if let Some(lead_id) = button_id.strip_prefix(CONFIRM_DONE_PREFIX) {
            return Some(CompletionReply::Done(lead_id.to_string()));
        }
        button_id
            .strip_prefix(NOT_DONE_PREFIX)
            .map(|lead_id| CompletionReply::NotDone(lead_id.to_string()))
    }
}

pub fn is_cancel_request(text: &str) -> bool {
    CANCEL_KEYWORDS.contains(&text.trim().to_lowercase().as_str())
}

#[derive(Clone)]
pub struct ChatService {
    lifecycle: LeadLifecycleService,
    lead_repo: Arc<dyn LeadRepository>,
    professional_repo: Arc<dyn ProfessionalRepository>,
    cache: ConversationCache,
    oracle: Arc<dyn NluOracle>,
    notifications: NotificationService,
}

impl ChatService {
    pub fn new(
        lifecycle: LeadLifecycleService,
        lead_repo: Arc<dyn LeadRepository>,
        professional_repo: Arc<dyn ProfessionalRepository>,
        cache: ConversationCache,
        oracle: Arc<dyn NluOracle>,
        notifications: NotificationService,
    ) -> Self {
        Self {
            lifecycle,
            lead_repo,
            professional_repo,
            cache,
            oracle,
            notifications,
        }
    }

    /// Handles one inbound message. The sender always gets a reply; internal
    /// failures are logged and answered with an apology.
    pub async fn handle_inbound(&self, message: InboundMessage) {
        let chat_id = message.chat_id.trim().to_string();
        if chat_id.is_empty() {
            tracing::warn!("Dropping inbound message without chat id");
            return;
        }

        if let Err(e) = self.route(&chat_id, &message).await {
            tracing::error!("Failed to handle message from {}: {}", chat_id, e);
            self.notifications.send_text(&chat_id, APOLOGY_REPLY).await;
        }
    }

    async fn route(&self, chat_id: &str, message: &InboundMessage) -> ApiResult<()> {
        if let Some(pro) = self.professional_repo.get_professional_by_phone(chat_id).await? {
            return self.handle_professional(&pro, message).await;
        }

        if let Some(reply) = message.button_id.as_deref().and_then(CompletionReply::parse) {
            return self.handle_completion_reply(chat_id, reply).await;
        }

        let text = message.trimmed_text();

        if let Some(text) = text {
            if is_cancel_request(text) {
                return self.handle_cancel(chat_id).await;
            }

            if let Some(rating) = parse_rating(text) {
                if let Some(applied) = self.lifecycle.apply_rating(chat_id, rating).await? {
                    self.cache
                        .set_phase(
                            chat_id,
                            ConversationPhase::AwaitingReview {
                                lead_id: applied.lead_id,
                            },
                        )
                        .await?;
                    self.notifications
                        .send_text(
                            chat_id,
                            "Thank you for the rating! Anything you would like to add about the service?",
                        )
                        .await;
                    return Ok(());
                }
            }

            if let ConversationPhase::AwaitingReview { lead_id } = self.cache.phase(chat_id).await {
                self.lifecycle.save_review_comment(&lead_id, text).await?;
                self.cache.clear_phase(chat_id).await;
                self.notifications
                    .send_text(chat_id, "Thanks, your review was saved.")
                    .await;
                return Ok(());
            }
        }

        self.converse(chat_id, message).await
    }

    async fn handle_professional(&self, pro: &Professional, message: &InboundMessage) -> ApiResult<()> {
        let Some(command) = ProCommand::parse(message) else {
            self.notifications.send_text(&pro.phone, PRO_HELP_REPLY).await;
            return Ok(());
        };

        tracing::info!("Professional {} sent {:?}", pro.id, command);
        let lead_id = command.lead_id.as_deref();
        let outcome = match command.action {
            ProAction::Approve => self.lifecycle.approve(pro, lead_id).await?,
            ProAction::Reject => self.lifecycle.reject(pro, lead_id).await?,
            ProAction::Finish => self.lifecycle.finish_by_professional(pro, lead_id).await?,
        };

        if let CommandOutcome::NothingPending = outcome {
            self.notifications
                .send_text(&pro.phone, NOTHING_PENDING_REPLY)
                .await;
        }
        Ok(())
    }

    async fn handle_completion_reply(&self, chat_id: &str, reply: CompletionReply) -> ApiResult<()> {
        match reply {
            CompletionReply::Done(lead_id) => {
                match self.lifecycle.confirm_done_by_customer(chat_id, &lead_id).await {
                    Ok(_) => {}
                    Err(e) => {
                        tracing::warn!("Completion confirmation for lead {} ignored: {}", lead_id, e);
                        self.notifications
                            .send_text(chat_id, "This job is already closed. Thank you!")
                            .await;
                    }
                }
            }
            CompletionReply::NotDone(lead_id) => {
                if let Err(e) = self.lifecycle.report_not_done(chat_id, &lead_id).await {
                    tracing::warn!("Not-done report for lead {} ignored: {}", lead_id, e);
                    self.notifications
                        .send_text(chat_id, "Thanks, this job is no longer active.")
                        .await;
                }
            }
        }
        Ok(())
    }

    async fn handle_cancel(&self, chat_id: &str) -> ApiResult<()> {
        let reply = match self.lifecycle.cancel_by_customer(chat_id).await? {
            Some(_) => "Your request was cancelled. Write to us any time you need help.",
            None => "You have no open request to cancel.",
        };
        self.cache.clear_phase(chat_id).await;
        self.notifications.send_text(chat_id, reply).await;
        Ok(())
    }

    /// The oracle-driven conversation: open a lead once location and issue
    /// are known, confirm the deal when either signal fires.
    async fn converse(&self, chat_id: &str, message: &InboundMessage) -> ApiResult<()> {
        let history = self.cache.history(chat_id).await?;
        let input = NluInput {
            text: message.trimmed_text().map(str::to_string),
            media_url: message.media_url.clone(),
        };

        let outcome = match self.oracle.analyze(&history, &input).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!("Oracle failed for chat {}: {}", chat_id, e);
                if let Some(text) = input.text.as_deref() {
                    self.cache.record_turn(chat_id, MessageRole::User, text).await?;
                }
                self.reply(chat_id, CLARIFYING_REPLY).await?;
                return Ok(());
            }
        };

        let user_text = outcome
            .transcription
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .or(input.text.as_deref());
        if let Some(text) = user_text {
            self.cache.record_turn(chat_id, MessageRole::User, text).await?;
        }

        let mut lead = self.active_lead(chat_id).await?;
        if lead.is_none() && outcome.extracted.has_routing_pair() {
            let city = outcome.extracted.city.as_deref().unwrap_or_default().trim();
            let issue = outcome.extracted.issue.as_deref().unwrap_or_default().trim();
            lead = Some(self.lifecycle.open_lead(chat_id, city, issue).await?);
        }

        let signals = DealSignals::from_outcome(&outcome);
        if let Some(current) = lead.as_ref().filter(|l| l.status == LeadStatus::Contacted) {
            if signals.confirmed() {
                tracing::info!(
                    "Deal confirmed for lead {} (flag: {}, marker: {})",
                    current.id,
                    signals.structured_flag,
                    signals.marker.is_some()
                );
                let details = signals.resolve_details(&outcome.extracted, current);
                if let Err(e) = self.lifecycle.confirm_deal(current, &details).await {
                    tracing::error!("Could not confirm deal for lead {}: {}", current.id, e);
                }
            }
        }

        let reply = strip_deal_marker(&outcome.reply_text);
        let reply = if reply.is_empty() {
            CLARIFYING_REPLY.to_string()
        } else {
            reply
        };
        self.reply(chat_id, &reply).await
    }

    async fn active_lead(&self, chat_id: &str) -> ApiResult<Option<Lead>> {
        self.lead_repo
            .latest_lead_for_chat(
                chat_id,
                &[LeadStatus::Contacted, LeadStatus::New, LeadStatus::Booked],
            )
            .await
    }

    async fn reply(&self, chat_id: &str, text: &str) -> ApiResult<()> {
        self.cache
            .record_turn(chat_id, MessageRole::Assistant, text)
            .await?;
        self.notifications.send_text(chat_id, text).await;
        Ok(())
    }
}
