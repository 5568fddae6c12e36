use crate::application::services::{MatchingService, NotificationService, SlotService};
use crate::domain::entities::{
    CreateLead, DealDetails, Lead, LeadStatus, Professional, ReplyButton, REQUIRES_ADMIN_FLAG,
};
use crate::domain::events::SystemEvent;
use crate::domain::ports::event_bus::EventBus;
use crate::domain::ports::lead_repository::LeadRepository;
use crate::domain::ports::professional_repository::ProfessionalRepository;
use crate::domain::ports::time_service::Clock;
use crate::domain::services::rating::blended_rating;
use crate::domain::services::state_machine::{
    can_reassign, check_transition, validate_transition, TransitionError,
};
use crate::infrastructure::http::middleware::error::{ApiError, ApiResult};
use crate::shared::utils::format_timestamp;
use std::sync::Arc;

pub const APPROVE_BUTTON_ID: &str = "approve_job";
pub const REJECT_BUTTON_ID: &str = "reject_job";
pub const FINISH_BUTTON_ID: &str = "finish_job";
pub const CONFIRM_DONE_PREFIX: &str = "confirm_done:";
pub const NOT_DONE_PREFIX: &str = "not_done:";

/// `<action>:<lead_id>`, so a tap acts on the job card it came from.
pub fn job_button_id(action: &str, lead_id: &str) -> String {
    format!("{}:{}", action, lead_id)
}

/// Result of a professional's command.
#[derive(Debug, Clone)]
pub enum CommandOutcome {
    Applied(Lead),
    NothingPending,
}

/// A rating that was accepted for a completed lead.
#[derive(Debug, Clone, PartialEq)]
pub struct RatingApplied {
    pub lead_id: String,
    pub pro_id: String,
    pub given: i64,
    pub new_rating: f64,
}

/// Owns every lead transition. Each transition is recorded with a
/// compare-and-set on the current status first; notifications follow and
/// never undo it.
#[derive(Clone)]
pub struct LeadLifecycleService {
    lead_repo: Arc<dyn LeadRepository>,
    professional_repo: Arc<dyn ProfessionalRepository>,
    matching: MatchingService,
    slots: SlotService,
    notifications: NotificationService,
    event_bus: Arc<dyn EventBus>,
    clock: Arc<dyn Clock>,
}

impl LeadLifecycleService {
    pub fn new(
        lead_repo: Arc<dyn LeadRepository>,
        professional_repo: Arc<dyn ProfessionalRepository>,
        matching: MatchingService,
        slots: SlotService,
        notifications: NotificationService,
        event_bus: Arc<dyn EventBus>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            lead_repo,
            professional_repo,
            matching,
            slots,
            notifications,
            event_bus,
            clock,
        }
    }

    fn now(&self) -> String {
        format_timestamp(self.clock.now())
    }

    pub async fn get_lead(&self, id: &str) -> ApiResult<Lead> {
        self.lead_repo
            .get_lead_by_id(id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Lead {} not found", id)))
    }

    /// ∅ → CONTACTED. Routing runs before the deal is confirmed so the
    /// assigned professional's persona can carry the conversation.
    pub async fn open_lead(&self, chat_id: &str, city: &str, issue_type: &str) -> ApiResult<Lead> {
        validate_transition(None, LeadStatus::Contacted)?;

        let pro = self.matching.find_professional(issue_type, city, &[]).await;
        let lead = Lead::new_contacted(
            &CreateLead {
                chat_id: chat_id.to_string(),
                city: city.to_string(),
                issue_type: issue_type.to_string(),
                pro_id: pro.as_ref().map(|p| p.id.clone()),
            },
            self.clock.now(),
        )?;
        self.lead_repo.create_lead(&lead).await?;

        tracing::info!(
            "Lead {} opened for chat {} (professional: {:?})",
            lead.id,
            chat_id,
            lead.pro_id
        );
        self.event_bus.publish(SystemEvent::LeadCreated {
            lead_id: lead.id.clone(),
            chat_id: lead.chat_id.clone(),
            pro_id: lead.pro_id.clone(),
            timestamp: lead.created_at.clone(),
        });

        Ok(lead)
    }

    /// CONTACTED → NEW with the finalized deal details.
    pub async fn confirm_deal(&self, lead: &Lead, details: &DealDetails) -> ApiResult<Lead> {
        check_transition(lead, LeadStatus::New)?;

        // One more routing attempt for leads that were opened unmatched.
        let matched = match lead.pro_id {
            Some(_) => None,
            None => {
                let location = lead.routing_location().unwrap_or(&details.full_address);
                self.matching
                    .find_professional(&details.issue_type, location, &[])
                    .await
            }
        };

        let confirmed = self
            .lead_repo
            .confirm_deal(
                &lead.id,
                details,
                matched.as_ref().map(|p| p.id.as_str()),
                &self.now(),
            )
            .await?;
        if !confirmed {
            return Err(TransitionError::Conflict {
                lead_id: lead.id.clone(),
                expected: LeadStatus::Contacted,
            }
            .into());
        }

        let updated = self.get_lead(&lead.id).await?;
        self.publish_status_change(&updated, LeadStatus::Contacted);

        match self.assigned_professional(&updated).await? {
            Some(pro) => self.offer_job(&pro, &updated).await,
            None => tracing::warn!(
                "Lead {} is ready but unassigned; the healer will retry routing",
                updated.id
            ),
        }

        Ok(updated)
    }

    /// NEW → BOOKED on the professional's approval. A missing slot only
    /// changes the confirmation wording.
    pub async fn approve(&self, pro: &Professional, lead_id: Option<&str>) -> ApiResult<CommandOutcome> {
        let Some(lead) = self.pending_lead(pro, LeadStatus::New, lead_id).await? else {
            return Ok(CommandOutcome::NothingPending);
        };
        check_transition(&lead, LeadStatus::Booked)?;
        self.record_transition(&lead, LeadStatus::New, LeadStatus::Booked)
            .await?;

        let anchor = lead.created_at_datetime().unwrap_or_else(|| self.clock.now());
        let slot_claimed = match self.slots.claim_slot_near(&pro.id, anchor).await {
            Ok(claimed) => claimed,
            Err(e) => {
                tracing::error!("Slot claim failed for lead {}: {}", lead.id, e);
                false
            }
        };
        self.event_bus.publish(SystemEvent::SlotClaimed {
            lead_id: lead.id.clone(),
            pro_id: pro.id.clone(),
            claimed: slot_claimed,
            timestamp: self.now(),
        });

        let when = lead.appointment_time.as_deref().unwrap_or("soon");
        let customer_text = if slot_claimed {
            format!(
                "Your visit is booked for {}. {} will arrive; you can reach them at {}.",
                when,
                pro.display_name(),
                pro.phone
            )
        } else {
            format!(
                "{} accepted your request for {}. They will confirm the exact time with you; their number is {}.",
                pro.display_name(),
                when,
                pro.phone
            )
        };
        self.notifications
            .send_text(&lead.chat_id, &customer_text)
            .await;
        self.notifications
            .send_buttons(
                &pro.phone,
                "Job booked. Tap when the work is done.",
                &[ReplyButton::new(
                    job_button_id(FINISH_BUTTON_ID, &lead.id),
                    "Job done",
                )],
            )
            .await;

        Ok(CommandOutcome::Applied(self.get_lead(&lead.id).await?))
    }

    /// NEW → REJECTED. Terminal unless reopened by an operator.
    pub async fn reject(&self, pro: &Professional, lead_id: Option<&str>) -> ApiResult<CommandOutcome> {
        let Some(lead) = self.pending_lead(pro, LeadStatus::New, lead_id).await? else {
            return Ok(CommandOutcome::NothingPending);
        };
        check_transition(&lead, LeadStatus::Rejected)?;
        self.record_transition(&lead, LeadStatus::New, LeadStatus::Rejected)
            .await?;

        self.notifications
            .send_text(
                &lead.chat_id,
                "Unfortunately the professional cannot take this job. Our team will get back to you.",
            )
            .await;
        self.notifications
            .send_text(&pro.phone, "Job declined. Thanks for letting us know.")
            .await;

        Ok(CommandOutcome::Applied(self.get_lead(&lead.id).await?))
    }

    /// BOOKED → COMPLETED on the professional's finish command.
    pub async fn finish_by_professional(
        &self,
        pro: &Professional,
        lead_id: Option<&str>,
    ) -> ApiResult<CommandOutcome> {
        let Some(lead) = self.pending_lead(pro, LeadStatus::Booked, lead_id).await? else {
            return Ok(CommandOutcome::NothingPending);
        };
        let completed = self.complete(&lead).await?;

        self.notifications
            .send_text(&pro.phone, "Marked as done. Thank you!")
            .await;
        self.request_rating(&completed, pro).await;

        Ok(CommandOutcome::Applied(completed))
    }

    /// BOOKED → COMPLETED from the customer's completion prompt.
    pub async fn confirm_done_by_customer(&self, chat_id: &str, lead_id: &str) -> ApiResult<Lead> {
        let lead = self.customer_lead(chat_id, lead_id).await?;
        let completed = self.complete(&lead).await?;

        if let Some(pro) = self.assigned_professional(&completed).await? {
            self.notifications
                .send_text(
                    &pro.phone,
                    &format!(
                        "The customer confirmed the job at {} is done.",
                        completed.full_address.as_deref().unwrap_or("their address")
                    ),
                )
                .await;
            self.request_rating(&completed, &pro).await;
        }

        Ok(completed)
    }

    /// The customer says the booked job is not done yet; status stays BOOKED.
    pub async fn report_not_done(&self, chat_id: &str, lead_id: &str) -> ApiResult<Lead> {
        let lead = self.customer_lead(chat_id, lead_id).await?;
        if lead.status != LeadStatus::Booked {
            return Err(ApiError::Conflict(format!(
                "Lead {} is {}, not booked",
                lead.id, lead.status
            )));
        }

        if let Some(pro) = self.assigned_professional(&lead).await? {
            self.notifications
                .send_text(
                    &pro.phone,
                    &format!(
                        "The customer at {} reports the job is not finished yet. Please follow up.",
                        lead.full_address.as_deref().unwrap_or("the booked address")
                    ),
                )
                .await;
        }
        self.notifications
            .send_text(chat_id, "Thanks, we let the professional know.")
            .await;

        Ok(lead)
    }

    async fn complete(&self, lead: &Lead) -> ApiResult<Lead> {
        check_transition(lead, LeadStatus::Completed)?;
        if !self.lead_repo.mark_completed(&lead.id, &self.now()).await? {
            return Err(TransitionError::Conflict {
                lead_id: lead.id.clone(),
                expected: LeadStatus::Booked,
            }
            .into());
        }

        let completed = self.get_lead(&lead.id).await?;
        tracing::info!("Lead {} completed", completed.id);
        self.publish_status_change(&completed, LeadStatus::Booked);
        Ok(completed)
    }

    async fn request_rating(&self, lead: &Lead, pro: &Professional) {
        self.notifications
            .send_text(
                &lead.chat_id,
                &format!(
                    "How was the service from {}? Reply with a number from 1 to 5.",
                    pro.display_name()
                ),
            )
            .await;
    }

    /// Applies a 1-5 rating to the chat's completed lead that is waiting for
    /// one. `None` when nothing is waiting.
    pub async fn apply_rating(&self, chat_id: &str, given: i64) -> ApiResult<Option<RatingApplied>> {
        let Some(lead) = self
            .lead_repo
            .latest_lead_for_chat(chat_id, &[LeadStatus::Completed])
            .await?
            .filter(|l| l.waiting_for_rating)
        else {
            return Ok(None);
        };
        let pro_id = lead
            .pro_id
            .clone()
            .ok_or_else(|| ApiError::Internal(format!("Completed lead {} has no professional", lead.id)))?;

        if !self.lead_repo.record_rating(&lead.id, given, &self.now()).await? {
            // Someone else consumed the rating first.
            return Ok(None);
        }

        let pro = self
            .professional_repo
            .get_professional_by_id(&pro_id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Professional {} not found", pro_id)))?;
        let new_rating = blended_rating(pro.rating, given);
        self.professional_repo
            .record_review(&pro.id, new_rating)
            .await?;

        tracing::info!(
            "Professional {} rated {} on lead {}: {} -> {}",
            pro.id,
            given,
            lead.id,
            pro.rating,
            new_rating
        );
        self.event_bus.publish(SystemEvent::ProfessionalRated {
            pro_id: pro.id.clone(),
            lead_id: lead.id.clone(),
            given,
            new_rating,
            timestamp: self.now(),
        });

        Ok(Some(RatingApplied {
            lead_id: lead.id,
            pro_id: pro.id,
            given,
            new_rating,
        }))
    }

    pub async fn save_review_comment(&self, lead_id: &str, comment: &str) -> ApiResult<()> {
        self.lead_repo
            .save_review_comment(lead_id, comment.trim(), &self.now())
            .await
    }

    /// Cancels the chat's latest open lead. `None` when there is none.
    pub async fn cancel_by_customer(&self, chat_id: &str) -> ApiResult<Option<Lead>> {
        let open = [LeadStatus::Contacted, LeadStatus::New, LeadStatus::Booked];
        let Some(lead) = self.lead_repo.latest_lead_for_chat(chat_id, &open).await? else {
            return Ok(None);
        };
        check_transition(&lead, LeadStatus::Cancelled)?;
        self.record_transition(&lead, lead.status, LeadStatus::Cancelled)
            .await?;

        if let Some(pro) = self.assigned_professional(&lead).await? {
            self.notifications
                .send_text(
                    &pro.phone,
                    &format!(
                        "The customer cancelled the {} request in {}.",
                        lead.issue_type.as_deref().unwrap_or("service"),
                        lead.routing_location().unwrap_or("their area")
                    ),
                )
                .await;
        }

        Ok(Some(self.get_lead(&lead.id).await?))
    }

    /// Moves a pre-booking lead to `new_pro`, restarting its age clock.
    /// False when the lead changed owner or status concurrently.
    pub async fn reassign(&self, lead: &Lead, new_pro: &Professional) -> ApiResult<bool> {
        if !can_reassign(lead) {
            return Ok(false);
        }
        let moved = self
            .lead_repo
            .reassign_lead(&lead.id, &new_pro.id, lead.pro_id.as_deref(), &self.now())
            .await?;
        if moved {
            tracing::info!(
                "Lead {} reassigned from {:?} to {}",
                lead.id,
                lead.pro_id,
                new_pro.id
            );
            self.event_bus.publish(SystemEvent::LeadReassigned {
                lead_id: lead.id.clone(),
                previous_pro_id: lead.pro_id.clone(),
                new_pro_id: new_pro.id.clone(),
                timestamp: self.now(),
            });
        }
        Ok(moved)
    }

    /// Marks a booked lead for operator attention. True only for the call
    /// that actually set the flag.
    pub async fn flag_requires_admin(&self, lead: &Lead) -> ApiResult<bool> {
        let flagged = self
            .lead_repo
            .flag_requires_admin(&lead.id, &self.now())
            .await?;
        if flagged {
            tracing::warn!("Lead {} flagged {}", lead.id, REQUIRES_ADMIN_FLAG);
            self.event_bus.publish(SystemEvent::LeadFlagged {
                lead_id: lead.id.clone(),
                flag: REQUIRES_ADMIN_FLAG.to_string(),
                timestamp: self.now(),
            });
        }
        Ok(flagged)
    }

    /// Sends a professional the job card and a navigation link. Only NEW
    /// leads carry approve/reject buttons; a CONTACTED lead is announced as
    /// a handoff while the customer is still settling the details.
    pub async fn offer_job(&self, pro: &Professional, lead: &Lead) {
        let details = format!(
            "{}\nAddress: {}\nTime: {}",
            lead.issue_type.as_deref().unwrap_or("service request"),
            lead.full_address
                .as_deref()
                .or(lead.city.as_deref())
                .unwrap_or("to be confirmed"),
            lead.appointment_time.as_deref().unwrap_or("to be coordinated"),
        );
        match lead.status {
            LeadStatus::New => {
                self.notifications
                    .send_buttons(
                        &pro.phone,
                        &format!("New job: {}", details),
                        &[
                            ReplyButton::new(job_button_id(APPROVE_BUTTON_ID, &lead.id), "Approve"),
                            ReplyButton::new(job_button_id(REJECT_BUTTON_ID, &lead.id), "Reject"),
                        ],
                    )
                    .await;
            }
            _ => {
                self.notifications
                    .send_text(
                        &pro.phone,
                        &format!(
                            "Request handed over to you: {}\nThe customer is still confirming the details. You will get a job card to approve once they do.",
                            details
                        ),
                    )
                    .await;
            }
        }
        if let Some(address) = lead.full_address.as_deref().or(lead.city.as_deref()) {
            self.notifications
                .send_location_link(&pro.phone, address, "Navigate:")
                .await;
        }
    }

    /// The lead a professional command acts on. A named lead must still be
    /// assigned to `pro` and in `status`; otherwise the latest such lead.
    async fn pending_lead(
        &self,
        pro: &Professional,
        status: LeadStatus,
        lead_id: Option<&str>,
    ) -> ApiResult<Option<Lead>> {
        match lead_id {
            Some(id) => Ok(self.lead_repo.get_lead_by_id(id).await?.filter(|lead| {
                lead.status == status && lead.pro_id.as_deref() == Some(pro.id.as_str())
            })),
            None => {
                self.lead_repo
                    .latest_lead_for_professional(&pro.id, status)
                    .await
            }
        }
    }

    pub async fn assigned_professional(&self, lead: &Lead) -> ApiResult<Option<Professional>> {
        match lead.pro_id.as_deref() {
            Some(pro_id) => self.professional_repo.get_professional_by_id(pro_id).await,
            None => Ok(None),
        }
    }

    async fn customer_lead(&self, chat_id: &str, lead_id: &str) -> ApiResult<Lead> {
        let lead = self.get_lead(lead_id).await?;
        if lead.chat_id != chat_id {
            return Err(ApiError::NotFound(format!("Lead {} not found", lead_id)));
        }
        Ok(lead)
    }

    async fn record_transition(&self, lead: &Lead, from: LeadStatus, to: LeadStatus) -> ApiResult<()> {
        if !self
            .lead_repo
            .transition_status(&lead.id, from, to, &self.now())
            .await?
        {
            return Err(TransitionError::Conflict {
                lead_id: lead.id.clone(),
                expected: from,
            }
            .into());
        }
        tracing::info!("Lead {} moved {} -> {}", lead.id, from, to);
        self.event_bus.publish(SystemEvent::LeadStatusChanged {
            lead_id: lead.id.clone(),
            old_status: from,
            new_status: to,
            pro_id: lead.pro_id.clone(),
            timestamp: self.now(),
        });
        Ok(())
    }

    fn publish_status_change(&self, lead: &Lead, from: LeadStatus) {
        tracing::info!("Lead {} moved {} -> {}", lead.id, from, lead.status);
        self.event_bus.publish(SystemEvent::LeadStatusChanged {
            lead_id: lead.id.clone(),
            old_status: from,
            new_status: lead.status,
            pro_id: lead.pro_id.clone(),
            timestamp: lead.updated_at.clone(),
        });
    }
}
