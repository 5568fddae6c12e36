use crate::domain::entities::{DealDetails, Lead, LeadStatus};
use crate::infrastructure::http::middleware::error::ApiResult;
use std::collections::HashMap;

/// Durable lead store.
///
/// Status-changing writes are conditional on the expected current status and
/// report whether they applied, so concurrent writers lose cleanly instead of
/// clobbering each other.
#[async_trait::async_trait]
pub trait LeadRepository: Send + Sync {
    async fn create_lead(&self, lead: &Lead) -> ApiResult<()>;

    async fn get_lead_by_id(&self, id: &str) -> ApiResult<Option<Lead>>;

    /// Most recent lead of a conversation whose status is one of `statuses`.
    async fn latest_lead_for_chat(
        &self,
        chat_id: &str,
        statuses: &[LeadStatus],
    ) -> ApiResult<Option<Lead>>;

    /// Most recent lead assigned to a professional in the given status.
    async fn latest_lead_for_professional(
        &self,
        pro_id: &str,
        status: LeadStatus,
    ) -> ApiResult<Option<Lead>>;

    async fn list_leads(&self, status: Option<LeadStatus>, limit: i64) -> ApiResult<Vec<Lead>>;

    /// Leads in any of `statuses` created at or before `cutoff` (oldest first).
    async fn find_leads_created_before(
        &self,
        statuses: &[LeadStatus],
        cutoff: &str,
    ) -> ApiResult<Vec<Lead>>;

    async fn attach_professional(&self, id: &str, pro_id: &str, now: &str) -> ApiResult<()>;

    /// `CONTACTED -> NEW` with the finalized deal details.
    async fn confirm_deal(
        &self,
        id: &str,
        deal: &DealDetails,
        pro_id: Option<&str>,
        now: &str,
    ) -> ApiResult<bool>;

    async fn transition_status(
        &self,
        id: &str,
        from: LeadStatus,
        to: LeadStatus,
        now: &str,
    ) -> ApiResult<bool>;

    /// `BOOKED -> COMPLETED`, stamping `completed_at` and opening the rating window.
    async fn mark_completed(&self, id: &str, now: &str) -> ApiResult<bool>;

    /// Stores the rating and closes the rating window; false if it was already closed.
    async fn record_rating(&self, id: &str, rating: i64, now: &str) -> ApiResult<bool>;

    async fn save_review_comment(&self, id: &str, comment: &str, now: &str) -> ApiResult<()>;

    /// Moves a pre-booking lead to `new_pro_id` and restarts its clock.
    /// Applies only if the lead still belongs to `previous_pro_id`.
    async fn reassign_lead(
        &self,
        id: &str,
        new_pro_id: &str,
        previous_pro_id: Option<&str>,
        now: &str,
    ) -> ApiResult<bool>;

    /// Sets `flag = requires_admin` unless already set. True only for the write that set it.
    async fn flag_requires_admin(&self, id: &str, now: &str) -> ApiResult<bool>;

    /// Open-lead count per professional over the load-bearing statuses.
    async fn count_open_leads_by_professional(&self) -> ApiResult<HashMap<String, i64>>;

    async fn count_leads_by_status(&self) -> ApiResult<Vec<(LeadStatus, i64)>>;

    async fn count_flagged_leads(&self) -> ApiResult<i64>;
}
