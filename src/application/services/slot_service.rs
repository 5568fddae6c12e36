use crate::domain::entities::Slot;
use crate::domain::ports::slot_repository::SlotRepository;
use crate::domain::services::slot_window::search_window;
use crate::infrastructure::http::middleware::error::ApiResult;
use crate::shared::utils::format_timestamp;
use chrono::{DateTime, Utc};
use std::sync::Arc;

#[derive(Clone)]
pub struct SlotService {
    slot_repo: Arc<dyn SlotRepository>,
}

impl SlotService {
    pub fn new(slot_repo: Arc<dyn SlotRepository>) -> Self {
        Self { slot_repo }
    }

    /// Claims the earliest free slot of `pro_id` starting within two hours of
    /// `anchor` rounded up to the hour. False when nothing is free.
    pub async fn claim_slot_near(&self, pro_id: &str, anchor: DateTime<Utc>) -> ApiResult<bool> {
        let window = search_window(anchor);
        let claimed = self
            .slot_repo
            .claim_earliest_open_slot(
                pro_id,
                &format_timestamp(window.start),
                &format_timestamp(window.end),
            )
            .await?;

        if claimed {
            tracing::info!(
                "Claimed slot for professional {} near {}",
                pro_id,
                window.estimated
            );
        } else {
            tracing::info!(
                "No free slot for professional {} between {} and {}",
                pro_id,
                window.start,
                window.end
            );
        }
        Ok(claimed)
    }

    pub async fn open_slot(
        &self,
        pro_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> ApiResult<Slot> {
        let slot = Slot::new(pro_id.to_string(), start, end)?;
        self.slot_repo.create_slot(&slot).await?;
        Ok(slot)
    }

    pub async fn list_slots(&self, pro_id: &str) -> ApiResult<Vec<Slot>> {
        self.slot_repo.list_slots_for_professional(pro_id).await
    }
}
