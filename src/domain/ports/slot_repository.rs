use crate::domain::entities::Slot;
use crate::infrastructure::http::middleware::error::ApiResult;

#[async_trait::async_trait]
pub trait SlotRepository: Send + Sync {
    async fn create_slot(&self, slot: &Slot) -> ApiResult<()>;

    /// Atomically marks the earliest untaken slot starting inside
    /// `[window_start, window_end]` as taken. True iff a slot was claimed.
    async fn claim_earliest_open_slot(
        &self,
        pro_id: &str,
        window_start: &str,
        window_end: &str,
    ) -> ApiResult<bool>;

    async fn list_slots_for_professional(&self, pro_id: &str) -> ApiResult<Vec<Slot>>;
}
