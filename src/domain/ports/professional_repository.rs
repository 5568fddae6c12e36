use crate::domain::entities::Professional;
use crate::infrastructure::http::middleware::error::ApiResult;

#[async_trait::async_trait]
pub trait ProfessionalRepository: Send + Sync {
    async fn create_professional(&self, professional: &Professional) -> ApiResult<()>;

    async fn get_professional_by_id(&self, id: &str) -> ApiResult<Option<Professional>>;

    async fn get_professional_by_phone(&self, phone: &str) -> ApiResult<Option<Professional>>;

    async fn list_active_professionals(&self) -> ApiResult<Vec<Professional>>;

    /// Active professionals whose service areas contain `location_text`, case-insensitively.
    async fn list_active_by_service_area(&self, location_text: &str)
        -> ApiResult<Vec<Professional>>;

    async fn list_active_by_keyword(&self, keyword: &str) -> ApiResult<Vec<Professional>>;

    /// Writes the new rating and counts exactly one more review.
    async fn record_review(&self, id: &str, new_rating: f64) -> ApiResult<()>;

    async fn set_professional_active(&self, id: &str, is_active: bool) -> ApiResult<()>;
}
