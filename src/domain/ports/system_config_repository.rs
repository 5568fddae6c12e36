use crate::infrastructure::http::middleware::error::ApiResult;

#[async_trait::async_trait]
pub trait SystemConfigRepository: Send + Sync {
    async fn get_config_value(&self, key: &str) -> ApiResult<Option<String>>;

    async fn set_config_value(&self, key: &str, value: &str) -> ApiResult<()>;

    /// Records `date` as the daily job's last run unless it already is.
    /// Exactly one caller per date gets `true`.
    async fn try_mark_daily_run(&self, date: &str) -> ApiResult<bool>;
}
