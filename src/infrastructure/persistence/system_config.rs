use crate::domain::entities::DAILY_LAST_RUN_KEY;
use crate::domain::ports::system_config_repository::SystemConfigRepository;
use crate::infrastructure::http::middleware::error::ApiResult;
use crate::infrastructure::persistence::Database;
use crate::shared::utils::format_timestamp;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;

#[async_trait]
impl SystemConfigRepository for Database {
    async fn get_config_value(&self, key: &str) -> ApiResult<Option<String>> {
        let row = sqlx::query("SELECT value FROM system_config WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(row.try_get("value")?)),
            None => Ok(None),
        }
    }

    async fn set_config_value(&self, key: &str, value: &str) -> ApiResult<()> {
        sqlx::query(
            "INSERT INTO system_config (key, value, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(value)
        .bind(format_timestamp(Utc::now()))
        .execute(&self.pool)
        .await?;

        tracing::info!("System config {} set to {}", key, value);
        Ok(())
    }

    async fn try_mark_daily_run(&self, date: &str) -> ApiResult<bool> {
        // Upsert that only writes when the stored date differs; rows_affected
        // tells the caller whether it won the day.
        let result = sqlx::query(
            "INSERT INTO system_config (key, value, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
             WHERE system_config.value <> excluded.value",
        )
        .bind(DAILY_LAST_RUN_KEY)
        .bind(date)
        .bind(format_timestamp(Utc::now()))
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
