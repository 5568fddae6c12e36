use crate::domain::entities::{DealDetails, Lead, LeadStatus, REQUIRES_ADMIN_FLAG};
use crate::domain::ports::lead_repository::LeadRepository;
use crate::infrastructure::http::middleware::error::{ApiError, ApiResult};
use crate::infrastructure::persistence::{nullable, placeholders, Database};
use async_trait::async_trait;
use sqlx::any::AnyRow;
use sqlx::Row;
use std::collections::HashMap;

const LEAD_COLUMNS: &str = "id, chat_id, status, pro_id, city, issue_type, full_address,
    appointment_time, created_at, updated_at, completed_at, waiting_for_rating,
    rating_given, review_comment, flag, reassigned_from";

fn lead_from_row(row: &AnyRow) -> ApiResult<Lead> {
    let status: String = row.try_get("status")?;
    let waiting: i64 = row.try_get("waiting_for_rating")?;

    Ok(Lead {
        id: row.try_get("id")?,
        chat_id: row.try_get("chat_id")?,
        status: status
            .parse::<LeadStatus>()
            .map_err(|e| ApiError::Internal(e.to_string()))?,
        pro_id: nullable::<String>(row, "pro_id"),
        city: nullable::<String>(row, "city"),
        issue_type: nullable::<String>(row, "issue_type"),
        full_address: nullable::<String>(row, "full_address"),
        appointment_time: nullable::<String>(row, "appointment_time"),
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        completed_at: nullable::<String>(row, "completed_at"),
        waiting_for_rating: waiting != 0,
        rating_given: nullable::<i64>(row, "rating_given"),
        review_comment: nullable::<String>(row, "review_comment"),
        flag: nullable::<String>(row, "flag"),
        reassigned_from: nullable::<String>(row, "reassigned_from"),
    })
}

#[async_trait]
impl LeadRepository for Database {
    async fn create_lead(&self, lead: &Lead) -> ApiResult<()> {
        sqlx::query(
            "INSERT INTO leads (id, chat_id, status, pro_id, city, issue_type, full_address,
                appointment_time, created_at, updated_at, completed_at, waiting_for_rating,
                rating_given, review_comment, flag, reassigned_from)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&lead.id)
        .bind(&lead.chat_id)
        .bind(lead.status.as_str())
        .bind(&lead.pro_id)
        .bind(&lead.city)
        .bind(&lead.issue_type)
        .bind(&lead.full_address)
        .bind(&lead.appointment_time)
        .bind(&lead.created_at)
        .bind(&lead.updated_at)
        .bind(&lead.completed_at)
        .bind(lead.waiting_for_rating as i64)
        .bind(lead.rating_given)
        .bind(&lead.review_comment)
        .bind(&lead.flag)
        .bind(&lead.reassigned_from)
        .execute(&self.pool)
        .await?;

        tracing::debug!("Lead {} stored for chat {}", lead.id, lead.chat_id);
        Ok(())
    }

    async fn get_lead_by_id(&self, id: &str) -> ApiResult<Option<Lead>> {
        let row = sqlx::query(&format!("SELECT {} FROM leads WHERE id = ?", LEAD_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(lead_from_row).transpose()
    }

    async fn latest_lead_for_chat(
        &self,
        chat_id: &str,
        statuses: &[LeadStatus],
    ) -> ApiResult<Option<Lead>> {
        if statuses.is_empty() {
            return Ok(None);
        }
        let sql = format!(
            "SELECT {} FROM leads
             WHERE chat_id = ? AND status IN ({})
             ORDER BY rowid DESC
             LIMIT 1",
            LEAD_COLUMNS,
            placeholders(statuses.len())
        );
        let mut query = sqlx::query(&sql).bind(chat_id);
        for status in statuses {
            query = query.bind(status.as_str());
        }
        let row = query.fetch_optional(&self.pool).await?;

        row.as_ref().map(lead_from_row).transpose()
    }

    async fn latest_lead_for_professional(
        &self,
        pro_id: &str,
        status: LeadStatus,
    ) -> ApiResult<Option<Lead>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM leads
             WHERE pro_id = ? AND status = ?
             ORDER BY updated_at DESC, rowid DESC
             LIMIT 1",
            LEAD_COLUMNS
        ))
        .bind(pro_id)
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(lead_from_row).transpose()
    }

    async fn list_leads(&self, status: Option<LeadStatus>, limit: i64) -> ApiResult<Vec<Lead>> {
        let rows = match status {
            Some(status) => {
                sqlx::query(&format!(
                    "SELECT {} FROM leads WHERE status = ? ORDER BY rowid DESC LIMIT ?",
                    LEAD_COLUMNS
                ))
                .bind(status.as_str())
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(&format!(
                    "SELECT {} FROM leads ORDER BY rowid DESC LIMIT ?",
                    LEAD_COLUMNS
                ))
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
        };

        rows.iter().map(lead_from_row).collect()
    }

    async fn find_leads_created_before(
        &self,
        statuses: &[LeadStatus],
        cutoff: &str,
    ) -> ApiResult<Vec<Lead>> {
        if statuses.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT {} FROM leads
             WHERE status IN ({}) AND created_at <= ?
             ORDER BY created_at ASC",
            LEAD_COLUMNS,
            placeholders(statuses.len())
        );
        let mut query = sqlx::query(&sql);
        for status in statuses {
            query = query.bind(status.as_str());
        }
        let rows = query.bind(cutoff).fetch_all(&self.pool).await?;

        rows.iter().map(lead_from_row).collect()
    }

    async fn attach_professional(&self, id: &str, pro_id: &str, now: &str) -> ApiResult<()> {
        let result = sqlx::query("UPDATE leads SET pro_id = ?, updated_at = ? WHERE id = ?")
            .bind(pro_id)
            .bind(now)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound(format!("Lead {} not found", id)));
        }
        Ok(())
    }

    async fn confirm_deal(
        &self,
        id: &str,
        deal: &DealDetails,
        pro_id: Option<&str>,
        now: &str,
    ) -> ApiResult<bool> {
        let result = sqlx::query(
            "UPDATE leads
             SET status = 'new', appointment_time = ?, full_address = ?, issue_type = ?,
                 pro_id = COALESCE(?, pro_id), updated_at = ?
             WHERE id = ? AND status = 'contacted'",
        )
        .bind(&deal.appointment_time)
        .bind(&deal.full_address)
        .bind(&deal.issue_type)
        .bind(pro_id)
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn transition_status(
        &self,
        id: &str,
        from: LeadStatus,
        to: LeadStatus,
        now: &str,
    ) -> ApiResult<bool> {
        let result =
            sqlx::query("UPDATE leads SET status = ?, updated_at = ? WHERE id = ? AND status = ?")
                .bind(to.as_str())
                .bind(now)
                .bind(id)
                .bind(from.as_str())
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn mark_completed(&self, id: &str, now: &str) -> ApiResult<bool> {
        let result = sqlx::query(
            "UPDATE leads
             SET status = 'completed', completed_at = ?, waiting_for_rating = 1, updated_at = ?
             WHERE id = ? AND status = 'booked' AND pro_id IS NOT NULL",
        )
        .bind(now)
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn record_rating(&self, id: &str, rating: i64, now: &str) -> ApiResult<bool> {
        let result = sqlx::query(
            "UPDATE leads
             SET rating_given = ?, waiting_for_rating = 0, updated_at = ?
             WHERE id = ? AND status = 'completed' AND waiting_for_rating = 1",
        )
        .bind(rating)
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn save_review_comment(&self, id: &str, comment: &str, now: &str) -> ApiResult<()> {
        sqlx::query("UPDATE leads SET review_comment = ?, updated_at = ? WHERE id = ?")
            .bind(comment)
            .bind(now)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn reassign_lead(
        &self,
        id: &str,
        new_pro_id: &str,
        previous_pro_id: Option<&str>,
        now: &str,
    ) -> ApiResult<bool> {
        // Compare-and-set on the current owner so two healers cannot both move it.
        let result = sqlx::query(
            "UPDATE leads
             SET pro_id = ?, reassigned_from = COALESCE(?, reassigned_from),
                 created_at = ?, updated_at = ?
             WHERE id = ? AND status IN ('new', 'contacted') AND COALESCE(pro_id, '') = ?",
        )
        .bind(new_pro_id)
        .bind(previous_pro_id)
        .bind(now)
        .bind(now)
        .bind(id)
        .bind(previous_pro_id.unwrap_or(""))
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn flag_requires_admin(&self, id: &str, now: &str) -> ApiResult<bool> {
        let result = sqlx::query(
            "UPDATE leads SET flag = ?, updated_at = ?
             WHERE id = ? AND (flag IS NULL OR flag <> ?)",
        )
        .bind(REQUIRES_ADMIN_FLAG)
        .bind(now)
        .bind(id)
        .bind(REQUIRES_ADMIN_FLAG)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn count_open_leads_by_professional(&self) -> ApiResult<HashMap<String, i64>> {
        let sql = format!(
            "SELECT pro_id, COUNT(*) AS open_count FROM leads
             WHERE pro_id IS NOT NULL AND status IN ({})
             GROUP BY pro_id",
            placeholders(LeadStatus::LOAD_BEARING.len())
        );
        let mut query = sqlx::query(&sql);
        for status in LeadStatus::LOAD_BEARING {
            query = query.bind(status.as_str());
        }
        let rows = query.fetch_all(&self.pool).await?;

        let mut counts = HashMap::with_capacity(rows.len());
        for row in rows {
            counts.insert(row.try_get("pro_id")?, row.try_get("open_count")?);
        }
        Ok(counts)
    }

    async fn count_leads_by_status(&self) -> ApiResult<Vec<(LeadStatus, i64)>> {
        let rows = sqlx::query(
            "SELECT status, COUNT(*) AS total FROM leads GROUP BY status ORDER BY status",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut counts = Vec::with_capacity(rows.len());
        for row in rows {
            let status: String = row.try_get("status")?;
            let status = status
                .parse::<LeadStatus>()
                .map_err(|e| ApiError::Internal(e.to_string()))?;
            counts.push((status, row.try_get("total")?));
        }
        Ok(counts)
    }

    async fn count_flagged_leads(&self) -> ApiResult<i64> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS total FROM leads WHERE flag = ? AND status = 'booked'",
        )
        .bind(REQUIRES_ADMIN_FLAG)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.try_get("total")?)
    }
}
