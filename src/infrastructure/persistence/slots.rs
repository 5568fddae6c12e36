use crate::domain::entities::Slot;
use crate::domain::ports::slot_repository::SlotRepository;
use crate::infrastructure::http::middleware::error::ApiResult;
use crate::infrastructure::persistence::Database;
use async_trait::async_trait;
use sqlx::Row;

#[async_trait]
impl SlotRepository for Database {
    async fn create_slot(&self, slot: &Slot) -> ApiResult<()> {
        sqlx::query(
            "INSERT INTO slots (id, pro_id, start_time, end_time, is_taken)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&slot.id)
        .bind(&slot.pro_id)
        .bind(&slot.start_time)
        .bind(&slot.end_time)
        .bind(slot.is_taken as i64)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn claim_earliest_open_slot(
        &self,
        pro_id: &str,
        window_start: &str,
        window_end: &str,
    ) -> ApiResult<bool> {
        // Select and mark in one statement; the outer `is_taken = 0` makes a
        // concurrent loser affect zero rows instead of double-claiming.
        let result = sqlx::query(
            "UPDATE slots SET is_taken = 1
             WHERE id = (
                 SELECT id FROM slots
                 WHERE pro_id = ? AND is_taken = 0
                   AND start_time >= ? AND start_time <= ?
                 ORDER BY start_time ASC
                 LIMIT 1
             ) AND is_taken = 0",
        )
        .bind(pro_id)
        .bind(window_start)
        .bind(window_end)
        .execute(&self.pool)
        .await?;

        let claimed = result.rows_affected() > 0;
        tracing::debug!(
            "Slot claim for pro {} in [{}, {}]: {}",
            pro_id,
            window_start,
            window_end,
            claimed
        );
        Ok(claimed)
    }

    async fn list_slots_for_professional(&self, pro_id: &str) -> ApiResult<Vec<Slot>> {
        let rows = sqlx::query(
            "SELECT id, pro_id, start_time, end_time, is_taken FROM slots
             WHERE pro_id = ? ORDER BY start_time ASC",
        )
        .bind(pro_id)
        .fetch_all(&self.pool)
        .await?;

        let mut slots = Vec::with_capacity(rows.len());
        for row in rows {
            let is_taken: i64 = row.try_get("is_taken")?;
            slots.push(Slot {
                id: row.try_get("id")?,
                pro_id: row.try_get("pro_id")?,
                start_time: row.try_get("start_time")?,
                end_time: row.try_get("end_time")?,
                is_taken: is_taken != 0,
            });
        }
        Ok(slots)
    }
}
