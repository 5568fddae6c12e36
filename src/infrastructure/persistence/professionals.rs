use crate::domain::entities::{GeoPoint, Professional};
use crate::domain::ports::professional_repository::ProfessionalRepository;
use crate::infrastructure::http::middleware::error::{ApiError, ApiResult};
use crate::infrastructure::persistence::{nullable, Database};
use async_trait::async_trait;
use sqlx::any::AnyRow;
use sqlx::Row;

const PROFESSIONAL_COLUMNS: &str = "id, name, phone, is_active, service_areas, keywords,
    latitude, longitude, rating, review_count, created_at";

fn decode_list(raw: &str) -> ApiResult<Vec<String>> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(raw)?)
}

fn professional_from_row(row: &AnyRow) -> ApiResult<Professional> {
    let is_active: i64 = row.try_get("is_active")?;
    let service_areas: String = row.try_get("service_areas")?;
    let keywords: String = row.try_get("keywords")?;
    let latitude = nullable::<f64>(row, "latitude");
    let longitude = nullable::<f64>(row, "longitude");

    Ok(Professional {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        phone: row.try_get("phone")?,
        is_active: is_active != 0,
        service_areas: decode_list(&service_areas)?,
        keywords: decode_list(&keywords)?,
        location: latitude.zip(longitude).map(|(lat, lng)| GeoPoint::new(lat, lng)),
        rating: row.try_get("rating")?,
        review_count: row.try_get("review_count")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl ProfessionalRepository for Database {
    async fn create_professional(&self, professional: &Professional) -> ApiResult<()> {
        sqlx::query(
            "INSERT INTO professionals (id, name, phone, is_active, service_areas, keywords,
                latitude, longitude, rating, review_count, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&professional.id)
        .bind(&professional.name)
        .bind(&professional.phone)
        .bind(professional.is_active as i64)
        .bind(serde_json::to_string(&professional.service_areas)?)
        .bind(serde_json::to_string(&professional.keywords)?)
        .bind(professional.location.map(|p| p.latitude))
        .bind(professional.location.map(|p| p.longitude))
        .bind(professional.rating)
        .bind(professional.review_count)
        .bind(&professional.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_professional_by_id(&self, id: &str) -> ApiResult<Option<Professional>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM professionals WHERE id = ?",
            PROFESSIONAL_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(professional_from_row).transpose()
    }

    async fn get_professional_by_phone(&self, phone: &str) -> ApiResult<Option<Professional>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM professionals WHERE phone = ?",
            PROFESSIONAL_COLUMNS
        ))
        .bind(phone.trim())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(professional_from_row).transpose()
    }

    async fn list_active_professionals(&self) -> ApiResult<Vec<Professional>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM professionals WHERE is_active = 1 ORDER BY rowid ASC",
            PROFESSIONAL_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(professional_from_row).collect()
    }

    async fn list_active_by_service_area(
        &self,
        location_text: &str,
    ) -> ApiResult<Vec<Professional>> {
        let all = self.list_active_professionals().await?;
        Ok(all
            .into_iter()
            .filter(|p| p.serves_area(location_text))
            .collect())
    }

    async fn list_active_by_keyword(&self, keyword: &str) -> ApiResult<Vec<Professional>> {
        let all = self.list_active_professionals().await?;
        Ok(all.into_iter().filter(|p| p.has_keyword(keyword)).collect())
    }

    async fn record_review(&self, id: &str, new_rating: f64) -> ApiResult<()> {
        let result = sqlx::query(
            "UPDATE professionals SET rating = ?, review_count = review_count + 1 WHERE id = ?",
        )
        .bind(new_rating)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound(format!("Professional {} not found", id)));
        }
        Ok(())
    }

    async fn set_professional_active(&self, id: &str, is_active: bool) -> ApiResult<()> {
        let result = sqlx::query("UPDATE professionals SET is_active = ? WHERE id = ?")
            .bind(is_active as i64)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound(format!("Professional {} not found", id)));
        }
        tracing::info!("Professional {} active={}", id, is_active);
        Ok(())
    }
}
