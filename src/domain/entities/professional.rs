use crate::domain::errors::{DomainError, DomainResult};
use crate::shared::utils::format_timestamp;
use chrono::Utc;
use serde::{Deserialize, Serialize};

pub const DEFAULT_RATING: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Professional {
    pub id: String,
    pub name: String,
    /// Chat identity used for outbound notifications and for recognizing commands.
    pub phone: String,
    pub is_active: bool,
    pub service_areas: Vec<String>,
    pub keywords: Vec<String>,
    pub location: Option<GeoPoint>,
    pub rating: f64,
    pub review_count: i64,
    pub created_at: String,
}

impl Professional {
    pub fn new(
        name: String,
        phone: String,
        service_areas: Vec<String>,
        keywords: Vec<String>,
        location: Option<GeoPoint>,
    ) -> DomainResult<Self> {
        if phone.trim().is_empty() {
            return Err(DomainError::ValidationError(
                "Professional needs a chat identity".to_string(),
            ));
        }
        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            phone: phone.trim().to_string(),
            is_active: true,
            service_areas,
            keywords,
            location,
            rating: DEFAULT_RATING,
            review_count: 0,
            created_at: format_timestamp(Utc::now()),
        })
    }

    pub fn has_keyword(&self, keyword: &str) -> bool {
        let needle = keyword.trim().to_lowercase();
        !needle.is_empty()
            && self
                .keywords
                .iter()
                .any(|k| k.to_lowercase().contains(&needle))
    }

    /// True when some service area contains `location_text`, ignoring case.
    pub fn serves_area(&self, location_text: &str) -> bool {
        let needle = location_text.trim().to_lowercase();
        !needle.is_empty()
            && self
                .service_areas
                .iter()
                .any(|area| area.to_lowercase().contains(&needle))
    }

    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.phone
        } else {
            &self.name
        }
    }
}
