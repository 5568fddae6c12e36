use crate::domain::errors::{DomainError, DomainResult};
use crate::shared::utils::format_timestamp;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Slot {
    pub id: String,
    pub pro_id: String,
    pub start_time: String,
    pub end_time: String,
    pub is_taken: bool,
}

impl Slot {
    pub fn new(pro_id: String, start: DateTime<Utc>, end: DateTime<Utc>) -> DomainResult<Self> {
        if end <= start {
            return Err(DomainError::ValidationError(format!(
                "Slot must end after it starts ({} .. {})",
                start, end
            )));
        }
        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            pro_id,
            start_time: format_timestamp(start),
            end_time: format_timestamp(end),
            is_taken: false,
        })
    }
}
