use crate::domain::errors::{DomainError, DomainResult};
use crate::shared::utils::{format_timestamp, parse_timestamp};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Marker stored in `Lead::flag` when a booked job has gone unattended too long.
pub const REQUIRES_ADMIN_FLAG: &str = "requires_admin";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeadStatus {
    New,
    Contacted,
    Booked,
    Completed,
    Rejected,
    Cancelled,
}

impl LeadStatus {
    /// Statuses that count against a professional's load.
    pub const LOAD_BEARING: [LeadStatus; 3] =
        [LeadStatus::New, LeadStatus::Contacted, LeadStatus::Booked];

    /// Statuses the healer and reporter consider "stuck before booking".
    pub const PRE_BOOKING: [LeadStatus; 2] = [LeadStatus::New, LeadStatus::Contacted];

    pub fn as_str(&self) -> &'static str {
        match self {
            LeadStatus::New => "new",
            LeadStatus::Contacted => "contacted",
            LeadStatus::Booked => "booked",
            LeadStatus::Completed => "completed",
            LeadStatus::Rejected => "rejected",
            LeadStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for LeadStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "new" => Ok(LeadStatus::New),
            "contacted" => Ok(LeadStatus::Contacted),
            "booked" => Ok(LeadStatus::Booked),
            "completed" => Ok(LeadStatus::Completed),
            "rejected" => Ok(LeadStatus::Rejected),
            "cancelled" => Ok(LeadStatus::Cancelled),
            other => Err(DomainError::UnknownLeadStatus(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lead {
    pub id: String,
    pub chat_id: String,
    pub status: LeadStatus,
    pub pro_id: Option<String>,
    pub city: Option<String>,
    pub issue_type: Option<String>,
    pub full_address: Option<String>,
    pub appointment_time: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub completed_at: Option<String>,
    pub waiting_for_rating: bool,
    pub rating_given: Option<i64>,
    pub review_comment: Option<String>,
    pub flag: Option<String>,
    pub reassigned_from: Option<String>,
}

impl Lead {
    /// A freshly routed conversation: location and issue are known, the deal is not.
    pub fn new_contacted(create: &CreateLead, now: DateTime<Utc>) -> DomainResult<Self> {
        create.validate()?;
        let ts = format_timestamp(now);
        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            chat_id: create.chat_id.trim().to_string(),
            status: LeadStatus::Contacted,
            pro_id: create.pro_id.clone(),
            city: Some(create.city.trim().to_string()),
            issue_type: Some(create.issue_type.trim().to_string()),
            full_address: None,
            appointment_time: None,
            created_at: ts.clone(),
            updated_at: ts,
            completed_at: None,
            waiting_for_rating: false,
            rating_given: None,
            review_comment: None,
            flag: None,
            reassigned_from: None,
        })
    }

    pub fn created_at_datetime(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.created_at)
    }

    /// Age relative to `created_at`, the anchor every timing rule uses.
    pub fn age(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.created_at_datetime().map(|created| now - created)
    }

    pub fn requires_admin(&self) -> bool {
        self.flag.as_deref() == Some(REQUIRES_ADMIN_FLAG)
    }

    /// Location text used for routing, falling back to the address.
    pub fn routing_location(&self) -> Option<&str> {
        self.city
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .or(self.full_address.as_deref())
    }

    pub fn check_invariants(&self) -> DomainResult<()> {
        if matches!(self.status, LeadStatus::Booked | LeadStatus::Completed)
            && self.pro_id.is_none()
        {
            return Err(DomainError::ValidationError(format!(
                "Lead {} is {} without a professional",
                self.id, self.status
            )));
        }
        if self.waiting_for_rating && self.status != LeadStatus::Completed {
            return Err(DomainError::ValidationError(format!(
                "Lead {} waits for a rating while {}",
                self.id, self.status
            )));
        }
        if let Some(rating) = self.rating_given {
            if !(1..=5).contains(&rating) {
                return Err(DomainError::ValidationError(format!(
                    "Lead {} has out-of-range rating {}",
                    self.id, rating
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateLead {
    pub chat_id: String,
    pub city: String,
    pub issue_type: String,
    pub pro_id: Option<String>,
}

impl CreateLead {
    pub fn validate(&self) -> DomainResult<()> {
        if self.chat_id.trim().is_empty() {
            return Err(DomainError::ValidationError(
                "Lead must belong to a conversation".to_string(),
            ));
        }
        if self.city.trim().is_empty() || self.issue_type.trim().is_empty() {
            return Err(DomainError::ValidationError(
                "Lead needs both a location and an issue".to_string(),
            ));
        }
        Ok(())
    }
}

/// Finalized deal details captured on `CONTACTED -> NEW`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DealDetails {
    pub appointment_time: String,
    pub full_address: String,
    pub issue_type: String,
}
