use crate::domain::entities::LeadStatus;

/// Lifecycle events published after a write has been recorded
#[derive(Debug, Clone)]
pub enum SystemEvent {
    LeadCreated {
        lead_id: String,
        chat_id: String,
        pro_id: Option<String>,
        timestamp: String, // ISO 8601
    },
    LeadStatusChanged {
        lead_id: String,
        old_status: LeadStatus,
        new_status: LeadStatus,
        pro_id: Option<String>,
        timestamp: String, // ISO 8601
    },
    LeadReassigned {
        lead_id: String,
        previous_pro_id: Option<String>,
        new_pro_id: String,
        timestamp: String, // ISO 8601
    },
    LeadFlagged {
        lead_id: String,
        flag: String,
        timestamp: String, // ISO 8601
    },
    SlotClaimed {
        lead_id: String,
        pro_id: String,
        claimed: bool,
        timestamp: String, // ISO 8601
    },
    ProfessionalRated {
        pro_id: String,
        lead_id: String,
        given: i64,
        new_rating: f64,
        timestamp: String, // ISO 8601
    },
    NotificationFailed {
        channel_id: String,
        attempts: u32,
        timestamp: String, // ISO 8601
    },
}

impl SystemEvent {
    pub fn name(&self) -> &'static str {
        match self {
            SystemEvent::LeadCreated { .. } => "lead.created",
            SystemEvent::LeadStatusChanged { .. } => "lead.status_changed",
            SystemEvent::LeadReassigned { .. } => "lead.reassigned",
            SystemEvent::LeadFlagged { .. } => "lead.flagged",
            SystemEvent::SlotClaimed { .. } => "slot.claimed",
            SystemEvent::ProfessionalRated { .. } => "professional.rated",
            SystemEvent::NotificationFailed { .. } => "notification.failed",
        }
    }
}
