use crate::domain::entities::{Lead, LeadStatus};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransitionError {
    #[error("Invalid transition from {from:?} to {to:?}")]
    InvalidTransition {
        from: Option<LeadStatus>,
        to: LeadStatus,
    },
    #[error("Lead {lead_id} has no assigned professional")]
    MissingProfessional { lead_id: String },
    #[error("Lead {lead_id} changed concurrently; expected {expected}")]
    Conflict {
        lead_id: String,
        expected: LeadStatus,
    },
}

/// Validates if a state transition is allowed. `from = None` is lead creation.
///
/// Re-applying a status is not a transition, and nothing leaves `COMPLETED`:
/// rating a completed job updates fields, not the status.
pub fn validate_transition(from: Option<LeadStatus>, to: LeadStatus) -> Result<(), TransitionError> {
    use LeadStatus::*;

    match (from, to) {
        (None, Contacted) => Ok(()),
        (Some(Contacted), New) => Ok(()),
        (Some(New), Booked) => Ok(()),
        (Some(New), Rejected) => Ok(()),
        (Some(Booked), Completed) => Ok(()),
        (Some(Contacted | New | Booked), Cancelled) => Ok(()),

        _ => Err(TransitionError::InvalidTransition { from, to }),
    }
}

/// Validates the transition and the lead-level preconditions of the target state.
pub fn check_transition(lead: &Lead, to: LeadStatus) -> Result<(), TransitionError> {
    validate_transition(Some(lead.status), to)?;

    if matches!(to, LeadStatus::Booked | LeadStatus::Completed) && lead.pro_id.is_none() {
        return Err(TransitionError::MissingProfessional {
            lead_id: lead.id.clone(),
        });
    }

    Ok(())
}

/// Whether the recovery sweeps may move this lead to another professional.
pub fn can_reassign(lead: &Lead) -> bool {
    LeadStatus::PRE_BOOKING.contains(&lead.status)
}
