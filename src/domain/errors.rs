use thiserror::Error;

/// Invariant violations raised by entity constructors and parsers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Unknown lead status: {0}")]
    UnknownLeadStatus(String),
    #[error("Unknown sweep: {0}")]
    UnknownSweep(String),
}

pub type DomainResult<T> = Result<T, DomainError>;
