use crate::domain::entities::{ConversationTurn, NluInput, NluOutcome};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NluError {
    #[error("Language oracle unavailable: {0}")]
    Unavailable(String),
    #[error("Language oracle returned malformed output: {0}")]
    Malformed(String),
}

/// Black-box language understanding: reads the conversation, extracts
/// structured fields and writes the next reply.
#[async_trait]
pub trait NluOracle: Send + Sync {
    async fn analyze(
        &self,
        history: &[ConversationTurn],
        input: &NluInput,
    ) -> Result<NluOutcome, NluError>;
}
