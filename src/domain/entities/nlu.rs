use serde::{Deserialize, Serialize};

/// Structured fields the language oracle pulled out of the conversation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedFields {
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub issue: Option<String>,
    #[serde(default)]
    pub full_address: Option<String>,
    #[serde(default)]
    pub appointment_time: Option<String>,
}

impl ExtractedFields {
    /// Location and issue are both present; enough to open a lead.
    pub fn has_routing_pair(&self) -> bool {
        non_blank(&self.city) && non_blank(&self.issue)
    }
}

fn non_blank(value: &Option<String>) -> bool {
    value.as_deref().map(|v| !v.trim().is_empty()).unwrap_or(false)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NluOutcome {
    pub reply_text: String,
    #[serde(default)]
    pub transcription: Option<String>,
    #[serde(default)]
    pub extracted: ExtractedFields,
    #[serde(default)]
    pub is_deal: bool,
}

/// What the oracle is asked to analyze: text and/or a media reference.
#[derive(Debug, Clone, Default)]
pub struct NluInput {
    pub text: Option<String>,
    pub media_url: Option<String>,
}
