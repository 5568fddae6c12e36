use crate::domain::entities::{DealDetails, ExtractedFields, Lead, NluOutcome};
use regex::Regex;
use std::sync::OnceLock;

const UNSPECIFIED_TIME: &str = "to be coordinated";

fn marker_regex() -> &'static Regex {
    static MARKER: OnceLock<Regex> = OnceLock::new();
    MARKER.get_or_init(|| {
        Regex::new(r"(?i)\[\s*DEAL\s*:\s*([^|\]]+?)\s*\|\s*([^|\]]+?)\s*\|\s*([^\]]+?)\s*\]")
            .unwrap_or_else(|e| panic!("deal marker pattern must compile: {}", e))
    })
}

/// `[DEAL: <time> | <address> | <issue>]` inside an oracle reply.
pub fn parse_deal_marker(reply: &str) -> Option<DealDetails> {
    marker_regex().captures(reply).map(|caps| DealDetails {
        appointment_time: caps[1].trim().to_string(),
        full_address: caps[2].trim().to_string(),
        issue_type: caps[3].trim().to_string(),
    })
}

/// The reply as the customer should see it.
pub fn strip_deal_marker(reply: &str) -> String {
    marker_regex().replace_all(reply, "").trim().to_string()
}

/// The two deal-confirmation signals, evaluated independently.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DealSignals {
    pub structured_flag: bool,
    pub marker: Option<DealDetails>,
}

impl DealSignals {
    pub fn from_outcome(outcome: &NluOutcome) -> Self {
        Self {
            structured_flag: outcome.is_deal,
            marker: parse_deal_marker(&outcome.reply_text),
        }
    }

    pub fn confirmed(&self) -> bool {
        self.structured_flag || self.marker.is_some()
    }

    /// Marker fields win, then the oracle's extracted fields, then what the lead
    /// already knows.
    pub fn resolve_details(&self, extracted: &ExtractedFields, lead: &Lead) -> DealDetails {
        let pick = |from_marker: Option<&String>, from_fields: &Option<String>, from_lead: &Option<String>| {
            from_marker
                .cloned()
                .or_else(|| non_blank(from_fields))
                .or_else(|| non_blank(from_lead))
        };
        let marker = self.marker.as_ref();

        DealDetails {
            appointment_time: pick(
                marker.map(|m| &m.appointment_time),
                &extracted.appointment_time,
                &lead.appointment_time,
            )
            .unwrap_or_else(|| UNSPECIFIED_TIME.to_string()),
            full_address: pick(
                marker.map(|m| &m.full_address),
                &extracted.full_address,
                &lead.full_address,
            )
            .or_else(|| non_blank(&lead.city))
            .unwrap_or_default(),
            issue_type: pick(marker.map(|m| &m.issue_type), &extracted.issue, &lead.issue_type)
                .unwrap_or_default(),
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::CreateLead;
    use chrono::Utc;

    fn lead() -> Lead {
        Lead::new_contacted(
            &CreateLead {
                chat_id: "c".into(),
                city: "Tel Aviv".into(),
                issue_type: "Leak".into(),
                pro_id: None,
            },
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn test_parse_marker() {
        let reply = "Great, see you then! [DEAL: Tomorrow 10:00 AM | Rothschild Blvd 10, Tel Aviv | Broken Pipe]";
        let deal = parse_deal_marker(reply).unwrap();
        assert_eq!(deal.appointment_time, "Tomorrow 10:00 AM");
        assert_eq!(deal.full_address, "Rothschild Blvd 10, Tel Aviv");
        assert_eq!(deal.issue_type, "Broken Pipe");
    }

    #[test]
    fn test_marker_is_case_insensitive() {
        assert!(parse_deal_marker("[deal: now | here | that]").is_some());
        assert!(parse_deal_marker("[DEAL: only two | fields]").is_none());
        assert!(parse_deal_marker("no marker").is_none());
    }

    #[test]
    fn test_strip_marker() {
        let reply = "See you tomorrow! [DEAL: 10:00 | Herzl 1 | Leak]";
        assert_eq!(strip_deal_marker(reply), "See you tomorrow!");
        assert_eq!(strip_deal_marker("plain"), "plain");
    }

    #[test]
    fn test_structured_flag_alone_confirms() {
        let outcome = NluOutcome {
            reply_text: "Booked!".into(),
            is_deal: true,
            ..Default::default()
        };
        let signals = DealSignals::from_outcome(&outcome);
        assert!(signals.confirmed());
        assert!(signals.marker.is_none());
    }

    #[test]
    fn test_marker_alone_confirms() {
        let outcome = NluOutcome {
            reply_text: "Ok [DEAL: 9am | Herzl 1 | Leak]".into(),
            is_deal: false,
            ..Default::default()
        };
        let signals = DealSignals::from_outcome(&outcome);
        assert!(signals.confirmed());
        assert!(!signals.structured_flag);
    }

    #[test]
    fn test_no_signal() {
        let outcome = NluOutcome {
            reply_text: "What time suits you?".into(),
            ..Default::default()
        };
        assert!(!DealSignals::from_outcome(&outcome).confirmed());
    }

    #[test]
    fn test_details_fall_back_to_fields_then_lead() {
        let signals = DealSignals {
            structured_flag: true,
            marker: None,
        };
        let extracted = ExtractedFields {
            appointment_time: Some("Sunday 8:00".into()),
            ..Default::default()
        };
        let details = signals.resolve_details(&extracted, &lead());
        assert_eq!(details.appointment_time, "Sunday 8:00");
        assert_eq!(details.full_address, "Tel Aviv");
        assert_eq!(details.issue_type, "Leak");
    }

    #[test]
    fn test_marker_details_take_priority() {
        let signals = DealSignals {
            structured_flag: true,
            marker: parse_deal_marker("[DEAL: 10:00 | Herzl 1 | Boiler]"),
        };
        let extracted = ExtractedFields {
            issue: Some("Leak".into()),
            ..Default::default()
        };
        let details = signals.resolve_details(&extracted, &lead());
        assert_eq!(details.issue_type, "Boiler");
        assert_eq!(details.full_address, "Herzl 1");
    }
}
