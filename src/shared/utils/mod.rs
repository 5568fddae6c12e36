use chrono::{DateTime, SecondsFormat, Utc};

/// Format a timestamp the way every table stores it: `YYYY-MM-DDTHH:MM:SSZ`.
///
/// The fixed width keeps lexical order equal to time order, which the
/// status+age range queries rely on.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parse a stored RFC 3339 timestamp back into UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
