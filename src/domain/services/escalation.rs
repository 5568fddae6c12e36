use chrono::{DateTime, Duration, Timelike, Utc};
use chrono_tz::Tz;

pub const REMIND_PROFESSIONAL_AFTER_HOURS: i64 = 4;
pub const ASK_CUSTOMER_AFTER_HOURS: i64 = 6;
pub const ESCALATE_AFTER_HOURS: i64 = 24;

/// What the booked-job monitor owes a `BOOKED` lead of a given age.
/// The tiers never overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookedTier {
    TooFresh,
    RemindProfessional,
    AskCustomer,
    Escalate,
}

pub fn classify_booked_age(age: Duration) -> BookedTier {
    if age < Duration::hours(REMIND_PROFESSIONAL_AFTER_HOURS) {
        BookedTier::TooFresh
    } else if age < Duration::hours(ASK_CUSTOMER_AFTER_HOURS) {
        BookedTier::RemindProfessional
    } else if age < Duration::hours(ESCALATE_AFTER_HOURS) {
        BookedTier::AskCustomer
    } else {
        BookedTier::Escalate
    }
}

/// Local business hours, `[start_hour, end_hour)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusinessHours {
    pub timezone: Tz,
    pub start_hour: u32,
    pub end_hour: u32,
}

impl BusinessHours {
    pub fn contains(&self, now: DateTime<Utc>) -> bool {
        let hour = now.with_timezone(&self.timezone).hour();
        hour >= self.start_hour && hour < self.end_hour
    }
}
