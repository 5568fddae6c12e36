use chrono::{DateTime, Duration, DurationRound, Utc};

/// Half-width of the slot search window around the estimated visit time.
pub const SLOT_SEARCH_HOURS: i64 = 2;

/// Inclusive window of acceptable slot start times.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotWindow {
    pub estimated: DateTime<Utc>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Rounds up to the next whole hour. A time exactly on the hour (09:00:00.000)
/// is returned unchanged; any later instant within the hour rounds up.
pub fn round_up_to_hour(at: DateTime<Utc>) -> DateTime<Utc> {
    match at.duration_trunc(Duration::hours(1)) {
        Ok(floor) if floor == at => floor,
        Ok(floor) => floor + Duration::hours(1),
        Err(_) => at,
    }
}

pub fn search_window(anchor: DateTime<Utc>) -> SlotWindow {
    let estimated = round_up_to_hour(anchor);
    SlotWindow {
        estimated,
        start: estimated - Duration::hours(SLOT_SEARCH_HOURS),
        end: estimated + Duration::hours(SLOT_SEARCH_HOURS),
    }
}
