use crate::domain::errors::DomainError;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const MONITOR_ENABLED_KEY: &str = "recovery.monitor_enabled";
pub const HEALER_ENABLED_KEY: &str = "recovery.healer_enabled";
pub const REPORTER_ENABLED_KEY: &str = "recovery.reporter_enabled";
pub const DAILY_REPORT_TIME_KEY: &str = "daily.report_time";
pub const DAILY_LAST_RUN_KEY: &str = "daily.last_run_date";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepKind {
    BookedMonitor,
    Healer,
    Reporter,
    DailySummary,
}

impl SweepKind {
    pub const ALL: [SweepKind; 4] = [
        SweepKind::BookedMonitor,
        SweepKind::Healer,
        SweepKind::Reporter,
        SweepKind::DailySummary,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SweepKind::BookedMonitor => "booked_monitor",
            SweepKind::Healer => "healer",
            SweepKind::Reporter => "reporter",
            SweepKind::DailySummary => "daily_summary",
        }
    }
}

impl fmt::Display for SweepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SweepKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SweepKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| DomainError::UnknownSweep(s.to_string()))
    }
}

/// The shared configuration record, read fresh on every sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecoverySettings {
    pub monitor_enabled: bool,
    pub healer_enabled: bool,
    pub reporter_enabled: bool,
    pub daily_report_time: NaiveTime,
    pub last_run_date: Option<NaiveDate>,
}

impl Default for RecoverySettings {
    fn default() -> Self {
        Self {
            monitor_enabled: true,
            healer_enabled: true,
            reporter_enabled: true,
            daily_report_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN),
            last_run_date: None,
        }
    }
}

impl RecoverySettings {
    /// The daily summary has no toggle of its own; its guard is `last_run_date`.
    pub fn is_enabled(&self, kind: SweepKind) -> bool {
        match kind {
            SweepKind::BookedMonitor => self.monitor_enabled,
            SweepKind::Healer => self.healer_enabled,
            SweepKind::Reporter => self.reporter_enabled,
            SweepKind::DailySummary => true,
        }
    }
}

/// Parse the loose boolean spellings operators type into the config table.
pub fn parse_toggle(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "true" | "1" | "yes" | "on" | "enabled"
    )
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MonitorReport {
    pub reminders_sent: usize,
    pub completion_checks_sent: usize,
    pub newly_flagged: usize,
    pub skipped_outside_hours: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HealerReport {
    pub examined: usize,
    pub reassigned: usize,
    pub unmatched: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReporterReport {
    pub stuck_leads: usize,
    pub digest_sent: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "sweep", rename_all = "snake_case")]
pub enum SweepOutcome {
    Disabled,
    BookedMonitor(MonitorReport),
    Healer(HealerReport),
    Reporter(ReporterReport),
    DailySummary { sent: bool },
}
