use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallStats {
    pub total_calls: u64,
    pub successful: u64,
    pub unsuccessful: u64,
    pub pending: u64,
    pub calls_by_outcome: BTreeMap<String, u64>,
    /// Keyed by `YYYY-MM-DD` (UTC).
    pub calls_by_day: BTreeMap<String, u64>,
    /// Keyed by UTC hour, 0-23.
    pub calls_by_hour: BTreeMap<u32, u64>,
    /// Seconds.
    pub average_call_duration: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatsPeriod {
    Today,
    #[default]
    Week,
    Month,
    All,
}

/// Half-open `[start, end)` window; `None` start means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: Option<DateTime<Utc>>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start.is_none_or(|start| at >= start) && at < self.end
    }
}

impl StatsPeriod {
    pub fn range(&self, now: DateTime<Utc>) -> TimeRange {
        // One second of slack so records stamped "now" by the caller count.
        let end = now + Duration::seconds(1);
        let start = match self {
            StatsPeriod::Today => now
                .date_naive()
                .and_hms_opt(0, 0, 0)
                .map(|midnight| midnight.and_utc()),
            StatsPeriod::Week => Some(now - Duration::days(7)),
            StatsPeriod::Month => Some(now - Duration::days(30)),
            StatsPeriod::All => None,
        };
        TimeRange { start, end }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSources {
    pub database: CallStats,
    pub notion: Option<CallStats>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CombinedCallStats {
    pub period: StatsPeriod,
    pub combined: CallStats,
    pub sources: StatsSources,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notion_error: Option<String>,
}
