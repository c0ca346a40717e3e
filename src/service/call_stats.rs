//! Call statistics: single-pass aggregation and the cross-source merge used
//! by `/api/calls/stats`.

use crate::api::notion::NotionClient;
use crate::db::Storage;
use crate::error::AppError;
use crate::types::call::{CallRecord, OutcomeCategory};
use crate::types::stats::{CallStats, CombinedCallStats, StatsPeriod, StatsSources};
use chrono::{DateTime, Timelike, Utc};
use tracing::warn;

pub fn aggregate<'a, I>(records: I) -> CallStats
where
    I: IntoIterator<Item = &'a CallRecord>,
{
    let mut stats = CallStats::default();
    let mut total_duration: i64 = 0;

    for record in records {
        stats.total_calls += 1;
        match record.outcome.category() {
            OutcomeCategory::Successful => stats.successful += 1,
            OutcomeCategory::Unsuccessful => stats.unsuccessful += 1,
            OutcomeCategory::Pending => stats.pending += 1,
        }
        *stats
            .calls_by_outcome
            .entry(record.outcome.as_str().to_string())
            .or_default() += 1;
        *stats
            .calls_by_day
            .entry(record.called_at.format("%Y-%m-%d").to_string())
            .or_default() += 1;
        *stats.calls_by_hour.entry(record.called_at.hour()).or_default() += 1;
        total_duration += record.duration_seconds.max(0);
    }

    if stats.total_calls > 0 {
        stats.average_call_duration = total_duration as f64 / stats.total_calls as f64;
    }
    stats
}

/// Merge two stats objects: counters add, keyed maps union with shared keys
/// summed, and the average duration is weighted by each side's call count.
pub fn combine_stats(a: &CallStats, b: &CallStats) -> CallStats {
    let mut out = a.clone();
    out.total_calls += b.total_calls;
    out.successful += b.successful;
    out.unsuccessful += b.unsuccessful;
    out.pending += b.pending;

    for (k, v) in &b.calls_by_outcome {
        *out.calls_by_outcome.entry(k.clone()).or_default() += v;
    }
    for (k, v) in &b.calls_by_day {
        *out.calls_by_day.entry(k.clone()).or_default() += v;
    }
    for (k, v) in &b.calls_by_hour {
        *out.calls_by_hour.entry(*k).or_default() += v;
    }

    out.average_call_duration = if out.total_calls == 0 {
        0.0
    } else {
        (a.average_call_duration * a.total_calls as f64
            + b.average_call_duration * b.total_calls as f64)
            / out.total_calls as f64
    };
    out
}

/// Database stats for the period merged with Notion's. A failing Notion
/// source contributes zero stats and its message is reported instead.
pub async fn combined_call_stats(
    storage: &Storage,
    notion: Option<&NotionClient>,
    period: StatsPeriod,
    now: DateTime<Utc>,
) -> Result<CombinedCallStats, AppError> {
    let range = period.range(now);
    let records: Vec<CallRecord> = storage
        .call_logs_in(range)
        .await?
        .iter()
        .map(CallRecord::from)
        .collect();
    let database = aggregate(&records);

    let (notion_stats, notion_error) = match notion {
        None => (None, None),
        Some(client) => match client.call_stats(range).await {
            Ok(stats) => (Some(stats), None),
            Err(AppError::NotConfigured(_)) => (None, None),
            Err(e) => {
                warn!(error = %e, "Notion call stats unavailable");
                (Some(CallStats::default()), Some(e.to_string()))
            }
        },
    };

    let combined = match notion_stats.as_ref() {
        Some(n) => combine_stats(&database, n),
        None => database.clone(),
    };
    Ok(CombinedCallStats {
        period,
        combined,
        sources: StatsSources {
            database,
            notion: notion_stats,
        },
        notion_error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::call::CallOutcome;
    use chrono::{TimeZone, Utc};

    fn record(outcome: CallOutcome, day: u32, hour: u32, secs: i64) -> CallRecord {
        CallRecord {
            outcome,
            duration_seconds: secs,
            called_at: Utc.with_ymd_and_hms(2024, 6, day, hour, 15, 0).unwrap(),
        }
    }

    #[test]
    fn empty_input_gives_zero_stats() {
        let stats = aggregate(&Vec::<CallRecord>::new());
        assert_eq!(stats, CallStats::default());
        assert_eq!(stats.average_call_duration, 0.0);
    }

    #[test]
    fn aggregate_groups_by_outcome_day_and_hour() {
        let records = vec![
            record(CallOutcome::Booked, 3, 9, 120),
            record(CallOutcome::Interested, 3, 9, 60),
            record(CallOutcome::NoAnswer, 4, 14, 0),
            record(CallOutcome::WrongNumber, 4, 16, 20),
        ];
        let stats = aggregate(&records);

        assert_eq!(stats.total_calls, 4);
        assert_eq!(stats.successful, 2);
        assert_eq!(stats.pending, 1);
        assert_eq!(stats.unsuccessful, 1);
        assert_eq!(stats.calls_by_outcome["Booked"], 1);
        assert_eq!(stats.calls_by_outcome["No Answer"], 1);
        assert_eq!(stats.calls_by_day["2024-06-03"], 2);
        assert_eq!(stats.calls_by_day["2024-06-04"], 2);
        assert_eq!(stats.calls_by_hour[&9], 2);
        assert_eq!(stats.calls_by_hour[&16], 1);
        assert_eq!(stats.average_call_duration, 50.0);
    }

    #[test]
    fn combine_sums_counters_and_unions_keys() {
        let a = aggregate(&[
            record(CallOutcome::Booked, 3, 9, 100),
            record(CallOutcome::Callback, 3, 10, 100),
        ]);
        let b = aggregate(&[
            record(CallOutcome::Booked, 3, 9, 300),
            record(CallOutcome::NotInterested, 5, 11, 300),
        ]);
        let c = combine_stats(&a, &b);

        assert_eq!(c.total_calls, 4);
        assert_eq!(c.successful, 2);
        assert_eq!(c.unsuccessful, 1);
        assert_eq!(c.pending, 1);
        assert_eq!(c.calls_by_outcome["Booked"], 2);
        assert_eq!(c.calls_by_outcome["Callback"], 1);
        assert_eq!(c.calls_by_outcome["Not Interested"], 1);
        assert_eq!(c.calls_by_day["2024-06-03"], 3);
        assert_eq!(c.calls_by_day["2024-06-05"], 1);
        assert_eq!(c.calls_by_hour[&9], 2);
        // equal call counts: plain mean of 100 and 300
        assert_eq!(c.average_call_duration, 200.0);
    }

    #[test]
    fn combining_with_zero_stats_is_identity() {
        let a = aggregate(&[record(CallOutcome::Voicemail, 7, 8, 45)]);
        assert_eq!(combine_stats(&a, &CallStats::default()), a);
        assert_eq!(combine_stats(&CallStats::default(), &a), a);
    }

    #[test]
    fn average_is_weighted_by_call_count() {
        let a = aggregate(&[
            record(CallOutcome::Booked, 1, 9, 60),
            record(CallOutcome::Booked, 1, 9, 60),
            record(CallOutcome::Booked, 1, 9, 60),
        ]);
        let b = aggregate(&[record(CallOutcome::Booked, 1, 9, 260)]);
        assert_eq!(combine_stats(&a, &b).average_call_duration, 110.0);
    }
}
