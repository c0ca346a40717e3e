use super::sqlite::Storage;
use crate::error::AppError;
use crate::types::call::{CallLog, CallOutcome, NewCallLog};
use crate::types::stats::TimeRange;
use chrono::{DateTime, Utc};
use serde::Deserialize;

const CALL_COLUMNS: &str = "id, lead_id, business_name, phone, caller, outcome, \
    duration_seconds, notes, source, called_at";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallLogQuery {
    pub outcome: Option<CallOutcome>,
    pub lead_id: Option<i64>,
    pub limit: Option<i64>,
}

impl Storage {
    pub async fn insert_call_log(&self, call: &NewCallLog) -> Result<CallLog, AppError> {
        let called_at = call.called_at.unwrap_or_else(Utc::now);
        let row = sqlx::query_as::<_, CallLog>(&format!(
            "INSERT INTO call_logs (lead_id, business_name, phone, caller, outcome, \
             duration_seconds, notes, source, called_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING {CALL_COLUMNS}"
        ))
        .bind(call.lead_id)
        .bind(&call.business_name)
        .bind(&call.phone)
        .bind(&call.caller)
        .bind(call.outcome)
        .bind(call.duration_seconds.max(0))
        .bind(&call.notes)
        .bind(&call.source)
        .bind(called_at)
        .fetch_one(self.pool())
        .await?;
        Ok(row)
    }

    /// Newest first.
    pub async fn list_call_logs(&self, query: &CallLogQuery) -> Result<Vec<CallLog>, AppError> {
        let limit = query.limit.unwrap_or(100).clamp(1, 1000);
        let rows = sqlx::query_as::<_, CallLog>(&format!(
            "SELECT {CALL_COLUMNS} FROM call_logs \
             WHERE (?1 IS NULL OR outcome = ?1) AND (?2 IS NULL OR lead_id = ?2) \
             ORDER BY called_at DESC, id DESC LIMIT ?3"
        ))
        .bind(query.outcome)
        .bind(query.lead_id)
        .bind(limit)
        .fetch_all(self.pool())
        .await?;
        Ok(rows)
    }

    pub async fn call_logs_in(&self, range: TimeRange) -> Result<Vec<CallLog>, AppError> {
        let rows = sqlx::query_as::<_, CallLog>(&format!(
            "SELECT {CALL_COLUMNS} FROM call_logs \
             WHERE (?1 IS NULL OR called_at >= ?1) AND called_at < ?2 \
             ORDER BY called_at"
        ))
        .bind(range.start)
        .bind(range.end)
        .fetch_all(self.pool())
        .await?;
        Ok(rows)
    }

    pub async fn count_calls_since(&self, since: DateTime<Utc>) -> Result<i64, AppError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM call_logs WHERE called_at >= ?")
            .bind(since)
            .fetch_one(self.pool())
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::memory_storage;
    use chrono::{Duration, TimeZone};

    fn call(outcome: CallOutcome, at: DateTime<Utc>) -> NewCallLog {
        NewCallLog {
            lead_id: None,
            business_name: Some("Acme Plumbing".into()),
            phone: "+15550100".into(),
            caller: Some("Sam".into()),
            outcome,
            duration_seconds: 90,
            notes: None,
            source: "manual".into(),
            called_at: Some(at),
        }
    }

    #[tokio::test]
    async fn range_query_is_half_open() {
        let storage = memory_storage().await;
        let base = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        storage
            .insert_call_log(&call(CallOutcome::Booked, base - Duration::days(2)))
            .await
            .unwrap();
        storage
            .insert_call_log(&call(CallOutcome::NoAnswer, base))
            .await
            .unwrap();
        storage
            .insert_call_log(&call(CallOutcome::Voicemail, base + Duration::hours(1)))
            .await
            .unwrap();

        let range = TimeRange {
            start: Some(base - Duration::days(1)),
            end: base + Duration::hours(1),
        };
        let logs = storage.call_logs_in(range).await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].outcome, CallOutcome::NoAnswer);
    }

    #[tokio::test]
    async fn list_filters_by_outcome_newest_first() {
        let storage = memory_storage().await;
        let base = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        for (i, outcome) in [CallOutcome::Booked, CallOutcome::Booked, CallOutcome::Callback]
            .into_iter()
            .enumerate()
        {
            storage
                .insert_call_log(&call(outcome, base + Duration::minutes(i as i64)))
                .await
                .unwrap();
        }
        let booked = storage
            .list_call_logs(&CallLogQuery {
                outcome: Some(CallOutcome::Booked),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(booked.len(), 2);
        assert!(booked[0].called_at > booked[1].called_at);
    }
}
