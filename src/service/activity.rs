use crate::db::{CallLogQuery, Storage};
use crate::error::AppError;
use crate::types::business::AnalysisStatus;
use crate::types::call::CallLog;
use crate::types::email::{EmailLog, EmailStatus};
use crate::types::lead::LeadStatus;
use crate::types::stats::StatsPeriod;
use crate::types::voice_ai::{CampaignStatus, QueueStatus};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

pub const DEFAULT_ACTIVITY_LIMIT: i64 = 20;
pub const MAX_ACTIVITY_LIMIT: i64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Call,
    Email,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityItem {
    pub kind: ActivityKind,
    pub id: i64,
    pub title: String,
    pub detail: String,
    pub at: DateTime<Utc>,
}

impl From<&CallLog> for ActivityItem {
    fn from(call: &CallLog) -> Self {
        let who = call.business_name.as_deref().unwrap_or(&call.phone);
        Self {
            kind: ActivityKind::Call,
            id: call.id,
            title: format!("Call with {who}"),
            detail: call.outcome.to_string(),
            at: call.called_at,
        }
    }
}

impl From<&EmailLog> for ActivityItem {
    fn from(log: &EmailLog) -> Self {
        let detail = match (log.status, log.error.as_deref()) {
            (EmailStatus::Failed, Some(err)) => format!("Failed: {err}"),
            (status, _) => format!("{status:?}"),
        };
        Self {
            kind: ActivityKind::Email,
            id: log.id,
            title: format!("Email to {}: {}", log.recipient, log.subject),
            detail,
            at: log.created_at,
        }
    }
}

/// Newest first, at most `limit` items.
pub fn merge_feed(calls: &[CallLog], emails: &[EmailLog], limit: usize) -> Vec<ActivityItem> {
    let mut items: Vec<ActivityItem> = calls
        .iter()
        .map(ActivityItem::from)
        .chain(emails.iter().map(ActivityItem::from))
        .collect();
    items.sort_by(|a, b| b.at.cmp(&a.at));
    items.truncate(limit);
    items
}

pub async fn recent_activity(
    storage: &Storage,
    limit: Option<i64>,
) -> Result<Vec<ActivityItem>, AppError> {
    let limit = limit
        .unwrap_or(DEFAULT_ACTIVITY_LIMIT)
        .clamp(1, MAX_ACTIVITY_LIMIT);
    let calls = storage
        .list_call_logs(&CallLogQuery {
            limit: Some(limit),
            ..Default::default()
        })
        .await?;
    let emails = storage.list_email_logs(limit).await?;
    Ok(merge_feed(&calls, &emails, limit as usize))
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationsOverview {
    pub leads_by_status: BTreeMap<String, i64>,
    pub total_leads: i64,
    pub calls_today: i64,
    pub emails_sent_today: i64,
    pub active_campaigns: i64,
    pub queued_calls: i64,
    pub bi_pending_analysis: i64,
}

pub async fn operations_overview(storage: &Storage) -> Result<OperationsOverview, AppError> {
    let today = StatsPeriod::Today.range(Utc::now()).start.unwrap_or_default();
    let mut leads_by_status = storage.count_leads_by_status().await?;
    for status in [
        LeadStatus::New,
        LeadStatus::Contacted,
        LeadStatus::Qualified,
        LeadStatus::Booked,
        LeadStatus::NotInterested,
        LeadStatus::Closed,
    ] {
        leads_by_status.entry(status.as_str().to_string()).or_insert(0);
    }

    Ok(OperationsOverview {
        total_leads: leads_by_status.values().sum(),
        leads_by_status,
        calls_today: storage.count_calls_since(today).await?,
        emails_sent_today: storage.count_emails_sent_since(today).await?,
        active_campaigns: storage
            .count_campaigns_with_status(CampaignStatus::Active)
            .await?,
        queued_calls: storage.count_queue_with_status(QueueStatus::Queued).await?,
        bi_pending_analysis: storage
            .count_bi_leads_with_status(AnalysisStatus::Pending)
            .await?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::memory_storage;
    use crate::types::call::{CallOutcome, NewCallLog};
    use crate::types::lead::{LeadSource, NewLead};
    use chrono::Duration;

    fn call_at(id: i64, at: DateTime<Utc>) -> CallLog {
        CallLog {
            id,
            lead_id: None,
            business_name: Some("Acme".into()),
            phone: "+1555".into(),
            caller: None,
            outcome: CallOutcome::Booked,
            duration_seconds: 60,
            notes: None,
            source: "manual".into(),
            called_at: at,
        }
    }

    fn email_at(id: i64, at: DateTime<Utc>) -> EmailLog {
        EmailLog {
            id,
            send_id: None,
            lead_id: None,
            recipient: "a@b.test".into(),
            subject: "Hi".into(),
            status: EmailStatus::Failed,
            error: Some("bounced".into()),
            created_at: at,
        }
    }

    #[test]
    fn feed_interleaves_newest_first() {
        let now = Utc::now();
        let calls = vec![call_at(1, now - Duration::minutes(10)), call_at(2, now)];
        let emails = vec![email_at(7, now - Duration::minutes(5))];
        let feed = merge_feed(&calls, &emails, 10);
        let order: Vec<(ActivityKind, i64)> = feed.iter().map(|i| (i.kind, i.id)).collect();
        assert_eq!(
            order,
            vec![
                (ActivityKind::Call, 2),
                (ActivityKind::Email, 7),
                (ActivityKind::Call, 1)
            ]
        );
        assert_eq!(feed[1].detail, "Failed: bounced");
        assert_eq!(merge_feed(&calls, &emails, 2).len(), 2);
    }

    #[tokio::test]
    async fn overview_counts() {
        let storage = memory_storage().await;
        storage
            .insert_lead(&NewLead {
                business_name: "Acme".into(),
                contact_name: None,
                phone: None,
                email: None,
                city: None,
                country: None,
                industry: None,
                status: LeadStatus::Contacted,
                source: LeadSource::Other,
                priority: None,
                list_id: None,
                notes: None,
            })
            .await
            .unwrap();
        storage
            .insert_call_log(&NewCallLog {
                lead_id: None,
                business_name: None,
                phone: "+1555".into(),
                caller: None,
                outcome: CallOutcome::Callback,
                duration_seconds: 30,
                notes: None,
                source: "manual".into(),
                called_at: None,
            })
            .await
            .unwrap();

        let overview = operations_overview(&storage).await.unwrap();
        assert_eq!(overview.total_leads, 1);
        assert_eq!(overview.leads_by_status["Contacted"], 1);
        assert_eq!(overview.leads_by_status["New"], 0);
        assert_eq!(overview.calls_today, 1);
        assert_eq!(overview.emails_sent_today, 0);
    }
}
