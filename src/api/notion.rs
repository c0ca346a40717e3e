//! Notion CRM bridge: database queries plus page-property mapping into
//! lead and call records.

use super::{default_retry_policy, ensure_success, service_base_url};
use crate::config::NotionConfig;
use crate::error::AppError;
use crate::service::call_stats::aggregate;
use crate::service::lead_source::map_lead_source;
use crate::types::call::{CallOutcome, CallRecord};
use crate::types::lead::NotionLead;
use crate::types::stats::{CallStats, TimeRange};
use backon::Retryable;
use chrono::{DateTime, NaiveDate, Utc};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

const PAGE_SIZE: u32 = 100;
const FALLBACK_RPS: NonZeroU32 = NonZeroU32::new(3).unwrap();

pub const CALL_OUTCOME_PROP: &str = "Outcome";
pub const CALL_DATE_PROP: &str = "Call Date";
pub const CALL_DURATION_PROP: &str = "Duration";

#[derive(Clone)]
pub struct NotionClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: String,
    version: String,
    leads_database_id: String,
    calls_database_id: String,
    limiter: Arc<DefaultDirectRateLimiter>,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    results: Vec<NotionPage>,
    #[serde(default)]
    has_more: bool,
    next_cursor: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotionPage {
    pub id: String,
    #[serde(default)]
    pub created_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

#[derive(Debug, Serialize)]
struct QueryBody<'a> {
    page_size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    start_cursor: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<&'a Value>,
}

impl NotionClient {
    pub fn new(http: reqwest::Client, cfg: &NotionConfig) -> Result<Self, AppError> {
        let rps = NonZeroU32::new(cfg.requests_per_second).unwrap_or(FALLBACK_RPS);
        Ok(Self {
            http,
            base_url: service_base_url(&cfg.base_url)?,
            api_key: cfg.api_key.clone(),
            version: cfg.version.clone(),
            leads_database_id: cfg.leads_database_id.clone(),
            calls_database_id: cfg.calls_database_id.clone(),
            limiter: Arc::new(RateLimiter::direct(Quota::per_second(rps))),
        })
    }

    /// Fetch every page of a database, following `next_cursor`.
    pub async fn query_database(
        &self,
        database_id: &str,
        filter: Option<Value>,
    ) -> Result<Vec<NotionPage>, AppError> {
        let url = self
            .base_url
            .join(&format!("v1/databases/{database_id}/query"))?;
        let mut pages = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let body = QueryBody {
                page_size: PAGE_SIZE,
                start_cursor: cursor.as_deref(),
                filter: filter.as_ref(),
            };
            let batch = self.post_query(&url, &body).await?;
            pages.extend(batch.results);
            match (batch.has_more, batch.next_cursor) {
                (true, Some(next)) => cursor = Some(next),
                _ => break,
            }
        }
        debug!(database_id, count = pages.len(), "Notion database fetched");
        Ok(pages)
    }

    async fn post_query(&self, url: &Url, body: &QueryBody<'_>) -> Result<QueryResponse, AppError> {
        (|| async {
            self.limiter.until_ready().await;
            let resp = self
                .http
                .post(url.clone())
                .bearer_auth(&self.api_key)
                .header("Notion-Version", &self.version)
                .json(body)
                .send()
                .await?;
            let resp = ensure_success("Notion", resp)?;
            Ok::<_, AppError>(resp.json::<QueryResponse>().await?)
        })
        .retry(default_retry_policy())
        .when(|e: &AppError| e.is_retryable())
        .notify(|err, dur: Duration| {
            warn!("Notion query retrying after error {}, sleeping {:?}", err, dur);
        })
        .await
    }

    pub async fn fetch_leads(&self) -> Result<Vec<NotionLead>, AppError> {
        if self.leads_database_id.is_empty() {
            return Err(AppError::NotConfigured("Notion leads database"));
        }
        let pages = self.query_database(&self.leads_database_id, None).await?;
        Ok(pages.iter().map(page_to_lead).collect())
    }

    pub async fn fetch_calls(&self, range: TimeRange) -> Result<Vec<CallRecord>, AppError> {
        if self.calls_database_id.is_empty() {
            return Err(AppError::NotConfigured("Notion calls database"));
        }
        let filter = range.start.map(|start| {
            json!({
                "property": CALL_DATE_PROP,
                "date": { "on_or_after": start.to_rfc3339() }
            })
        });
        let pages = self.query_database(&self.calls_database_id, filter).await?;
        Ok(pages
            .iter()
            .filter_map(page_to_call)
            .filter(|c| range.contains(c.called_at))
            .collect())
    }

    pub async fn call_stats(&self, range: TimeRange) -> Result<CallStats, AppError> {
        let calls = self.fetch_calls(range).await?;
        Ok(aggregate(&calls))
    }
}

/// Plain text of a property, whatever its Notion type.
pub fn prop_text(props: &Map<String, Value>, name: &str) -> Option<String> {
    let prop = props.get(name)?;
    let kind = prop.get("type")?.as_str()?;
    let text = match kind {
        "title" | "rich_text" => prop
            .get(kind)?
            .as_array()?
            .iter()
            .filter_map(|t| t.get("plain_text").and_then(Value::as_str))
            .collect::<String>(),
        "select" | "status" => prop.get(kind)?.get("name")?.as_str()?.to_string(),
        "phone_number" | "email" | "url" => prop.get(kind)?.as_str()?.to_string(),
        "number" => prop.get(kind)?.as_f64()?.to_string(),
        "date" => prop.get(kind)?.get("start")?.as_str()?.to_string(),
        _ => return None,
    };
    let text = text.trim().to_string();
    (!text.is_empty()).then_some(text)
}

pub fn prop_number(props: &Map<String, Value>, name: &str) -> Option<f64> {
    props.get(name)?.get("number")?.as_f64()
}

/// Notion dates are either `YYYY-MM-DD` or full RFC3339 timestamps.
pub fn prop_date(props: &Map<String, Value>, name: &str) -> Option<DateTime<Utc>> {
    let start = props.get(name)?.get("date")?.get("start")?.as_str()?;
    if let Ok(dt) = DateTime::parse_from_rfc3339(start) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(start, "%Y-%m-%d")
        .ok()?
        .and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc())
}

/// The page title, whichever property carries it.
fn page_title(props: &Map<String, Value>) -> Option<String> {
    props
        .iter()
        .find(|(_, v)| v.get("type").and_then(Value::as_str) == Some("title"))
        .and_then(|(name, _)| prop_text(props, name))
}

pub fn page_to_lead(page: &NotionPage) -> NotionLead {
    let props = &page.properties;
    NotionLead {
        id: page.id.clone(),
        name: page_title(props).unwrap_or_else(|| "Untitled".to_string()),
        phone: prop_text(props, "Phone"),
        email: prop_text(props, "Email"),
        city: prop_text(props, "City"),
        status: prop_text(props, "Status"),
        source: map_lead_source(prop_text(props, "Source").as_deref()),
        created_time: page.created_time,
    }
}

/// `Duration` is recorded in minutes in the CRM.
pub fn page_to_call(page: &NotionPage) -> Option<CallRecord> {
    let props = &page.properties;
    let raw_outcome = prop_text(props, CALL_OUTCOME_PROP)?;
    let outcome = match raw_outcome.parse::<CallOutcome>() {
        Ok(o) => o,
        Err(e) => {
            debug!(page = %page.id, error = %e, "skipping Notion call page");
            return None;
        }
    };
    let called_at = prop_date(props, CALL_DATE_PROP).or(page.created_time)?;
    let minutes = prop_number(props, CALL_DURATION_PROP).unwrap_or(0.0);
    Some(CallRecord {
        outcome,
        duration_seconds: (minutes * 60.0).round() as i64,
        called_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn page(properties: Value) -> NotionPage {
        NotionPage {
            id: "page-1".into(),
            created_time: Some(Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()),
            properties: properties.as_object().cloned().unwrap_or_default(),
        }
    }

    #[test]
    fn maps_lead_properties() {
        let p = page(json!({
            "Business": {"type": "title", "title": [
                {"plain_text": "Acme "}, {"plain_text": "Roofing"}
            ]},
            "Phone": {"type": "phone_number", "phone_number": "+44 113 000"},
            "Email": {"type": "email", "email": null},
            "City": {"type": "rich_text", "rich_text": [{"plain_text": "Leeds"}]},
            "Status": {"type": "status", "status": {"name": "Contacted"}},
            "Source": {"type": "select", "select": {"name": "Website"}}
        }));
        let lead = page_to_lead(&p);
        assert_eq!(lead.name, "Acme Roofing");
        assert_eq!(lead.phone.as_deref(), Some("+44 113 000"));
        assert_eq!(lead.email, None);
        assert_eq!(lead.city.as_deref(), Some("Leeds"));
        assert_eq!(lead.status.as_deref(), Some("Contacted"));
        assert_eq!(lead.source, crate::types::lead::LeadSource::Website);
    }

    #[test]
    fn maps_call_properties_minutes_to_seconds() {
        let p = page(json!({
            "Outcome": {"type": "select", "select": {"name": "Booked Appointment"}},
            "Call Date": {"type": "date", "date": {"start": "2024-03-05"}},
            "Duration": {"type": "number", "number": 2.5}
        }));
        let call = page_to_call(&p).unwrap();
        assert_eq!(call.outcome, CallOutcome::Booked);
        assert_eq!(call.duration_seconds, 150);
        assert_eq!(
            call.called_at,
            Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn unknown_outcome_is_skipped() {
        let p = page(json!({
            "Outcome": {"type": "select", "select": {"name": "Hung up"}}
        }));
        assert!(page_to_call(&p).is_none());
        let empty = page(json!({}));
        assert!(page_to_call(&empty).is_none());
    }

    #[test]
    fn rfc3339_dates_keep_time() {
        let p = page(json!({
            "Outcome": {"type": "select", "select": {"name": "Interested"}},
            "Call Date": {"type": "date", "date": {"start": "2024-03-05T14:30:00.000+01:00"}}
        }));
        let call = page_to_call(&p).unwrap();
        assert_eq!(
            call.called_at,
            Utc.with_ymd_and_hms(2024, 3, 5, 13, 30, 0).unwrap()
        );
    }
}
