use super::{default_retry_policy, ensure_success, service_base_url};
use crate::config::McpConfig;
use crate::error::AppError;
use crate::types::business::{BusinessAnalysis, BusinessLead};
use backon::Retryable;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;
use url::Url;

/// Client for the enrichment server the BI pipeline delegates analysis to.
#[derive(Clone)]
pub struct McpClient {
    http: reqwest::Client,
    analyze_url: Url,
    api_key: Option<String>,
}

#[derive(Debug, Serialize)]
struct AnalyzeRequest<'a> {
    business_name: &'a str,
    city: &'a str,
    country: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    website: Option<&'a str>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzeResponse {
    #[serde(default)]
    pub google_rating: Option<f64>,
    #[serde(default)]
    pub review_count: i64,
    #[serde(default)]
    pub competitors_found: i64,
    #[serde(default)]
    pub website_score: Option<i64>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub opportunities: Vec<String>,
}

impl AnalyzeResponse {
    pub fn into_analysis(self, lead_id: i64) -> BusinessAnalysis {
        BusinessAnalysis {
            lead_id,
            google_rating: self.google_rating,
            review_count: self.review_count,
            competitors_found: self.competitors_found,
            website_score: self.website_score,
            summary: self.summary,
            opportunities: self.opportunities,
            analyzed_at: Utc::now(),
        }
    }
}

impl McpClient {
    pub fn new(http: reqwest::Client, cfg: &McpConfig) -> Result<Self, AppError> {
        let base = service_base_url(&cfg.server_url)?;
        Ok(Self {
            http,
            analyze_url: base.join("analyze")?,
            api_key: cfg.api_key.clone().filter(|k| !k.is_empty()),
        })
    }

    pub async fn analyze(&self, lead: &BusinessLead) -> Result<BusinessAnalysis, AppError> {
        let body = AnalyzeRequest {
            business_name: &lead.business_name,
            city: &lead.city,
            country: &lead.country,
            website: lead.website.as_deref(),
        };
        let resp = (|| async {
            let mut req = self.http.post(self.analyze_url.clone()).json(&body);
            if let Some(key) = self.api_key.as_ref() {
                req = req.bearer_auth(key);
            }
            let resp = ensure_success("MCP server", req.send().await?)?;
            Ok::<_, AppError>(resp.json::<AnalyzeResponse>().await?)
        })
        .retry(default_retry_policy())
        .when(|e: &AppError| e.is_retryable())
        .notify(|err, dur: Duration| {
            warn!(lead_id = lead.id, "MCP analyze retrying after error {}, sleeping {:?}", err, dur);
        })
        .await?;
        Ok(resp.into_analysis(lead.id))
    }
}
