use super::{default_retry_policy, ensure_success, service_base_url};
use crate::config::RetellConfig;
use crate::error::AppError;
use backon::Retryable;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

#[derive(Clone)]
pub struct RetellClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetellAgent {
    pub agent_id: String,
    #[serde(default)]
    pub agent_name: Option<String>,
    #[serde(default)]
    pub voice_id: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub last_modification_timestamp: Option<i64>,
}

/// Body Retell posts to the webhook endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct RetellWebhook {
    pub event: String,
    #[serde(default)]
    pub call: Option<RetellCall>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RetellCall {
    pub call_id: String,
    #[serde(default)]
    pub to_number: Option<String>,
    #[serde(default)]
    pub disconnection_reason: Option<String>,
    #[serde(default)]
    pub start_timestamp: Option<i64>,
    #[serde(default)]
    pub duration_ms: Option<i64>,
    #[serde(default)]
    pub call_analysis: Option<RetellCallAnalysis>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RetellCallAnalysis {
    #[serde(default)]
    pub call_successful: Option<bool>,
    #[serde(default)]
    pub in_voicemail: Option<bool>,
    #[serde(default)]
    pub call_summary: Option<String>,
}

#[derive(Debug, Serialize)]
struct CreatePhoneCall<'a> {
    from_number: &'a str,
    to_number: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    override_agent_id: Option<&'a str>,
    metadata: &'a Value,
}

#[derive(Debug, Deserialize)]
struct PhoneCallResponse {
    call_id: String,
}

impl RetellClient {
    pub fn new(http: reqwest::Client, cfg: &RetellConfig) -> Result<Self, AppError> {
        Ok(Self {
            http,
            base_url: service_base_url(&cfg.base_url)?,
            api_key: cfg.api_key.clone(),
        })
    }

    pub async fn list_agents(&self) -> Result<Vec<RetellAgent>, AppError> {
        let url = self.base_url.join("list-agents")?;
        (|| async {
            let resp = self
                .http
                .get(url.clone())
                .bearer_auth(&self.api_key)
                .send()
                .await?;
            let resp = ensure_success("Retell", resp)?;
            Ok::<_, AppError>(resp.json::<Vec<RetellAgent>>().await?)
        })
        .retry(default_retry_policy())
        .when(|e: &AppError| e.is_retryable())
        .notify(|err, dur: Duration| {
            warn!("Retell list-agents retrying after error {}, sleeping {:?}", err, dur);
        })
        .await
    }

    /// Place an outbound call; returns Retell's `call_id`.
    /// Not retried: a timed-out request may still have dialed.
    pub async fn create_phone_call(
        &self,
        from_number: &str,
        to_number: &str,
        agent_id: Option<&str>,
        metadata: &Value,
    ) -> Result<String, AppError> {
        let url = self.base_url.join("v2/create-phone-call")?;
        let body = CreatePhoneCall {
            from_number,
            to_number,
            override_agent_id: agent_id,
            metadata,
        };
        let resp = self
            .http
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        let call: PhoneCallResponse = ensure_success("Retell", resp)?.json().await?;
        info!(call_id = %call.call_id, to = %to_number, "Retell call placed");
        Ok(call.call_id)
    }
}
