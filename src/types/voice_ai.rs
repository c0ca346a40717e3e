use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum VoiceLeadStatus {
    Pending,
    Queued,
    Calling,
    Completed,
    Failed,
    #[serde(rename = "Do Not Call")]
    #[sqlx(rename = "Do Not Call")]
    DoNotCall,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum CampaignStatus {
    Draft,
    Active,
    Paused,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum QueueStatus {
    Queued,
    #[serde(rename = "In Progress")]
    #[sqlx(rename = "In Progress")]
    InProgress,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct VoiceAiLead {
    pub id: i64,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub company: Option<String>,
    pub status: VoiceLeadStatus,
    pub campaign_id: Option<i64>,
    pub call_attempts: i64,
    pub last_called_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewVoiceAiLead {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub company: Option<String>,
    pub campaign_id: Option<i64>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VoiceAiLeadUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub company: Option<String>,
    pub status: Option<VoiceLeadStatus>,
    pub campaign_id: Option<i64>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct VoiceAiCampaign {
    pub id: i64,
    pub name: String,
    pub agent_id: Option<String>,
    pub status: CampaignStatus,
    pub max_attempts: i64,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewVoiceAiCampaign {
    pub name: String,
    pub agent_id: Option<String>,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: i64,
    pub description: Option<String>,
}

fn default_max_attempts() -> i64 {
    3
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VoiceAiCampaignUpdate {
    pub name: Option<String>,
    pub agent_id: Option<String>,
    pub status: Option<CampaignStatus>,
    pub max_attempts: Option<i64>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct CallQueueItem {
    pub id: i64,
    pub campaign_id: i64,
    pub lead_id: i64,
    pub status: QueueStatus,
    pub attempts: i64,
    pub retell_call_id: Option<String>,
    pub result: Option<String>,
    pub scheduled_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueueQuery {
    pub status: Option<QueueStatus>,
    pub campaign_id: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct VoiceAiSettings {
    pub retell_agent_id: Option<String>,
    pub from_number: Option<String>,
    pub max_concurrent_calls: i64,
    pub call_window_start: String,
    pub call_window_end: String,
    pub timezone: String,
}

impl Default for VoiceAiSettings {
    fn default() -> Self {
        Self {
            retell_agent_id: None,
            from_number: None,
            max_concurrent_calls: 5,
            call_window_start: "09:00".to_string(),
            call_window_end: "17:00".to_string(),
            timezone: "UTC".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct DispatchReport {
    pub dispatched: usize,
    pub failed: usize,
    pub call_ids: Vec<String>,
}
