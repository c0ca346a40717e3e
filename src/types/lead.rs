use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
pub enum LeadStatus {
    New,
    Contacted,
    Qualified,
    Booked,
    #[serde(rename = "Not Interested")]
    #[sqlx(rename = "Not Interested")]
    NotInterested,
    Closed,
}

impl LeadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeadStatus::New => "New",
            LeadStatus::Contacted => "Contacted",
            LeadStatus::Qualified => "Qualified",
            LeadStatus::Booked => "Booked",
            LeadStatus::NotInterested => "Not Interested",
            LeadStatus::Closed => "Closed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum LeadSource {
    Website,
    #[serde(rename = "Cold Call")]
    #[sqlx(rename = "Cold Call")]
    ColdCall,
    Referral,
    #[serde(rename = "Social Media")]
    #[sqlx(rename = "Social Media")]
    SocialMedia,
    Email,
    #[serde(rename = "Business Intelligence")]
    #[sqlx(rename = "Business Intelligence")]
    BusinessIntelligence,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum Priority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct Lead {
    pub id: i64,
    pub business_name: String,
    pub contact_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub industry: Option<String>,
    pub status: LeadStatus,
    pub source: LeadSource,
    pub priority: Option<Priority>,
    pub list_id: Option<i64>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct NewLead {
    pub business_name: String,
    pub contact_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub industry: Option<String>,
    #[serde(default = "default_status")]
    pub status: LeadStatus,
    #[serde(default = "default_source")]
    pub source: LeadSource,
    pub priority: Option<Priority>,
    pub list_id: Option<i64>,
    pub notes: Option<String>,
}

fn default_status() -> LeadStatus {
    LeadStatus::New
}

fn default_source() -> LeadSource {
    LeadSource::Other
}

/// Partial update; absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LeadUpdate {
    pub business_name: Option<String>,
    pub contact_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub industry: Option<String>,
    pub status: Option<LeadStatus>,
    pub source: Option<LeadSource>,
    pub priority: Option<Priority>,
    pub list_id: Option<i64>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LeadQuery {
    pub status: Option<LeadStatus>,
    pub list_id: Option<i64>,
    pub search: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct LeadList {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub lead_count: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewLeadList {
    pub name: String,
    pub description: Option<String>,
}

/// Lead as read from the Notion CRM database.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NotionLead {
    pub id: String,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub city: Option<String>,
    pub status: Option<String>,
    pub source: LeadSource,
    pub created_time: Option<DateTime<Utc>>,
}
