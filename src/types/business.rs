use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum AnalysisStatus {
    Pending,
    Processing,
    Complete,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct BusinessLead {
    pub id: i64,
    pub business_name: String,
    pub city: String,
    pub country: String,
    pub website: Option<String>,
    pub phone: Option<String>,
    pub industry: Option<String>,
    pub analysis_status: AnalysisStatus,
    pub pushed_to_caller: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BusinessAnalysis {
    pub lead_id: i64,
    pub google_rating: Option<f64>,
    pub review_count: i64,
    pub competitors_found: i64,
    pub website_score: Option<i64>,
    pub summary: Option<String>,
    pub opportunities: Vec<String>,
    pub analyzed_at: DateTime<Utc>,
}

/// One import row as submitted by the dashboard. Required fields are
/// optional here so a missing one can be reported per row.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImportRow {
    pub business_name: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub website: Option<String>,
    pub phone: Option<String>,
    pub industry: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewBusinessLead {
    pub business_name: String,
    pub city: String,
    pub country: String,
    pub website: Option<String>,
    pub phone: Option<String>,
    pub industry: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct ImportReport {
    pub imported: usize,
    pub duplicates: usize,
    pub errors: Vec<String>,
    pub lead_ids: Vec<i64>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct AnalyzeReport {
    pub completed: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct PushReport {
    pub pushed: usize,
    pub skipped: usize,
    pub lead_ids: Vec<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BusinessLeadDetail {
    #[serde(flatten)]
    pub lead: BusinessLead,
    pub analysis: Option<BusinessAnalysis>,
}
