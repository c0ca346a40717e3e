//! Row structs for tables whose columns don't map one-to-one onto the
//! domain types.

use crate::types::business::BusinessAnalysis;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct DbAnalysis {
    pub lead_id: i64,
    pub google_rating: Option<f64>,
    pub review_count: i64,
    pub competitors_found: i64,
    pub website_score: Option<i64>,
    pub summary: Option<String>,
    /// JSON array, serialized as text
    pub opportunities: String,
    pub analyzed_at: DateTime<Utc>,
}

impl TryFrom<DbAnalysis> for BusinessAnalysis {
    type Error = serde_json::Error;

    fn try_from(d: DbAnalysis) -> Result<Self, Self::Error> {
        Ok(BusinessAnalysis {
            lead_id: d.lead_id,
            google_rating: d.google_rating,
            review_count: d.review_count,
            competitors_found: d.competitors_found,
            website_score: d.website_score,
            summary: d.summary,
            opportunities: serde_json::from_str(&d.opportunities)?,
            analyzed_at: d.analyzed_at,
        })
    }
}
