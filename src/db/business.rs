use super::models::DbAnalysis;
use super::sqlite::Storage;
use crate::error::AppError;
use crate::types::business::{AnalysisStatus, BusinessAnalysis, BusinessLead, NewBusinessLead};
use chrono::Utc;

const BI_COLUMNS: &str = "id, business_name, city, country, website, phone, industry, \
    analysis_status, pushed_to_caller, created_at, updated_at";

impl Storage {
    /// Case-insensitive match on trimmed `(business_name, city)`.
    pub async fn bi_lead_exists(&self, business_name: &str, city: &str) -> Result<bool, AppError> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM bi_leads \
             WHERE lower(trim(business_name)) = lower(trim(?)) AND lower(trim(city)) = lower(trim(?))",
        )
        .bind(business_name)
        .bind(city)
        .fetch_one(self.pool())
        .await?;
        Ok(count > 0)
    }

    pub async fn insert_bi_lead(&self, lead: &NewBusinessLead) -> Result<BusinessLead, AppError> {
        let now = Utc::now();
        let row = sqlx::query_as::<_, BusinessLead>(&format!(
            "INSERT INTO bi_leads (business_name, city, country, website, phone, industry, \
             analysis_status, pushed_to_caller, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, 0, ?, ?) RETURNING {BI_COLUMNS}"
        ))
        .bind(&lead.business_name)
        .bind(&lead.city)
        .bind(&lead.country)
        .bind(&lead.website)
        .bind(&lead.phone)
        .bind(&lead.industry)
        .bind(AnalysisStatus::Pending)
        .bind(now)
        .bind(now)
        .fetch_one(self.pool())
        .await?;
        Ok(row)
    }

    pub async fn get_bi_lead(&self, id: i64) -> Result<BusinessLead, AppError> {
        sqlx::query_as::<_, BusinessLead>(&format!("SELECT {BI_COLUMNS} FROM bi_leads WHERE id = ?"))
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| AppError::not_found(format!("Business lead {id}")))
    }

    pub async fn list_bi_leads(
        &self,
        status: Option<AnalysisStatus>,
    ) -> Result<Vec<BusinessLead>, AppError> {
        let rows = sqlx::query_as::<_, BusinessLead>(&format!(
            "SELECT {BI_COLUMNS} FROM bi_leads WHERE (?1 IS NULL OR analysis_status = ?1) \
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(status)
        .fetch_all(self.pool())
        .await?;
        Ok(rows)
    }

    pub async fn count_bi_leads_with_status(&self, status: AnalysisStatus) -> Result<i64, AppError> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM bi_leads WHERE analysis_status = ?")
                .bind(status)
                .fetch_one(self.pool())
                .await?;
        Ok(count)
    }

    pub async fn set_analysis_status(
        &self,
        id: i64,
        status: AnalysisStatus,
    ) -> Result<(), AppError> {
        sqlx::query("UPDATE bi_leads SET analysis_status = ?, updated_at = ? WHERE id = ?")
            .bind(status)
            .bind(Utc::now())
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(())
    }

    /// Store the analysis and flip the lead to `Complete` in one transaction.
    pub async fn save_analysis(&self, analysis: &BusinessAnalysis) -> Result<(), AppError> {
        let opportunities = serde_json::to_string(&analysis.opportunities)?;
        let mut tx = self.pool().begin().await?;
        sqlx::query(
            r#"
            INSERT INTO bi_analysis (
                lead_id, google_rating, review_count, competitors_found,
                website_score, summary, opportunities, analyzed_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(lead_id) DO UPDATE SET
                google_rating=excluded.google_rating,
                review_count=excluded.review_count,
                competitors_found=excluded.competitors_found,
                website_score=excluded.website_score,
                summary=excluded.summary,
                opportunities=excluded.opportunities,
                analyzed_at=excluded.analyzed_at
            "#,
        )
        .bind(analysis.lead_id)
        .bind(analysis.google_rating)
        .bind(analysis.review_count)
        .bind(analysis.competitors_found)
        .bind(analysis.website_score)
        .bind(&analysis.summary)
        .bind(opportunities)
        .bind(analysis.analyzed_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE bi_leads SET analysis_status = ?, updated_at = ? WHERE id = ?")
            .bind(AnalysisStatus::Complete)
            .bind(Utc::now())
            .bind(analysis.lead_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn get_analysis(&self, lead_id: i64) -> Result<Option<BusinessAnalysis>, AppError> {
        let row = sqlx::query_as::<_, DbAnalysis>(
            "SELECT lead_id, google_rating, review_count, competitors_found, website_score, \
             summary, opportunities, analyzed_at FROM bi_analysis WHERE lead_id = ?",
        )
        .bind(lead_id)
        .fetch_optional(self.pool())
        .await?;
        Ok(row.map(BusinessAnalysis::try_from).transpose()?)
    }

    pub async fn mark_pushed_to_caller(&self, id: i64) -> Result<(), AppError> {
        sqlx::query("UPDATE bi_leads SET pushed_to_caller = 1, updated_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(())
    }
}
