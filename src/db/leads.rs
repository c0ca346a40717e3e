use super::sqlite::Storage;
use crate::error::AppError;
use crate::types::lead::{
    Lead, LeadList, LeadQuery, LeadStatus, LeadUpdate, NewLead, NewLeadList,
};
use chrono::Utc;
use std::collections::BTreeMap;

const LEAD_COLUMNS: &str = "id, business_name, contact_name, phone, email, city, country, \
    industry, status, source, priority, list_id, notes, created_at, updated_at";

impl Storage {
    pub async fn insert_lead(&self, lead: &NewLead) -> Result<Lead, AppError> {
        let now = Utc::now();
        let row = sqlx::query_as::<_, Lead>(&format!(
            "INSERT INTO leads (business_name, contact_name, phone, email, city, country, \
             industry, status, source, priority, list_id, notes, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING {LEAD_COLUMNS}"
        ))
        .bind(&lead.business_name)
        .bind(&lead.contact_name)
        .bind(&lead.phone)
        .bind(&lead.email)
        .bind(&lead.city)
        .bind(&lead.country)
        .bind(&lead.industry)
        .bind(lead.status)
        .bind(lead.source)
        .bind(lead.priority)
        .bind(lead.list_id)
        .bind(&lead.notes)
        .bind(now)
        .bind(now)
        .fetch_one(self.pool())
        .await?;
        Ok(row)
    }

    pub async fn get_lead(&self, id: i64) -> Result<Lead, AppError> {
        sqlx::query_as::<_, Lead>(&format!("SELECT {LEAD_COLUMNS} FROM leads WHERE id = ?"))
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| AppError::not_found(format!("Lead {id}")))
    }

    /// Newest first. `search` matches business name, contact, phone or email.
    pub async fn list_leads(&self, query: &LeadQuery) -> Result<Vec<Lead>, AppError> {
        let limit = query.limit.unwrap_or(500).clamp(1, 5000);
        let pattern = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", s.to_lowercase()));
        let rows = sqlx::query_as::<_, Lead>(&format!(
            "SELECT {LEAD_COLUMNS} FROM leads \
             WHERE (?1 IS NULL OR status = ?1) \
               AND (?2 IS NULL OR list_id = ?2) \
               AND (?3 IS NULL OR lower(business_name) LIKE ?3 OR lower(contact_name) LIKE ?3 \
                    OR phone LIKE ?3 OR lower(email) LIKE ?3) \
             ORDER BY created_at DESC, id DESC LIMIT ?4"
        ))
        .bind(query.status)
        .bind(query.list_id)
        .bind(pattern)
        .bind(limit)
        .fetch_all(self.pool())
        .await?;
        Ok(rows)
    }

    pub async fn update_lead(&self, id: i64, update: &LeadUpdate) -> Result<Lead, AppError> {
        sqlx::query_as::<_, Lead>(&format!(
            "UPDATE leads SET \
                business_name = COALESCE(?, business_name), \
                contact_name = COALESCE(?, contact_name), \
                phone = COALESCE(?, phone), \
                email = COALESCE(?, email), \
                city = COALESCE(?, city), \
                country = COALESCE(?, country), \
                industry = COALESCE(?, industry), \
                status = COALESCE(?, status), \
                source = COALESCE(?, source), \
                priority = COALESCE(?, priority), \
                list_id = COALESCE(?, list_id), \
                notes = COALESCE(?, notes), \
                updated_at = ? \
             WHERE id = ? RETURNING {LEAD_COLUMNS}"
        ))
        .bind(&update.business_name)
        .bind(&update.contact_name)
        .bind(&update.phone)
        .bind(&update.email)
        .bind(&update.city)
        .bind(&update.country)
        .bind(&update.industry)
        .bind(update.status)
        .bind(update.source)
        .bind(update.priority)
        .bind(update.list_id)
        .bind(&update.notes)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(self.pool())
        .await?
        .ok_or_else(|| AppError::not_found(format!("Lead {id}")))
    }

    pub async fn delete_lead(&self, id: i64) -> Result<(), AppError> {
        let res = sqlx::query("DELETE FROM leads WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await?;
        if res.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Lead {id}")));
        }
        Ok(())
    }

    pub async fn count_leads_by_status(&self) -> Result<BTreeMap<String, i64>, AppError> {
        let rows: Vec<(LeadStatus, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM leads GROUP BY status")
                .fetch_all(self.pool())
                .await?;
        Ok(rows
            .into_iter()
            .map(|(status, count)| (status.as_str().to_string(), count))
            .collect())
    }

    pub async fn insert_lead_list(&self, list: &NewLeadList) -> Result<LeadList, AppError> {
        let row = sqlx::query_as::<_, LeadList>(
            "INSERT INTO lead_lists (name, description, created_at) VALUES (?, ?, ?) \
             RETURNING id, name, description, 0 AS lead_count, created_at",
        )
        .bind(list.name.trim())
        .bind(&list.description)
        .bind(Utc::now())
        .fetch_one(self.pool())
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::validation(format!("Lead list '{}' already exists", list.name.trim()))
            }
            other => other.into(),
        })?;
        Ok(row)
    }

    pub async fn list_lead_lists(&self) -> Result<Vec<LeadList>, AppError> {
        let rows = sqlx::query_as::<_, LeadList>(
            "SELECT l.id, l.name, l.description, COUNT(ld.id) AS lead_count, l.created_at \
             FROM lead_lists l LEFT JOIN leads ld ON ld.list_id = l.id \
             GROUP BY l.id ORDER BY l.name",
        )
        .fetch_all(self.pool())
        .await?;
        Ok(rows)
    }

    pub async fn get_lead_list(&self, id: i64) -> Result<LeadList, AppError> {
        sqlx::query_as::<_, LeadList>(
            "SELECT l.id, l.name, l.description, COUNT(ld.id) AS lead_count, l.created_at \
             FROM lead_lists l LEFT JOIN leads ld ON ld.list_id = l.id \
             WHERE l.id = ? GROUP BY l.id",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await?
        .ok_or_else(|| AppError::not_found(format!("Lead list {id}")))
    }

    /// Leads in the list are kept and detached (`list_id` set to NULL).
    pub async fn delete_lead_list(&self, id: i64) -> Result<(), AppError> {
        let res = sqlx::query("DELETE FROM lead_lists WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await?;
        if res.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Lead list {id}")));
        }
        Ok(())
    }
}
