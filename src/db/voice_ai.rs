use super::sqlite::Storage;
use crate::error::AppError;
use crate::types::voice_ai::{
    CallQueueItem, CampaignStatus, NewVoiceAiCampaign, NewVoiceAiLead, QueueQuery, QueueStatus,
    VoiceAiCampaign, VoiceAiCampaignUpdate, VoiceAiLead, VoiceAiLeadUpdate, VoiceAiSettings,
    VoiceLeadStatus,
};
use chrono::Utc;

const VOICE_LEAD_COLUMNS: &str = "id, name, phone, email, company, status, campaign_id, \
    call_attempts, last_called_at, notes, created_at";
const CAMPAIGN_COLUMNS: &str = "id, name, agent_id, status, max_attempts, description, created_at";
const QUEUE_COLUMNS: &str = "id, campaign_id, lead_id, status, attempts, retell_call_id, result, \
    scheduled_at, updated_at";

impl Storage {
    // ---- leads ----

    pub async fn insert_voice_lead(&self, lead: &NewVoiceAiLead) -> Result<VoiceAiLead, AppError> {
        let row = sqlx::query_as::<_, VoiceAiLead>(&format!(
            "INSERT INTO voice_ai_leads (name, phone, email, company, status, campaign_id, notes, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?) RETURNING {VOICE_LEAD_COLUMNS}"
        ))
        .bind(&lead.name)
        .bind(&lead.phone)
        .bind(&lead.email)
        .bind(&lead.company)
        .bind(VoiceLeadStatus::Pending)
        .bind(lead.campaign_id)
        .bind(&lead.notes)
        .bind(Utc::now())
        .fetch_one(self.pool())
        .await?;
        Ok(row)
    }

    pub async fn get_voice_lead(&self, id: i64) -> Result<VoiceAiLead, AppError> {
        sqlx::query_as::<_, VoiceAiLead>(&format!(
            "SELECT {VOICE_LEAD_COLUMNS} FROM voice_ai_leads WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await?
        .ok_or_else(|| AppError::not_found(format!("Voice AI lead {id}")))
    }

    pub async fn list_voice_leads(
        &self,
        campaign_id: Option<i64>,
    ) -> Result<Vec<VoiceAiLead>, AppError> {
        let rows = sqlx::query_as::<_, VoiceAiLead>(&format!(
            "SELECT {VOICE_LEAD_COLUMNS} FROM voice_ai_leads \
             WHERE (?1 IS NULL OR campaign_id = ?1) ORDER BY created_at DESC, id DESC"
        ))
        .bind(campaign_id)
        .fetch_all(self.pool())
        .await?;
        Ok(rows)
    }

    pub async fn update_voice_lead(
        &self,
        id: i64,
        update: &VoiceAiLeadUpdate,
    ) -> Result<VoiceAiLead, AppError> {
        sqlx::query_as::<_, VoiceAiLead>(&format!(
            "UPDATE voice_ai_leads SET \
                name = COALESCE(?, name), \
                phone = COALESCE(?, phone), \
                email = COALESCE(?, email), \
                company = COALESCE(?, company), \
                status = COALESCE(?, status), \
                campaign_id = COALESCE(?, campaign_id), \
                notes = COALESCE(?, notes) \
             WHERE id = ? RETURNING {VOICE_LEAD_COLUMNS}"
        ))
        .bind(&update.name)
        .bind(&update.phone)
        .bind(&update.email)
        .bind(&update.company)
        .bind(update.status)
        .bind(update.campaign_id)
        .bind(&update.notes)
        .bind(id)
        .fetch_optional(self.pool())
        .await?
        .ok_or_else(|| AppError::not_found(format!("Voice AI lead {id}")))
    }

    pub async fn delete_voice_lead(&self, id: i64) -> Result<(), AppError> {
        let res = sqlx::query("DELETE FROM voice_ai_leads WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await?;
        if res.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Voice AI lead {id}")));
        }
        Ok(())
    }

    pub async fn set_voice_lead_status(
        &self,
        id: i64,
        status: VoiceLeadStatus,
    ) -> Result<(), AppError> {
        sqlx::query("UPDATE voice_ai_leads SET status = ? WHERE id = ?")
            .bind(status)
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(())
    }

    pub async fn record_voice_lead_attempt(&self, id: i64) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE voice_ai_leads SET status = ?, call_attempts = call_attempts + 1, \
             last_called_at = ? WHERE id = ?",
        )
        .bind(VoiceLeadStatus::Calling)
        .bind(Utc::now())
        .bind(id)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    // ---- campaigns ----

    pub async fn insert_campaign(
        &self,
        campaign: &NewVoiceAiCampaign,
    ) -> Result<VoiceAiCampaign, AppError> {
        let row = sqlx::query_as::<_, VoiceAiCampaign>(&format!(
            "INSERT INTO voice_ai_campaigns (name, agent_id, status, max_attempts, description, created_at) \
             VALUES (?, ?, ?, ?, ?, ?) RETURNING {CAMPAIGN_COLUMNS}"
        ))
        .bind(&campaign.name)
        .bind(&campaign.agent_id)
        .bind(CampaignStatus::Draft)
        .bind(campaign.max_attempts.max(1))
        .bind(&campaign.description)
        .bind(Utc::now())
        .fetch_one(self.pool())
        .await?;
        Ok(row)
    }

    pub async fn get_campaign(&self, id: i64) -> Result<VoiceAiCampaign, AppError> {
        sqlx::query_as::<_, VoiceAiCampaign>(&format!(
            "SELECT {CAMPAIGN_COLUMNS} FROM voice_ai_campaigns WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await?
        .ok_or_else(|| AppError::not_found(format!("Campaign {id}")))
    }

    pub async fn list_campaigns(&self) -> Result<Vec<VoiceAiCampaign>, AppError> {
        let rows = sqlx::query_as::<_, VoiceAiCampaign>(&format!(
            "SELECT {CAMPAIGN_COLUMNS} FROM voice_ai_campaigns ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(self.pool())
        .await?;
        Ok(rows)
    }

    pub async fn update_campaign(
        &self,
        id: i64,
        update: &VoiceAiCampaignUpdate,
    ) -> Result<VoiceAiCampaign, AppError> {
        sqlx::query_as::<_, VoiceAiCampaign>(&format!(
            "UPDATE voice_ai_campaigns SET \
                name = COALESCE(?, name), \
                agent_id = COALESCE(?, agent_id), \
                status = COALESCE(?, status), \
                max_attempts = COALESCE(?, max_attempts), \
                description = COALESCE(?, description) \
             WHERE id = ? RETURNING {CAMPAIGN_COLUMNS}"
        ))
        .bind(&update.name)
        .bind(&update.agent_id)
        .bind(update.status)
        .bind(update.max_attempts.map(|n| n.max(1)))
        .bind(&update.description)
        .bind(id)
        .fetch_optional(self.pool())
        .await?
        .ok_or_else(|| AppError::not_found(format!("Campaign {id}")))
    }

    pub async fn delete_campaign(&self, id: i64) -> Result<(), AppError> {
        let res = sqlx::query("DELETE FROM voice_ai_campaigns WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await?;
        if res.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Campaign {id}")));
        }
        Ok(())
    }

    pub async fn count_campaigns_with_status(
        &self,
        status: CampaignStatus,
    ) -> Result<i64, AppError> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM voice_ai_campaigns WHERE status = ?")
                .bind(status)
                .fetch_one(self.pool())
                .await?;
        Ok(count)
    }

    /// Enqueue every callable lead of the campaign and activate it, atomically.
    /// Callable: `Pending`, or `Failed` with attempts left. Returns queued items.
    pub async fn enqueue_campaign(
        &self,
        campaign: &VoiceAiCampaign,
    ) -> Result<Vec<CallQueueItem>, AppError> {
        let now = Utc::now();
        let mut tx = self.pool().begin().await?;

        let lead_ids: Vec<(i64,)> = sqlx::query_as(
            "SELECT id FROM voice_ai_leads WHERE campaign_id = ? \
             AND (status = ? OR (status = ? AND call_attempts < ?)) ORDER BY id",
        )
        .bind(campaign.id)
        .bind(VoiceLeadStatus::Pending)
        .bind(VoiceLeadStatus::Failed)
        .bind(campaign.max_attempts)
        .fetch_all(&mut *tx)
        .await?;

        let mut items = Vec::with_capacity(lead_ids.len());
        for (lead_id,) in lead_ids {
            let item = sqlx::query_as::<_, CallQueueItem>(&format!(
                "INSERT INTO voice_ai_call_queue (campaign_id, lead_id, status, attempts, scheduled_at, updated_at) \
                 VALUES (?, ?, ?, 0, ?, ?) RETURNING {QUEUE_COLUMNS}"
            ))
            .bind(campaign.id)
            .bind(lead_id)
            .bind(QueueStatus::Queued)
            .bind(now)
            .bind(now)
            .fetch_one(&mut *tx)
            .await?;

            sqlx::query("UPDATE voice_ai_leads SET status = ? WHERE id = ?")
                .bind(VoiceLeadStatus::Queued)
                .bind(lead_id)
                .execute(&mut *tx)
                .await?;
            items.push(item);
        }

        sqlx::query("UPDATE voice_ai_campaigns SET status = ? WHERE id = ?")
            .bind(CampaignStatus::Active)
            .bind(campaign.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(items)
    }

    // ---- queue ----

    /// Oldest scheduled first.
    pub async fn list_queue(&self, query: &QueueQuery) -> Result<Vec<CallQueueItem>, AppError> {
        let limit = query.limit.unwrap_or(200).clamp(1, 1000);
        let rows = sqlx::query_as::<_, CallQueueItem>(&format!(
            "SELECT {QUEUE_COLUMNS} FROM voice_ai_call_queue \
             WHERE (?1 IS NULL OR status = ?1) AND (?2 IS NULL OR campaign_id = ?2) \
             ORDER BY scheduled_at, id LIMIT ?3"
        ))
        .bind(query.status)
        .bind(query.campaign_id)
        .bind(limit)
        .fetch_all(self.pool())
        .await?;
        Ok(rows)
    }

    pub async fn count_queue_with_status(&self, status: QueueStatus) -> Result<i64, AppError> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM voice_ai_call_queue WHERE status = ?")
                .bind(status)
                .fetch_one(self.pool())
                .await?;
        Ok(count)
    }

    pub async fn find_queue_item_by_call_id(
        &self,
        call_id: &str,
    ) -> Result<Option<CallQueueItem>, AppError> {
        let row = sqlx::query_as::<_, CallQueueItem>(&format!(
            "SELECT {QUEUE_COLUMNS} FROM voice_ai_call_queue WHERE retell_call_id = ?"
        ))
        .bind(call_id)
        .fetch_optional(self.pool())
        .await?;
        Ok(row)
    }

    /// Move up to `limit` `Queued` items to `In Progress` in one statement, so
    /// concurrent dispatchers never claim the same item. Oldest scheduled first.
    pub async fn claim_queued_items(&self, limit: i64) -> Result<Vec<CallQueueItem>, AppError> {
        let mut rows = sqlx::query_as::<_, CallQueueItem>(&format!(
            "UPDATE voice_ai_call_queue SET status = ?1, attempts = attempts + 1, updated_at = ?2 \
             WHERE status = ?3 AND id IN ( \
                 SELECT id FROM voice_ai_call_queue WHERE status = ?3 \
                 ORDER BY scheduled_at, id LIMIT ?4) \
             RETURNING {QUEUE_COLUMNS}"
        ))
        .bind(QueueStatus::InProgress)
        .bind(Utc::now())
        .bind(QueueStatus::Queued)
        .bind(limit.max(1))
        .fetch_all(self.pool())
        .await?;
        rows.sort_by(|a, b| (a.scheduled_at, a.id).cmp(&(b.scheduled_at, b.id)));
        Ok(rows)
    }

    pub async fn set_queue_call_id(&self, id: i64, call_id: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE voice_ai_call_queue SET retell_call_id = ?, updated_at = ? WHERE id = ?")
            .bind(call_id)
            .bind(Utc::now())
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(())
    }

    /// Close an `In Progress` item. Returns `false` when the item was not in
    /// progress, e.g. it was already finished by an earlier event.
    pub async fn finish_queue_item(
        &self,
        id: i64,
        status: QueueStatus,
        result: Option<&str>,
    ) -> Result<bool, AppError> {
        let res = sqlx::query(
            "UPDATE voice_ai_call_queue SET status = ?, result = ?, updated_at = ? \
             WHERE id = ? AND status = ?",
        )
        .bind(status)
        .bind(result)
        .bind(Utc::now())
        .bind(id)
        .bind(QueueStatus::InProgress)
        .execute(self.pool())
        .await?;
        Ok(res.rows_affected() > 0)
    }

    // ---- settings ----

    pub async fn get_voice_settings(&self) -> Result<Option<VoiceAiSettings>, AppError> {
        let row = sqlx::query_as::<_, VoiceAiSettings>(
            "SELECT retell_agent_id, from_number, max_concurrent_calls, call_window_start, \
             call_window_end, timezone FROM voice_ai_settings WHERE id = 1",
        )
        .fetch_optional(self.pool())
        .await?;
        Ok(row)
    }

    pub async fn save_voice_settings(&self, settings: &VoiceAiSettings) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO voice_ai_settings (
                id, retell_agent_id, from_number, max_concurrent_calls,
                call_window_start, call_window_end, timezone
            ) VALUES (1, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                retell_agent_id=excluded.retell_agent_id,
                from_number=excluded.from_number,
                max_concurrent_calls=excluded.max_concurrent_calls,
                call_window_start=excluded.call_window_start,
                call_window_end=excluded.call_window_end,
                timezone=excluded.timezone
            "#,
        )
        .bind(&settings.retell_agent_id)
        .bind(&settings.from_number)
        .bind(settings.max_concurrent_calls.max(1))
        .bind(&settings.call_window_start)
        .bind(&settings.call_window_end)
        .bind(&settings.timezone)
        .execute(self.pool())
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::memory_storage;

    #[tokio::test]
    async fn enqueue_takes_pending_and_retryable_failed_leads() {
        let storage = memory_storage().await;
        let campaign = storage
            .insert_campaign(&NewVoiceAiCampaign {
                name: "Spring promo".into(),
                agent_id: Some("agent_1".into()),
                max_attempts: 2,
                description: None,
            })
            .await
            .unwrap();

        let mut ids = Vec::new();
        for phone in ["+1555000001", "+1555000002", "+1555000003", "+1555000004"] {
            let lead = storage
                .insert_voice_lead(&NewVoiceAiLead {
                    name: "Owner".into(),
                    phone: phone.into(),
                    email: None,
                    company: None,
                    campaign_id: Some(campaign.id),
                    notes: None,
                })
                .await
                .unwrap();
            ids.push(lead.id);
        }
        // one failed with attempts left, one exhausted, one do-not-call
        storage.record_voice_lead_attempt(ids[1]).await.unwrap();
        storage
            .set_voice_lead_status(ids[1], VoiceLeadStatus::Failed)
            .await
            .unwrap();
        storage.record_voice_lead_attempt(ids[2]).await.unwrap();
        storage.record_voice_lead_attempt(ids[2]).await.unwrap();
        storage
            .set_voice_lead_status(ids[2], VoiceLeadStatus::Failed)
            .await
            .unwrap();
        storage
            .set_voice_lead_status(ids[3], VoiceLeadStatus::DoNotCall)
            .await
            .unwrap();

        let queued = storage.enqueue_campaign(&campaign).await.unwrap();
        let queued_leads: Vec<i64> = queued.iter().map(|q| q.lead_id).collect();
        assert_eq!(queued_leads, vec![ids[0], ids[1]]);

        let campaign = storage.get_campaign(campaign.id).await.unwrap();
        assert_eq!(campaign.status, CampaignStatus::Active);
        let lead = storage.get_voice_lead(ids[0]).await.unwrap();
        assert_eq!(lead.status, VoiceLeadStatus::Queued);
    }

    async fn campaign_with_leads(storage: &Storage, phones: &[&str]) -> VoiceAiCampaign {
        let campaign = storage
            .insert_campaign(&NewVoiceAiCampaign {
                name: "c".into(),
                agent_id: None,
                max_attempts: 3,
                description: None,
            })
            .await
            .unwrap();
        for phone in phones {
            storage
                .insert_voice_lead(&NewVoiceAiLead {
                    name: "Owner".into(),
                    phone: (*phone).into(),
                    email: None,
                    company: None,
                    campaign_id: Some(campaign.id),
                    notes: None,
                })
                .await
                .unwrap();
        }
        campaign
    }

    #[tokio::test]
    async fn queue_item_lookup_by_call_id() {
        let storage = memory_storage().await;
        let campaign = campaign_with_leads(&storage, &["+1555000009"]).await;
        let queued = storage.enqueue_campaign(&campaign).await.unwrap();
        let claimed = storage.claim_queued_items(5).await.unwrap();
        assert_eq!(claimed[0].id, queued[0].id);
        storage.set_queue_call_id(queued[0].id, "call_abc").await.unwrap();

        let item = storage
            .find_queue_item_by_call_id("call_abc")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(item.status, QueueStatus::InProgress);
        assert_eq!(item.attempts, 1);
        assert!(storage.find_queue_item_by_call_id("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn claimed_items_are_not_claimed_again() {
        let storage = memory_storage().await;
        let campaign =
            campaign_with_leads(&storage, &["+1555000001", "+1555000002", "+1555000003"]).await;
        let queued = storage.enqueue_campaign(&campaign).await.unwrap();

        let first = storage.claim_queued_items(2).await.unwrap();
        let ids: Vec<i64> = first.iter().map(|q| q.id).collect();
        assert_eq!(ids, vec![queued[0].id, queued[1].id]);
        assert!(first.iter().all(|q| q.status == QueueStatus::InProgress));

        let second = storage.claim_queued_items(2).await.unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].id, queued[2].id);
        assert!(storage.claim_queued_items(2).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn only_in_progress_items_finish() {
        let storage = memory_storage().await;
        let campaign = campaign_with_leads(&storage, &["+1555000001"]).await;
        let queued = storage.enqueue_campaign(&campaign).await.unwrap();
        let id = queued[0].id;

        // still queued
        assert!(!storage.finish_queue_item(id, QueueStatus::Completed, None).await.unwrap());
        storage.claim_queued_items(1).await.unwrap();
        assert!(storage.finish_queue_item(id, QueueStatus::Completed, Some("Voicemail")).await.unwrap());
        assert!(!storage.finish_queue_item(id, QueueStatus::Completed, Some("Interested")).await.unwrap());

        let items = storage
            .list_queue(&QueueQuery {
                status: Some(QueueStatus::Completed),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(items[0].result.as_deref(), Some("Voicemail"));
    }
}
