use super::sqlite::Storage;
use crate::error::AppError;
use crate::types::email::{EmailLog, EmailSend, EmailSettings, EmailStatus};
use chrono::{DateTime, Utc};

const SEND_COLUMNS: &str =
    "id, lead_id, recipient, subject, body, status, error, created_at, sent_at";
const LOG_COLUMNS: &str = "id, send_id, lead_id, recipient, subject, status, error, created_at";

impl Storage {
    pub async fn insert_email_send(
        &self,
        lead_id: Option<i64>,
        recipient: &str,
        subject: &str,
        body: &str,
    ) -> Result<EmailSend, AppError> {
        let row = sqlx::query_as::<_, EmailSend>(&format!(
            "INSERT INTO email_sends (lead_id, recipient, subject, body, status, created_at) \
             VALUES (?, ?, ?, ?, ?, ?) RETURNING {SEND_COLUMNS}"
        ))
        .bind(lead_id)
        .bind(recipient)
        .bind(subject)
        .bind(body)
        .bind(EmailStatus::Queued)
        .bind(Utc::now())
        .fetch_one(self.pool())
        .await?;
        Ok(row)
    }

    /// Record the delivery result on the send row and append a log event.
    pub async fn finish_email_send(
        &self,
        send: &EmailSend,
        status: EmailStatus,
        error: Option<&str>,
    ) -> Result<EmailSend, AppError> {
        let now = Utc::now();
        let sent_at = (status == EmailStatus::Sent).then_some(now);
        let mut tx = self.pool().begin().await?;

        let updated = sqlx::query_as::<_, EmailSend>(&format!(
            "UPDATE email_sends SET status = ?, error = ?, sent_at = ? WHERE id = ? \
             RETURNING {SEND_COLUMNS}"
        ))
        .bind(status)
        .bind(error)
        .bind(sent_at)
        .bind(send.id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO email_logs (send_id, lead_id, recipient, subject, status, error, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(send.id)
        .bind(send.lead_id)
        .bind(&send.recipient)
        .bind(&send.subject)
        .bind(status)
        .bind(error)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(updated)
    }

    /// Newest first.
    pub async fn list_email_logs(&self, limit: i64) -> Result<Vec<EmailLog>, AppError> {
        let rows = sqlx::query_as::<_, EmailLog>(&format!(
            "SELECT {LOG_COLUMNS} FROM email_logs ORDER BY created_at DESC, id DESC LIMIT ?"
        ))
        .bind(limit.clamp(1, 1000))
        .fetch_all(self.pool())
        .await?;
        Ok(rows)
    }

    pub async fn count_emails_sent_since(&self, since: DateTime<Utc>) -> Result<i64, AppError> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM email_sends WHERE status = ? AND sent_at >= ?",
        )
        .bind(EmailStatus::Sent)
        .bind(since)
        .fetch_one(self.pool())
        .await?;
        Ok(count)
    }

    pub async fn get_email_settings(&self) -> Result<Option<EmailSettings>, AppError> {
        let row = sqlx::query_as::<_, EmailSettings>(
            "SELECT smtp_host, smtp_port, smtp_username, from_name, from_address, \
             imap_host, imap_port, daily_limit, signature FROM email_settings WHERE id = 1",
        )
        .fetch_optional(self.pool())
        .await?;
        Ok(row)
    }

    pub async fn save_email_settings(&self, settings: &EmailSettings) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO email_settings (
                id, smtp_host, smtp_port, smtp_username, from_name, from_address,
                imap_host, imap_port, daily_limit, signature
            ) VALUES (1, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                smtp_host=excluded.smtp_host,
                smtp_port=excluded.smtp_port,
                smtp_username=excluded.smtp_username,
                from_name=excluded.from_name,
                from_address=excluded.from_address,
                imap_host=excluded.imap_host,
                imap_port=excluded.imap_port,
                daily_limit=excluded.daily_limit,
                signature=excluded.signature
            "#,
        )
        .bind(&settings.smtp_host)
        .bind(settings.smtp_port)
        .bind(&settings.smtp_username)
        .bind(&settings.from_name)
        .bind(&settings.from_address)
        .bind(&settings.imap_host)
        .bind(settings.imap_port)
        .bind(settings.daily_limit)
        .bind(&settings.signature)
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
    async fn finishing_a_send_appends_a_log_event() {
        let storage = memory_storage().await;
        let send = storage
            .insert_email_send(Some(7), "owner@acme.test", "Hello", "Hi there")
            .await
            .unwrap();
        assert_eq!(send.status, EmailStatus::Queued);

        let done = storage
            .finish_email_send(&send, EmailStatus::Sent, None)
            .await
            .unwrap();
        assert_eq!(done.status, EmailStatus::Sent);
        assert!(done.sent_at.is_some());

        let logs = storage.list_email_logs(10).await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].send_id, Some(send.id));
        assert_eq!(logs[0].lead_id, Some(7));

        let sent_today = storage
            .count_emails_sent_since(Utc::now() - chrono::Duration::hours(1))
            .await
            .unwrap();
        assert_eq!(sent_today, 1);
    }

    #[tokio::test]
    async fn settings_upsert_single_row() {
        let storage = memory_storage().await;
        assert!(storage.get_email_settings().await.unwrap().is_none());
        let mut settings = EmailSettings {
            smtp_host: "smtp.acme.test".into(),
            smtp_port: 587,
            smtp_username: "bot".into(),
            from_name: "Acme".into(),
            from_address: "bot@acme.test".into(),
            imap_host: None,
            imap_port: None,
            daily_limit: 100,
            signature: None,
        };
        storage.save_email_settings(&settings).await.unwrap();
        settings.daily_limit = 50;
        storage.save_email_settings(&settings).await.unwrap();
        let stored = storage.get_email_settings().await.unwrap().unwrap();
        assert_eq!(stored.daily_limit, 50);
    }
}
