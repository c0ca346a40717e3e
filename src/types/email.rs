use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum EmailStatus {
    Queued,
    Sent,
    Failed,
}

/// A message handed to the mail transport, with its delivery state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct EmailSend {
    pub id: i64,
    pub lead_id: Option<i64>,
    pub recipient: String,
    pub subject: String,
    pub body: String,
    pub status: EmailStatus,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
}

/// Delivery event shown in the email activity log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct EmailLog {
    pub id: i64,
    pub send_id: Option<i64>,
    pub lead_id: Option<i64>,
    pub recipient: String,
    pub subject: String,
    pub status: EmailStatus,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SendEmailRequest {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub lead_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct EmailSettings {
    pub smtp_host: String,
    pub smtp_port: i64,
    pub smtp_username: String,
    pub from_name: String,
    pub from_address: String,
    pub imap_host: Option<String>,
    pub imap_port: Option<i64>,
    pub daily_limit: i64,
    pub signature: Option<String>,
}

pub const DEFAULT_DAILY_LIMIT: i64 = 200;
