use axum::{Json, extract::State};
use serde::Serialize;
use tracing::warn;

use crate::error::AppError;
use crate::middleware::{ApiJson, ApiQuery};
use crate::router::AppState;
use crate::service::email::{self, demo_email_logs, settings_from_config};
use crate::service::mailer::parse_recipient;
use crate::types::ApiResponse;
use crate::types::email::{EmailLog, EmailSend, EmailSettings, SendEmailRequest};

use super::{LimitQuery, non_blank};

const DEFAULT_LOG_LIMIT: i64 = 50;

#[derive(Debug, Serialize)]
pub struct EmailLogFeed {
    pub logs: Vec<EmailLog>,
    /// Placeholder rows served because the log table could not be read.
    pub demo: bool,
}

/// GET /api/email/logs
pub async fn email_logs(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<LimitQuery>,
) -> Json<ApiResponse<EmailLogFeed>> {
    let limit = query.limit.unwrap_or(DEFAULT_LOG_LIMIT);
    let feed = match state.storage.list_email_logs(limit).await {
        Ok(logs) => EmailLogFeed { logs, demo: false },
        Err(e) => {
            warn!(error = %e, "email log query failed, serving demo entries");
            EmailLogFeed {
                logs: demo_email_logs(),
                demo: true,
            }
        }
    };
    Json(ApiResponse::ok(feed))
}

/// POST /api/email/send
pub async fn send_email(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<SendEmailRequest>,
) -> Result<Json<ApiResponse<EmailSend>>, AppError> {
    let mailer = state.mailer.as_deref().ok_or(AppError::NotConfigured("SMTP"))?;
    let send = email::send_email(&state.storage, mailer, &req).await?;
    Ok(Json(ApiResponse::ok(send)))
}

/// GET /api/email/settings
pub async fn get_settings(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<EmailSettings>>, AppError> {
    let settings = match state.storage.get_email_settings().await? {
        Some(saved) => saved,
        None => settings_from_config(&state.config.smtp),
    };
    Ok(Json(ApiResponse::ok(settings)))
}

/// PUT /api/email/settings
///
/// The saved sender and daily limit apply to later sends; the SMTP relay
/// keeps using the configured host and credentials.
pub async fn save_settings(
    State(state): State<AppState>,
    ApiJson(mut settings): ApiJson<EmailSettings>,
) -> Result<Json<ApiResponse<EmailSettings>>, AppError> {
    settings.smtp_host = non_blank(&settings.smtp_host)
        .ok_or_else(|| AppError::validation("SMTP host is required"))?
        .to_string();
    if !(1..=i64::from(u16::MAX)).contains(&settings.smtp_port) {
        return Err(AppError::validation("SMTP port must be between 1 and 65535"));
    }
    settings.from_address = parse_recipient(&settings.from_address)?.to_string();
    if settings.daily_limit < 0 {
        return Err(AppError::validation("Daily limit cannot be negative"));
    }
    state.storage.save_email_settings(&settings).await?;
    Ok(Json(ApiResponse::ok(settings)))
}
