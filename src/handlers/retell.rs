use axum::{Json, extract::State};
use serde::Serialize;

use crate::api::retell::{RetellAgent, RetellWebhook};
use crate::error::AppError;
use crate::middleware::ApiJson;
use crate::router::AppState;
use crate::service::voice_ai::handle_retell_event;
use crate::types::ApiResponse;

#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub received: bool,
    pub call_log_id: Option<i64>,
}

/// GET /api/retell/agents
pub async fn list_agents(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<RetellAgent>>>, AppError> {
    let retell = state.retell.as_ref().ok_or(AppError::NotConfigured("Retell"))?;
    Ok(Json(ApiResponse::ok(retell.list_agents().await?)))
}

/// POST /api/retell/webhook
pub async fn webhook(
    State(state): State<AppState>,
    ApiJson(event): ApiJson<RetellWebhook>,
) -> Result<Json<ApiResponse<WebhookAck>>, AppError> {
    let log = handle_retell_event(&state.storage, &event).await?;
    Ok(Json(ApiResponse::ok(WebhookAck {
        received: true,
        call_log_id: log.map(|l| l.id),
    })))
}
