use axum::{Json, extract::State};

use crate::error::AppError;
use crate::router::AppState;
use crate::types::ApiResponse;
use crate::types::lead::NotionLead;

/// GET /api/notion/leads
pub async fn notion_leads(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<NotionLead>>>, AppError> {
    let notion = state.notion.as_ref().ok_or(AppError::NotConfigured("Notion"))?;
    Ok(Json(ApiResponse::ok(notion.fetch_leads().await?)))
}
