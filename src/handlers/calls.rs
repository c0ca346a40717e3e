use axum::{Json, extract::State, http::StatusCode};
use chrono::Utc;
use serde::Deserialize;

use crate::db::CallLogQuery;
use crate::error::AppError;
use crate::middleware::{ApiJson, ApiQuery};
use crate::router::AppState;
use crate::service::call_stats::combined_call_stats;
use crate::types::ApiResponse;
use crate::types::call::{CallLog, NewCallLog};
use crate::types::stats::{CombinedCallStats, StatsPeriod};

use super::non_blank;

#[derive(Debug, Default, Deserialize)]
pub struct StatsQuery {
    #[serde(default)]
    pub period: StatsPeriod,
}

pub async fn list_calls(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<CallLogQuery>,
) -> Result<Json<ApiResponse<Vec<CallLog>>>, AppError> {
    let calls = state.storage.list_call_logs(&query).await?;
    Ok(Json(ApiResponse::ok(calls)))
}

pub async fn create_call(
    State(state): State<AppState>,
    ApiJson(mut call): ApiJson<NewCallLog>,
) -> Result<(StatusCode, Json<ApiResponse<CallLog>>), AppError> {
    call.phone = non_blank(&call.phone)
        .ok_or_else(|| AppError::validation("Phone is required"))?
        .to_string();
    if call.duration_seconds < 0 {
        return Err(AppError::validation("Duration cannot be negative"));
    }
    if let Some(lead_id) = call.lead_id {
        state.storage.get_lead(lead_id).await?;
    }
    let created = state.storage.insert_call_log(&call).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(created))))
}

/// GET /api/calls/stats?period=today|week|month|all
pub async fn call_stats(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<StatsQuery>,
) -> Result<Json<ApiResponse<CombinedCallStats>>, AppError> {
    let stats = combined_call_stats(
        &state.storage,
        state.notion.as_ref(),
        query.period,
        Utc::now(),
    )
    .await?;
    Ok(Json(ApiResponse::ok(stats)))
}
