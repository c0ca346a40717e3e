use axum::{Json, extract::State};

use crate::error::AppError;
use crate::middleware::ApiQuery;
use crate::router::AppState;
use crate::service::activity::{
    ActivityItem, OperationsOverview, operations_overview, recent_activity,
};
use crate::types::ApiResponse;

use super::LimitQuery;

/// GET /api/activity?limit=
pub async fn activity(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<LimitQuery>,
) -> Result<Json<ApiResponse<Vec<ActivityItem>>>, AppError> {
    Ok(Json(ApiResponse::ok(
        recent_activity(&state.storage, query.limit).await?,
    )))
}

/// GET /api/operations/overview
pub async fn overview(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<OperationsOverview>>, AppError> {
    Ok(Json(ApiResponse::ok(operations_overview(&state.storage).await?)))
}
