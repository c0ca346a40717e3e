use axum::{
    Json,
    extract::State,
};
use serde::Deserialize;

use crate::error::AppError;
use crate::middleware::{ApiJson, ApiPath, ApiQuery};
use crate::router::AppState;
use crate::service::business;
use crate::types::ApiResponse;
use crate::types::business::{
    AnalysisStatus, AnalyzeReport, BusinessLead, BusinessLeadDetail, ImportReport, ImportRow,
    PushReport,
};

use super::IdsRequest;

#[derive(Debug, Default, Deserialize)]
pub struct BusinessLeadQuery {
    pub status: Option<AnalysisStatus>,
}

#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    pub rows: Vec<ImportRow>,
}

pub async fn list_leads(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<BusinessLeadQuery>,
) -> Result<Json<ApiResponse<Vec<BusinessLead>>>, AppError> {
    Ok(Json(ApiResponse::ok(
        state.storage.list_bi_leads(query.status).await?,
    )))
}

pub async fn get_lead(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<ApiResponse<BusinessLeadDetail>>, AppError> {
    let lead = state.storage.get_bi_lead(id).await?;
    let analysis = state.storage.get_analysis(id).await?;
    Ok(Json(ApiResponse::ok(BusinessLeadDetail { lead, analysis })))
}

/// POST /api/business-intelligence/import
pub async fn import(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ImportRequest>,
) -> Result<Json<ApiResponse<ImportReport>>, AppError> {
    if req.rows.is_empty() {
        return Err(AppError::validation("No rows to import"));
    }
    let report = business::import(&state.storage, &req.rows).await?;
    Ok(Json(ApiResponse::ok(report)))
}

/// POST /api/business-intelligence/analyze
///
/// An empty `ids` list analyzes every pending lead.
pub async fn analyze(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<IdsRequest>,
) -> Result<Json<ApiResponse<AnalyzeReport>>, AppError> {
    let mcp = state.mcp.as_ref().ok_or(AppError::NotConfigured("MCP server"))?;
    let report = business::analyze(
        &state.storage,
        mcp,
        &req.ids,
        state.config.mcp.concurrency,
    )
    .await?;
    Ok(Json(ApiResponse::ok(report)))
}

/// POST /api/business-intelligence/push-to-caller
pub async fn push_to_caller(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<IdsRequest>,
) -> Result<Json<ApiResponse<PushReport>>, AppError> {
    if req.ids.is_empty() {
        return Err(AppError::validation("No lead ids given"));
    }
    let report = business::push_to_caller(&state.storage, &req.ids).await?;
    Ok(Json(ApiResponse::ok(report)))
}
