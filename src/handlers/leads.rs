use axum::{
    Json,
    extract::State,
    http::StatusCode,
};

use crate::error::AppError;
use crate::middleware::{ApiJson, ApiPath, ApiQuery};
use crate::router::AppState;
use crate::types::ApiResponse;
use crate::types::lead::{Lead, LeadList, LeadQuery, LeadUpdate, NewLead, NewLeadList};

use super::{Deleted, non_blank};

pub async fn list_leads(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<LeadQuery>,
) -> Result<Json<ApiResponse<Vec<Lead>>>, AppError> {
    Ok(Json(ApiResponse::ok(state.storage.list_leads(&query).await?)))
}

pub async fn create_lead(
    State(state): State<AppState>,
    ApiJson(mut lead): ApiJson<NewLead>,
) -> Result<(StatusCode, Json<ApiResponse<Lead>>), AppError> {
    lead.business_name = non_blank(&lead.business_name)
        .ok_or_else(|| AppError::validation("Business name is required"))?
        .to_string();
    if let Some(list_id) = lead.list_id {
        state.storage.get_lead_list(list_id).await?;
    }
    let created = state.storage.insert_lead(&lead).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(created))))
}

pub async fn get_lead(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<ApiResponse<Lead>>, AppError> {
    Ok(Json(ApiResponse::ok(state.storage.get_lead(id).await?)))
}

pub async fn update_lead(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(update): ApiJson<LeadUpdate>,
) -> Result<Json<ApiResponse<Lead>>, AppError> {
    if update
        .business_name
        .as_deref()
        .is_some_and(|name| non_blank(name).is_none())
    {
        return Err(AppError::validation("Business name cannot be empty"));
    }
    if let Some(list_id) = update.list_id {
        state.storage.get_lead_list(list_id).await?;
    }
    Ok(Json(ApiResponse::ok(
        state.storage.update_lead(id, &update).await?,
    )))
}

pub async fn delete_lead(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<ApiResponse<Deleted>>, AppError> {
    state.storage.delete_lead(id).await?;
    Ok(Json(ApiResponse::ok(Deleted::new(id))))
}

pub async fn list_lead_lists(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<LeadList>>>, AppError> {
    Ok(Json(ApiResponse::ok(state.storage.list_lead_lists().await?)))
}

pub async fn create_lead_list(
    State(state): State<AppState>,
    ApiJson(mut list): ApiJson<NewLeadList>,
) -> Result<(StatusCode, Json<ApiResponse<LeadList>>), AppError> {
    list.name = non_blank(&list.name)
        .ok_or_else(|| AppError::validation("List name is required"))?
        .to_string();
    let created = state.storage.insert_lead_list(&list).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(created))))
}

/// Leads in the list are kept and detached.
pub async fn delete_lead_list(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<ApiResponse<Deleted>>, AppError> {
    state.storage.delete_lead_list(id).await?;
    Ok(Json(ApiResponse::ok(Deleted::new(id))))
}

pub async fn leads_in_list(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<ApiResponse<Vec<Lead>>>, AppError> {
    state.storage.get_lead_list(id).await?;
    let leads = state
        .storage
        .list_leads(&LeadQuery {
            list_id: Some(id),
            ..Default::default()
        })
        .await?;
    Ok(Json(ApiResponse::ok(leads)))
}
