use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use chrono::NaiveTime;
use serde::Deserialize;

use crate::error::AppError;
use crate::middleware::{ApiJson, ApiPath, ApiQuery};
use crate::router::AppState;
use crate::service::voice_ai;
use crate::types::ApiResponse;
use crate::types::voice_ai::{
    CallQueueItem, DispatchReport, NewVoiceAiCampaign, NewVoiceAiLead, QueueQuery,
    VoiceAiCampaign, VoiceAiCampaignUpdate, VoiceAiLead, VoiceAiLeadUpdate, VoiceAiSettings,
};

use super::{Deleted, non_blank};

#[derive(Debug, Default, Deserialize)]
pub struct VoiceLeadQuery {
    pub campaign_id: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DispatchRequest {
    pub limit: Option<i64>,
}

fn required(value: &str, field: &str) -> Result<String, AppError> {
    non_blank(value)
        .map(str::to_string)
        .ok_or_else(|| AppError::validation(format!("{field} is required")))
}

// ---- leads ----

pub async fn list_leads(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<VoiceLeadQuery>,
) -> Result<Json<ApiResponse<Vec<VoiceAiLead>>>, AppError> {
    Ok(Json(ApiResponse::ok(
        state.storage.list_voice_leads(query.campaign_id).await?,
    )))
}

pub async fn create_lead(
    State(state): State<AppState>,
    ApiJson(mut lead): ApiJson<NewVoiceAiLead>,
) -> Result<(StatusCode, Json<ApiResponse<VoiceAiLead>>), AppError> {
    lead.name = required(&lead.name, "Name")?;
    lead.phone = required(&lead.phone, "Phone")?;
    if let Some(campaign_id) = lead.campaign_id {
        state.storage.get_campaign(campaign_id).await?;
    }
    let created = state.storage.insert_voice_lead(&lead).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(created))))
}

pub async fn update_lead(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(update): ApiJson<VoiceAiLeadUpdate>,
) -> Result<Json<ApiResponse<VoiceAiLead>>, AppError> {
    if let Some(phone) = update.phone.as_deref() {
        required(phone, "Phone")?;
    }
    if let Some(campaign_id) = update.campaign_id {
        state.storage.get_campaign(campaign_id).await?;
    }
    Ok(Json(ApiResponse::ok(
        state.storage.update_voice_lead(id, &update).await?,
    )))
}

pub async fn delete_lead(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<ApiResponse<Deleted>>, AppError> {
    state.storage.delete_voice_lead(id).await?;
    Ok(Json(ApiResponse::ok(Deleted::new(id))))
}

// ---- campaigns ----

pub async fn list_campaigns(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<VoiceAiCampaign>>>, AppError> {
    Ok(Json(ApiResponse::ok(state.storage.list_campaigns().await?)))
}

pub async fn create_campaign(
    State(state): State<AppState>,
    ApiJson(mut campaign): ApiJson<NewVoiceAiCampaign>,
) -> Result<(StatusCode, Json<ApiResponse<VoiceAiCampaign>>), AppError> {
    campaign.name = required(&campaign.name, "Campaign name")?;
    if campaign.max_attempts < 1 {
        return Err(AppError::validation("max_attempts must be at least 1"));
    }
    let created = state.storage.insert_campaign(&campaign).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(created))))
}

pub async fn update_campaign(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(update): ApiJson<VoiceAiCampaignUpdate>,
) -> Result<Json<ApiResponse<VoiceAiCampaign>>, AppError> {
    if update.max_attempts.is_some_and(|n| n < 1) {
        return Err(AppError::validation("max_attempts must be at least 1"));
    }
    Ok(Json(ApiResponse::ok(
        state.storage.update_campaign(id, &update).await?,
    )))
}

pub async fn delete_campaign(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<ApiResponse<Deleted>>, AppError> {
    state.storage.delete_campaign(id).await?;
    Ok(Json(ApiResponse::ok(Deleted::new(id))))
}

/// POST /api/voice-ai/campaigns/{id}/start
pub async fn start_campaign(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<ApiResponse<Vec<CallQueueItem>>>, AppError> {
    let queued = voice_ai::start_campaign(&state.storage, id).await?;
    Ok(Json(ApiResponse::ok(queued)))
}

// ---- queue ----

pub async fn list_queue(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<QueueQuery>,
) -> Result<Json<ApiResponse<Vec<CallQueueItem>>>, AppError> {
    Ok(Json(ApiResponse::ok(state.storage.list_queue(&query).await?)))
}

/// POST /api/voice-ai/queue/dispatch
pub async fn dispatch(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<DispatchRequest>,
) -> Result<Json<ApiResponse<DispatchReport>>, AppError> {
    let report = voice_ai::dispatch(&state.storage, state.retell.as_ref(), req.limit).await?;
    Ok(Json(ApiResponse::ok(report)))
}

// ---- settings ----

pub async fn get_settings(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<VoiceAiSettings>>, AppError> {
    Ok(Json(ApiResponse::ok(
        voice_ai::settings_or_default(&state.storage).await?,
    )))
}

pub async fn save_settings(
    State(state): State<AppState>,
    ApiJson(settings): ApiJson<VoiceAiSettings>,
) -> Result<Json<ApiResponse<VoiceAiSettings>>, AppError> {
    if settings.max_concurrent_calls < 1 {
        return Err(AppError::validation(
            "max_concurrent_calls must be at least 1",
        ));
    }
    for (field, value) in [
        ("call_window_start", &settings.call_window_start),
        ("call_window_end", &settings.call_window_end),
    ] {
        NaiveTime::parse_from_str(value, "%H:%M")
            .map_err(|_| AppError::validation(format!("{field} must be HH:MM")))?;
    }
    state.storage.save_voice_settings(&settings).await?;
    Ok(Json(ApiResponse::ok(settings)))
}
