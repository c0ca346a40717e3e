use crate::api::retell::{RetellCall, RetellClient, RetellWebhook};
use crate::db::Storage;
use crate::error::AppError;
use crate::types::call::{CallLog, CallOutcome, NewCallLog};
use crate::types::voice_ai::{
    CallQueueItem, CampaignStatus, DispatchReport, QueueStatus, VoiceAiSettings, VoiceLeadStatus,
};
use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::{debug, info, warn};

pub const VOICE_CALL_SOURCE: &str = "voice_ai";
const VOICE_CALLER: &str = "Retell AI";

pub async fn settings_or_default(storage: &Storage) -> Result<VoiceAiSettings, AppError> {
    Ok(storage.get_voice_settings().await?.unwrap_or_default())
}

pub async fn start_campaign(
    storage: &Storage,
    campaign_id: i64,
) -> Result<Vec<CallQueueItem>, AppError> {
    let campaign = storage.get_campaign(campaign_id).await?;
    if campaign.status == CampaignStatus::Completed {
        return Err(AppError::validation(format!(
            "Campaign {campaign_id} is already completed"
        )));
    }
    let queued = storage.enqueue_campaign(&campaign).await?;
    info!(campaign_id, queued = queued.len(), "campaign started");
    Ok(queued)
}

/// Claim up to `limit` queued items, oldest first, and place a call for each.
pub async fn dispatch(
    storage: &Storage,
    retell: Option<&RetellClient>,
    limit: Option<i64>,
) -> Result<DispatchReport, AppError> {
    let retell = retell.ok_or(AppError::NotConfigured("Retell"))?;
    let settings = settings_or_default(storage).await?;
    let from_number = settings
        .from_number
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or(AppError::NotConfigured("Voice AI outbound number"))?;

    let items = storage
        .claim_queued_items(limit.unwrap_or(settings.max_concurrent_calls).max(1))
        .await?;

    let mut report = DispatchReport::default();
    for item in items {
        match place_call(storage, retell, &settings, from_number, &item).await {
            Ok(call_id) => {
                storage.set_queue_call_id(item.id, &call_id).await?;
                report.dispatched += 1;
                report.call_ids.push(call_id);
            }
            Err(e) => {
                let msg = e.to_string();
                warn!(queue_item_id = item.id, lead_id = item.lead_id, error = %msg, "call placement failed");
                storage
                    .finish_queue_item(item.id, QueueStatus::Failed, Some(&msg))
                    .await?;
                storage
                    .set_voice_lead_status(item.lead_id, VoiceLeadStatus::Failed)
                    .await?;
                report.failed += 1;
            }
        }
    }
    Ok(report)
}

async fn place_call(
    storage: &Storage,
    retell: &RetellClient,
    settings: &VoiceAiSettings,
    from_number: &str,
    item: &CallQueueItem,
) -> Result<String, AppError> {
    let lead = storage.get_voice_lead(item.lead_id).await?;
    let campaign = storage.get_campaign(item.campaign_id).await?;
    let agent_id = campaign
        .agent_id
        .as_deref()
        .or(settings.retell_agent_id.as_deref());
    let metadata = json!({
        "queue_item_id": item.id,
        "lead_id": lead.id,
        "campaign_id": campaign.id,
    });

    storage.record_voice_lead_attempt(lead.id).await?;
    retell
        .create_phone_call(from_number, &lead.phone, agent_id, &metadata)
        .await
}

pub fn outcome_from_retell(call: &RetellCall) -> CallOutcome {
    let analysis = call.call_analysis.as_ref();
    if analysis.and_then(|a| a.call_successful) == Some(true) {
        return CallOutcome::Interested;
    }
    if analysis.and_then(|a| a.in_voicemail) == Some(true) {
        return CallOutcome::Voicemail;
    }
    match call.disconnection_reason.as_deref() {
        Some("voicemail_reached") => CallOutcome::Voicemail,
        Some("dial_no_answer" | "dial_busy") => CallOutcome::NoAnswer,
        Some("invalid_destination") => CallOutcome::WrongNumber,
        _ => CallOutcome::NotInterested,
    }
}

/// Returns the call log written for a finished call, or `None` when the
/// event is ignored. A repeated `call_ended` for the same call is ignored.
pub async fn handle_retell_event(
    storage: &Storage,
    event: &RetellWebhook,
) -> Result<Option<CallLog>, AppError> {
    let Some(call) = event.call.as_ref().filter(|_| event.event == "call_ended") else {
        debug!(event = %event.event, "ignoring Retell event");
        return Ok(None);
    };
    let Some(item) = storage.find_queue_item_by_call_id(&call.call_id).await? else {
        debug!(call_id = %call.call_id, "Retell call not in queue");
        return Ok(None);
    };

    let outcome = outcome_from_retell(call);
    let lead = storage.get_voice_lead(item.lead_id).await?;
    if !storage
        .finish_queue_item(item.id, QueueStatus::Completed, Some(outcome.as_str()))
        .await?
    {
        debug!(call_id = %call.call_id, status = ?item.status, "Retell call already finished");
        return Ok(None);
    }
    storage
        .set_voice_lead_status(lead.id, VoiceLeadStatus::Completed)
        .await?;

    let called_at = call
        .start_timestamp
        .and_then(DateTime::<Utc>::from_timestamp_millis);
    let notes = call
        .call_analysis
        .as_ref()
        .and_then(|a| a.call_summary.clone())
        .or_else(|| call.disconnection_reason.clone());
    let log = storage
        .insert_call_log(&NewCallLog {
            lead_id: None,
            business_name: lead.company.clone().or_else(|| Some(lead.name.clone())),
            phone: call.to_number.clone().unwrap_or_else(|| lead.phone.clone()),
            caller: Some(VOICE_CALLER.to_string()),
            outcome,
            duration_seconds: call.duration_ms.unwrap_or(0) / 1000,
            notes,
            source: VOICE_CALL_SOURCE.to_string(),
            called_at,
        })
        .await?;
    info!(call_id = %call.call_id, lead_id = lead.id, outcome = %outcome, "voice call completed");
    Ok(Some(log))
}
