use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use tracing::info;

use crate::error::AppError;
use crate::middleware::ApiJson;
use crate::router::AppState;
use crate::service::lead_source::map_lead_source;
use crate::types::ApiResponse;
use crate::types::lead::{Lead, LeadStatus, NewLead};

/// Lead pushed by a Make.com scenario. Forms disagree on the name field,
/// so `name` and `company` are accepted for the business name.
#[derive(Debug, Default, Deserialize)]
pub struct MakeLeadWebhook {
    #[serde(alias = "company")]
    pub business_name: Option<String>,
    pub name: Option<String>,
    pub contact_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub industry: Option<String>,
    pub source: Option<String>,
    pub notes: Option<String>,
}

fn filled(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl MakeLeadWebhook {
    pub fn into_new_lead(self) -> Result<NewLead, AppError> {
        let source = map_lead_source(self.source.as_deref());
        let name = filled(self.name);
        let business_name = filled(self.business_name)
            .or_else(|| name.clone())
            .ok_or_else(|| AppError::validation("business_name or name is required"))?;
        let contact_name = filled(self.contact_name)
            .or(name)
            .filter(|n| *n != business_name);

        Ok(NewLead {
            business_name,
            contact_name,
            phone: filled(self.phone),
            email: filled(self.email),
            city: filled(self.city),
            country: filled(self.country),
            industry: filled(self.industry),
            status: LeadStatus::New,
            source,
            priority: None,
            list_id: None,
            notes: filled(self.notes),
        })
    }
}

/// POST /api/webhooks/make
pub async fn make_lead(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<MakeLeadWebhook>,
) -> Result<(StatusCode, Json<ApiResponse<Lead>>), AppError> {
    let lead = state.storage.insert_lead(&payload.into_new_lead()?).await?;
    info!(lead_id = lead.id, source = ?lead.source, "lead received from Make.com");
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(lead))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::lead::LeadSource;

    #[test]
    fn name_falls_back_to_business_name() {
        let lead = MakeLeadWebhook {
            name: Some(" Acme Roofing ".into()),
            source: Some("Facebook Ads".into()),
            ..Default::default()
        }
        .into_new_lead()
        .unwrap();
        assert_eq!(lead.business_name, "Acme Roofing");
        assert_eq!(lead.contact_name, None);
        assert_eq!(lead.source, LeadSource::SocialMedia);
    }

    #[test]
    fn contact_name_kept_when_business_given() {
        let lead = MakeLeadWebhook {
            business_name: Some("Acme".into()),
            name: Some("Jo Smith".into()),
            ..Default::default()
        }
        .into_new_lead()
        .unwrap();
        assert_eq!(lead.business_name, "Acme");
        assert_eq!(lead.contact_name.as_deref(), Some("Jo Smith"));
        assert_eq!(lead.source, LeadSource::Other);
    }

    #[test]
    fn missing_name_is_rejected() {
        let err = MakeLeadWebhook {
            phone: Some("+1555".into()),
            ..Default::default()
        }
        .into_new_lead()
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
