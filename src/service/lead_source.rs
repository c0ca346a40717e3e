use crate::types::lead::LeadSource;

/// Map a free-form source string (webhook field, Notion select) onto a
/// `LeadSource`. First matching rule wins.
pub fn map_lead_source(raw: Option<&str>) -> LeadSource {
    let Some(raw) = raw else {
        return LeadSource::Other;
    };
    let s = raw.to_lowercase();
    let has = |needle: &str| s.contains(needle);

    if has("web") {
        LeadSource::Website
    } else if has("call") || has("voice") {
        LeadSource::ColdCall
    } else if has("referr") {
        LeadSource::Referral
    } else if ["facebook", "instagram", "linkedin", "social"]
        .iter()
        .any(|n| has(n))
    {
        LeadSource::SocialMedia
    } else if has("email") || has("mail") {
        LeadSource::Email
    } else {
        LeadSource::Other
    }
}
