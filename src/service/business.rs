//! Business-intelligence pipeline: import → analyze (MCP) → push to caller.

use crate::api::mcp::McpClient;
use crate::db::Storage;
use crate::error::AppError;
use crate::types::business::{
    AnalysisStatus, AnalyzeReport, BusinessAnalysis, BusinessLead, ImportReport, ImportRow,
    NewBusinessLead, PushReport,
};
use crate::types::lead::{LeadSource, LeadStatus, NewLead, Priority};
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use tracing::{info, warn};

fn trimmed(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Check one row; `row_number` is 1-based.
pub fn validate_row(row_number: usize, row: &ImportRow) -> Result<NewBusinessLead, String> {
    let business_name = trimmed(&row.business_name);
    let city = trimmed(&row.city);
    let country = trimmed(&row.country);

    match (business_name, city, country) {
        (Some(business_name), Some(city), Some(country)) => Ok(NewBusinessLead {
            business_name,
            city,
            country,
            website: trimmed(&row.website),
            phone: trimmed(&row.phone),
            industry: trimmed(&row.industry),
        }),
        (name, city, country) => {
            let missing: Vec<&str> = [
                (name.is_none(), "business_name"),
                (city.is_none(), "city"),
                (country.is_none(), "country"),
            ]
            .into_iter()
            .filter_map(|(is_missing, field)| is_missing.then_some(field))
            .collect();
            Err(format!(
                "Row {row_number}: missing required field(s): {}",
                missing.join(", ")
            ))
        }
    }
}

fn dedup_key(name: &str, city: &str) -> (String, String) {
    (name.trim().to_lowercase(), city.trim().to_lowercase())
}

/// Rows are checked and inserted one at a time, in order.
pub async fn import(storage: &Storage, rows: &[ImportRow]) -> Result<ImportReport, AppError> {
    let mut report = ImportReport::default();
    let mut seen = HashSet::new();

    for (idx, row) in rows.iter().enumerate() {
        let lead = match validate_row(idx + 1, row) {
            Ok(lead) => lead,
            Err(msg) => {
                report.errors.push(msg);
                continue;
            }
        };
        let key = dedup_key(&lead.business_name, &lead.city);
        if seen.contains(&key) || storage.bi_lead_exists(&lead.business_name, &lead.city).await? {
            report.duplicates += 1;
            continue;
        }
        let inserted = storage.insert_bi_lead(&lead).await?;
        seen.insert(key);
        report.imported += 1;
        report.lead_ids.push(inserted.id);
    }

    info!(
        imported = report.imported,
        duplicates = report.duplicates,
        errors = report.errors.len(),
        "business lead import finished"
    );
    Ok(report)
}

/// Analyze the given leads, or every `Pending` lead when `ids` is empty.
/// Leads left `Failed` (or `Processing` after a crash) are retried by passing
/// their ids explicitly. Each outcome is recorded on its own; a storage error
/// for one lead counts it as failed and the batch carries on.
pub async fn analyze(
    storage: &Storage,
    mcp: &McpClient,
    ids: &[i64],
    concurrency: usize,
) -> Result<AnalyzeReport, AppError> {
    let leads: Vec<BusinessLead> = if ids.is_empty() {
        storage.list_bi_leads(Some(AnalysisStatus::Pending)).await?
    } else {
        let mut leads = Vec::with_capacity(ids.len());
        for id in ids {
            leads.push(storage.get_bi_lead(*id).await?);
        }
        leads
    };

    let outcomes: Vec<(i64, Result<BusinessAnalysis, AppError>)> = stream::iter(leads)
        .map(|lead| async move {
            let result = match storage
                .set_analysis_status(lead.id, AnalysisStatus::Processing)
                .await
            {
                Ok(()) => mcp.analyze(&lead).await,
                Err(e) => Err(e),
            };
            (lead.id, result)
        })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    let mut report = AnalyzeReport::default();
    for (lead_id, result) in outcomes {
        let saved = match result {
            Ok(analysis) => storage.save_analysis(&analysis).await,
            Err(e) => Err(e),
        };
        match saved {
            Ok(()) => report.completed += 1,
            Err(e) => {
                warn!(lead_id, error = %e, "business analysis failed");
                if let Err(e) = storage
                    .set_analysis_status(lead_id, AnalysisStatus::Failed)
                    .await
                {
                    warn!(lead_id, error = %e, "could not mark business lead failed");
                }
                report.failed += 1;
            }
        }
    }
    info!(completed = report.completed, failed = report.failed, "business analysis finished");
    Ok(report)
}

pub fn is_convertible(lead: &BusinessLead) -> bool {
    lead.analysis_status == AnalysisStatus::Complete && !lead.pushed_to_caller
}

/// High when the market is crowded and the business is weakly rated.
/// An unknown rating never yields `High`.
pub fn priority_for(analysis: &BusinessAnalysis) -> Priority {
    let rating = analysis.google_rating;
    let crowded = analysis.competitors_found > 5;
    if crowded && rating.is_some_and(|r| r < 4.0) {
        Priority::High
    } else if analysis.competitors_found > 2 || rating.is_some_and(|r| r < 4.5) {
        Priority::Medium
    } else {
        Priority::Low
    }
}

pub fn to_calling_lead(lead: &BusinessLead, analysis: &BusinessAnalysis) -> NewLead {
    NewLead {
        business_name: lead.business_name.clone(),
        contact_name: None,
        phone: lead.phone.clone(),
        email: None,
        city: Some(lead.city.clone()),
        country: Some(lead.country.clone()),
        industry: lead.industry.clone(),
        status: LeadStatus::New,
        source: LeadSource::BusinessIntelligence,
        priority: Some(priority_for(analysis)),
        list_id: None,
        notes: analysis.summary.clone(),
    }
}

pub async fn push_to_caller(storage: &Storage, ids: &[i64]) -> Result<PushReport, AppError> {
    let mut report = PushReport::default();
    for id in ids {
        let lead = storage.get_bi_lead(*id).await?;
        if !is_convertible(&lead) {
            report.skipped += 1;
            continue;
        }
        let Some(analysis) = storage.get_analysis(lead.id).await? else {
            report.skipped += 1;
            continue;
        };
        let created = storage
            .insert_lead(&to_calling_lead(&lead, &analysis))
            .await?;
        storage.mark_pushed_to_caller(lead.id).await?;
        report.pushed += 1;
        report.lead_ids.push(created.id);
    }
    info!(pushed = report.pushed, skipped = report.skipped, "pushed leads to caller");
    Ok(report)
}
