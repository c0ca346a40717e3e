use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get, post, put},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::api::{build_http_client, mcp::McpClient, notion::NotionClient, retell::RetellClient};
use crate::config::Config;
use crate::db::Storage;
use crate::error::AppError;
use crate::handlers::{
    business, calls, email, health, leads, notion, operations, retell, voice_ai, webhooks,
};
use crate::service::mailer::{Mailer, SmtpMailer};

/// Shared handler state. Integrations without credentials are `None`.
#[derive(Clone)]
pub struct AppState {
    pub storage: Storage,
    pub config: Arc<Config>,
    pub notion: Option<NotionClient>,
    pub retell: Option<RetellClient>,
    pub mcp: Option<McpClient>,
    pub mailer: Option<Arc<dyn Mailer>>,
}

impl AppState {
    pub fn new(storage: Storage, config: Config) -> Result<Self, AppError> {
        let http = build_http_client(&config.http)?;

        let notion = config
            .notion
            .is_configured()
            .then(|| NotionClient::new(http.clone(), &config.notion))
            .transpose()?;
        let retell = config
            .retell
            .is_configured()
            .then(|| RetellClient::new(http.clone(), &config.retell))
            .transpose()?;
        let mcp = config
            .mcp
            .is_configured()
            .then(|| McpClient::new(http.clone(), &config.mcp))
            .transpose()?;
        let mailer: Option<Arc<dyn Mailer>> = if config.smtp.is_configured() {
            Some(Arc::new(SmtpMailer::new(&config.smtp)?))
        } else {
            None
        };

        info!(
            notion = notion.is_some(),
            retell = retell.is_some(),
            mcp = mcp.is_some(),
            smtp = mailer.is_some(),
            "integrations"
        );

        Ok(Self {
            storage,
            config: Arc::new(config),
            notion,
            retell,
            mcp,
            mailer,
        })
    }

    pub fn with_mailer(mut self, mailer: Arc<dyn Mailer>) -> Self {
        self.mailer = Some(mailer);
        self
    }
}

pub fn app_router(state: AppState) -> Router {
    // Routes the dashboard widgets call cross-origin.
    let cors_routes = Router::new()
        .route("/api/calls", get(calls::list_calls).post(calls::create_call))
        .route("/api/calls/stats", get(calls::call_stats))
        .route("/api/activity", get(operations::activity))
        .route("/api/operations/overview", get(operations::overview))
        .route("/api/retell/agents", get(retell::list_agents))
        .route("/api/retell/webhook", post(retell::webhook))
        .layer(CorsLayer::permissive());

    Router::new()
        .route("/api/health", get(health))
        .route("/api/leads", get(leads::list_leads).post(leads::create_lead))
        .route(
            "/api/leads/{id}",
            get(leads::get_lead)
                .put(leads::update_lead)
                .delete(leads::delete_lead),
        )
        .route(
            "/api/lead-lists",
            get(leads::list_lead_lists).post(leads::create_lead_list),
        )
        .route(
            "/api/lead-lists/{id}",
            delete(leads::delete_lead_list),
        )
        .route("/api/lead-lists/{id}/leads", get(leads::leads_in_list))
        .route("/api/notion/leads", get(notion::notion_leads))
        .route("/api/webhooks/make", post(webhooks::make_lead))
        .route("/api/email/logs", get(email::email_logs))
        .route("/api/email/send", post(email::send_email))
        .route(
            "/api/email/settings",
            get(email::get_settings).put(email::save_settings),
        )
        .route("/api/business-intelligence/leads", get(business::list_leads))
        .route(
            "/api/business-intelligence/leads/{id}",
            get(business::get_lead),
        )
        .route("/api/business-intelligence/import", post(business::import))
        .route("/api/business-intelligence/analyze", post(business::analyze))
        .route(
            "/api/business-intelligence/push-to-caller",
            post(business::push_to_caller),
        )
        .route(
            "/api/voice-ai/leads",
            get(voice_ai::list_leads).post(voice_ai::create_lead),
        )
        .route(
            "/api/voice-ai/leads/{id}",
            put(voice_ai::update_lead).delete(voice_ai::delete_lead),
        )
        .route(
            "/api/voice-ai/campaigns",
            get(voice_ai::list_campaigns).post(voice_ai::create_campaign),
        )
        .route(
            "/api/voice-ai/campaigns/{id}",
            put(voice_ai::update_campaign).delete(voice_ai::delete_campaign),
        )
        .route(
            "/api/voice-ai/campaigns/{id}/start",
            post(voice_ai::start_campaign),
        )
        .route("/api/voice-ai/queue", get(voice_ai::list_queue))
        .route("/api/voice-ai/queue/dispatch", post(voice_ai::dispatch))
        .route(
            "/api/voice-ai/settings",
            get(voice_ai::get_settings).put(voice_ai::save_settings),
        )
        .merge(cors_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
