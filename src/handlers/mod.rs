pub mod business;
pub mod calls;
pub mod email;
pub mod leads;
pub mod notion;
pub mod operations;
pub mod retell;
pub mod voice_ai;
pub mod webhooks;

use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::types::ApiResponse;

/// GET /api/health
pub async fn health() -> Json<ApiResponse<Value>> {
    Json(ApiResponse::ok(json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    })))
}

/// Body of the bulk endpoints that act on a set of row ids.
#[derive(Debug, Default, Deserialize)]
pub struct IdsRequest {
    #[serde(default)]
    pub ids: Vec<i64>,
}

#[derive(Debug, Serialize)]
pub struct Deleted {
    pub id: i64,
    pub deleted: bool,
}

impl Deleted {
    pub fn new(id: i64) -> Self {
        Self { id, deleted: true }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<i64>,
}

/// Trimmed, or `None` when blank.
pub(crate) fn non_blank(value: &str) -> Option<&str> {
    let value = value.trim();
    (!value.is_empty()).then_some(value)
}
