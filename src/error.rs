use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use sqlx::Error as SqlxError;
use thiserror::Error as ThisError;
use tracing::error;

#[derive(Debug, ThisError)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] SqlxError),

    #[error("HTTP request error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{service} responded with status {status}")]
    UpstreamStatus {
        service: &'static str,
        status: StatusCode,
    },

    #[error("Mail error: {0}")]
    Mail(String),

    #[error("{0}")]
    LimitReached(String),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        AppError::NotFound(what.into())
    }

    /// Network failures, 429 and 5xx from upstreams are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::Reqwest(e) => e.is_timeout() || e.is_connect(),
            AppError::UpstreamStatus { status, .. } => {
                *status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
            }
            _ => false,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) | AppError::Database(SqlxError::RowNotFound) => {
                StatusCode::NOT_FOUND
            }
            AppError::NotConfigured(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::LimitReached(_) => StatusCode::TOO_MANY_REQUESTS,
            AppError::Reqwest(_) | AppError::UpstreamStatus { .. } | AppError::Mail(_) => {
                StatusCode::BAD_GATEWAY
            }
            AppError::Database(_) | AppError::UrlParse(_) | AppError::Json(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let message = match &self {
            AppError::Validation(_)
            | AppError::NotFound(_)
            | AppError::NotConfigured(_)
            | AppError::LimitReached(_) => self.to_string(),
            AppError::Database(SqlxError::RowNotFound) => "Record not found".to_string(),
            AppError::Reqwest(_) | AppError::UpstreamStatus { .. } | AppError::Mail(_) => {
                error!(error = %self, "upstream failure");
                "Upstream service is unavailable.".to_string()
            }
            AppError::Database(_) | AppError::UrlParse(_) | AppError::Json(_) => {
                error!(error = %self, "internal failure");
                "An internal server error occurred.".to_string()
            }
        };
        (status, Json(ApiErrorResponse::new(message))).into_response()
    }
}

/// Uniform failure body: `{ "success": false, "error": "..." }`.
#[derive(Debug, Serialize)]
pub struct ApiErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ApiErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_error_kind() {
        assert_eq!(
            AppError::validation("bad").status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::not_found("Lead").status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::Database(SqlxError::RowNotFound).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::NotConfigured("Notion").status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            AppError::Mail("relay refused".into()).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            AppError::LimitReached("Daily email limit of 5 reached".into()).status(),
            StatusCode::TOO_MANY_REQUESTS
        );
    }

    #[test]
    fn only_transient_upstream_statuses_retry() {
        let throttled = AppError::UpstreamStatus {
            service: "Notion",
            status: StatusCode::TOO_MANY_REQUESTS,
        };
        let down = AppError::UpstreamStatus {
            service: "Retell",
            status: StatusCode::SERVICE_UNAVAILABLE,
        };
        let denied = AppError::UpstreamStatus {
            service: "Retell",
            status: StatusCode::UNAUTHORIZED,
        };
        assert!(throttled.is_retryable());
        assert!(down.is_retryable());
        assert!(!denied.is_retryable());
        assert!(!AppError::validation("x").is_retryable());
    }
}
