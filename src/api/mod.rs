//! Stateless callers for the external services the dashboard aggregates.

pub mod mcp;
pub mod notion;
pub mod retell;

use crate::config::HttpConfig;
use crate::error::AppError;
use backon::ExponentialBuilder;
use std::time::Duration;
use url::Url;

/// Shared reqwest client: timeouts and optional proxy from config.
pub fn build_http_client(cfg: &HttpConfig) -> Result<reqwest::Client, AppError> {
    let mut builder = reqwest::Client::builder()
        .user_agent(concat!("cold-solutions/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(Duration::from_secs(cfg.connect_timeout_secs))
        .timeout(Duration::from_secs(cfg.timeout_secs));
    if let Some(proxy_url) = cfg.proxy.as_ref() {
        builder = builder.proxy(reqwest::Proxy::all(proxy_url.as_str())?);
    }
    Ok(builder.build()?)
}

/// Parse a configured base URL so relative joins keep its whole path.
pub(crate) fn service_base_url(raw: &str) -> Result<Url, AppError> {
    let mut base = Url::parse(raw)?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    Ok(base)
}

pub(crate) fn default_retry_policy() -> ExponentialBuilder {
    ExponentialBuilder::default()
        .with_min_delay(Duration::from_millis(500))
        .with_max_delay(Duration::from_secs(3))
        .with_max_times(3)
        .with_jitter()
}

/// Turn a non-2xx response into `AppError::UpstreamStatus`.
pub(crate) fn ensure_success(
    service: &'static str,
    resp: reqwest::Response,
) -> Result<reqwest::Response, AppError> {
    let status = resp.status();
    if status.is_success() {
        Ok(resp)
    } else {
        Err(AppError::UpstreamStatus {
            service,
            status,
        })
    }
}
