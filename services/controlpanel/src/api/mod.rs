//! Admin backend client.
//!
//! # Purpose
//! Wraps the session-authenticated admin HTTP API: access-control rules and
//! groups, admin users and the admin log stream.
//!
//! # Notes
//! The client is constructed explicitly (see [`crate::app::PanelContext`]) and
//! shared through an `Arc`. No retries are performed.
pub mod access;
pub mod error;
pub mod logs;
pub mod users;

pub use access::{AccessAdmin, AccessConfigSnapshot};
pub use error::{ApiError, ApiResult};
pub use logs::{LogEntry, LogsPage, LogsQuery};
pub use users::{AdminRole, AdminStatus, AdminUser, AuthProvider};

use crate::config::PanelConfig;
use reqwest::{RequestBuilder, Response, Url};
use serde_json::Value;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct AdminApiClient {
    base_url: Option<String>,
    http: reqwest::Client,
}

impl AdminApiClient {
    pub fn new(base_url: Option<String>, http: reqwest::Client) -> Self {
        Self {
            base_url: base_url.and_then(|value| crate::config::normalize_base_url(&value)),
            http,
        }
    }

    pub fn from_config(config: &PanelConfig) -> ApiResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;
        Ok(Self::new(config.auth_base_url.clone(), http))
    }

    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Build `{base}/{segments...}` with each segment percent-encoded.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> ApiResult<Url> {
        let base = self.base_url.as_deref().ok_or(ApiError::MissingBaseUrl)?;
        let mut url = Url::parse(base).map_err(|_| ApiError::InvalidBaseUrl(base.to_string()))?;
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| ApiError::InvalidBaseUrl(base.to_string()))?;
            path.pop_if_empty();
            path.extend(segments);
        }
        Ok(url)
    }

    /// Send a request and decode its JSON body, recording the outcome under `op`.
    pub(crate) async fn send_json(&self, op: &'static str, request: RequestBuilder) -> ApiResult<Value> {
        let result = match request.send().await {
            Ok(response) => read_json(response).await,
            Err(err) => Err(ApiError::Transport(err)),
        };
        record_outcome(op, &result);
        result
    }
}

pub(crate) fn record_outcome<T>(op: &'static str, result: &ApiResult<T>) {
    let outcome = if result.is_ok() { "ok" } else { "error" };
    metrics::counter!("panel_admin_requests_total", "op" => op, "outcome" => outcome)
        .increment(1);
    if let Err(err) = result {
        tracing::warn!(op, status = ?err.status(), error = %err, "admin API request failed");
    }
}

/// Decode a response; a 2xx with an empty or non-JSON body yields `Value::Null`.
pub(crate) async fn read_json(response: Response) -> ApiResult<Value> {
    let status = response.status();
    let body = response.bytes().await?;
    if !status.is_success() {
        return Err(ApiError::from_status(status, &body));
    }
    if body.is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_slice(&body).unwrap_or(Value::Null))
}

/// Fail fast on empty identifiers.
pub(crate) fn require_id<'a>(id: &'a str, what: &'static str) -> ApiResult<&'a str> {
    if id.is_empty() {
        Err(ApiError::MissingId { what })
    } else {
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_encodes_segments() {
        let client = AdminApiClient::new(
            Some("https://auth.example.com/".to_string()),
            reqwest::Client::new(),
        );
        let url = client
            .endpoint(&["admin", "access-control", "features", "a/b c"])
            .expect("url");
        assert_eq!(
            url.as_str(),
            "https://auth.example.com/admin/access-control/features/a%2Fb%20c"
        );
    }

    #[test]
    fn endpoint_keeps_base_path_prefix() {
        let client = AdminApiClient::new(
            Some("https://example.com/auth".to_string()),
            reqwest::Client::new(),
        );
        let url = client.endpoint(&["admin", "users"]).expect("url");
        assert_eq!(url.as_str(), "https://example.com/auth/admin/users");
    }

    #[test]
    fn endpoint_requires_base_url() {
        let client = AdminApiClient::new(Some("   ".to_string()), reqwest::Client::new());
        assert!(matches!(
            client.endpoint(&["admin"]),
            Err(ApiError::MissingBaseUrl)
        ));
        let client = AdminApiClient::new(Some("not a url".to_string()), reqwest::Client::new());
        assert!(matches!(
            client.endpoint(&["admin"]),
            Err(ApiError::InvalidBaseUrl(_))
        ));
    }

    #[test]
    fn require_id_rejects_only_empty_ids() {
        assert!(matches!(
            require_id("", "Feature"),
            Err(ApiError::MissingId { what: "Feature" })
        ));
        assert_eq!(require_id(" ", "Feature").expect("id"), " ");
        assert_eq!(require_id("nav", "Feature").expect("id"), "nav");
    }
}
