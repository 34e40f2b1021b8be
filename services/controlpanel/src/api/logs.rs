//! Cursor-paginated admin log stream (`GET /admin/logs`).
use super::{AdminApiClient, ApiError, ApiResult, error::error_detail, record_outcome};
use crate::config::{DEFAULT_LOG_PAGE_LIMIT, clamp_log_page_limit};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub level: String,
    #[serde(default)]
    pub service: String,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<serde_json::Map<String, Value>>,
}

#[derive(Debug, Clone, Default)]
pub struct LogsQuery {
    pub limit: Option<u32>,
    pub cursor: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogsPage {
    pub items: Vec<LogEntry>,
    pub next_cursor: Option<String>,
}

impl LogsPage {
    /// Validate the `{ ok, items, nextCursor }` envelope of a 2xx response.
    pub fn from_envelope(payload: &Value) -> ApiResult<Self> {
        let items = match (payload.get("ok"), payload.get("items")) {
            (Some(Value::Bool(true)), Some(Value::Array(items))) => items,
            _ => {
                let detail = payload
                    .get("error")
                    .and_then(Value::as_str)
                    .unwrap_or("Failed to load logs.");
                return Err(ApiError::Decode(detail.to_string()));
            }
        };
        let items = items
            .iter()
            .filter_map(|item| match serde_json::from_value::<LogEntry>(item.clone()) {
                Ok(entry) => Some(entry),
                Err(err) => {
                    tracing::debug!(error = %err, "skipping malformed log entry");
                    None
                }
            })
            .collect();
        let next_cursor = payload
            .get("nextCursor")
            .and_then(Value::as_str)
            .map(str::to_string);
        Ok(Self { items, next_cursor })
    }
}

impl AdminApiClient {
    pub async fn fetch_admin_logs(&self, query: &LogsQuery) -> ApiResult<LogsPage> {
        let mut url = self.endpoint(&["admin", "logs"])?;
        let limit = clamp_log_page_limit(query.limit.unwrap_or(DEFAULT_LOG_PAGE_LIMIT));
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("limit", &limit.to_string());
            if let Some(cursor) = query.cursor.as_deref().filter(|cursor| !cursor.is_empty()) {
                pairs.append_pair("cursor", cursor);
            }
        }
        let result = self.fetch_logs_page(url).await;
        record_outcome("fetch_admin_logs", &result);
        result
    }

    async fn fetch_logs_page(&self, url: reqwest::Url) -> ApiResult<LogsPage> {
        let response = self.http().get(url).send().await?;
        let status = response.status();
        let body = response.bytes().await?;
        let payload = serde_json::from_slice::<Value>(&body).unwrap_or(Value::Null);
        if !status.is_success() {
            return Err(ApiError::Http {
                status: status.as_u16(),
                message: error_detail(&payload, status),
            });
        }
        LogsPage::from_envelope(&payload)
    }
}
