//! Admin API error type.
//!
//! # Purpose
//! One error shape for every admin backend call so callers can render a
//! human-readable message without inspecting transport details.
//!
//! # Key invariants
//! - `MissingBaseUrl` and `MissingId` are raised before any network call.
//! - `Http` always carries a non-empty message: the body's `error`, then its
//!   `message`, then the canonical status text.
use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("admin API base URL is missing (PANEL_AUTH_BASE_URL)")]
    MissingBaseUrl,
    #[error("admin API base URL is invalid: {0}")]
    InvalidBaseUrl(String),
    #[error("{what} id is required")]
    MissingId { what: &'static str },
    #[error("Request failed ({status}): {message}")]
    Http { status: u16, message: String },
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("{0}")]
    Decode(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            ApiError::Transport(err) => err.status().map(|status| status.as_u16()),
            _ => None,
        }
    }

    /// Raised locally, before any request left the process.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            ApiError::MissingBaseUrl | ApiError::InvalidBaseUrl(_) | ApiError::MissingId { .. }
        )
    }

    pub(crate) fn from_status(status: StatusCode, body: &[u8]) -> Self {
        let payload = serde_json::from_slice::<Value>(body).unwrap_or(Value::Null);
        ApiError::Http {
            status: status.as_u16(),
            message: error_detail(&payload, status),
        }
    }
}

/// Pick the most specific message a failed response offers.
pub(crate) fn error_detail(payload: &Value, status: StatusCode) -> String {
    ["error", "message"]
        .iter()
        .filter_map(|key| payload.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .find(|detail| !detail.is_empty())
        .map(str::to_string)
        .or_else(|| status.canonical_reason().map(str::to_string))
        .unwrap_or_else(|| format!("Failed with status {}.", status.as_u16()))
}
