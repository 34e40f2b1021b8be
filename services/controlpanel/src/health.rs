//! Service health checks.
//!
//! # Purpose
//! Checks the backends the control panel depends on and classifies each one
//! as ok, degraded, down or unknown.
//!
//! # Notes
//! Every check is bounded by a hard `tokio::time::timeout`; a check that does
//! not finish in time reports `down` regardless of whether the request would
//! eventually resolve. All checks of a sweep run concurrently.
use chrono::{DateTime, Utc};
use futures::future::join_all;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;

pub const DEFAULT_FIRESTORE_BASE_URL: &str = "https://firestore.googleapis.com/v1";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Ok,
    Degraded,
    Down,
    #[default]
    Unknown,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Ok => "ok",
            HealthStatus::Degraded => "degraded",
            HealthStatus::Down => "down",
            HealthStatus::Unknown => "unknown",
        }
    }

    /// Classification of a plain HTTP health endpoint.
    pub fn from_http(status: StatusCode) -> Self {
        match status.as_u16() {
            200 => HealthStatus::Ok,
            code if code >= 500 => HealthStatus::Down,
            code if code >= 400 => HealthStatus::Degraded,
            _ => HealthStatus::Unknown,
        }
    }

    /// Classification of a Firestore REST read.
    pub fn from_firestore(status: StatusCode) -> Self {
        if status.is_success() {
            HealthStatus::Ok
        } else if status.is_server_error() {
            HealthStatus::Down
        } else {
            HealthStatus::Degraded
        }
    }

    fn gauge_value(&self) -> f64 {
        match self {
            HealthStatus::Ok => 1.0,
            HealthStatus::Degraded => 0.5,
            HealthStatus::Down | HealthStatus::Unknown => 0.0,
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceKind {
    Api,
    Db,
    Analytics,
    Worker,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HealthCheck {
    Http {
        url: String,
        #[serde(default)]
        timeout_ms: Option<u64>,
    },
    Firestore {
        collection: String,
        #[serde(default)]
        document: Option<String>,
        #[serde(default)]
        timeout_ms: Option<u64>,
    },
}

impl HealthCheck {
    fn timeout_ms(&self) -> Option<u64> {
        match self {
            HealthCheck::Http { timeout_ms, .. } | HealthCheck::Firestore { timeout_ms, .. } => {
                *timeout_ms
            }
        }
    }
}

/// One entry of the service catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDefinition {
    pub id: String,
    pub name: String,
    pub kind: ServiceKind,
    #[serde(default)]
    pub description: Option<String>,
    /// Reported as-is when the service has no health check.
    #[serde(default)]
    pub status: Option<HealthStatus>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub health_check: Option<HealthCheck>,
}

/// Built-in catalog used when the configuration does not list services.
pub fn default_services(auth_base_url: Option<&str>) -> Vec<ServiceDefinition> {
    vec![
        ServiceDefinition {
            id: "auth-api".to_string(),
            name: "Auth API".to_string(),
            kind: ServiceKind::Api,
            description: Some("Login, sessions and the admin endpoints.".to_string()),
            status: None,
            url: auth_base_url.map(str::to_string),
            health_check: auth_base_url.map(|base| HealthCheck::Http {
                url: format!("{base}/health"),
                timeout_ms: None,
            }),
        },
        ServiceDefinition {
            id: "scan-import-api".to_string(),
            name: "Scan Import API".to_string(),
            kind: ServiceKind::Api,
            description: Some("Accepts scan uploads and writes them to Firestore.".to_string()),
            status: Some(HealthStatus::Unknown),
            url: None,
            health_check: None,
        },
        ServiceDefinition {
            id: "firestore".to_string(),
            name: "Firestore Database".to_string(),
            kind: ServiceKind::Db,
            description: Some("Primary document database.".to_string()),
            status: None,
            url: None,
            health_check: Some(HealthCheck::Firestore {
                collection: "feature_access".to_string(),
                document: None,
                timeout_ms: None,
            }),
        },
    ]
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceHealth {
    pub status: HealthStatus,
    pub latency_ms: Option<u64>,
    pub checked_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
}

impl ServiceHealth {
    fn fixed(status: HealthStatus) -> Self {
        Self {
            status,
            latency_ms: None,
            checked_at: None,
            error_message: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HealthChecker {
    http: reqwest::Client,
    default_timeout: Duration,
    firestore_project_id: Option<String>,
    firestore_base_url: String,
}

impl HealthChecker {
    pub fn new(
        http: reqwest::Client,
        default_timeout: Duration,
        firestore_project_id: Option<String>,
    ) -> Self {
        Self {
            http,
            default_timeout,
            firestore_project_id,
            firestore_base_url: DEFAULT_FIRESTORE_BASE_URL.to_string(),
        }
    }

    pub fn with_firestore_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.firestore_base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub async fn check(&self, service: &ServiceDefinition) -> ServiceHealth {
        let Some(check) = &service.health_check else {
            return ServiceHealth::fixed(service.status.unwrap_or_default());
        };
        let timeout = check
            .timeout_ms()
            .map(Duration::from_millis)
            .unwrap_or(self.default_timeout);
        match check {
            HealthCheck::Http { url, .. } => self.request(url, timeout, HealthStatus::from_http).await,
            HealthCheck::Firestore {
                collection,
                document,
                ..
            } => {
                let Some(project_id) = self.firestore_project_id.as_deref() else {
                    return ServiceHealth {
                        status: HealthStatus::Unknown,
                        latency_ms: None,
                        checked_at: Some(Utc::now()),
                        error_message: Some(
                            "Missing Firestore project id (PANEL_FIRESTORE_PROJECT_ID)".to_string(),
                        ),
                    };
                };
                let target = match document {
                    Some(document) => format!("{collection}/{document}"),
                    None => collection.clone(),
                };
                let url = format!(
                    "{}/projects/{project_id}/databases/(default)/documents/{target}?pageSize=1",
                    self.firestore_base_url
                );
                self.request(&url, timeout, HealthStatus::from_firestore).await
            }
        }
    }

    /// Check every service concurrently; results keep catalog order.
    pub async fn check_all(&self, services: &[ServiceDefinition]) -> Vec<(String, ServiceHealth)> {
        join_all(services.iter().map(|service| async move {
            let health = self.check(service).await;
            metrics::gauge!("panel_service_health", "service" => service.id.clone())
                .set(health.status.gauge_value());
            if health.status != HealthStatus::Ok {
                tracing::debug!(
                    service = %service.id,
                    status = %health.status,
                    error = ?health.error_message,
                    "service not healthy"
                );
            }
            (service.id.clone(), health)
        }))
        .await
    }

    async fn request(
        &self,
        url: &str,
        timeout: Duration,
        classify: fn(StatusCode) -> HealthStatus,
    ) -> ServiceHealth {
        let started = Instant::now();
        let outcome = tokio::time::timeout(timeout, self.http.get(url).send()).await;
        let latency_ms = Some(started.elapsed().as_millis() as u64);
        let checked_at = Some(Utc::now());
        match outcome {
            Err(_) => ServiceHealth {
                status: HealthStatus::Down,
                latency_ms,
                checked_at,
                error_message: Some(format!("timed out after {}ms", timeout.as_millis())),
            },
            Ok(Err(err)) => ServiceHealth {
                status: HealthStatus::Down,
                latency_ms,
                checked_at,
                error_message: Some(err.to_string()),
            },
            Ok(Ok(response)) => {
                let status = response.status();
                ServiceHealth {
                    status: classify(status),
                    latency_ms,
                    checked_at,
                    error_message: (!status.is_success())
                        .then(|| format!("HTTP {}", status.as_u16())),
                }
            }
        }
    }
}
