use crate::health::{ServiceDefinition, default_services};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;

pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 15_000;
pub const DEFAULT_HEALTH_TIMEOUT_MS: u64 = 6_000;
pub const DEFAULT_LOG_PAGE_LIMIT: u32 = 200;
pub const MAX_LOG_PAGE_LIMIT: u32 = 500;
pub const DEFAULT_METRICS_BIND: &str = "127.0.0.1:9464";

// Environment first, then the optional PANEL_CONFIG YAML file on top.
#[derive(Debug, Clone)]
pub struct PanelConfig {
    // Admin backend base address, without trailing slash.
    pub auth_base_url: Option<String>,
    // Overall timeout for admin API requests.
    pub request_timeout_ms: u64,
    // Hard bound for a single service health check.
    pub health_timeout_ms: u64,
    // Page size for the admin log feed.
    pub log_page_limit: u32,
    // Metrics HTTP listener bind address (watch mode only).
    pub metrics_bind: SocketAddr,
    // Project used to build the Firestore health-check URL.
    pub firestore_project_id: Option<String>,
    // Services checked by `health` and `watch`.
    pub services: Vec<ServiceDefinition>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
struct PanelConfigOverride {
    auth_base_url: Option<String>,
    request_timeout_ms: Option<u64>,
    health_timeout_ms: Option<u64>,
    log_page_limit: Option<u32>,
    metrics_bind: Option<String>,
    firestore_project_id: Option<String>,
    services: Option<Vec<ServiceDefinition>>,
}

/// Trim whitespace and trailing slashes; blank means unconfigured.
pub fn normalize_base_url(value: &str) -> Option<String> {
    let trimmed = value.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub fn clamp_log_page_limit(value: u32) -> u32 {
    value.clamp(1, MAX_LOG_PAGE_LIMIT)
}

fn env_u64(name: &str, default: u64) -> Result<u64> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse()
            .with_context(|| format!("parse {name}")),
        _ => Ok(default),
    }
}

// A zero timeout keeps the default, as in the YAML override.
fn env_timeout_ms(name: &str, default: u64) -> Result<u64> {
    Ok(Some(env_u64(name, default)?)
        .filter(|value| *value > 0)
        .unwrap_or(default))
}

impl PanelConfig {
    pub fn from_env() -> Result<Self> {
        let auth_base_url = std::env::var("PANEL_AUTH_BASE_URL")
            .ok()
            .and_then(|value| normalize_base_url(&value));
        let request_timeout_ms =
            env_timeout_ms("PANEL_REQUEST_TIMEOUT_MS", DEFAULT_REQUEST_TIMEOUT_MS)?;
        let health_timeout_ms =
            env_timeout_ms("PANEL_HEALTH_TIMEOUT_MS", DEFAULT_HEALTH_TIMEOUT_MS)?;
        let log_page_limit = env_u64("PANEL_LOG_PAGE_LIMIT", u64::from(DEFAULT_LOG_PAGE_LIMIT))?;
        let log_page_limit =
            clamp_log_page_limit(u32::try_from(log_page_limit).unwrap_or(MAX_LOG_PAGE_LIMIT));
        let metrics_bind = std::env::var("PANEL_METRICS_BIND")
            .unwrap_or_else(|_| DEFAULT_METRICS_BIND.to_string())
            .parse()
            .with_context(|| "parse PANEL_METRICS_BIND")?;
        let firestore_project_id = std::env::var("PANEL_FIRESTORE_PROJECT_ID")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());
        let services = default_services(auth_base_url.as_deref());
        Ok(Self {
            auth_base_url,
            request_timeout_ms,
            health_timeout_ms,
            log_page_limit,
            metrics_bind,
            firestore_project_id,
            services,
        })
    }

    pub fn from_env_or_yaml() -> Result<Self> {
        let mut config = Self::from_env()?;
        if let Ok(path) = std::env::var("PANEL_CONFIG") {
            let contents =
                fs::read_to_string(&path).with_context(|| format!("read PANEL_CONFIG: {path}"))?;
            config.apply_yaml(&contents)?;
        }
        Ok(config)
    }

    pub fn apply_yaml(&mut self, contents: &str) -> Result<()> {
        let override_cfg: PanelConfigOverride =
            serde_yaml::from_str(contents).with_context(|| "parse control panel config yaml")?;
        let base_url_changed = override_cfg.auth_base_url.is_some();
        if let Some(value) = override_cfg.auth_base_url {
            self.auth_base_url = normalize_base_url(&value);
        }
        if let Some(value) = override_cfg.request_timeout_ms
            && value > 0
        {
            self.request_timeout_ms = value;
        }
        if let Some(value) = override_cfg.health_timeout_ms
            && value > 0
        {
            self.health_timeout_ms = value;
        }
        if let Some(value) = override_cfg.log_page_limit {
            self.log_page_limit = clamp_log_page_limit(value);
        }
        if let Some(value) = override_cfg.metrics_bind {
            self.metrics_bind = value.parse().with_context(|| "parse metrics_bind")?;
        }
        if let Some(value) = override_cfg.firestore_project_id {
            self.firestore_project_id = Some(value).filter(|value| !value.trim().is_empty());
        }
        match override_cfg.services {
            Some(services) => self.services = services,
            None if base_url_changed => {
                self.services = default_services(self.auth_base_url.as_deref());
            }
            None => {}
        }
        Ok(())
    }
}
