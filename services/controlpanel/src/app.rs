//! Explicit construction of the control panel's shared handles.
//!
//! # Purpose
//! Builds the HTTP client, document source, store, editor and health checker
//! once from a [`PanelConfig`] and hands them out by `Arc`.
use crate::api::AdminApiClient;
use crate::config::PanelConfig;
use crate::health::HealthChecker;
use crate::store::{
    AccessControlStore, AdminApiDocumentSource, DocumentSource, InMemoryDocumentSource, LogFeed,
};
use crate::view::AccessEditor;
use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

pub struct PanelContext {
    pub config: PanelConfig,
    pub client: Arc<AdminApiClient>,
    pub store: Arc<AccessControlStore>,
    pub editor: Arc<AccessEditor>,
    pub health: HealthChecker,
}

impl PanelContext {
    /// Wire everything against the admin backend, or against a seed file
    /// when `documents` is given.
    pub fn new(config: PanelConfig, documents: Option<&Path>) -> Result<Self> {
        let client = Arc::new(
            AdminApiClient::from_config(&config).context("build admin API client")?,
        );
        let source: Arc<dyn DocumentSource> = match documents {
            Some(path) => Arc::new(InMemoryDocumentSource::from_seed_file(path)?),
            None => Arc::new(AdminApiDocumentSource::new(client.clone())),
        };
        Ok(Self::with_source(config, client, source))
    }

    pub fn with_source(
        config: PanelConfig,
        client: Arc<AdminApiClient>,
        source: Arc<dyn DocumentSource>,
    ) -> Self {
        let store = Arc::new(AccessControlStore::new(source));
        let editor = Arc::new(AccessEditor::new(store.clone(), client.clone()));
        let health = HealthChecker::new(
            reqwest::Client::new(),
            Duration::from_millis(config.health_timeout_ms),
            config.firestore_project_id.clone(),
        );
        Self {
            config,
            client,
            store,
            editor,
            health,
        }
    }

    pub fn log_feed(&self) -> LogFeed {
        LogFeed::new(self.client.clone(), self.config.log_page_limit)
    }
}
