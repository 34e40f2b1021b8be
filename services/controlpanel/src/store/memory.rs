//! In-memory document source.
//!
//! # Purpose
//! Backs the store in tests and in offline CLI runs (`--documents seed.json`).
//! The seed file maps collection name to `{ id: fields }`.
//!
//! # Notes
//! A failure message can be injected so every subsequent read fails with it,
//! which lets callers exercise the store's fail-closed path.
use super::{DocumentSource, RawDocument, StoreError, StoreResult};
use anyhow::{Context, Result};
use async_trait::async_trait;
use panel_access::RawFields;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
pub struct InMemoryDocumentSource {
    collections: RwLock<HashMap<String, BTreeMap<String, RawFields>>>,
    failure: RwLock<Option<String>>,
}

impl InMemoryDocumentSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_seed_json(contents: &str) -> Result<Self> {
        let seed: HashMap<String, BTreeMap<String, Value>> =
            serde_json::from_str(contents).context("parse document seed")?;
        let mut collections = HashMap::with_capacity(seed.len());
        for (collection, documents) in seed {
            let mut parsed = BTreeMap::new();
            for (id, value) in documents {
                let Value::Object(fields) = value else {
                    anyhow::bail!("document {collection}/{id} is not an object");
                };
                parsed.insert(id, fields);
            }
            collections.insert(collection, parsed);
        }
        Ok(Self {
            collections: RwLock::new(collections),
            failure: RwLock::new(None),
        })
    }

    pub fn from_seed_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("read document seed: {}", path.display()))?;
        Self::from_seed_json(&contents)
    }

    pub async fn insert(&self, collection: &str, id: &str, fields: RawFields) {
        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), fields);
    }

    pub async fn remove(&self, collection: &str, id: &str) -> Option<RawFields> {
        self.collections
            .write()
            .await
            .get_mut(collection)
            .and_then(|documents| documents.remove(id))
    }

    pub async fn fail_with(&self, message: impl Into<String>) {
        *self.failure.write().await = Some(message.into());
    }

    pub async fn clear_failure(&self) {
        *self.failure.write().await = None;
    }
}

#[async_trait]
impl DocumentSource for InMemoryDocumentSource {
    async fn list_documents(&self, collection: &str) -> StoreResult<Vec<RawDocument>> {
        if let Some(message) = self.failure.read().await.clone() {
            return Err(StoreError::Source {
                collection: collection.to_string(),
                message,
            });
        }
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|documents| {
                documents
                    .iter()
                    .map(|(id, fields)| RawDocument::new(id.clone(), fields.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{ACCESS_GROUPS_COLLECTION, FEATURE_ACCESS_COLLECTION};
    use serde_json::json;

    #[tokio::test]
    async fn seed_json_loads_collections() {
        let source = InMemoryDocumentSource::from_seed_json(
            &json!({
                "feature_access": { "nav": { "route": "/nav" } },
                "access_groups": { "beta_testers": {}, "dev_team": { "label": "Dev" } }
            })
            .to_string(),
        )
        .expect("seed");
        let features = source
            .list_documents(FEATURE_ACCESS_COLLECTION)
            .await
            .expect("features");
        assert_eq!(features.len(), 1);
        assert_eq!(features[0].id, "nav");
        let groups = source
            .list_documents(ACCESS_GROUPS_COLLECTION)
            .await
            .expect("groups");
        assert_eq!(groups.len(), 2);
        assert!(source.list_documents("other").await.expect("other").is_empty());
    }

    #[test]
    fn seed_rejects_non_object_documents() {
        let err = InMemoryDocumentSource::from_seed_json(r#"{"feature_access":{"nav":3}}"#)
            .expect_err("bad seed");
        assert!(err.to_string().contains("feature_access/nav"));
    }

    #[tokio::test]
    async fn injected_failure_applies_until_cleared() {
        let source = InMemoryDocumentSource::new();
        source
            .insert(FEATURE_ACCESS_COLLECTION, "nav", RawFields::new())
            .await;
        source.fail_with("permission denied").await;
        let err = source
            .list_documents(FEATURE_ACCESS_COLLECTION)
            .await
            .expect_err("failure");
        assert_eq!(
            err.to_string(),
            "failed to read feature_access: permission denied"
        );
        source.clear_failure().await;
        assert_eq!(
            source
                .list_documents(FEATURE_ACCESS_COLLECTION)
                .await
                .expect("read")
                .len(),
            1
        );
        assert!(source.remove(FEATURE_ACCESS_COLLECTION, "nav").await.is_some());
    }
}
