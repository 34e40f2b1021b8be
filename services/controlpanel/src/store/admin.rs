//! Document source reading through the admin backend.
use super::{
    ACCESS_GROUPS_COLLECTION, AccessDocuments, DocumentSource, FEATURE_ACCESS_COLLECTION,
    RawDocument, StoreError, StoreResult,
};
use crate::api::AdminApiClient;
use async_trait::async_trait;
use panel_access::RawFields;
use serde_json::Value;
use std::sync::Arc;

/// Serves both collections from `GET /admin/access-control`.
///
/// Each raw item's `id` becomes the document id; items without a non-empty
/// string id are skipped.
#[derive(Debug, Clone)]
pub struct AdminApiDocumentSource {
    client: Arc<AdminApiClient>,
}

impl AdminApiDocumentSource {
    pub fn new(client: Arc<AdminApiClient>) -> Self {
        Self { client }
    }
}

fn documents_from(items: Vec<RawFields>) -> Vec<RawDocument> {
    items
        .into_iter()
        .filter_map(|fields| {
            let id = fields
                .get("id")
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|id| !id.is_empty())?
                .to_string();
            Some(RawDocument::new(id, fields))
        })
        .collect()
}

fn source_error(collection: &str, message: String) -> StoreError {
    StoreError::Source {
        collection: collection.to_string(),
        message,
    }
}

#[async_trait]
impl DocumentSource for AdminApiDocumentSource {
    async fn list_documents(&self, collection: &str) -> StoreResult<Vec<RawDocument>> {
        if collection != FEATURE_ACCESS_COLLECTION && collection != ACCESS_GROUPS_COLLECTION {
            return Err(source_error(collection, "unknown collection".to_string()));
        }
        let snapshot = self
            .client
            .fetch_access_config()
            .await
            .map_err(|err| source_error(collection, err.to_string()))?;
        let items = if collection == FEATURE_ACCESS_COLLECTION {
            snapshot.features
        } else {
            snapshot.groups
        };
        Ok(documents_from(items))
    }

    /// One `GET /admin/access-control` serves both collections.
    async fn load_access_documents(&self) -> StoreResult<AccessDocuments> {
        let snapshot = self
            .client
            .fetch_access_config()
            .await
            .map_err(|err| source_error("access-control", err.to_string()))?;
        Ok(AccessDocuments {
            features: documents_from(snapshot.features),
            groups: documents_from(snapshot.groups),
        })
    }
}
