//! Document sources and the in-memory access-control snapshot.
//!
//! # Purpose
//! `DocumentSource` is the read seam for the two access-control collections.
//! `AccessControlStore` owns the session snapshot built from it; `LogFeed`
//! pages through the admin log stream.
//!
//! # Notes
//! Store operations never return errors. Failures are captured into the
//! published state as a human-readable message.
use async_trait::async_trait;
use panel_access::RawFields;
use thiserror::Error;

pub mod access;
pub mod admin;
pub mod logs;
pub mod memory;

pub use access::{AccessControlState, AccessControlStore};
pub use admin::AdminApiDocumentSource;
pub use logs::LogFeed;
pub use memory::InMemoryDocumentSource;

pub const FEATURE_ACCESS_COLLECTION: &str = "feature_access";
pub const ACCESS_GROUPS_COLLECTION: &str = "access_groups";

/// One stored document: its id plus the untyped field bag.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDocument {
    pub id: String,
    pub fields: RawFields,
}

impl RawDocument {
    pub fn new(id: impl Into<String>, fields: RawFields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read {collection}: {message}")]
    Source { collection: String, message: String },
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Raw contents of both access-control collections taken from one read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccessDocuments {
    pub features: Vec<RawDocument>,
    pub groups: Vec<RawDocument>,
}

#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// All documents of `collection`, in no particular order.
    async fn list_documents(&self, collection: &str) -> StoreResult<Vec<RawDocument>>;

    /// Both collections for one snapshot. Sources whose backend serves them
    /// together override this so a snapshot never mixes two server states.
    async fn load_access_documents(&self) -> StoreResult<AccessDocuments> {
        let (features, groups) = tokio::try_join!(
            self.list_documents(FEATURE_ACCESS_COLLECTION),
            self.list_documents(ACCESS_GROUPS_COLLECTION),
        )?;
        Ok(AccessDocuments { features, groups })
    }
}
