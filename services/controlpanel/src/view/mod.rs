//! Access & features editor view-model.
//!
//! # Purpose
//! Everything the admin screen needs on top of the store snapshot: filtering,
//! drafts with dirty tracking, optimistic visibility toggles and display
//! formatting. [`AccessEditor`] ties them to the store and the admin API.
//!
//! # Notes
//! The view never mutates the snapshot directly. Confirmed saves and
//! optimistic toggles go through `AccessControlStore::update_feature` and
//! `update_group`.
use crate::api::ApiError;
use thiserror::Error;

pub mod draft;
pub mod editor;
pub mod filter;
pub mod format;
pub mod toggle;
pub mod users;

pub use draft::{FeatureDraft, GroupDraft};
pub use editor::{AccessEditor, EditState};
pub use filter::{StatusFilter, filter_features, filter_groups, normalize_search};
pub use format::{FeatureRow, GroupRow, format_role, format_timestamp};
pub use toggle::{ToggleStatus, ToggleTracker, VisibilityField};
pub use users::{UserRolesDraft, UsersSummary, summarize_users};

#[derive(Debug, Error)]
pub enum EditError {
    #[error("no draft is open for {0}")]
    NoDraft(String),
    #[error("draft for {0} has no changes")]
    NotDirty(String),
    #[error("unknown feature: {0}")]
    UnknownFeature(String),
    #[error("unknown access group: {0}")]
    UnknownGroup(String),
    #[error("access group {0} is managed by the system and cannot be edited")]
    SystemGroup(String),
    #[error("a save is already in flight for {0}")]
    SaveInFlight(String),
    #[error("{field} toggle is already in flight for {id}")]
    ToggleInFlight { id: String, field: VisibilityField },
    #[error(transparent)]
    Api(#[from] ApiError),
}
