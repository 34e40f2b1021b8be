//! Access-control records shared by the control panel service and its tests.
//!
//! # Purpose
//! Turns loosely-typed documents from the backing store into strongly shaped
//! feature-access rules and access groups, and describes the sparse patches
//! the admin backend accepts for them.
//!
//! # How it fits
//! The control panel store feeds raw documents through [`normalize_feature_access`]
//! and [`normalize_access_group`], sorts them with [`sort_features`] and
//! [`sort_groups`], and the editor builds [`FeatureAccessPatch`] /
//! [`AccessGroupPatch`] values to send upstream and merge back on success.
//!
//! # Key invariants
//! - Normalization is total: no input makes it fail or panic.
//! - Normalization is idempotent: `normalize(record.to_raw())` equals `record`.
//! - Optional arrays are either absent or non-empty, never present-but-empty.
//! - `status` and `min_role` are always non-empty after normalization.
//!
//! # Examples
//! ```rust
//! use panel_access::{FeatureStatus, normalize_feature_access};
//!
//! let raw = serde_json::json!({ "route": "/access", "status": "BETA" });
//! let record = normalize_feature_access("access", raw.as_object().unwrap());
//! assert_eq!(record.status, FeatureStatus::Beta);
//! assert_eq!(record.min_role.as_str(), "user");
//! ```

mod normalize;
mod patch;
mod record;
mod timestamp;
mod vocab;

pub use normalize::{
    normalize_access_group, normalize_feature_access, normalize_role, normalize_role_list,
    normalize_string_list, sort_features, sort_groups,
};
pub use patch::{AccessGroupPatch, FeatureAccessPatch};
pub use record::{AccessGroupRecord, FeatureAccessRecord, RawFields};
pub use timestamp::{TimestampValue, normalize_timestamp};
pub use vocab::{AccessRole, FeatureArea, FeatureStatus, StatusMeta, role_label};
