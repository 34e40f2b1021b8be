//! Normalized record shapes.
use crate::vocab::{AccessRole, FeatureArea, FeatureStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Untyped key/value bag as read from the document store.
pub type RawFields = serde_json::Map<String, Value>;

/// Visibility/access rule for one navigable feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureAccessRecord {
    pub id: String,
    pub route: String,
    pub area: FeatureArea,
    pub title_key: String,
    pub status: FeatureStatus,
    pub min_role: AccessRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_roles: Option<Vec<AccessRole>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_groups: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_user_ids: Option<Vec<String>>,
    pub show_in_topbar: bool,
    pub show_in_sidebar: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nav_order: Option<f64>,
    pub is_experimental: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
}

impl FeatureAccessRecord {
    /// Serialize back into the raw document shape.
    pub fn to_raw(&self) -> crate::RawFields {
        to_fields(self)
    }

    /// Most recent known modification time.
    pub fn touched_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at.or(self.created_at)
    }
}

/// Named collection of users with an associated access policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessGroupRecord {
    pub id: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_role: Option<AccessRole>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_roles: Option<Vec<AccessRole>>,
    pub is_system: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
}

impl AccessGroupRecord {
    pub fn to_raw(&self) -> crate::RawFields {
        to_fields(self)
    }

    pub fn member_count(&self) -> usize {
        self.user_ids.as_ref().map_or(0, Vec::len)
    }
}

fn to_fields<T: Serialize>(record: &T) -> RawFields {
    // Records only hold strings, numbers, bools and timestamps; serialization
    // into a JSON object cannot fail for them.
    match serde_json::to_value(record) {
        Ok(Value::Object(map)) => map,
        _ => RawFields::new(),
    }
}
