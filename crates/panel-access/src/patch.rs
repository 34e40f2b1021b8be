//! Sparse update payloads accepted by the admin backend.
//!
//! Only fields that are `Some` are serialized, so a patch carries exactly the
//! changed fields. `apply_to` merges a patch into a local record with the same
//! collapse rules the normalizers use.
use crate::record::{AccessGroupRecord, FeatureAccessRecord};
use crate::vocab::{AccessRole, FeatureStatus};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureAccessPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<FeatureStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_role: Option<AccessRole>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_roles: Option<Vec<AccessRole>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_groups: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_in_sidebar: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_in_topbar: Option<bool>,
}

impl FeatureAccessPatch {
    pub fn sidebar(visible: bool) -> Self {
        Self {
            show_in_sidebar: Some(visible),
            ..Self::default()
        }
    }

    pub fn topbar(visible: bool) -> Self {
        Self {
            show_in_topbar: Some(visible),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub fn apply_to(&self, record: &mut FeatureAccessRecord) {
        if let Some(status) = &self.status {
            record.status = status.clone();
        }
        if let Some(min_role) = &self.min_role {
            record.min_role = min_role.clone();
        }
        if let Some(roles) = &self.allowed_roles {
            record.allowed_roles = collapse_roles(roles);
        }
        if let Some(groups) = &self.allowed_groups {
            record.allowed_groups = collapse_ids(groups);
        }
        if let Some(visible) = self.show_in_sidebar {
            record.show_in_sidebar = visible;
        }
        if let Some(visible) = self.show_in_topbar {
            record.show_in_topbar = visible;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessGroupPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_role: Option<AccessRole>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_roles: Option<Vec<AccessRole>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_ids: Option<Vec<String>>,
}

impl AccessGroupPatch {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub fn apply_to(&self, record: &mut AccessGroupRecord) {
        if let Some(label) = &self.label {
            record.label = if label.trim().is_empty() {
                record.id.clone()
            } else {
                label.clone()
            };
        }
        if let Some(description) = &self.description {
            record.description = Some(description.clone());
        }
        if let Some(min_role) = &self.min_role {
            record.min_role = Some(min_role.clone());
        }
        if let Some(roles) = &self.allowed_roles {
            record.allowed_roles = collapse_roles(roles);
        }
        if let Some(user_ids) = &self.user_ids {
            record.user_ids = collapse_ids(user_ids);
        }
    }
}

fn collapse_roles(roles: &[AccessRole]) -> Option<Vec<AccessRole>> {
    let mut unique: Vec<AccessRole> = Vec::with_capacity(roles.len());
    for role in roles {
        if !unique.contains(role) {
            unique.push(role.clone());
        }
    }
    (!unique.is_empty()).then_some(unique)
}

fn collapse_ids(ids: &[String]) -> Option<Vec<String>> {
    let mut unique: Vec<String> = Vec::with_capacity(ids.len());
    for id in ids.iter().map(|id| id.trim()).filter(|id| !id.is_empty()) {
        if !unique.iter().any(|seen| seen == id) {
            unique.push(id.to_string());
        }
    }
    (!unique.is_empty()).then_some(unique)
}
