//! Unsaved edit copies of feature rules and access groups.
//!
//! A draft is dirty exactly when its sparse patch is non-empty. Role and group
//! selections compare as sets, so reordering never makes a draft dirty.
use super::EditError;
use panel_access::{
    AccessGroupPatch, AccessGroupRecord, AccessRole, FeatureAccessPatch, FeatureAccessRecord,
    FeatureStatus,
};
use std::collections::HashSet;
use std::hash::Hash;

/// Flip membership of `item`: remove it when present, append it otherwise.
pub fn toggle_member<T: PartialEq>(set: &mut Vec<T>, item: T) {
    if let Some(index) = set.iter().position(|existing| *existing == item) {
        set.remove(index);
    } else {
        set.push(item);
    }
}

pub fn same_members<T: Eq + Hash>(left: &[T], right: &[T]) -> bool {
    left.iter().collect::<HashSet<_>>() == right.iter().collect::<HashSet<_>>()
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureDraft {
    original: FeatureAccessRecord,
    pub status: FeatureStatus,
    pub min_role: AccessRole,
    pub allowed_roles: Vec<AccessRole>,
    pub allowed_groups: Vec<String>,
    pub show_in_sidebar: bool,
    pub show_in_topbar: bool,
}

impl FeatureDraft {
    pub fn from_record(record: &FeatureAccessRecord) -> Self {
        Self {
            original: record.clone(),
            status: record.status.clone(),
            min_role: record.min_role.clone(),
            allowed_roles: record.allowed_roles.clone().unwrap_or_default(),
            allowed_groups: record.allowed_groups.clone().unwrap_or_default(),
            show_in_sidebar: record.show_in_sidebar,
            show_in_topbar: record.show_in_topbar,
        }
    }

    pub fn original(&self) -> &FeatureAccessRecord {
        &self.original
    }

    pub fn toggle_role(&mut self, role: AccessRole) {
        toggle_member(&mut self.allowed_roles, role);
    }

    pub fn toggle_group(&mut self, group_id: &str) {
        toggle_member(&mut self.allowed_groups, group_id.to_string());
    }

    pub fn is_dirty(&self) -> bool {
        !self.to_patch().is_empty()
    }

    /// Only the fields that differ from the original record.
    pub fn to_patch(&self) -> FeatureAccessPatch {
        let original = &self.original;
        let original_roles = original.allowed_roles.as_deref().unwrap_or_default();
        let original_groups = original.allowed_groups.as_deref().unwrap_or_default();
        FeatureAccessPatch {
            status: (self.status != original.status).then(|| self.status.clone()),
            min_role: (self.min_role != original.min_role).then(|| self.min_role.clone()),
            allowed_roles: (!same_members(&self.allowed_roles, original_roles))
                .then(|| self.allowed_roles.clone()),
            allowed_groups: (!same_members(&self.allowed_groups, original_groups))
                .then(|| self.allowed_groups.clone()),
            show_in_sidebar: (self.show_in_sidebar != original.show_in_sidebar)
                .then_some(self.show_in_sidebar),
            show_in_topbar: (self.show_in_topbar != original.show_in_topbar)
                .then_some(self.show_in_topbar),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupDraft {
    original: AccessGroupRecord,
    pub label: String,
    pub description: String,
    min_role: Option<AccessRole>,
    pub allowed_roles: Vec<AccessRole>,
    pub user_ids: Vec<String>,
}

impl GroupDraft {
    /// System groups are managed by the backend and cannot be edited.
    pub fn from_record(record: &AccessGroupRecord) -> Result<Self, EditError> {
        if record.is_system {
            return Err(EditError::SystemGroup(record.id.clone()));
        }
        Ok(Self {
            original: record.clone(),
            label: record.label.clone(),
            description: record.description.clone().unwrap_or_default(),
            min_role: record.min_role.clone(),
            allowed_roles: record.allowed_roles.clone().unwrap_or_default(),
            user_ids: record.user_ids.clone().unwrap_or_default(),
        })
    }

    pub fn original(&self) -> &AccessGroupRecord {
        &self.original
    }

    pub fn min_role(&self) -> Option<&AccessRole> {
        self.min_role.as_ref()
    }

    pub fn set_min_role(&mut self, role: AccessRole) {
        self.min_role = Some(role);
    }

    pub fn toggle_role(&mut self, role: AccessRole) {
        toggle_member(&mut self.allowed_roles, role);
    }

    pub fn toggle_user(&mut self, user_id: &str) {
        toggle_member(&mut self.user_ids, user_id.trim().to_string());
    }

    pub fn is_dirty(&self) -> bool {
        !self.to_patch().is_empty()
    }

    pub fn to_patch(&self) -> AccessGroupPatch {
        let original = &self.original;
        let original_description = original.description.as_deref().unwrap_or_default();
        AccessGroupPatch {
            label: (self.label != original.label).then(|| self.label.clone()),
            description: (self.description != original_description)
                .then(|| self.description.clone()),
            min_role: self
                .min_role
                .clone()
                .filter(|role| original.min_role.as_ref() != Some(role)),
            allowed_roles: (!same_members(
                &self.allowed_roles,
                original.allowed_roles.as_deref().unwrap_or_default(),
            ))
            .then(|| self.allowed_roles.clone()),
            user_ids: (!same_members(
                &self.user_ids,
                original.user_ids.as_deref().unwrap_or_default(),
            ))
            .then(|| self.user_ids.clone()),
        }
    }
}
