//! Total normalizers for raw store documents.
//!
//! # Key invariants
//! - Every function here is total; malformed fields degrade to defaults.
//! - Role strings are trimmed and lower-cased; lists keep first-seen order.
//! - Empty lists collapse to `None` so "has restriction" is a presence test.
use crate::record::{AccessGroupRecord, FeatureAccessRecord, RawFields};
use crate::timestamp::normalize_timestamp;
use crate::vocab::{AccessRole, FeatureArea, FeatureStatus};
use serde_json::Value;
use std::cmp::Ordering;

const DEFAULT_ROUTE: &str = "/";

/// Normalize a single role value, falling back to `user`.
pub fn normalize_role(value: &Value) -> AccessRole {
    match value.as_str().map(str::trim) {
        Some(role) if !role.is_empty() => AccessRole::from(role.to_lowercase()),
        _ => AccessRole::User,
    }
}

/// Normalize a role list. Entries that are not usable strings fall back to
/// `user` like single roles do; duplicates are dropped.
pub fn normalize_role_list(value: Option<&Value>) -> Option<Vec<AccessRole>> {
    let items = value?.as_array()?;
    let mut roles: Vec<AccessRole> = Vec::with_capacity(items.len());
    for item in items {
        let role = normalize_role(item);
        if !roles.contains(&role) {
            roles.push(role);
        }
    }
    non_empty(roles)
}

/// Normalize a list of identifiers: trimmed, blanks and non-strings dropped.
pub fn normalize_string_list(value: Option<&Value>) -> Option<Vec<String>> {
    let items = value?.as_array()?;
    let entries = items
        .iter()
        .filter_map(Value::as_str)
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect();
    non_empty(entries)
}

fn non_empty<T>(items: Vec<T>) -> Option<Vec<T>> {
    if items.is_empty() { None } else { Some(items) }
}

fn non_blank(value: Option<&Value>) -> Option<&str> {
    value
        .and_then(Value::as_str)
        .filter(|text| !text.trim().is_empty())
}

fn optional_string(value: Option<&Value>) -> Option<String> {
    value.and_then(Value::as_str).map(str::to_string)
}

fn strict_true(value: Option<&Value>) -> bool {
    matches!(value, Some(Value::Bool(true)))
}

fn normalize_status(value: Option<&Value>) -> FeatureStatus {
    match non_blank(value) {
        Some(status) => FeatureStatus::from(status.trim().to_lowercase()),
        None => FeatureStatus::Hidden,
    }
}

fn normalize_area(value: Option<&Value>) -> FeatureArea {
    match non_blank(value) {
        Some(area) => FeatureArea::from(area.trim()),
        None => FeatureArea::ControlPanel,
    }
}

// Group minRole is only set when the raw value is truthy.
fn optional_role(value: Option<&Value>) -> Option<AccessRole> {
    let value = value?;
    let truthy = match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    };
    truthy.then(|| normalize_role(value))
}

/// Shape a raw feature-access document.
pub fn normalize_feature_access(id: &str, raw: &RawFields) -> FeatureAccessRecord {
    FeatureAccessRecord {
        id: id.to_string(),
        route: non_blank(raw.get("route"))
            .unwrap_or(DEFAULT_ROUTE)
            .to_string(),
        area: normalize_area(raw.get("area")),
        title_key: non_blank(raw.get("titleKey")).unwrap_or(id).to_string(),
        status: normalize_status(raw.get("status")),
        min_role: raw
            .get("minRole")
            .map(normalize_role)
            .unwrap_or(AccessRole::User),
        allowed_roles: normalize_role_list(raw.get("allowedRoles")),
        allowed_groups: normalize_string_list(raw.get("allowedGroups")),
        allowed_user_ids: normalize_string_list(raw.get("allowedUserIds")),
        show_in_topbar: strict_true(raw.get("showInTopbar")),
        show_in_sidebar: strict_true(raw.get("showInSidebar")),
        nav_order: raw.get("navOrder").and_then(Value::as_f64),
        is_experimental: strict_true(raw.get("isExperimental")),
        created_at: normalize_timestamp(raw.get("createdAt")),
        updated_at: normalize_timestamp(raw.get("updatedAt")),
        created_by: optional_string(raw.get("createdBy")),
        updated_by: optional_string(raw.get("updatedBy")),
    }
}

/// Shape a raw access-group document.
pub fn normalize_access_group(id: &str, raw: &RawFields) -> AccessGroupRecord {
    AccessGroupRecord {
        id: id.to_string(),
        label: non_blank(raw.get("label")).unwrap_or(id).to_string(),
        description: optional_string(raw.get("description")),
        user_ids: normalize_string_list(raw.get("userIds")),
        min_role: optional_role(raw.get("minRole")),
        allowed_roles: normalize_role_list(raw.get("allowedRoles")),
        is_system: strict_true(raw.get("isSystem")),
        created_at: normalize_timestamp(raw.get("createdAt")),
        updated_at: normalize_timestamp(raw.get("updatedAt")),
        created_by: optional_string(raw.get("createdBy")),
        updated_by: optional_string(raw.get("updatedBy")),
    }
}

/// Order features by `nav_order` (unset last), then by route.
pub fn sort_features(features: &mut [FeatureAccessRecord]) {
    features.sort_by(|a, b| {
        let by_order = match (a.nav_order, b.nav_order) {
            (Some(left), Some(right)) => left.total_cmp(&right),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        by_order.then_with(|| a.route.cmp(&b.route))
    });
}

/// Order groups by id.
pub fn sort_groups(groups: &mut [AccessGroupRecord]) {
    groups.sort_by(|a, b| a.id.cmp(&b.id));
}
