//! Display helpers for the access tables.
use chrono::{DateTime, Utc};
use panel_access::{AccessGroupRecord, AccessRole, FeatureAccessRecord, role_label};

pub const PLACEHOLDER: &str = "—";

const MINUTE_MS: f64 = 60_000.0;
const HOUR_MS: f64 = 60.0 * MINUTE_MS;
const DAY_MS: f64 = 24.0 * HOUR_MS;

/// Relative time for recent values, an absolute UTC date otherwise.
pub fn format_timestamp(value: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(value) = value else {
        return PLACEHOLDER.to_string();
    };
    let diff_ms = (value - now).num_milliseconds();
    let abs_ms = diff_ms.unsigned_abs() as f64;
    let future = diff_ms >= 0;
    let relative = |amount: f64, unit: &str| {
        if future {
            format!("in {amount}{unit}")
        } else {
            format!("{amount}{unit} ago")
        }
    };

    let minutes = (abs_ms / MINUTE_MS).round();
    if minutes < 90.0 {
        return relative(minutes, "m");
    }
    let hours = (abs_ms / HOUR_MS).round();
    if hours < 48.0 {
        return relative(hours, "h");
    }
    let days = (abs_ms / DAY_MS).round();
    if days < 10.0 {
        return relative(days, "d");
    }
    value.format("%b %d, %Y, %I:%M %p").to_string()
}

pub fn format_role(role: Option<&AccessRole>) -> String {
    role.map_or_else(|| PLACEHOLDER.to_string(), |role| role_label(role).to_string())
}

fn join_or_placeholder(items: Vec<String>) -> String {
    if items.is_empty() {
        PLACEHOLDER.to_string()
    } else {
        items.join(", ")
    }
}

/// Allowed roles followed by allowed groups.
pub fn format_audience(feature: &FeatureAccessRecord) -> String {
    let roles = feature
        .allowed_roles
        .iter()
        .flatten()
        .map(|role| role_label(role).to_string());
    let groups = feature.allowed_groups.iter().flatten().cloned();
    join_or_placeholder(roles.chain(groups).collect())
}

pub fn format_visibility(feature: &FeatureAccessRecord) -> String {
    let flag = |on: bool| if on { "on" } else { "off" };
    format!(
        "sidebar:{} topbar:{}",
        flag(feature.show_in_sidebar),
        flag(feature.show_in_topbar)
    )
}

/// One rendered line of the features table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureRow {
    pub status: String,
    pub tone: &'static str,
    pub route: String,
    pub area: String,
    pub title_key: String,
    pub min_role: String,
    pub audience: String,
    pub visibility: String,
    pub updated: String,
}

impl FeatureRow {
    pub fn new(feature: &FeatureAccessRecord, now: DateTime<Utc>) -> Self {
        let meta = feature.status.meta();
        Self {
            status: meta.label.to_string(),
            tone: meta.tone,
            route: feature.route.clone(),
            area: feature.area.to_string(),
            title_key: feature.title_key.clone(),
            min_role: format_role(Some(&feature.min_role)),
            audience: format_audience(feature),
            visibility: format_visibility(feature),
            updated: format_timestamp(feature.touched_at(), now),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupRow {
    pub id: String,
    pub label: String,
    pub description: String,
    pub min_role: String,
    pub allowed_roles: String,
    pub members: usize,
    pub kind: &'static str,
}

impl GroupRow {
    pub fn new(group: &AccessGroupRecord) -> Self {
        Self {
            id: group.id.clone(),
            label: group.label.clone(),
            description: group
                .description
                .clone()
                .unwrap_or_else(|| PLACEHOLDER.to_string()),
            min_role: format_role(Some(group.min_role.as_ref().unwrap_or(&AccessRole::User))),
            allowed_roles: join_or_placeholder(
                group
                    .allowed_roles
                    .iter()
                    .flatten()
                    .map(|role| role_label(role).to_string())
                    .collect(),
            ),
            members: group.member_count(),
            kind: if group.is_system { "System" } else { "Custom" },
        }
    }
}
