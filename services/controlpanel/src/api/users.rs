//! Admin user listing and role assignment.
//!
//! # Purpose
//! Normalizes user documents returned by `GET /admin/users` and sends role
//! updates to `PATCH /admin/users/{id}/roles`.
//!
//! # Notes
//! The panel works with a closed, ordered role set. The backend speaks its own
//! role names (`mod`, `creator`); aliases fold on the way in and map back on
//! the way out.
use super::{AdminApiClient, ApiResult, require_id};
use chrono::SecondsFormat;
use panel_access::normalize_timestamp;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::fmt;

/// Panel role, ordered by privilege.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdminRole {
    User,
    Moderator,
    Developer,
    Admin,
}

impl AdminRole {
    pub const ALL: [AdminRole; 4] = [
        AdminRole::User,
        AdminRole::Moderator,
        AdminRole::Developer,
        AdminRole::Admin,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AdminRole::User => "user",
            AdminRole::Moderator => "moderator",
            AdminRole::Developer => "developer",
            AdminRole::Admin => "admin",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AdminRole::User => "User",
            AdminRole::Moderator => "Moderator",
            AdminRole::Developer => "Developer",
            AdminRole::Admin => "Admin",
        }
    }

    /// Fold a raw role name (case-insensitive) onto the panel role set.
    pub fn from_alias(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "admin" | "owner" => Some(AdminRole::Admin),
            "moderator" | "mod" => Some(AdminRole::Moderator),
            "developer" | "dev" | "creator" => Some(AdminRole::Developer),
            "user" => Some(AdminRole::User),
            _ => None,
        }
    }

    /// Role name the backend stores.
    pub fn backend_name(&self) -> &'static str {
        match self {
            AdminRole::Admin => "admin",
            AdminRole::Moderator => "mod",
            AdminRole::Developer => "creator",
            AdminRole::User => "user",
        }
    }
}

impl fmt::Display for AdminRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdminStatus {
    #[default]
    Active,
    Suspended,
    Banned,
}

impl AdminStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdminStatus::Active => "active",
            AdminStatus::Suspended => "suspended",
            AdminStatus::Banned => "banned",
        }
    }

    fn parse(value: Option<&Value>) -> Self {
        match value.and_then(Value::as_str) {
            Some("suspended") => AdminStatus::Suspended,
            Some("banned") => AdminStatus::Banned,
            _ => AdminStatus::Active,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthProvider {
    Discord,
    Google,
}

impl AuthProvider {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "discord" => Some(AuthProvider::Discord),
            "google" => Some(AuthProvider::Google),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderEntry {
    pub id: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUser {
    pub id: String,
    pub user_id: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub primary_provider: Option<AuthProvider>,
    pub providers: Option<BTreeMap<AuthProvider, ProviderEntry>>,
    pub profile: Option<Value>,
    pub roles: Vec<AdminRole>,
    pub status: AdminStatus,
    pub created_at: Option<String>,
    pub last_login_at: Option<String>,
    pub notes: Option<String>,
    pub flags: Option<Vec<String>>,
    pub is_system: bool,
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|value| !value.is_empty())
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(value) => value.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Fold, dedupe and order roles; anything unusable becomes `[user]`.
pub fn normalize_admin_roles(value: Option<&Value>) -> Vec<AdminRole> {
    let Some(items) = value.and_then(Value::as_array) else {
        return vec![AdminRole::User];
    };
    let mut roles: Vec<AdminRole> = items
        .iter()
        .filter_map(Value::as_str)
        .filter_map(AdminRole::from_alias)
        .collect();
    roles.sort();
    roles.dedup();
    if roles.is_empty() {
        roles.push(AdminRole::User);
    }
    roles
}

/// Map panel roles onto backend names; never empty.
pub fn backend_roles(roles: &[AdminRole]) -> Vec<&'static str> {
    let mut names: Vec<&'static str> = Vec::with_capacity(roles.len());
    for name in roles.iter().map(AdminRole::backend_name) {
        if !names.contains(&name) {
            names.push(name);
        }
    }
    if names.is_empty() {
        names.push(AdminRole::User.backend_name());
    }
    names
}

fn normalize_iso(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(_)) | Some(Value::Number(_)) => normalize_timestamp(value)
            .map(|timestamp| timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)),
        _ => None,
    }
}

fn normalize_providers(value: Option<&Value>) -> Option<BTreeMap<AuthProvider, ProviderEntry>> {
    let entries: BTreeMap<AuthProvider, ProviderEntry> = value
        .and_then(Value::as_object)?
        .iter()
        .filter_map(|(key, entry)| {
            let provider = AuthProvider::parse(key)?;
            let entry = entry.as_object()?;
            Some((
                provider,
                ProviderEntry {
                    id: entry.get("id").map(scalar_to_string).unwrap_or_default(),
                    display_name: entry
                        .get("displayName")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                    avatar_url: entry
                        .get("avatarUrl")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                },
            ))
        })
        .collect();
    (!entries.is_empty()).then_some(entries)
}

pub fn normalize_admin_user(raw: &Value) -> AdminUser {
    let id = non_empty_str(raw.get("id")).unwrap_or("unknown-user").to_string();
    let user_id = non_empty_str(raw.get("userId"))
        .map(str::to_string)
        .unwrap_or_else(|| id.clone());
    let profile = raw.get("profile").filter(|value| !value.is_null()).cloned();
    let display_name = non_empty_str(raw.get("displayName"))
        .or_else(|| {
            profile
                .as_ref()
                .and_then(|profile| profile.get("displayName"))
                .and_then(Value::as_str)
        })
        .map(str::to_string);
    let flags: Option<Vec<String>> = raw
        .get("flags")
        .and_then(Value::as_array)
        .map(|items| items.iter().map(scalar_to_string).collect());
    let is_system = raw.get("isSystem") == Some(&Value::Bool(true))
        || raw.get("system") == Some(&Value::Bool(true))
        || flags
            .as_ref()
            .is_some_and(|flags| flags.iter().any(|flag| flag == "system"));

    AdminUser {
        display_name,
        avatar_url: raw
            .get("avatarUrl")
            .and_then(Value::as_str)
            .map(str::to_string),
        primary_provider: raw
            .get("primaryProvider")
            .and_then(Value::as_str)
            .and_then(AuthProvider::parse),
        providers: normalize_providers(raw.get("providers")),
        profile,
        roles: normalize_admin_roles(raw.get("roles")),
        status: AdminStatus::parse(raw.get("status")),
        created_at: normalize_iso(raw.get("createdAt")),
        last_login_at: normalize_iso(raw.get("lastLoginAt")),
        notes: raw.get("notes").and_then(Value::as_str).map(str::to_string),
        flags,
        is_system,
        id,
        user_id,
    }
}

impl AdminApiClient {
    pub async fn fetch_admin_users(&self) -> ApiResult<Vec<AdminUser>> {
        let url = self.endpoint(&["admin", "users"])?;
        let body = self
            .send_json("fetch_admin_users", self.http().get(url))
            .await?;
        let users: Vec<AdminUser> = body
            .get("users")
            .and_then(Value::as_array)
            .map(|items| items.iter().map(normalize_admin_user).collect())
            .unwrap_or_default();
        tracing::info!(count = users.len(), "admin users loaded");
        Ok(users)
    }

    pub async fn update_user_roles(&self, user_id: &str, roles: &[AdminRole]) -> ApiResult<AdminUser> {
        let user_id = require_id(user_id, "User")?;
        let url = self.endpoint(&["admin", "users", user_id, "roles"])?;
        let payload = json!({ "roles": backend_roles(roles) });
        let body = self
            .send_json("update_user_roles", self.http().patch(url).json(&payload))
            .await?;
        let user = body.get("user").unwrap_or(&body);
        Ok(normalize_admin_user(user))
    }
}
