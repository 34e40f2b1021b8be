//! Semi-closed vocabularies used by access rules.
//!
//! # Purpose
//! Roles, statuses and areas have a handful of well-known values, but the
//! backing store is free-form. Each type here keeps the known values as
//! variants and carries anything else in `Other` so unrecognized data still
//! renders instead of failing a strict match.
//!
//! # Key invariants
//! - `From<&str>` maps the exact canonical spelling to the known variant; any
//!   other spelling (including different case) lands in `Other`. Callers that
//!   need case folding go through the normalizers first.
//! - `as_str` returns the canonical spelling (or the carried string).
use serde::{Deserialize, Serialize};

/// Role identifier attached to features and groups.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AccessRole {
    User,
    Moderator,
    Developer,
    Admin,
    Other(String),
}

impl AccessRole {
    pub fn as_str(&self) -> &str {
        match self {
            AccessRole::User => "user",
            AccessRole::Moderator => "moderator",
            AccessRole::Developer => "developer",
            AccessRole::Admin => "admin",
            AccessRole::Other(value) => value,
        }
    }

    /// The four roles offered by the editor, lowest privilege first.
    pub fn canonical() -> [AccessRole; 4] {
        [
            AccessRole::User,
            AccessRole::Moderator,
            AccessRole::Developer,
            AccessRole::Admin,
        ]
    }
}

impl From<&str> for AccessRole {
    fn from(value: &str) -> Self {
        match value {
            "user" => AccessRole::User,
            "moderator" => AccessRole::Moderator,
            "developer" => AccessRole::Developer,
            "admin" => AccessRole::Admin,
            other => AccessRole::Other(other.to_string()),
        }
    }
}

impl From<String> for AccessRole {
    fn from(value: String) -> Self {
        AccessRole::from(value.as_str())
    }
}

impl From<AccessRole> for String {
    fn from(value: AccessRole) -> Self {
        match value {
            AccessRole::Other(value) => value,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for AccessRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display label for a role. Aliases fold onto the canonical four; unknown
/// roles are shown as stored.
pub fn role_label(role: &AccessRole) -> &str {
    match role.as_str() {
        "admin" | "owner" => "Admin",
        "moderator" | "mod" => "Moderator",
        "developer" => "Developer",
        "user" => "User",
        other => other,
    }
}

/// Visibility status of a feature-access rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FeatureStatus {
    Public,
    LoggedIn,
    Beta,
    DevOnly,
    Hidden,
    Other(String),
}

/// Badge text and style hint for a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusMeta<'a> {
    pub label: &'a str,
    pub tone: &'static str,
}

impl FeatureStatus {
    pub fn as_str(&self) -> &str {
        match self {
            FeatureStatus::Public => "public",
            FeatureStatus::LoggedIn => "logged_in",
            FeatureStatus::Beta => "beta",
            FeatureStatus::DevOnly => "dev_only",
            FeatureStatus::Hidden => "hidden",
            FeatureStatus::Other(value) => value,
        }
    }

    /// Statuses offered by the editor's status dropdown, in display order.
    pub fn known() -> [FeatureStatus; 5] {
        [
            FeatureStatus::Public,
            FeatureStatus::LoggedIn,
            FeatureStatus::Beta,
            FeatureStatus::DevOnly,
            FeatureStatus::Hidden,
        ]
    }

    pub fn meta(&self) -> StatusMeta<'_> {
        match self {
            FeatureStatus::Public => StatusMeta {
                label: "Public",
                tone: "public",
            },
            FeatureStatus::LoggedIn => StatusMeta {
                label: "Logged in",
                tone: "logged-in",
            },
            FeatureStatus::Beta => StatusMeta {
                label: "Beta",
                tone: "beta",
            },
            FeatureStatus::DevOnly => StatusMeta {
                label: "Dev only",
                tone: "dev",
            },
            FeatureStatus::Hidden => StatusMeta {
                label: "Hidden",
                tone: "hidden",
            },
            FeatureStatus::Other(value) => StatusMeta {
                label: value,
                tone: "hidden",
            },
        }
    }
}

impl From<&str> for FeatureStatus {
    fn from(value: &str) -> Self {
        match value {
            "public" => FeatureStatus::Public,
            "logged_in" => FeatureStatus::LoggedIn,
            "beta" => FeatureStatus::Beta,
            "dev_only" => FeatureStatus::DevOnly,
            "hidden" => FeatureStatus::Hidden,
            other => FeatureStatus::Other(other.to_string()),
        }
    }
}

impl From<String> for FeatureStatus {
    fn from(value: String) -> Self {
        FeatureStatus::from(value.as_str())
    }
}

impl From<FeatureStatus> for String {
    fn from(value: FeatureStatus) -> Self {
        match value {
            FeatureStatus::Other(value) => value,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for FeatureStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Free-form area tag grouping features in navigation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FeatureArea {
    ControlPanel,
    Other(String),
}

impl FeatureArea {
    pub fn as_str(&self) -> &str {
        match self {
            FeatureArea::ControlPanel => "controlPanel",
            FeatureArea::Other(value) => value,
        }
    }
}

impl From<&str> for FeatureArea {
    fn from(value: &str) -> Self {
        match value {
            "controlPanel" => FeatureArea::ControlPanel,
            other => FeatureArea::Other(other.to_string()),
        }
    }
}

impl From<String> for FeatureArea {
    fn from(value: String) -> Self {
        FeatureArea::from(value.as_str())
    }
}

impl From<FeatureArea> for String {
    fn from(value: FeatureArea) -> Self {
        match value {
            FeatureArea::Other(value) => value,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for FeatureArea {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
