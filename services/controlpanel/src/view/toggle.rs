//! Per-(feature, field) tracking of optimistic visibility toggles.
//!
//! Each sidebar/topbar flag has its own status entry, so toggles on different
//! rows or fields never share an in-flight marker.
use super::EditError;
use dashmap::DashMap;
use panel_access::{FeatureAccessPatch, FeatureAccessRecord};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VisibilityField {
    Sidebar,
    Topbar,
}

impl VisibilityField {
    pub fn as_str(&self) -> &'static str {
        match self {
            VisibilityField::Sidebar => "sidebar",
            VisibilityField::Topbar => "topbar",
        }
    }

    pub fn read(&self, feature: &FeatureAccessRecord) -> bool {
        match self {
            VisibilityField::Sidebar => feature.show_in_sidebar,
            VisibilityField::Topbar => feature.show_in_topbar,
        }
    }

    pub fn patch(&self, visible: bool) -> FeatureAccessPatch {
        match self {
            VisibilityField::Sidebar => FeatureAccessPatch::sidebar(visible),
            VisibilityField::Topbar => FeatureAccessPatch::topbar(visible),
        }
    }
}

impl fmt::Display for VisibilityField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VisibilityField {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sidebar" => Ok(VisibilityField::Sidebar),
            "topbar" => Ok(VisibilityField::Topbar),
            other => Err(format!("unknown visibility field: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleStatus {
    Confirmed,
    Pending,
    PendingFailed(String),
}

#[derive(Debug, Default)]
pub struct ToggleTracker {
    entries: DashMap<(String, VisibilityField), ToggleStatus>,
}

impl ToggleTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a toggle in flight; refuses a second toggle of the same flag.
    pub fn begin(&self, feature_id: &str, field: VisibilityField) -> Result<(), EditError> {
        let mut entry = self
            .entries
            .entry((feature_id.to_string(), field))
            .or_insert(ToggleStatus::Confirmed);
        if *entry == ToggleStatus::Pending {
            return Err(EditError::ToggleInFlight {
                id: feature_id.to_string(),
                field,
            });
        }
        *entry = ToggleStatus::Pending;
        Ok(())
    }

    pub fn confirm(&self, feature_id: &str, field: VisibilityField) {
        self.entries.remove(&(feature_id.to_string(), field));
    }

    pub fn fail(&self, feature_id: &str, field: VisibilityField, message: impl Into<String>) {
        self.entries.insert(
            (feature_id.to_string(), field),
            ToggleStatus::PendingFailed(message.into()),
        );
    }

    pub fn status(&self, feature_id: &str, field: VisibilityField) -> ToggleStatus {
        self.entries
            .get(&(feature_id.to_string(), field))
            .map(|entry| entry.value().clone())
            .unwrap_or(ToggleStatus::Confirmed)
    }

    pub fn in_flight(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| *entry.value() == ToggleStatus::Pending)
            .count()
    }
}
