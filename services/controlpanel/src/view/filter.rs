//! Search and status filtering over a loaded snapshot.
//!
//! Pure functions of (search text, status filter, snapshot); nothing here
//! touches the store.
use panel_access::{AccessGroupRecord, FeatureAccessRecord, FeatureStatus};
use std::convert::Infallible;
use std::str::FromStr;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Only(FeatureStatus),
}

impl StatusFilter {
    pub fn matches(&self, status: &FeatureStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(expected) => expected == status,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = Infallible;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        if value.is_empty() || value.eq_ignore_ascii_case("all") {
            Ok(StatusFilter::All)
        } else {
            Ok(StatusFilter::Only(FeatureStatus::from(
                value.to_lowercase().as_str(),
            )))
        }
    }
}

pub fn normalize_search(value: &str) -> String {
    value.trim().to_lowercase()
}

pub fn feature_matches(feature: &FeatureAccessRecord, query: &str) -> bool {
    query.is_empty()
        || format!("{} {} {}", feature.route, feature.title_key, feature.area)
            .to_lowercase()
            .contains(query)
}

pub fn group_matches(group: &AccessGroupRecord, query: &str) -> bool {
    query.is_empty()
        || format!("{} {}", group.id, group.label)
            .to_lowercase()
            .contains(query)
}

pub fn filter_features<'a>(
    features: &'a [FeatureAccessRecord],
    search: &str,
    status: &StatusFilter,
) -> Vec<&'a FeatureAccessRecord> {
    let query = normalize_search(search);
    features
        .iter()
        .filter(|feature| status.matches(&feature.status) && feature_matches(feature, &query))
        .collect()
}

pub fn filter_groups<'a>(groups: &'a [AccessGroupRecord], search: &str) -> Vec<&'a AccessGroupRecord> {
    let query = normalize_search(search);
    groups
        .iter()
        .filter(|group| group_matches(group, &query))
        .collect()
}
