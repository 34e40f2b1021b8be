//! Session snapshot of feature-access rules and access groups.
//!
//! # Purpose
//! Reads both collections as one unit, normalizes and sorts them, and
//! publishes the result through a `tokio::sync::watch` channel so readers
//! always observe a whole snapshot.
//!
//! # Ordering
//! Every load takes a generation number before it starts fetching. Results
//! are only published while that generation is still the latest; the check
//! runs under the channel's write lock, so a superseded load can never
//! overwrite the state set by a newer one. In-flight fetches are not
//! aborted, their results are dropped.
//!
//! # Failure
//! A failed load clears both lists and records the error message. Nothing is
//! propagated to the caller.
use super::{DocumentSource, RawDocument, StoreError};
use panel_access::{
    AccessGroupPatch, AccessGroupRecord, FeatureAccessPatch, FeatureAccessRecord,
    normalize_access_group, normalize_feature_access, sort_features, sort_groups,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccessControlState {
    pub features: Vec<FeatureAccessRecord>,
    pub groups: Vec<AccessGroupRecord>,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl AccessControlState {
    pub fn feature(&self, id: &str) -> Option<&FeatureAccessRecord> {
        self.features.iter().find(|feature| feature.id == id)
    }

    pub fn group(&self, id: &str) -> Option<&AccessGroupRecord> {
        self.groups.iter().find(|group| group.id == id)
    }
}

pub struct AccessControlStore {
    source: Arc<dyn DocumentSource>,
    state: watch::Sender<AccessControlState>,
    generation: AtomicU64,
}

impl AccessControlStore {
    pub fn new(source: Arc<dyn DocumentSource>) -> Self {
        let (state, _) = watch::channel(AccessControlState::default());
        Self {
            source,
            state,
            generation: AtomicU64::new(0),
        }
    }

    /// Fetch both collections and replace the snapshot.
    pub async fn load(&self) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.send_modify(|state| {
            state.is_loading = true;
            state.error = None;
        });

        let outcome = self
            .source
            .load_access_documents()
            .await
            .map(|documents| build_snapshot(documents.features, documents.groups));

        let published = self.state.send_if_modified(|state| {
            if self.generation.load(Ordering::SeqCst) != generation {
                return false;
            }
            state.is_loading = false;
            match &outcome {
                Ok((features, groups)) => {
                    state.features = features.clone();
                    state.groups = groups.clone();
                    state.error = None;
                }
                Err(err) => {
                    state.features.clear();
                    state.groups.clear();
                    state.error = Some(load_error_message(err));
                }
            }
            true
        });

        if !published {
            metrics::counter!("panel_access_stale_results_total").increment(1);
            tracing::debug!(generation, "discarded superseded access-control load");
            return;
        }
        match &outcome {
            Ok((features, groups)) => {
                metrics::counter!("panel_access_loads_total", "outcome" => "ok").increment(1);
                metrics::gauge!("panel_features_total").set(features.len() as f64);
                metrics::gauge!("panel_access_groups_total").set(groups.len() as f64);
                tracing::info!(
                    generation,
                    features = features.len(),
                    groups = groups.len(),
                    "access-control snapshot loaded"
                );
            }
            Err(err) => {
                metrics::counter!("panel_access_loads_total", "outcome" => "error").increment(1);
                metrics::gauge!("panel_features_total").set(0.0);
                metrics::gauge!("panel_access_groups_total").set(0.0);
                tracing::warn!(generation, error = %err, "access-control load failed");
            }
        }
    }

    /// Reload; overlapping calls resolve to the latest one's result.
    pub async fn refresh(&self) {
        self.load().await;
    }

    /// Merge a partial update into one feature in place. Returns false when
    /// the id is not in the snapshot.
    pub fn update_feature(&self, id: &str, patch: &FeatureAccessPatch) -> bool {
        self.state.send_if_modified(|state| {
            match state.features.iter_mut().find(|feature| feature.id == id) {
                Some(feature) => {
                    patch.apply_to(feature);
                    true
                }
                None => false,
            }
        })
    }

    pub fn update_group(&self, id: &str, patch: &AccessGroupPatch) -> bool {
        self.state.send_if_modified(|state| {
            match state.groups.iter_mut().find(|group| group.id == id) {
                Some(group) => {
                    patch.apply_to(group);
                    true
                }
                None => false,
            }
        })
    }

    pub fn state(&self) -> AccessControlState {
        self.state.borrow().clone()
    }

    pub fn features(&self) -> Vec<FeatureAccessRecord> {
        self.state.borrow().features.clone()
    }

    pub fn groups(&self) -> Vec<AccessGroupRecord> {
        self.state.borrow().groups.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading
    }

    pub fn error(&self) -> Option<String> {
        self.state.borrow().error.clone()
    }

    pub fn feature(&self, id: &str) -> Option<FeatureAccessRecord> {
        self.state.borrow().feature(id).cloned()
    }

    pub fn group(&self, id: &str) -> Option<AccessGroupRecord> {
        self.state.borrow().group(id).cloned()
    }

    pub fn subscribe(&self) -> watch::Receiver<AccessControlState> {
        self.state.subscribe()
    }
}

fn build_snapshot(
    features: Vec<RawDocument>,
    groups: Vec<RawDocument>,
) -> (Vec<FeatureAccessRecord>, Vec<AccessGroupRecord>) {
    let mut features: Vec<FeatureAccessRecord> = features
        .iter()
        .map(|doc| normalize_feature_access(&doc.id, &doc.fields))
        .collect();
    let mut groups: Vec<AccessGroupRecord> = groups
        .iter()
        .map(|doc| normalize_access_group(&doc.id, &doc.fields))
        .collect();
    sort_features(&mut features);
    sort_groups(&mut groups);
    (features, groups)
}

fn load_error_message(err: &StoreError) -> String {
    format!("Failed to load access control data: {err}")
}
