//! Edit workflow over the access-control snapshot.
//!
//! # Drafts
//! Each feature or group being edited has its own session: `Editing` until a
//! save is issued, `Saving` while the PATCH is in flight, then either removed
//! (success, with the confirmed patch merged into the store) or back to
//! editing with the error attached. A failed save never touches other drafts
//! or the snapshot.
//!
//! # Toggles
//! Sidebar/topbar flips skip the draft flow. They are applied to the store
//! optimistically, tracked per (feature, field), and reverted individually
//! when the backend rejects them.
use super::draft::{FeatureDraft, GroupDraft};
use super::toggle::{ToggleStatus, ToggleTracker, VisibilityField};
use super::EditError;
use crate::api::{AccessAdmin, ApiError};
use crate::store::AccessControlStore;
use dashmap::DashMap;
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;

#[derive(Debug, Clone, PartialEq)]
pub enum EditState<D> {
    Idle,
    Editing(D),
    Saving(D),
    Failed { draft: D, error: String },
}

// Sessions reopened under the same id get a fresh epoch, so a save issued
// from an earlier session never lands on a later one.
static NEXT_EPOCH: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone)]
struct EditSession<D> {
    draft: D,
    epoch: u64,
    saving: bool,
    error: Option<String>,
}

impl<D: Clone> EditSession<D> {
    fn new(draft: D) -> Self {
        Self {
            draft,
            epoch: NEXT_EPOCH.fetch_add(1, Ordering::Relaxed),
            saving: false,
            error: None,
        }
    }

    fn state(&self) -> EditState<D> {
        match (&self.error, self.saving) {
            (_, true) => EditState::Saving(self.draft.clone()),
            (Some(error), false) => EditState::Failed {
                draft: self.draft.clone(),
                error: error.clone(),
            },
            (None, false) => EditState::Editing(self.draft.clone()),
        }
    }
}

fn session_state<D: Clone>(sessions: &DashMap<String, EditSession<D>>, id: &str) -> EditState<D> {
    sessions
        .get(id)
        .map(|session| session.state())
        .unwrap_or(EditState::Idle)
}

fn edit_session<D: Clone>(
    sessions: &DashMap<String, EditSession<D>>,
    id: &str,
    edit: impl FnOnce(&mut D),
) -> Result<D, EditError> {
    let mut session = sessions
        .get_mut(id)
        .ok_or_else(|| EditError::NoDraft(id.to_string()))?;
    if session.saving {
        return Err(EditError::SaveInFlight(id.to_string()));
    }
    edit(&mut session.draft);
    Ok(session.draft.clone())
}

/// Move a session to `Saving` and hand back its patch and epoch.
fn start_save<D, P>(
    sessions: &DashMap<String, EditSession<D>>,
    id: &str,
    patch_of: impl FnOnce(&D) -> Option<P>,
) -> Result<(P, u64), EditError> {
    let mut session = sessions
        .get_mut(id)
        .ok_or_else(|| EditError::NoDraft(id.to_string()))?;
    if session.saving {
        return Err(EditError::SaveInFlight(id.to_string()));
    }
    let patch = patch_of(&session.draft).ok_or_else(|| EditError::NotDirty(id.to_string()))?;
    session.saving = true;
    session.error = None;
    Ok((patch, session.epoch))
}

/// Settle the session that issued the save; a cancelled or reopened draft
/// under the same id is left alone.
fn finish_save<D, T>(
    sessions: &DashMap<String, EditSession<D>>,
    id: &str,
    epoch: u64,
    result: &Result<T, ApiError>,
) {
    match result {
        Ok(_) => {
            sessions.remove_if(id, |_, session| session.epoch == epoch);
        }
        Err(err) => {
            if let Some(mut session) = sessions.get_mut(id)
                && session.epoch == epoch
            {
                session.saving = false;
                session.error = Some(err.to_string());
            }
        }
    }
}

pub struct AccessEditor {
    store: Arc<AccessControlStore>,
    admin: Arc<dyn AccessAdmin>,
    features: DashMap<String, EditSession<FeatureDraft>>,
    groups: DashMap<String, EditSession<GroupDraft>>,
    toggles: ToggleTracker,
    banner: watch::Sender<Option<String>>,
}

impl AccessEditor {
    pub fn new(store: Arc<AccessControlStore>, admin: Arc<dyn AccessAdmin>) -> Self {
        let (banner, _) = watch::channel(None);
        Self {
            store,
            admin,
            features: DashMap::new(),
            groups: DashMap::new(),
            toggles: ToggleTracker::new(),
            banner,
        }
    }

    pub fn store(&self) -> &Arc<AccessControlStore> {
        &self.store
    }

    /// Open (or resume) a draft for a feature in the current snapshot.
    pub fn begin_feature_edit(&self, feature_id: &str) -> Result<FeatureDraft, EditError> {
        if let Some(session) = self.features.get(feature_id) {
            return Ok(session.draft.clone());
        }
        let record = self
            .store
            .feature(feature_id)
            .ok_or_else(|| EditError::UnknownFeature(feature_id.to_string()))?;
        let draft = FeatureDraft::from_record(&record);
        self.features
            .insert(feature_id.to_string(), EditSession::new(draft.clone()));
        Ok(draft)
    }

    pub fn edit_feature(
        &self,
        feature_id: &str,
        edit: impl FnOnce(&mut FeatureDraft),
    ) -> Result<FeatureDraft, EditError> {
        edit_session(&self.features, feature_id, edit)
    }

    pub fn cancel_feature_edit(&self, feature_id: &str) -> bool {
        self.features.remove(feature_id).is_some()
    }

    pub fn feature_edit_state(&self, feature_id: &str) -> EditState<FeatureDraft> {
        session_state(&self.features, feature_id)
    }

    /// Send the draft's changed fields; on success merge them into the store.
    pub async fn save_feature(&self, feature_id: &str) -> Result<Value, EditError> {
        let (patch, epoch) = start_save(&self.features, feature_id, |draft: &FeatureDraft| {
            Some(draft.to_patch()).filter(|patch| !patch.is_empty())
        })?;
        let result = self.admin.update_feature_access(feature_id, &patch).await;
        finish_save(&self.features, feature_id, epoch, &result);
        match result {
            Ok(body) => {
                self.store.update_feature(feature_id, &patch);
                tracing::info!(feature_id, "feature access saved");
                Ok(body)
            }
            Err(err) => {
                tracing::warn!(feature_id, error = %err, "feature access save failed");
                Err(err.into())
            }
        }
    }

    /// Open (or resume) a draft for a non-system group.
    pub fn begin_group_edit(&self, group_id: &str) -> Result<GroupDraft, EditError> {
        if let Some(session) = self.groups.get(group_id) {
            return Ok(session.draft.clone());
        }
        let record = self
            .store
            .group(group_id)
            .ok_or_else(|| EditError::UnknownGroup(group_id.to_string()))?;
        let draft = GroupDraft::from_record(&record)?;
        self.groups
            .insert(group_id.to_string(), EditSession::new(draft.clone()));
        Ok(draft)
    }

    pub fn edit_group(
        &self,
        group_id: &str,
        edit: impl FnOnce(&mut GroupDraft),
    ) -> Result<GroupDraft, EditError> {
        edit_session(&self.groups, group_id, edit)
    }

    pub fn cancel_group_edit(&self, group_id: &str) -> bool {
        self.groups.remove(group_id).is_some()
    }

    pub fn group_edit_state(&self, group_id: &str) -> EditState<GroupDraft> {
        session_state(&self.groups, group_id)
    }

    pub async fn save_group(&self, group_id: &str) -> Result<Value, EditError> {
        let (patch, epoch) = start_save(&self.groups, group_id, |draft: &GroupDraft| {
            Some(draft.to_patch()).filter(|patch| !patch.is_empty())
        })?;
        let result = self.admin.update_access_group(group_id, &patch).await;
        finish_save(&self.groups, group_id, epoch, &result);
        match result {
            Ok(body) => {
                self.store.update_group(group_id, &patch);
                tracing::info!(group_id, "access group saved");
                Ok(body)
            }
            Err(err) => {
                tracing::warn!(group_id, error = %err, "access group save failed");
                Err(err.into())
            }
        }
    }

    /// Flip one visibility flag optimistically. Returns the new value.
    pub async fn toggle_visibility(
        &self,
        feature_id: &str,
        field: VisibilityField,
    ) -> Result<bool, EditError> {
        let record = self
            .store
            .feature(feature_id)
            .ok_or_else(|| EditError::UnknownFeature(feature_id.to_string()))?;
        self.toggles.begin(feature_id, field)?;
        let visible = !field.read(&record);
        self.store.update_feature(feature_id, &field.patch(visible));

        match self
            .admin
            .update_feature_access(feature_id, &field.patch(visible))
            .await
        {
            Ok(_) => {
                self.toggles.confirm(feature_id, field);
                tracing::info!(feature_id, field = %field, visible, "visibility updated");
                Ok(visible)
            }
            Err(err) => {
                self.store.update_feature(feature_id, &field.patch(!visible));
                self.toggles.fail(feature_id, field, err.to_string());
                self.banner.send_replace(Some(format!(
                    "Failed to update {field} visibility for {feature_id}: {err}"
                )));
                tracing::warn!(feature_id, field = %field, error = %err, "visibility toggle failed");
                Err(err.into())
            }
        }
    }

    pub fn toggle_status(&self, feature_id: &str, field: VisibilityField) -> ToggleStatus {
        self.toggles.status(feature_id, field)
    }

    pub fn banner(&self) -> Option<String> {
        self.banner.borrow().clone()
    }

    pub fn dismiss_banner(&self) {
        self.banner.send_replace(None);
    }

    pub fn subscribe_banner(&self) -> watch::Receiver<Option<String>> {
        self.banner.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiResult;
    use crate::store::{
        ACCESS_GROUPS_COLLECTION, FEATURE_ACCESS_COLLECTION, InMemoryDocumentSource,
    };
    use async_trait::async_trait;
    use panel_access::{AccessGroupPatch, AccessRole, FeatureAccessPatch, FeatureStatus, RawFields};
    use serde_json::json;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Records every patch; optionally rejects sidebar patches or all group saves.
    #[derive(Default)]
    struct FakeAdmin {
        reject_sidebar: bool,
        reject_groups: bool,
        delay_ms: u64,
        feature_calls: Mutex<Vec<(String, FeatureAccessPatch)>>,
        group_calls: Mutex<Vec<(String, AccessGroupPatch)>>,
    }

    fn forbidden() -> ApiError {
        ApiError::Http {
            status: 403,
            message: "forbidden".into(),
        }
    }

    #[async_trait]
    impl AccessAdmin for FakeAdmin {
        async fn update_feature_access(
            &self,
            feature_id: &str,
            patch: &FeatureAccessPatch,
        ) -> ApiResult<Value> {
            tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
            self.feature_calls
                .lock()
                .expect("lock")
                .push((feature_id.to_string(), patch.clone()));
            if self.reject_sidebar && patch.show_in_sidebar.is_some() {
                return Err(forbidden());
            }
            Ok(json!({ "ok": true }))
        }

        async fn update_access_group(
            &self,
            group_id: &str,
            patch: &AccessGroupPatch,
        ) -> ApiResult<Value> {
            tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
            self.group_calls
                .lock()
                .expect("lock")
                .push((group_id.to_string(), patch.clone()));
            if self.reject_groups {
                return Err(forbidden());
            }
            Ok(Value::Null)
        }
    }

    fn raw(value: serde_json::Value) -> RawFields {
        value.as_object().cloned().unwrap_or_default()
    }

    async fn editor(admin: FakeAdmin) -> (AccessEditor, Arc<FakeAdmin>) {
        let source = Arc::new(InMemoryDocumentSource::new());
        source
            .insert(
                FEATURE_ACCESS_COLLECTION,
                "access",
                raw(json!({ "route": "/access", "status": "beta", "allowedRoles": ["admin"] })),
            )
            .await;
        source
            .insert(FEATURE_ACCESS_COLLECTION, "logs", raw(json!({ "route": "/logs" })))
            .await;
        source
            .insert(ACCESS_GROUPS_COLLECTION, "dev_team", raw(json!({ "label": "Dev" })))
            .await;
        source
            .insert(ACCESS_GROUPS_COLLECTION, "admins", raw(json!({ "isSystem": true })))
            .await;
        let store = Arc::new(AccessControlStore::new(source));
        store.load().await;
        let admin = Arc::new(admin);
        (AccessEditor::new(store, admin.clone()), admin)
    }

    #[tokio::test]
    async fn clean_draft_cannot_be_saved() {
        let (editor, admin) = editor(FakeAdmin::default()).await;
        editor.begin_feature_edit("access").expect("draft");
        let err = editor.save_feature("access").await.expect_err("not dirty");
        assert!(matches!(err, EditError::NotDirty(_)));
        assert!(admin.feature_calls.lock().expect("lock").is_empty());
        assert!(matches!(
            editor.feature_edit_state("access"),
            EditState::Editing(_)
        ));
        assert!(editor.cancel_feature_edit("access"));
        assert!(!editor.cancel_feature_edit("access"));
        assert_eq!(editor.feature_edit_state("access"), EditState::Idle);
    }

    #[tokio::test]
    async fn successful_save_merges_and_closes_draft() {
        let (editor, admin) = editor(FakeAdmin::default()).await;
        editor.begin_feature_edit("access").expect("draft");
        editor
            .edit_feature("access", |draft| {
                draft.status = FeatureStatus::Public;
                draft.toggle_role(AccessRole::Moderator);
            })
            .expect("edit");
        editor.save_feature("access").await.expect("save");

        assert_eq!(editor.feature_edit_state("access"), EditState::Idle);
        let record = editor.store().feature("access").expect("feature");
        assert_eq!(record.status, FeatureStatus::Public);
        assert_eq!(
            record.allowed_roles,
            Some(vec![AccessRole::Admin, AccessRole::Moderator])
        );
        let calls = admin.feature_calls.lock().expect("lock");
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1.show_in_sidebar, None);
    }

    #[tokio::test]
    async fn failed_save_keeps_draft_and_other_drafts() {
        let (editor, _admin) = editor(FakeAdmin {
            reject_groups: true,
            ..FakeAdmin::default()
        })
        .await;
        editor.begin_feature_edit("logs").expect("feature draft");
        editor
            .edit_feature("logs", |draft| draft.show_in_topbar = true)
            .expect("edit");
        editor.begin_group_edit("dev_team").expect("group draft");
        editor
            .edit_group("dev_team", |draft| draft.toggle_user("u1"))
            .expect("edit");

        let err = editor.save_group("dev_team").await.expect_err("rejected");
        assert!(err.to_string().contains("forbidden"));
        match editor.group_edit_state("dev_team") {
            EditState::Failed { draft, error } => {
                assert_eq!(draft.user_ids, vec!["u1".to_string()]);
                assert!(error.contains("403"));
            }
            other => panic!("unexpected state: {other:?}"),
        }
        assert!(matches!(editor.feature_edit_state("logs"), EditState::Editing(_)));
        assert_eq!(editor.store().group("dev_team").expect("group").member_count(), 0);

        // Cancelling discards the failed draft.
        assert!(editor.cancel_group_edit("dev_team"));
        assert_eq!(editor.group_edit_state("dev_team"), EditState::Idle);
    }

    #[tokio::test]
    async fn system_and_unknown_groups_are_refused() {
        let (editor, _admin) = editor(FakeAdmin::default()).await;
        assert!(matches!(
            editor.begin_group_edit("admins"),
            Err(EditError::SystemGroup(_))
        ));
        assert!(matches!(
            editor.begin_group_edit("ghosts"),
            Err(EditError::UnknownGroup(_))
        ));
        assert!(matches!(
            editor.edit_feature("access", |_| {}),
            Err(EditError::NoDraft(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_toggles_are_independent() {
        let (editor, _admin) = editor(FakeAdmin {
            reject_sidebar: true,
            delay_ms: 20,
            ..FakeAdmin::default()
        })
        .await;
        let banner_rx = editor.subscribe_banner();

        let (sidebar, topbar) = tokio::join!(
            editor.toggle_visibility("access", VisibilityField::Sidebar),
            editor.toggle_visibility("access", VisibilityField::Topbar),
        );
        assert!(sidebar.is_err());
        assert!(topbar.expect("topbar"));

        let record = editor.store().feature("access").expect("feature");
        assert!(record.show_in_topbar);
        assert!(!record.show_in_sidebar);
        assert!(matches!(
            editor.toggle_status("access", VisibilityField::Sidebar),
            ToggleStatus::PendingFailed(_)
        ));
        assert_eq!(
            editor.toggle_status("access", VisibilityField::Topbar),
            ToggleStatus::Confirmed
        );
        assert!(banner_rx.has_changed().expect("banner channel"));
        let banner = editor.banner().expect("banner");
        assert!(banner.contains("sidebar"));
        assert!(banner.contains("forbidden"));
        editor.dismiss_banner();
        assert_eq!(editor.banner(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn optimistic_toggle_is_visible_before_confirmation() {
        let (editor, _admin) = editor(FakeAdmin {
            delay_ms: 50,
            ..FakeAdmin::default()
        })
        .await;
        let editor = Arc::new(editor);
        let task = tokio::spawn({
            let editor = editor.clone();
            async move {
                editor
                    .toggle_visibility("logs", VisibilityField::Sidebar)
                    .await
            }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(editor.store().feature("logs").expect("feature").show_in_sidebar);
        assert_eq!(
            editor.toggle_status("logs", VisibilityField::Sidebar),
            ToggleStatus::Pending
        );
        let err = editor
            .toggle_visibility("logs", VisibilityField::Sidebar)
            .await
            .expect_err("in flight");
        assert!(matches!(err, EditError::ToggleInFlight { .. }));
        assert!(task.await.expect("join").expect("toggle"));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_save_does_not_touch_a_reopened_feature_draft() {
        let (editor, _admin) = editor(FakeAdmin {
            reject_sidebar: true,
            delay_ms: 50,
            ..FakeAdmin::default()
        })
        .await;
        let editor = Arc::new(editor);
        editor.begin_feature_edit("logs").expect("draft");
        editor
            .edit_feature("logs", |draft| draft.show_in_sidebar = true)
            .expect("edit");
        let save = tokio::spawn({
            let editor = editor.clone();
            async move { editor.save_feature("logs").await }
        });

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(editor.cancel_feature_edit("logs"));
        let reopened = editor.begin_feature_edit("logs").expect("reopen");
        assert!(!reopened.is_dirty());

        assert!(save.await.expect("join").is_err());
        assert_eq!(
            editor.feature_edit_state("logs"),
            EditState::Editing(reopened)
        );
        assert!(!editor.store().feature("logs").expect("feature").show_in_sidebar);
    }

    #[tokio::test(start_paused = true)]
    async fn confirmed_save_keeps_a_reopened_group_draft() {
        let (editor, admin) = editor(FakeAdmin {
            delay_ms: 50,
            ..FakeAdmin::default()
        })
        .await;
        let editor = Arc::new(editor);
        editor.begin_group_edit("dev_team").expect("draft");
        editor
            .edit_group("dev_team", |draft| draft.toggle_user("u1"))
            .expect("edit");
        let save = tokio::spawn({
            let editor = editor.clone();
            async move { editor.save_group("dev_team").await }
        });

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(editor.cancel_group_edit("dev_team"));
        editor.begin_group_edit("dev_team").expect("reopen");
        let reopened = editor
            .edit_group("dev_team", |draft| draft.label = "Developers".to_string())
            .expect("edit reopened");

        save.await.expect("join").expect("save");
        assert_eq!(admin.group_calls.lock().expect("lock").len(), 1);
        assert_eq!(
            editor.group_edit_state("dev_team"),
            EditState::Editing(reopened)
        );
        assert_eq!(editor.store().group("dev_team").expect("group").member_count(), 1);
    }
}
