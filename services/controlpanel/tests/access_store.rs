mod common;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, patch};
use axum::{Json, Router};
use common::{Recorded, admin_client, spawn_backend};
use controlpanel::store::{AccessControlStore, AdminApiDocumentSource};
use controlpanel::view::{AccessEditor, EditError, EditState, VisibilityField};
use panel_access::{AccessRole, FeatureStatus};
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

fn access_config() -> Value {
    json!({
        "features": [
            {
                "id": "controlPanelAccessFeatures",
                "route": "/access",
                "area": "controlPanel",
                "titleKey": "nav.controlPanel.access",
                "status": "logged_in",
                "minRole": "admin",
                "showInSidebar": true,
                "showInTopbar": false
            },
            { "route": "/no-id" },
            "not-an-object"
        ],
        "groups": [
            { "id": "beta_testers", "label": "Beta Testers", "isSystem": true },
            { "id": "creator_program", "label": "Creator Program", "userIds": ["u1"] }
        ]
    })
}

fn backend(recorded: Recorded) -> Router {
    Router::new()
        .route("/admin/access-control", get(|| async { Json(access_config()) }))
        .route(
            "/admin/access-control/features/:id",
            patch(
                |State(recorded): State<Recorded>, Path(id): Path<String>, Json(body): Json<Value>| async move {
                    recorded.push(format!("features/{id}"), body);
                    Json(json!({ "ok": true }))
                },
            ),
        )
        .route(
            "/admin/access-control/groups/:id",
            patch(|| async { (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "message": "write failed" }))) }),
        )
        .with_state(recorded)
}

async fn loaded_editor(recorded: Recorded) -> AccessEditor {
    let base = spawn_backend(backend(recorded)).await;
    let client = admin_client(&base);
    let store = Arc::new(AccessControlStore::new(Arc::new(
        AdminApiDocumentSource::new(client.clone()),
    )));
    store.load().await;
    AccessEditor::new(store, client)
}

#[tokio::test]
async fn store_loads_snapshot_through_admin_api() {
    let editor = loaded_editor(Recorded::default()).await;
    let store = editor.store();
    assert_eq!(store.error(), None);
    assert!(!store.is_loading());

    let features = store.features();
    assert_eq!(features.len(), 1);
    assert_eq!(features[0].id, "controlPanelAccessFeatures");
    assert_eq!(features[0].status, FeatureStatus::LoggedIn);
    assert_eq!(features[0].min_role, AccessRole::Admin);

    let groups = store.groups();
    assert_eq!(groups.len(), 2);
    assert!(store.group("beta_testers").expect("beta").is_system);
    assert_eq!(store.group("creator_program").expect("creator").member_count(), 1);
}

#[tokio::test]
async fn unreachable_backend_fails_closed() {
    let client = admin_client("http://127.0.0.1:9");
    let store = AccessControlStore::new(Arc::new(AdminApiDocumentSource::new(client)));
    store.load().await;
    let error = store.error().expect("error");
    assert!(
        error.starts_with("Failed to load access control data:"),
        "{error}"
    );
    assert!(store.features().is_empty());
    assert!(store.groups().is_empty());
}

#[tokio::test]
async fn saved_feature_draft_patches_backend_and_store() {
    let recorded = Recorded::default();
    let editor = loaded_editor(recorded.clone()).await;
    let id = "controlPanelAccessFeatures";

    editor.begin_feature_edit(id).expect("begin");
    editor
        .edit_feature(id, |draft| {
            draft.status = FeatureStatus::Beta;
            draft.toggle_group("creator_program");
        })
        .expect("edit");
    editor.save_feature(id).await.expect("save");

    let calls = recorded.take();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, format!("features/{id}"));
    assert_eq!(
        calls[0].1,
        json!({ "status": "beta", "allowedGroups": ["creator_program"] })
    );
    let feature = editor.store().feature(id).expect("feature");
    assert_eq!(feature.status, FeatureStatus::Beta);
    assert_eq!(
        feature.allowed_groups.as_deref(),
        Some(&["creator_program".to_string()][..])
    );
    assert!(matches!(editor.feature_edit_state(id), EditState::Idle));
}

#[tokio::test]
async fn failed_group_save_keeps_draft_and_error() {
    let editor = loaded_editor(Recorded::default()).await;
    let id = "creator_program";

    editor.begin_group_edit(id).expect("begin");
    editor
        .edit_group(id, |draft| draft.label = "Creators".to_string())
        .expect("edit");
    let err = editor.save_group(id).await.expect_err("server error");
    assert!(matches!(err, EditError::Api(_)));

    match editor.group_edit_state(id) {
        EditState::Failed { draft, error } => {
            assert_eq!(draft.label, "Creators");
            assert_eq!(error, "Request failed (500): write failed");
        }
        other => panic!("unexpected state: {other:?}"),
    }
    assert_eq!(editor.store().group(id).expect("group").label, "Creator Program");
    assert!(matches!(
        editor.begin_group_edit("beta_testers"),
        Err(EditError::SystemGroup(_))
    ));
}

#[tokio::test]
async fn visibility_toggle_confirms_against_backend() {
    let recorded = Recorded::default();
    let editor = loaded_editor(recorded.clone()).await;
    let id = "controlPanelAccessFeatures";

    let visible = editor
        .toggle_visibility(id, VisibilityField::Topbar)
        .await
        .expect("toggle");
    assert!(visible);
    assert!(editor.store().feature(id).expect("feature").show_in_topbar);
    assert_eq!(recorded.take()[0].1, json!({ "showInTopbar": true }));
    assert_eq!(editor.banner(), None);
}

#[tokio::test]
async fn one_load_reads_both_collections_from_one_response() {
    let reads = Arc::new(AtomicUsize::new(0));
    let router = Router::new()
        .route(
            "/admin/access-control",
            get(|State(reads): State<Arc<AtomicUsize>>| async move {
                let version = reads.fetch_add(1, Ordering::SeqCst);
                Json(json!({
                    "features": [{ "id": format!("feature-v{version}"), "route": "/f" }],
                    "groups": [{ "id": format!("group-v{version}"), "label": "G" }]
                }))
            }),
        )
        .with_state(reads.clone());
    let base = spawn_backend(router).await;
    let store = AccessControlStore::new(Arc::new(AdminApiDocumentSource::new(admin_client(
        &base,
    ))));

    store.load().await;
    assert_eq!(reads.load(Ordering::SeqCst), 1);
    let features: Vec<String> = store.features().into_iter().map(|f| f.id).collect();
    let groups: Vec<String> = store.groups().into_iter().map(|g| g.id).collect();
    assert_eq!(features, ["feature-v0"]);
    assert_eq!(groups, ["group-v0"]);

    store.refresh().await;
    assert_eq!(reads.load(Ordering::SeqCst), 2);
    assert_eq!(store.feature("feature-v1").map(|f| f.route), Some("/f".to_string()));
    assert!(store.group("group-v1").is_some());
}
