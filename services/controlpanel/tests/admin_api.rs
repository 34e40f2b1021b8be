mod common;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, patch};
use axum::{Json, Router};
use common::{Recorded, admin_client, spawn_backend};
use controlpanel::api::{AdminRole, AdminStatus, ApiError};
use controlpanel::store::LogFeed;
use panel_access::{FeatureAccessPatch, FeatureStatus};
use serde_json::{Value, json};
use std::collections::HashMap;

#[tokio::test]
async fn forbidden_patch_surfaces_backend_error_text() {
    let router = Router::new().route(
        "/admin/access-control/features/:id",
        patch(|| async { (StatusCode::FORBIDDEN, Json(json!({ "error": "forbidden" }))) }),
    );
    let base = spawn_backend(router).await;
    let client = admin_client(&base);

    let patch = FeatureAccessPatch {
        status: Some(FeatureStatus::Beta),
        ..Default::default()
    };
    let err = client
        .update_feature_access("controlPanelAccessFeatures", &patch)
        .await
        .expect_err("forbidden");
    assert_eq!(err.status(), Some(403));
    assert!(err.to_string().contains("forbidden"), "{err}");
}

#[tokio::test]
async fn non_json_error_body_falls_back_to_reason_phrase() {
    let router = Router::new().route(
        "/admin/access-control/groups/:id",
        patch(|| async { (StatusCode::FORBIDDEN, "<html>nope</html>") }),
    );
    let base = spawn_backend(router).await;
    let client = admin_client(&base);

    let err = client
        .update_access_group("creator_program", &Default::default())
        .await
        .expect_err("forbidden");
    match &err {
        ApiError::Http { status, message } => {
            assert_eq!(*status, 403);
            assert_eq!(message, "Forbidden");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn patch_sends_only_changed_fields_to_encoded_path() {
    let recorded = Recorded::default();
    let router = Router::new()
        .route(
            "/admin/access-control/features/:id",
            patch(
                |State(recorded): State<Recorded>, Path(id): Path<String>, Json(body): Json<Value>| async move {
                    recorded.push(id, body);
                    Json(json!({ "ok": true }))
                },
            ),
        )
        .with_state(recorded.clone());
    let base = spawn_backend(router).await;
    let client = admin_client(&base);

    let patch = FeatureAccessPatch {
        show_in_topbar: Some(true),
        ..Default::default()
    };
    let body = client
        .update_feature_access("scan import", &patch)
        .await
        .expect("patch");
    assert_eq!(body, json!({ "ok": true }));
    let calls = recorded.take();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "scan import");
    assert_eq!(calls[0].1, json!({ "showInTopbar": true }));
}

#[tokio::test]
async fn empty_success_body_is_accepted() {
    let router = Router::new().route(
        "/admin/access-control/features/:id",
        patch(|| async { StatusCode::NO_CONTENT }),
    );
    let base = spawn_backend(router).await;
    let client = admin_client(&base);
    let body = client
        .update_feature_access("a", &FeatureAccessPatch::default())
        .await
        .expect("no content");
    assert_eq!(body, Value::Null);
}

#[tokio::test]
async fn users_are_normalized_and_roles_updated() {
    let recorded = Recorded::default();
    let router = Router::new()
        .route(
            "/admin/users",
            get(|| async {
                Json(json!({
                    "users": [
                        {
                            "id": "doc-1",
                            "userId": "u1",
                            "displayName": "Ada",
                            "roles": ["owner", "mod"],
                            "status": "suspended",
                            "createdAt": 1_700_000_000_000_i64
                        },
                        { "id": "doc-2", "roles": [] }
                    ]
                }))
            }),
        )
        .route(
            "/admin/users/:id/roles",
            patch(
                |State(recorded): State<Recorded>, Path(id): Path<String>, Json(body): Json<Value>| async move {
                    recorded.push(id.clone(), body.clone());
                    Json(json!({ "user": { "id": id, "roles": body["roles"].clone() } }))
                },
            ),
        )
        .with_state(recorded.clone());
    let base = spawn_backend(router).await;
    let client = admin_client(&base);

    let users = client.fetch_admin_users().await.expect("users");
    assert_eq!(users.len(), 2);
    assert_eq!(users[0].user_id, "u1");
    assert_eq!(users[0].roles, vec![AdminRole::Moderator, AdminRole::Admin]);
    assert_eq!(users[0].status, AdminStatus::Suspended);
    assert_eq!(
        users[0].created_at.as_deref(),
        Some("2023-11-14T22:13:20.000Z")
    );
    assert_eq!(users[1].user_id, "doc-2");
    assert_eq!(users[1].roles, vec![AdminRole::User]);

    let updated = client
        .update_user_roles("u1", &[AdminRole::Admin, AdminRole::Developer])
        .await
        .expect("update");
    assert_eq!(updated.roles, vec![AdminRole::Developer, AdminRole::Admin]);
    let calls = recorded.take();
    assert_eq!(calls[0].0, "u1");
    assert_eq!(calls[0].1, json!({ "roles": ["admin", "creator"] }));
}

#[tokio::test]
async fn log_feed_follows_cursor_until_exhausted() {
    let router = Router::new().route(
        "/admin/logs",
        get(|Query(params): Query<HashMap<String, String>>| async move {
            assert_eq!(params.get("limit").map(String::as_str), Some("2"));
            match params.get("cursor").map(String::as_str) {
                None => Json(json!({
                    "ok": true,
                    "items": [
                        { "id": "1", "timestamp": "t1", "level": "info", "service": "auth", "message": "a" },
                        { "id": "2", "timestamp": "t2", "level": "warn", "service": "auth", "message": "b" }
                    ],
                    "nextCursor": "c2"
                })),
                Some("c2") => Json(json!({
                    "ok": true,
                    "items": [
                        { "id": "3", "timestamp": "t3", "level": "error", "service": "scan", "message": "c" },
                        "garbage"
                    ]
                })),
                Some(other) => panic!("unexpected cursor {other}"),
            }
        }),
    );
    let base = spawn_backend(router).await;
    let mut feed = LogFeed::new(admin_client(&base), 2);

    assert_eq!(feed.load_initial().await.expect("first page"), 2);
    assert!(feed.has_more());
    assert_eq!(feed.load_more().await.expect("second page"), 1);
    assert!(!feed.has_more());
    assert_eq!(feed.load_more().await.expect("exhausted"), 0);
    let ids: Vec<&str> = feed.entries().iter().map(|entry| entry.id.as_str()).collect();
    assert_eq!(ids, ["1", "2", "3"]);
    assert_eq!(feed.error(), None);
}

#[tokio::test]
async fn log_feed_records_backend_failure() {
    let router = Router::new().route(
        "/admin/logs",
        get(|| async { Json(json!({ "ok": false, "error": "log storage offline" })) }),
    );
    let base = spawn_backend(router).await;
    let mut feed = LogFeed::new(admin_client(&base), 50);
    let err = feed.load_initial().await.expect_err("not ok");
    assert_eq!(err.to_string(), "log storage offline");
    assert_eq!(feed.error(), Some("log storage offline"));
    assert!(feed.entries().is_empty());
}
