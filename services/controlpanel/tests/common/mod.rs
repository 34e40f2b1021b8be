#![allow(dead_code)]

use axum::Router;
use controlpanel::api::AdminApiClient;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Serve `router` on an ephemeral local port and return its base URL.
pub async fn spawn_backend(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("serve");
    });
    format!("http://{addr}")
}

pub fn admin_client(base_url: &str) -> Arc<AdminApiClient> {
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .expect("http client");
    Arc::new(AdminApiClient::new(Some(base_url.to_string()), http))
}

/// Request bodies captured by mock handlers, keyed by request path.
#[derive(Clone, Default)]
pub struct Recorded(Arc<Mutex<Vec<(String, Value)>>>);

impl Recorded {
    pub fn push(&self, path: impl Into<String>, body: Value) {
        self.0.lock().expect("lock").push((path.into(), body));
    }

    pub fn take(&self) -> Vec<(String, Value)> {
        std::mem::take(&mut *self.0.lock().expect("lock"))
    }
}
