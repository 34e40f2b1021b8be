//! Access-control endpoints: snapshot read and per-entity PATCH.
use super::{AdminApiClient, ApiResult, require_id};
use async_trait::async_trait;
use panel_access::{AccessGroupPatch, FeatureAccessPatch, RawFields};
use serde_json::Value;

/// Raw arrays returned by `GET /admin/access-control`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccessConfigSnapshot {
    pub features: Vec<RawFields>,
    pub groups: Vec<RawFields>,
}

impl AccessConfigSnapshot {
    /// Missing or malformed arrays decode as empty; non-object items are dropped.
    pub fn from_value(value: &Value) -> Self {
        Self {
            features: object_items(value.get("features")),
            groups: object_items(value.get("groups")),
        }
    }
}

fn object_items(value: Option<&Value>) -> Vec<RawFields> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_object)
                .cloned()
                .collect()
        })
        .unwrap_or_default()
}

/// Remote writes the access editor depends on.
#[async_trait]
pub trait AccessAdmin: Send + Sync {
    async fn update_feature_access(
        &self,
        feature_id: &str,
        patch: &FeatureAccessPatch,
    ) -> ApiResult<Value>;

    async fn update_access_group(&self, group_id: &str, patch: &AccessGroupPatch)
    -> ApiResult<Value>;
}

impl AdminApiClient {
    pub async fn fetch_access_config(&self) -> ApiResult<AccessConfigSnapshot> {
        let url = self.endpoint(&["admin", "access-control"])?;
        let body = self
            .send_json("fetch_access_config", self.http().get(url))
            .await?;
        Ok(AccessConfigSnapshot::from_value(&body))
    }

    pub async fn update_feature_access(
        &self,
        feature_id: &str,
        patch: &FeatureAccessPatch,
    ) -> ApiResult<Value> {
        let feature_id = require_id(feature_id, "Feature")?;
        let url = self.endpoint(&["admin", "access-control", "features", feature_id])?;
        tracing::debug!(feature_id, "patching feature access");
        self.send_json("update_feature_access", self.http().patch(url).json(patch))
            .await
    }

    pub async fn update_access_group(
        &self,
        group_id: &str,
        patch: &AccessGroupPatch,
    ) -> ApiResult<Value> {
        let group_id = require_id(group_id, "Group")?;
        let url = self.endpoint(&["admin", "access-control", "groups", group_id])?;
        tracing::debug!(group_id, "patching access group");
        self.send_json("update_access_group", self.http().patch(url).json(patch))
            .await
    }
}

#[async_trait]
impl AccessAdmin for AdminApiClient {
    async fn update_feature_access(
        &self,
        feature_id: &str,
        patch: &FeatureAccessPatch,
    ) -> ApiResult<Value> {
        AdminApiClient::update_feature_access(self, feature_id, patch).await
    }

    async fn update_access_group(
        &self,
        group_id: &str,
        patch: &AccessGroupPatch,
    ) -> ApiResult<Value> {
        AdminApiClient::update_access_group(self, group_id, patch).await
    }
}
