//! Mock asset-management connector for testing.
//!
//! Keeps hardware, models, status labels, categories and users in memory and
//! answers with the same `{status, messages, payload}` envelopes Snipe-IT
//! does, including the field-keyed error for a duplicate asset tag.

use crate::traits::{
    AssetManagementConnector, ConnectorError, ConnectorHealth, ConnectorResult,
    CreateModelRequest, HardwarePayload, HardwareRow, MutationEnvelope, MutationResponse,
    ReferenceRow,
};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

/// A call received by the mock, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    SearchHardware(String),
    HardwareByTag(String),
    CreateHardware(HardwarePayload),
    UpdateHardware(u64, HardwarePayload),
    SearchModels(String),
    CreateModel(CreateModelRequest),
    AssignFieldset(u64, u64),
    SearchStatusLabels(String),
    SearchCategories(String),
    CreateCategory(String),
    SearchUsers(String),
}

impl RecordedCall {
    /// Returns true for calls that change remote state.
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            RecordedCall::CreateHardware(_)
                | RecordedCall::UpdateHardware(..)
                | RecordedCall::CreateModel(_)
                | RecordedCall::AssignFieldset(..)
                | RecordedCall::CreateCategory(_)
        )
    }
}

#[derive(Debug, Clone)]
struct MockAsset {
    id: u64,
    fields: HardwarePayload,
}

impl MockAsset {
    fn field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    fn row(&self) -> HardwareRow {
        HardwareRow {
            id: self.id,
            asset_tag: self.field("asset_tag").map(str::to_string),
            serial: self.field("serial").map(str::to_string),
        }
    }
}

#[derive(Default)]
struct MockState {
    assets: Vec<MockAsset>,
    models: Vec<ReferenceRow>,
    model_fieldsets: HashMap<u64, u64>,
    statuses: Vec<ReferenceRow>,
    categories: Vec<ReferenceRow>,
    users: Vec<ReferenceRow>,
    calls: Vec<RecordedCall>,
    create_hardware_reply: Option<ConnectorResult<MutationResponse>>,
    search_failure: Option<ConnectorError>,
}

/// Mock asset-management connector for testing.
pub struct MockAssetManagement {
    name: String,
    state: RwLock<MockState>,
    counter: AtomicU64,
}

impl MockAssetManagement {
    /// Creates an empty mock.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            state: RwLock::new(MockState::default()),
            counter: AtomicU64::new(1000),
        }
    }

    fn next_id(&self) -> u64 {
        self.counter.fetch_add(1, Ordering::SeqCst)
    }

    /// Seeds an existing hardware asset.
    pub fn with_asset(mut self, id: u64, asset_tag: &str) -> Self {
        let mut fields = HardwarePayload::new();
        fields.insert("asset_tag".into(), json!(asset_tag));
        fields.insert("serial".into(), json!(asset_tag));
        self.state.get_mut().assets.push(MockAsset { id, fields });
        self
    }

    /// Seeds an existing model.
    pub fn with_model(mut self, id: u64, name: &str) -> Self {
        self.state.get_mut().models.push(ReferenceRow::named(id, name));
        self
    }

    /// Seeds an existing status label.
    pub fn with_status_label(mut self, id: u64, name: &str) -> Self {
        self.state
            .get_mut()
            .statuses
            .push(ReferenceRow::named(id, name));
        self
    }

    /// Seeds an existing category.
    pub fn with_category(mut self, id: u64, name: &str) -> Self {
        self.state
            .get_mut()
            .categories
            .push(ReferenceRow::named(id, name));
        self
    }

    /// Seeds an existing user.
    pub fn with_user(mut self, id: u64, email: &str) -> Self {
        self.state.get_mut().users.push(ReferenceRow {
            id,
            name: email.to_string(),
            email: Some(email.to_string()),
            username: None,
        });
        self
    }

    /// Replaces the answer to every hardware creation with `reply`.
    pub async fn set_create_hardware_reply(&self, reply: ConnectorResult<MutationResponse>) {
        self.state.write().await.create_hardware_reply = Some(reply);
    }

    /// Makes every search fail with `error`.
    pub async fn fail_searches_with(&self, error: ConnectorError) {
        self.state.write().await.search_failure = Some(error);
    }

    /// Returns every call received so far.
    pub async fn calls(&self) -> Vec<RecordedCall> {
        self.state.read().await.calls.clone()
    }

    /// Counts the calls matching `predicate`.
    pub async fn count_calls(&self, predicate: impl Fn(&RecordedCall) -> bool) -> usize {
        self.state
            .read()
            .await
            .calls
            .iter()
            .filter(|c| predicate(c))
            .count()
    }

    /// Returns the stored fields of the asset with `asset_tag`.
    pub async fn asset_fields(&self, asset_tag: &str) -> Option<HardwarePayload> {
        self.state
            .read()
            .await
            .assets
            .iter()
            .find(|a| matches_ci(a.field("asset_tag"), asset_tag))
            .map(|a| a.fields.clone())
    }

    /// Returns the number of stored assets.
    pub async fn asset_count(&self) -> usize {
        self.state.read().await.assets.len()
    }

    /// Returns the fieldset assigned to a model, if any.
    pub async fn model_fieldset(&self, model_id: u64) -> Option<u64> {
        self.state.read().await.model_fieldsets.get(&model_id).copied()
    }

    async fn record(&self, call: RecordedCall) -> ConnectorResult<()> {
        let mut state = self.state.write().await;
        let is_search = !call.is_mutation();
        state.calls.push(call);
        match (&state.search_failure, is_search) {
            (Some(err), true) => Err(err.clone()),
            _ => Ok(()),
        }
    }
}

fn matches_ci(value: Option<&str>, expected: &str) -> bool {
    value.is_some_and(|v| v.eq_ignore_ascii_case(expected))
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn ok(envelope: MutationEnvelope) -> ConnectorResult<MutationResponse> {
    Ok(MutationResponse::from_envelope(200, envelope))
}

#[async_trait]
impl crate::traits::Connector for MockAssetManagement {
    fn name(&self) -> &str {
        &self.name
    }

    fn connector_type(&self) -> &str {
        "asset_management"
    }

    async fn health_check(&self) -> ConnectorResult<ConnectorHealth> {
        Ok(ConnectorHealth::Healthy)
    }

    async fn test_connection(&self) -> ConnectorResult<bool> {
        Ok(true)
    }
}

#[async_trait]
impl AssetManagementConnector for MockAssetManagement {
    async fn search_hardware(&self, query: &str) -> ConnectorResult<Vec<HardwareRow>> {
        self.record(RecordedCall::SearchHardware(query.to_string()))
            .await?;
        let state = self.state.read().await;
        Ok(state
            .assets
            .iter()
            .filter(|a| {
                a.field("asset_tag").is_some_and(|t| contains_ci(t, query))
                    || a.field("serial").is_some_and(|s| contains_ci(s, query))
            })
            .map(MockAsset::row)
            .collect())
    }

    async fn hardware_by_tag(&self, asset_tag: &str) -> ConnectorResult<Option<HardwareRow>> {
        self.record(RecordedCall::HardwareByTag(asset_tag.to_string()))
            .await?;
        let state = self.state.read().await;
        Ok(state
            .assets
            .iter()
            .find(|a| matches_ci(a.field("asset_tag"), asset_tag))
            .map(MockAsset::row))
    }

    async fn create_hardware(
        &self,
        payload: &HardwarePayload,
    ) -> ConnectorResult<MutationResponse> {
        self.record(RecordedCall::CreateHardware(payload.clone()))
            .await?;
        let mut state = self.state.write().await;
        if let Some(reply) = &state.create_hardware_reply {
            return reply.clone();
        }

        let tag = payload
            .get("asset_tag")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        if state
            .assets
            .iter()
            .any(|a| matches_ci(a.field("asset_tag"), &tag))
        {
            return ok(MutationEnvelope::field_error(
                "asset_tag",
                "The asset tag must be unique.",
            ));
        }

        let id = self.next_id();
        state.assets.push(MockAsset {
            id,
            fields: payload.clone(),
        });
        ok(MutationEnvelope::success(
            "Asset created successfully.",
            json!({ "id": id, "asset_tag": tag }),
        ))
    }

    async fn update_hardware(
        &self,
        asset_id: u64,
        payload: &HardwarePayload,
    ) -> ConnectorResult<MutationResponse> {
        self.record(RecordedCall::UpdateHardware(asset_id, payload.clone()))
            .await?;
        let mut state = self.state.write().await;
        match state.assets.iter_mut().find(|a| a.id == asset_id) {
            Some(asset) => {
                for (key, value) in payload {
                    asset.fields.insert(key.clone(), value.clone());
                }
                ok(MutationEnvelope::success(
                    "Asset updated successfully.",
                    json!({ "id": asset_id }),
                ))
            }
            None => ok(MutationEnvelope {
                status: "error".to_string(),
                messages: json!("Asset does not exist."),
                payload: None,
            }),
        }
    }

    async fn search_models(&self, name: &str) -> ConnectorResult<Vec<ReferenceRow>> {
        self.record(RecordedCall::SearchModels(name.to_string()))
            .await?;
        let state = self.state.read().await;
        Ok(state
            .models
            .iter()
            .filter(|m| contains_ci(&m.name, name))
            .cloned()
            .collect())
    }

    async fn create_model(
        &self,
        request: &CreateModelRequest,
    ) -> ConnectorResult<MutationResponse> {
        self.record(RecordedCall::CreateModel(request.clone()))
            .await?;
        let mut state = self.state.write().await;
        if state
            .models
            .iter()
            .any(|m| m.name.eq_ignore_ascii_case(&request.name))
        {
            return ok(MutationEnvelope::field_error(
                "name",
                "The name has already been taken.",
            ));
        }
        let id = self.next_id();
        state.models.push(ReferenceRow::named(id, &request.name));
        ok(MutationEnvelope::success(
            "Model created successfully.",
            json!({ "id": id, "name": request.name }),
        ))
    }

    async fn assign_fieldset(
        &self,
        model_id: u64,
        fieldset_id: u64,
    ) -> ConnectorResult<MutationResponse> {
        self.record(RecordedCall::AssignFieldset(model_id, fieldset_id))
            .await?;
        let mut state = self.state.write().await;
        if !state.models.iter().any(|m| m.id == model_id) {
            return ok(MutationEnvelope {
                status: "error".to_string(),
                messages: json!("Model does not exist."),
                payload: None,
            });
        }
        state.model_fieldsets.insert(model_id, fieldset_id);
        ok(MutationEnvelope::success(
            "Model updated successfully.",
            json!({ "id": model_id, "fieldset_id": fieldset_id }),
        ))
    }

    async fn search_status_labels(&self, name: &str) -> ConnectorResult<Vec<ReferenceRow>> {
        self.record(RecordedCall::SearchStatusLabels(name.to_string()))
            .await?;
        let state = self.state.read().await;
        Ok(state
            .statuses
            .iter()
            .filter(|s| s.name.eq_ignore_ascii_case(name))
            .cloned()
            .collect())
    }

    async fn search_categories(&self, name: &str) -> ConnectorResult<Vec<ReferenceRow>> {
        self.record(RecordedCall::SearchCategories(name.to_string()))
            .await?;
        let state = self.state.read().await;
        Ok(state
            .categories
            .iter()
            .filter(|c| contains_ci(&c.name, name))
            .cloned()
            .collect())
    }

    async fn create_category(&self, name: &str) -> ConnectorResult<MutationResponse> {
        self.record(RecordedCall::CreateCategory(name.to_string()))
            .await?;
        let id = self.next_id();
        self.state
            .write()
            .await
            .categories
            .push(ReferenceRow::named(id, name));
        ok(MutationEnvelope::success(
            "Category created successfully.",
            json!({ "id": id, "name": name }),
        ))
    }

    async fn search_users(&self, email: &str) -> ConnectorResult<Vec<ReferenceRow>> {
        self.record(RecordedCall::SearchUsers(email.to_string()))
            .await?;
        let state = self.state.read().await;
        Ok(state
            .users
            .iter()
            .filter(|u| matches_ci(u.email.as_deref(), email))
            .cloned()
            .collect())
    }
}
