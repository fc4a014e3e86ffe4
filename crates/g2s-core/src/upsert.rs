//! Upsert engine: create-or-update of one hardware asset per device.
//!
//! The create call doubles as the existence check. A create rejected because the
//! asset tag or serial is already taken switches the device to the update
//! path; there is no search before the create.
//!
//! ```text
//! ResolveStatus -> ResolveModel -> SubmitCreate -> Done
//!                                       |
//!                                       +-> Conflict -> SubmitUpdate -> Done
//! any state -> Failed
//! ```

use crate::normalize::normalize_hardware_address;
use crate::resolver::{ReferenceResolver, ResolveError};
use crate::settings::SyncSettings;
use g2s_connectors::{
    AssetManagementConnector, ConnectorError, DeviceRecord, HardwarePayload, MutationResponse,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Date format of the sync-date custom attribute.
pub const SYNC_DATE_FORMAT: &str = "%Y-%m-%d";

/// Fields whose duplicate-value error means the asset already exists.
const UNIQUE_FIELDS: [&str; 2] = ["asset_tag", "serial"];

/// States of one device's reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsertState {
    ResolveStatus,
    ResolveModel,
    SubmitCreate,
    Conflict,
    SubmitUpdate,
    Done,
    Failed,
}

impl fmt::Display for UpsertState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UpsertState::ResolveStatus => "resolve_status",
            UpsertState::ResolveModel => "resolve_model",
            UpsertState::SubmitCreate => "submit_create",
            UpsertState::Conflict => "conflict",
            UpsertState::SubmitUpdate => "submit_update",
            UpsertState::Done => "done",
            UpsertState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// What a dry run would have done.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PlannedAction {
    /// A new asset would be created. `model_id` is `None` when the model
    /// would be created first.
    Create {
        model_id: Option<u64>,
        payload: HardwarePayload,
    },
    /// The existing asset would be patched with `payload`.
    Update {
        asset_id: u64,
        payload: HardwarePayload,
    },
}

/// Successful result of one upsert.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum UpsertOutcome {
    Created { asset_id: u64 },
    Updated { asset_id: u64 },
    /// The asset exists and there was nothing to patch.
    Unchanged { asset_id: u64 },
    Planned(PlannedAction),
}

impl UpsertOutcome {
    /// Short label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            UpsertOutcome::Created { .. } => "created",
            UpsertOutcome::Updated { .. } => "updated",
            UpsertOutcome::Unchanged { .. } => "unchanged",
            UpsertOutcome::Planned(_) => "planned",
        }
    }
}

/// Per-device failure.
#[derive(Error, Debug, Clone)]
pub enum UpsertError {
    #[error("device has no serial number")]
    MissingSerial,

    #[error("model resolution failed: {0}")]
    Resolve(#[from] ResolveError),

    /// The outcome of a call could not be confirmed; the remote state is unknown.
    #[error("request could not be confirmed: {0}")]
    Transport(#[from] ConnectorError),

    #[error("rejected with HTTP {status}: {messages} (payload: {payload})")]
    Rejected {
        status: u16,
        messages: Value,
        payload: Value,
    },

    #[error("malformed response (HTTP {status}): {body}")]
    MalformedResponse { status: u16, body: String },

    /// The conflict search returned a body that is not a row collection.
    #[error("malformed search response: {0}")]
    MalformedSearch(String),

    #[error("asset tag '{0}' reported as duplicate but not found by search")]
    AssetNotFound(String),
}

impl UpsertError {
    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            UpsertError::MissingSerial => "missing_serial",
            UpsertError::Resolve(_) => "resolve",
            UpsertError::Transport(_) => "transport",
            UpsertError::Rejected { .. } => "rejected",
            UpsertError::MalformedResponse { .. } | UpsertError::MalformedSearch(_) => {
                "malformed_response"
            }
            UpsertError::AssetNotFound(_) => "asset_not_found",
        }
    }
}

/// How a mutation response was interpreted.
enum Reply {
    Success(Option<u64>),
    Duplicate,
}

/// Traces state transitions for one device.
struct StateTrace<'a> {
    serial: &'a str,
    state: UpsertState,
}

impl<'a> StateTrace<'a> {
    fn new(serial: &'a str) -> Self {
        Self {
            serial,
            state: UpsertState::ResolveStatus,
        }
    }

    fn advance(&mut self, next: UpsertState) {
        debug!(serial = self.serial, from = %self.state, to = %next, "Upsert transition");
        self.state = next;
    }

    fn fail<T>(&mut self, error: impl Into<UpsertError>) -> Result<T, UpsertError> {
        self.advance(UpsertState::Failed);
        Err(error.into())
    }
}

/// Reconciles one device at a time against the asset-management service.
pub struct UpsertEngine {
    connector: Arc<dyn AssetManagementConnector>,
    resolver: Arc<ReferenceResolver>,
    settings: SyncSettings,
}

impl UpsertEngine {
    /// Creates an engine. The resolver's caches are shared by every device.
    pub fn new(
        connector: Arc<dyn AssetManagementConnector>,
        resolver: Arc<ReferenceResolver>,
        settings: SyncSettings,
    ) -> Self {
        Self {
            connector,
            resolver,
            settings,
        }
    }

    /// Returns the shared resolver.
    pub fn resolver(&self) -> &Arc<ReferenceResolver> {
        &self.resolver
    }

    /// Creates or updates the asset for `device`.
    pub async fn upsert(&self, device: &DeviceRecord) -> Result<UpsertOutcome, UpsertError> {
        let serial = device.serial.trim();
        if serial.is_empty() {
            return Err(UpsertError::MissingSerial);
        }
        let mut trace = StateTrace::new(serial);

        let status_id = self.resolver.resolve_status(device.status.as_deref()).await;
        trace.advance(UpsertState::ResolveModel);

        let model_id = if self.settings.dry_run {
            self.resolver.peek_model(device.model.as_deref()).await
        } else {
            match self.resolver.resolve_model(device.model.as_deref()).await {
                Ok(id) => Some(id),
                Err(e) => return trace.fail(e),
            }
        };

        let attributes = self.optional_attributes(device).await;
        let payload = create_payload(serial, model_id, status_id, &attributes);

        if self.settings.dry_run {
            return self.plan(&mut trace, device, model_id, payload, attributes).await;
        }

        trace.advance(UpsertState::SubmitCreate);
        let response = match self.connector.create_hardware(&payload).await {
            Ok(response) => response,
            Err(e) => return trace.fail(e),
        };

        match interpret(&response, &payload) {
            Ok(Reply::Success(Some(asset_id))) => {
                trace.advance(UpsertState::Done);
                info!(serial, asset_id, "Created asset");
                Ok(UpsertOutcome::Created { asset_id })
            }
            Ok(Reply::Success(None)) => trace.fail(UpsertError::MalformedResponse {
                status: response.status,
                body: response.body,
            }),
            Ok(Reply::Duplicate) => {
                trace.advance(UpsertState::Conflict);
                info!(serial, "Asset already exists, updating");
                self.update_existing(&mut trace, device, attributes).await
            }
            Err(e) => trace.fail(e),
        }
    }

    async fn update_existing(
        &self,
        trace: &mut StateTrace<'_>,
        device: &DeviceRecord,
        attributes: HardwarePayload,
    ) -> Result<UpsertOutcome, UpsertError> {
        let serial = trace.serial;
        let asset_id = match self.find_asset(serial).await {
            Ok(id) => id,
            Err(e) => return trace.fail(e),
        };

        let payload = update_payload(device, attributes);
        if payload.is_empty() {
            trace.advance(UpsertState::Done);
            debug!(serial, asset_id, "Nothing to update");
            return Ok(UpsertOutcome::Unchanged { asset_id });
        }

        trace.advance(UpsertState::SubmitUpdate);
        let response = match self.connector.update_hardware(asset_id, &payload).await {
            Ok(response) => response,
            Err(e) => return trace.fail(e),
        };

        match interpret(&response, &payload) {
            Ok(Reply::Success(_)) => {
                trace.advance(UpsertState::Done);
                info!(serial, asset_id, fields = payload.len(), "Updated asset");
                Ok(UpsertOutcome::Updated { asset_id })
            }
            Ok(Reply::Duplicate) => trace.fail(rejected(&response, &payload)),
            Err(e) => trace.fail(e),
        }
    }

    async fn plan(
        &self,
        trace: &mut StateTrace<'_>,
        device: &DeviceRecord,
        model_id: Option<u64>,
        payload: HardwarePayload,
        attributes: HardwarePayload,
    ) -> Result<UpsertOutcome, UpsertError> {
        let existing = match self.find_asset(trace.serial).await {
            Ok(id) => Some(id),
            Err(UpsertError::AssetNotFound(_)) => None,
            Err(e) => return trace.fail(e),
        };
        trace.advance(UpsertState::Done);

        let action = match existing {
            Some(asset_id) => PlannedAction::Update {
                asset_id,
                payload: update_payload(device, attributes),
            },
            None => PlannedAction::Create { model_id, payload },
        };
        debug!(serial = trace.serial, ?action, "Planned action");
        Ok(UpsertOutcome::Planned(action))
    }

    /// Finds the asset whose tag equals `serial` exactly.
    ///
    /// The search page is capped, so a miss there is confirmed with the
    /// exact tag lookup before reporting the asset as not found.
    async fn find_asset(&self, serial: &str) -> Result<u64, UpsertError> {
        let rows = self
            .connector
            .search_hardware(serial)
            .await
            .map_err(search_error)?;
        let exact = rows.iter().find(|row| {
            row.asset_tag
                .as_deref()
                .is_some_and(|tag| tag.eq_ignore_ascii_case(serial))
        });
        if let Some(row) = exact {
            return Ok(row.id);
        }

        debug!(serial, rows = rows.len(), "No exact tag in search page");
        self.connector
            .hardware_by_tag(serial)
            .await
            .map_err(search_error)?
            .map(|row| row.id)
            .ok_or_else(|| UpsertError::AssetNotFound(serial.to_string()))
    }

    /// Custom attributes present on this device, plus the assigned user when enabled.
    async fn optional_attributes(&self, device: &DeviceRecord) -> HardwarePayload {
        let fields = &self.settings.fields;
        let mut attributes = HardwarePayload::new();

        if let Some(mac) = normalize_hardware_address(present(&device.mac_address)) {
            attributes.insert(fields.mac_address.clone(), json!(mac));
        }
        if let Some(enrolled) = device.enrolled_at {
            attributes.insert(
                fields.sync_date.clone(),
                json!(enrolled.format(SYNC_DATE_FORMAT).to_string()),
            );
        }
        if let Some(ip) = present(&device.ip_address) {
            attributes.insert(fields.ip_address.clone(), json!(ip));
        }
        if let Some(email) = present(&device.last_user) {
            attributes.insert(fields.user.clone(), json!(email));
            if self.settings.assign_users {
                if let Some(user_id) = self.resolver.lookup_user(email).await {
                    attributes.insert("assigned_user".to_string(), json!(user_id));
                }
            }
        }
        attributes
    }
}

fn search_error(error: ConnectorError) -> UpsertError {
    match error {
        ConnectorError::InvalidResponse(detail) => UpsertError::MalformedSearch(detail),
        other => UpsertError::Transport(other),
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn create_payload(
    serial: &str,
    model_id: Option<u64>,
    status_id: u64,
    attributes: &HardwarePayload,
) -> HardwarePayload {
    let mut payload = HardwarePayload::new();
    payload.insert("asset_tag".to_string(), json!(serial));
    payload.insert("serial".to_string(), json!(serial));
    if let Some(model_id) = model_id {
        payload.insert("model_id".to_string(), json!(model_id));
    }
    payload.insert("status_id".to_string(), json!(status_id));
    for (key, value) in attributes {
        payload.insert(key.clone(), value.clone());
    }
    payload
}

fn update_payload(device: &DeviceRecord, mut attributes: HardwarePayload) -> HardwarePayload {
    if let Some(eol) = device.eol_date {
        attributes.insert(
            "asset_eol_date".to_string(),
            json!(eol.format(SYNC_DATE_FORMAT).to_string()),
        );
    }
    attributes
}

fn interpret(
    response: &MutationResponse,
    payload: &HardwarePayload,
) -> Result<Reply, UpsertError> {
    let Some(envelope) = &response.envelope else {
        return Err(UpsertError::MalformedResponse {
            status: response.status,
            body: response.body.clone(),
        });
    };

    if response.is_success() {
        return Ok(Reply::Success(envelope.payload_id()));
    }
    if envelope.is_error() && UNIQUE_FIELDS.iter().any(|f| envelope.names_field(f)) {
        return Ok(Reply::Duplicate);
    }
    Err(rejected(response, payload))
}

fn rejected(response: &MutationResponse, payload: &HardwarePayload) -> UpsertError {
    UpsertError::Rejected {
        status: response.status,
        messages: response
            .envelope
            .as_ref()
            .map(|e| e.messages.clone())
            .unwrap_or(Value::Null),
        payload: Value::Object(payload.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::ModelClassifier;
    use chrono::{NaiveDate, TimeZone, Utc};
    use g2s_connectors::testing::sample_device;
    use g2s_connectors::{MockAssetManagement, MockClassifier, MutationEnvelope, RecordedCall};

    fn engine(
        mock: MockAssetManagement,
        settings: SyncSettings,
    ) -> (UpsertEngine, Arc<MockAssetManagement>) {
        let mock = Arc::new(mock);
        let classifier = Arc::new(ModelClassifier::new(
            Arc::new(MockClassifier::new("ai", "**Chromebook**")),
            settings.categories.clone(),
        ));
        let resolver = Arc::new(ReferenceResolver::new(
            mock.clone(),
            classifier,
            settings.clone(),
        ));
        (UpsertEngine::new(mock.clone(), resolver, settings), mock)
    }

    fn snipe() -> MockAssetManagement {
        MockAssetManagement::new("snipe")
            .with_model(42, "Widget X")
            .with_category(12, "Chromebook")
    }

    #[tokio::test]
    async fn test_missing_serial() {
        let (engine, mock) = engine(snipe(), SyncSettings::default());
        let result = engine.upsert(&DeviceRecord::new("  ")).await;
        assert!(matches!(result, Err(UpsertError::MissingSerial)));
        assert!(mock.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_create_payload_fields() {
        let (engine, mock) = engine(snipe(), SyncSettings::default());
        let mut device = sample_device("SN001", "Widget X");
        device.enrolled_at = Utc.with_ymd_and_hms(2023, 8, 14, 9, 30, 0).single();

        let outcome = engine.upsert(&device).await.unwrap();

        assert!(matches!(outcome, UpsertOutcome::Created { .. }));
        let fields = mock.asset_fields("SN001").await.unwrap();
        assert_eq!(fields["model_id"], json!(42));
        assert_eq!(fields["status_id"], json!(2));
        assert_eq!(fields["_snipeit_mac_address_1"], json!("a8:1d:16:67:42:f7"));
        assert_eq!(fields["_snipeit_sync_date_9"], json!("2023-08-14"));
        assert_eq!(fields["_snipeit_ip_address_3"], json!("10.0.0.12"));
        assert_eq!(fields["_snipeit_user_10"], json!("student@example.org"));
        assert!(!fields.contains_key("assigned_user"));
    }

    #[tokio::test]
    async fn test_absent_optionals_are_omitted() {
        let (engine, mock) = engine(snipe(), SyncSettings::default());
        let mut device = DeviceRecord::new("SN002");
        device.model = Some("Widget X".into());
        device.ip_address = Some("   ".into());

        engine.upsert(&device).await.unwrap();

        let fields = mock.asset_fields("SN002").await.unwrap();
        let mut keys: Vec<_> = fields.keys().cloned().collect();
        keys.sort();
        assert_eq!(keys, vec!["asset_tag", "model_id", "serial", "status_id"]);
    }

    #[tokio::test]
    async fn test_assign_users_when_enabled() {
        let settings = SyncSettings {
            assign_users: true,
            ..SyncSettings::default()
        };
        let (engine, mock) = engine(snipe().with_user(77, "student@example.org"), settings);

        engine.upsert(&sample_device("SN003", "Widget X")).await.unwrap();

        let fields = mock.asset_fields("SN003").await.unwrap();
        assert_eq!(fields["assigned_user"], json!(77));
    }

    #[tokio::test]
    async fn test_second_pass_updates_with_eol() {
        let (engine, mock) = engine(snipe(), SyncSettings::default());
        let mut device = sample_device("SN004", "Widget X");

        let first = engine.upsert(&device).await.unwrap();
        device.eol_date = NaiveDate::from_ymd_opt(2029, 6, 1);
        device.ip_address = Some("10.0.0.99".into());
        let second = engine.upsert(&device).await.unwrap();

        let UpsertOutcome::Created { asset_id } = first else {
            panic!("expected create, got {:?}", first);
        };
        assert_eq!(second, UpsertOutcome::Updated { asset_id });
        let fields = mock.asset_fields("SN004").await.unwrap();
        assert_eq!(fields["asset_eol_date"], json!("2029-06-01"));
        assert_eq!(fields["_snipeit_ip_address_3"], json!("10.0.0.99"));
        assert_eq!(fields["model_id"], json!(42));
        assert_eq!(mock.asset_count().await, 1);
    }

    #[tokio::test]
    async fn test_conflict_with_nothing_to_update_is_unchanged() {
        let (engine, mock) = engine(snipe().with_asset(500, "SN005"), SyncSettings::default());
        let mut device = DeviceRecord::new("SN005");
        device.model = Some("Widget X".into());

        let outcome = engine.upsert(&device).await.unwrap();

        assert_eq!(outcome, UpsertOutcome::Unchanged { asset_id: 500 });
        assert_eq!(
            mock.count_calls(|c| matches!(c, RecordedCall::UpdateHardware(..)))
                .await,
            0
        );
    }

    #[tokio::test]
    async fn test_conflict_requires_exact_tag_match() {
        let (engine, mock) = engine(snipe().with_asset(600, "SN0066"), SyncSettings::default());
        mock.set_create_hardware_reply(Ok(MutationResponse::from_envelope(
            200,
            MutationEnvelope::field_error("serial", "The serial must be unique."),
        )))
        .await;

        let result = engine.upsert(&sample_device("SN006", "Widget X")).await;

        assert!(matches!(result, Err(UpsertError::AssetNotFound(tag)) if tag == "SN006"));
        assert_eq!(
            mock.count_calls(|c| matches!(c, RecordedCall::SearchHardware(_)))
                .await,
            1
        );
        assert_eq!(
            mock.count_calls(|c| matches!(c, RecordedCall::HardwareByTag(_)))
                .await,
            1
        );
    }

    #[tokio::test]
    async fn test_malformed_conflict_search_is_not_asset_not_found() {
        let (engine, mock) = engine(snipe(), SyncSettings::default());
        mock.set_create_hardware_reply(Ok(MutationResponse::from_envelope(
            200,
            MutationEnvelope::field_error("asset_tag", "The asset tag must be unique."),
        )))
        .await;
        mock.fail_searches_with(ConnectorError::InvalidResponse(
            "missing field `rows` - Body: {\"status\":\"error\",\"messages\":\"Unauthenticated.\"}"
                .into(),
        ))
        .await;

        let result = engine.upsert(&sample_device("SN013", "Widget X")).await;

        match result {
            Err(e @ UpsertError::MalformedSearch(_)) => {
                assert_eq!(e.kind(), "malformed_response");
                assert!(e.to_string().contains("Unauthenticated"));
            }
            other => panic!("expected malformed search, got {:?}", other),
        }
        assert_eq!(
            mock.count_calls(|c| matches!(c, RecordedCall::UpdateHardware(..)))
                .await,
            0
        );
    }

    #[tokio::test]
    async fn test_failed_user_search_assigns_no_user() {
        let settings = SyncSettings {
            assign_users: true,
            ..SyncSettings::default()
        };
        let (engine, mock) = engine(
            MockAssetManagement::new("snipe")
                .with_category(12, "Chromebook")
                .with_user(77, "student@example.org"),
            settings,
        );
        mock.fail_searches_with(ConnectorError::ConnectionFailed("down".into()))
            .await;

        let outcome = engine.upsert(&sample_device("SN014", "Widget X")).await.unwrap();

        assert!(matches!(outcome, UpsertOutcome::Created { .. }));
        let fields = mock.asset_fields("SN014").await.unwrap();
        assert!(!fields.contains_key("assigned_user"));
        assert_eq!(fields["_snipeit_user_10"], json!("student@example.org"));
    }

    #[tokio::test]
    async fn test_other_error_is_rejected_with_payload() {
        let (engine, mock) = engine(snipe(), SyncSettings::default());
        mock.set_create_hardware_reply(Ok(MutationResponse::from_envelope(
            200,
            MutationEnvelope::field_error("model_id", "The selected model id is invalid."),
        )))
        .await;

        let result = engine.upsert(&sample_device("SN007", "Widget X")).await;

        match result {
            Err(UpsertError::Rejected {
                status, payload, ..
            }) => {
                assert_eq!(status, 200);
                assert_eq!(payload["asset_tag"], json!("SN007"));
            }
            other => panic!("expected rejection, got {:?}", other),
        }
        assert_eq!(
            mock.count_calls(|c| matches!(c, RecordedCall::SearchHardware(_)))
                .await,
            0
        );
    }

    #[tokio::test]
    async fn test_non_json_reply_is_malformed() {
        let (engine, mock) = engine(snipe(), SyncSettings::default());
        mock.set_create_hardware_reply(Ok(MutationResponse::from_body(
            500,
            "<html>Server Error</html>".to_string(),
        )))
        .await;

        let result = engine.upsert(&sample_device("SN008", "Widget X")).await;

        match result {
            Err(UpsertError::MalformedResponse { status, body }) => {
                assert_eq!(status, 500);
                assert!(body.contains("Server Error"));
            }
            other => panic!("expected malformed response, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_success_without_id_is_malformed() {
        let (engine, mock) = engine(snipe(), SyncSettings::default());
        mock.set_create_hardware_reply(Ok(MutationResponse::from_envelope(
            200,
            MutationEnvelope::success("ok", json!({})),
        )))
        .await;

        let result = engine.upsert(&sample_device("SN009", "Widget X")).await;

        assert!(matches!(result, Err(UpsertError::MalformedResponse { .. })));
    }

    #[tokio::test]
    async fn test_transport_failure_is_not_retried() {
        let (engine, mock) = engine(snipe(), SyncSettings::default());
        mock.set_create_hardware_reply(Err(ConnectorError::RetriesExhausted {
            attempts: 4,
            last_error: "HTTP 429 Too Many Requests".into(),
        }))
        .await;

        let result = engine.upsert(&sample_device("SN010", "Widget X")).await;

        assert!(matches!(result, Err(UpsertError::Transport(_))));
        assert_eq!(
            mock.count_calls(|c| matches!(c, RecordedCall::CreateHardware(_)))
                .await,
            1
        );
    }

    #[tokio::test]
    async fn test_dry_run_plans_without_mutations() {
        let settings = SyncSettings {
            dry_run: true,
            ..SyncSettings::default()
        };
        let (engine, mock) = engine(snipe().with_asset(700, "SN011"), settings);

        let existing = engine.upsert(&sample_device("SN011", "Widget X")).await.unwrap();
        let fresh = engine.upsert(&sample_device("SN012", "Brand New")).await.unwrap();

        assert!(matches!(
            existing,
            UpsertOutcome::Planned(PlannedAction::Update { asset_id: 700, .. })
        ));
        match fresh {
            UpsertOutcome::Planned(PlannedAction::Create { model_id, payload }) => {
                assert_eq!(model_id, None);
                assert!(!payload.contains_key("model_id"));
            }
            other => panic!("expected planned create, got {:?}", other),
        }
        assert_eq!(mock.count_calls(RecordedCall::is_mutation).await, 0);
    }
}
