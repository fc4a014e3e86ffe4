//! Connector trait definitions for google2snipe.
//!
//! This module defines the interfaces the reconciliation core talks to,
//! providing a consistent API over the asset-management service, the AI
//! classification service and the device directory.

use crate::secure_string::SecureString;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use thiserror::Error;

/// Errors that can occur in connectors.
#[derive(Error, Debug, Clone)]
pub enum ConnectorError {
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Authorization denied: {0}")]
    AuthorizationDenied(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    /// Every attempt failed with a retryable condition. The remote state is
    /// unknown: a mutation may have been applied before the response was lost.
    #[error("Gave up after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for connector operations.
pub type ConnectorResult<T> = Result<T, ConnectorError>;

/// Health status of a connector.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConnectorHealth {
    /// Connector is healthy and operational.
    Healthy,
    /// Connector is degraded but still functional.
    Degraded(String),
    /// Connector is unhealthy and not operational.
    Unhealthy(String),
    /// Health status is unknown.
    Unknown,
}

/// Configuration for a connector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectorConfig {
    /// Connector name/identifier.
    pub name: String,
    /// Base URL for the API.
    pub base_url: String,
    /// Authentication configuration.
    pub auth: AuthConfig,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Maximum number of attempts per request (including the first one).
    pub max_attempts: u32,
    /// Fixed delay between attempts, in seconds.
    pub retry_delay_secs: u64,
    /// Whether to verify TLS certificates.
    pub verify_tls: bool,
    /// Additional headers to include.
    pub headers: HashMap<String, String>,
}

/// Authentication configuration.
///
/// Credential fields use `SecureString` so they are zeroized when dropped
/// and never printed by `Debug`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthConfig {
    /// No authentication.
    None,
    /// API key sent in a named header.
    ApiKey {
        /// The API key (zeroized on drop).
        key: SecureString,
        /// The header name to use for the API key.
        header_name: String,
    },
    /// Bearer token authentication.
    BearerToken {
        /// The bearer token (zeroized on drop).
        token: SecureString,
    },
}

/// Base trait for all connectors.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Returns the connector name.
    fn name(&self) -> &str;

    /// Returns the connector type (e.g., "asset_management", "classifier", "directory").
    fn connector_type(&self) -> &str;

    /// Checks the health of the connector.
    async fn health_check(&self) -> ConnectorResult<ConnectorHealth>;

    /// Tests the connection to the external system.
    async fn test_connection(&self) -> ConnectorResult<bool>;
}

// ============================================================================
// Directory
// ============================================================================

/// A managed device as reported by the directory service.
///
/// Snapshot for one synchronization pass. Only `serial` is mandatory.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeviceRecord {
    /// Serial number, used as the asset tag.
    pub serial: String,
    /// Lifecycle status label (e.g. "ACTIVE", "DISABLED").
    #[serde(default)]
    pub status: Option<String>,
    /// Hardware model name.
    #[serde(default)]
    pub model: Option<String>,
    /// Hardware (MAC) address, in whatever format the directory returns.
    #[serde(default)]
    pub mac_address: Option<String>,
    /// Last-known network address.
    #[serde(default)]
    pub ip_address: Option<String>,
    /// Email of the most recent user.
    #[serde(default)]
    pub last_user: Option<String>,
    /// First enrollment timestamp.
    #[serde(default)]
    pub enrolled_at: Option<DateTime<Utc>>,
    /// End-of-life date, when known.
    #[serde(default)]
    pub eol_date: Option<NaiveDate>,
}

impl DeviceRecord {
    /// Creates a record with only the serial set.
    pub fn new(serial: impl Into<String>) -> Self {
        Self {
            serial: serial.into(),
            ..Default::default()
        }
    }
}

/// Source of device records.
#[async_trait]
pub trait DirectoryConnector: Connector {
    /// Lists every device visible to this source.
    async fn list_devices(&self) -> ConnectorResult<Vec<DeviceRecord>>;
}

// ============================================================================
// AI classification
// ============================================================================

/// Free-text generation service used to classify hardware models.
#[async_trait]
pub trait ClassifierConnector: Connector {
    /// Sends a prompt and returns the raw response text.
    async fn generate(&self, prompt: &str) -> ConnectorResult<String>;
}

// ============================================================================
// Asset management
// ============================================================================

/// A named reference entity row (model, status label, category or user).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReferenceRow {
    /// Numeric identifier.
    pub id: u64,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Email address (users only).
    #[serde(default)]
    pub email: Option<String>,
    /// Username (users only).
    #[serde(default)]
    pub username: Option<String>,
}

impl ReferenceRow {
    /// Creates a row with an id and a name.
    pub fn named(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            ..Default::default()
        }
    }
}

/// A hardware asset row returned by a search.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct HardwareRow {
    /// Numeric identifier.
    pub id: u64,
    /// Asset tag.
    #[serde(default)]
    pub asset_tag: Option<String>,
    /// Serial number.
    #[serde(default)]
    pub serial: Option<String>,
}

/// Collection envelope returned by search endpoints.
///
/// `rows` is required: Snipe-IT answers some failures (an expired token,
/// for one) with HTTP 200 and a `{status, messages}` body, which must not
/// read as an empty result.
#[derive(Debug, Clone, Deserialize)]
pub struct RowsEnvelope<T> {
    /// Total matches on the remote side.
    #[serde(default)]
    pub total: Option<u64>,
    /// Returned rows.
    pub rows: Vec<T>,
}

/// Create/update body for hardware. Keys are dynamic because custom
/// attribute keys are instance-specific.
pub type HardwarePayload = Map<String, Value>;

/// The `{status, messages, payload}` envelope returned by mutations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MutationEnvelope {
    /// "success" or "error".
    pub status: String,
    /// Either a plain message or a field-keyed map of messages.
    #[serde(default)]
    pub messages: Value,
    /// The affected entity, when the mutation succeeded.
    #[serde(default)]
    pub payload: Option<Value>,
}

impl MutationEnvelope {
    /// Builds a success envelope.
    pub fn success(message: &str, payload: Value) -> Self {
        Self {
            status: "success".to_string(),
            messages: Value::String(message.to_string()),
            payload: Some(payload),
        }
    }

    /// Builds an error envelope with field-keyed messages.
    pub fn field_error(field: &str, message: &str) -> Self {
        let mut messages = Map::new();
        messages.insert(
            field.to_string(),
            Value::Array(vec![Value::String(message.to_string())]),
        );
        Self {
            status: "error".to_string(),
            messages: Value::Object(messages),
            payload: None,
        }
    }

    /// Returns true if the remote reported success.
    pub fn is_success(&self) -> bool {
        self.status.eq_ignore_ascii_case("success")
    }

    /// Returns true if the remote reported an error.
    pub fn is_error(&self) -> bool {
        self.status.eq_ignore_ascii_case("error")
    }

    /// Returns true if the error messages are keyed by `field`.
    pub fn names_field(&self, field: &str) -> bool {
        self.messages
            .as_object()
            .map(|m| m.contains_key(field))
            .unwrap_or(false)
    }

    /// Returns the `id` of the payload, if any.
    pub fn payload_id(&self) -> Option<u64> {
        self.payload
            .as_ref()
            .and_then(|p| p.get("id"))
            .and_then(Value::as_u64)
    }
}

/// Outcome of a mutating call as seen on the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationResponse {
    /// HTTP status code.
    pub status: u16,
    /// Parsed envelope, or `None` when the body was not a valid envelope.
    pub envelope: Option<MutationEnvelope>,
    /// Raw body, kept for diagnostics.
    pub body: String,
}

impl MutationResponse {
    /// Parses a raw HTTP body into a mutation response.
    pub fn from_body(status: u16, body: String) -> Self {
        let envelope = serde_json::from_str::<MutationEnvelope>(&body).ok();
        Self {
            status,
            envelope,
            body,
        }
    }

    /// Wraps an envelope produced without going through HTTP.
    pub fn from_envelope(status: u16, envelope: MutationEnvelope) -> Self {
        let body = serde_json::to_string(&envelope).unwrap_or_default();
        Self {
            status,
            envelope: Some(envelope),
            body,
        }
    }

    /// Returns true if the call is a confirmed success.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
            && self.envelope.as_ref().is_some_and(MutationEnvelope::is_success)
    }
}

/// Request to create a hardware model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateModelRequest {
    /// Model name.
    pub name: String,
    /// Category the model belongs to.
    pub category_id: u64,
    /// Manufacturer, when the instance requires one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manufacturer_id: Option<u64>,
}

/// Asset-management service connector (Snipe-IT).
#[async_trait]
pub trait AssetManagementConnector: Connector {
    /// Searches hardware assets.
    async fn search_hardware(&self, query: &str) -> ConnectorResult<Vec<HardwareRow>>;

    /// Looks up the asset whose tag equals `asset_tag` exactly.
    async fn hardware_by_tag(&self, asset_tag: &str) -> ConnectorResult<Option<HardwareRow>>;

    /// Creates a hardware asset.
    async fn create_hardware(&self, payload: &HardwarePayload)
        -> ConnectorResult<MutationResponse>;

    /// Partially updates a hardware asset.
    async fn update_hardware(
        &self,
        asset_id: u64,
        payload: &HardwarePayload,
    ) -> ConnectorResult<MutationResponse>;

    /// Searches models by name (substring search).
    async fn search_models(&self, name: &str) -> ConnectorResult<Vec<ReferenceRow>>;

    /// Creates a model.
    async fn create_model(&self, request: &CreateModelRequest)
        -> ConnectorResult<MutationResponse>;

    /// Assigns a custom field set to a model.
    async fn assign_fieldset(
        &self,
        model_id: u64,
        fieldset_id: u64,
    ) -> ConnectorResult<MutationResponse>;

    /// Searches status labels by name.
    async fn search_status_labels(&self, name: &str) -> ConnectorResult<Vec<ReferenceRow>>;

    /// Searches categories by name.
    async fn search_categories(&self, name: &str) -> ConnectorResult<Vec<ReferenceRow>>;

    /// Creates an asset category.
    async fn create_category(&self, name: &str) -> ConnectorResult<MutationResponse>;

    /// Searches users by email.
    async fn search_users(&self, email: &str) -> ConnectorResult<Vec<ReferenceRow>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_names_field() {
        let envelope: MutationEnvelope = serde_json::from_value(json!({
            "status": "error",
            "messages": { "asset_tag": ["The asset tag must be unique."] },
            "payload": null
        }))
        .unwrap();

        assert!(envelope.is_error());
        assert!(envelope.names_field("asset_tag"));
        assert!(!envelope.names_field("serial"));
    }

    #[test]
    fn test_envelope_plain_message_names_no_field() {
        let envelope = MutationEnvelope {
            status: "error".to_string(),
            messages: json!("Something went wrong"),
            payload: None,
        };
        assert!(!envelope.names_field("asset_tag"));
    }

    #[test]
    fn test_mutation_response_non_json_body() {
        let response = MutationResponse::from_body(500, "<html>oops</html>".to_string());
        assert!(response.envelope.is_none());
        assert!(!response.is_success());
        assert_eq!(response.body, "<html>oops</html>");
    }

    #[test]
    fn test_mutation_response_success_requires_2xx() {
        let envelope = MutationEnvelope::success("ok", json!({ "id": 7 }));
        assert!(MutationResponse::from_envelope(200, envelope.clone()).is_success());
        assert!(!MutationResponse::from_envelope(500, envelope).is_success());
    }

    #[test]
    fn test_payload_id() {
        let envelope = MutationEnvelope::success("created", json!({ "id": 42, "name": "x" }));
        assert_eq!(envelope.payload_id(), Some(42));
    }

    #[test]
    fn test_rows_envelope_requires_rows() {
        let parsed = serde_json::from_value::<RowsEnvelope<ReferenceRow>>(json!({
            "status": "error",
            "messages": "Unauthenticated."
        }));
        assert!(parsed.is_err());

        let empty: RowsEnvelope<ReferenceRow> =
            serde_json::from_value(json!({ "total": 0, "rows": [] })).unwrap();
        assert!(empty.rows.is_empty());
    }

    #[test]
    fn test_device_record_deserializes_with_missing_optionals() {
        let device: DeviceRecord = serde_json::from_value(json!({ "serial": "SN001" })).unwrap();
        assert_eq!(device, DeviceRecord::new("SN001"));
    }

    #[test]
    fn test_create_model_request_omits_missing_manufacturer() {
        let request = CreateModelRequest {
            name: "Widget X".to_string(),
            category_id: 3,
            manufacturer_id: None,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("manufacturer_id").is_none());
    }
}
