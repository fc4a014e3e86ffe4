//! Snipe-IT asset-management connector.
//!
//! Talks to the Snipe-IT REST API (v1). The configured base URL is expected
//! to include the `/api/v1` prefix.

use crate::http::{HttpClient, RateLimitConfig};
use crate::traits::{
    AssetManagementConnector, ConnectorConfig, ConnectorError, ConnectorHealth,
    ConnectorResult, CreateModelRequest, HardwarePayload, HardwareRow, MutationEnvelope,
    MutationResponse, ReferenceRow, RowsEnvelope,
};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Message Snipe-IT sends, with HTTP 200 on older releases, for an unknown tag.
const ASSET_MISSING: &str = "does not exist";

/// Snipe-IT specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnipeItConfig {
    /// Base connector configuration.
    #[serde(flatten)]
    pub connector: ConnectorConfig,
    /// Maximum rows requested per search.
    #[serde(default = "default_search_limit")]
    pub search_limit: u32,
    /// Client-side request budget per minute (Snipe-IT throttles at 120 by default).
    #[serde(default = "default_requests_per_minute")]
    pub requests_per_minute: u32,
}

fn default_search_limit() -> u32 {
    50
}

fn default_requests_per_minute() -> u32 {
    120
}

/// Snipe-IT connector.
pub struct SnipeItConnector {
    config: SnipeItConfig,
    client: HttpClient,
}

impl SnipeItConnector {
    /// Creates a new Snipe-IT connector.
    pub fn new(config: SnipeItConfig) -> ConnectorResult<Self> {
        let rate_limit = RateLimitConfig {
            max_requests: config.requests_per_minute,
            period: Duration::from_secs(60),
            burst_size: 10,
        };
        let client = HttpClient::with_rate_limit(config.connector.clone(), Some(rate_limit))?;

        info!(
            base_url = %config.connector.base_url,
            max_attempts = client.retry_policy().max_attempts,
            "Snipe-IT connector initialized"
        );

        Ok(Self { config, client })
    }

    async fn search<T: DeserializeOwned>(
        &self,
        path: &str,
        key: &str,
        value: &str,
    ) -> ConnectorResult<Vec<T>> {
        let query = [
            (key, value.to_string()),
            ("limit", self.config.search_limit.to_string()),
        ];
        let response = self.client.get(path, &query).await?;
        let envelope: RowsEnvelope<T> = HttpClient::read_json(response).await?;
        debug!(
            path,
            value,
            rows = envelope.rows.len(),
            total = ?envelope.total,
            "Search completed"
        );
        Ok(envelope.rows)
    }

    /// Interprets a `bytag` reply: an asset object, or an envelope saying
    /// the asset does not exist. Any other shape is a malformed response.
    fn tag_lookup(body: Value) -> ConnectorResult<Option<HardwareRow>> {
        if body.get("id").is_some() {
            return serde_json::from_value(body.clone())
                .map(Some)
                .map_err(|e| malformed(&e, &body));
        }
        match serde_json::from_value::<MutationEnvelope>(body.clone()) {
            Ok(envelope)
                if envelope.is_error()
                    && envelope
                        .messages
                        .as_str()
                        .is_some_and(|m| m.contains(ASSET_MISSING)) =>
            {
                Ok(None)
            }
            _ => Err(ConnectorError::InvalidResponse(format!(
                "Unexpected asset lookup reply - Body: {}",
                body
            ))),
        }
    }

    async fn mutate(&self, response: reqwest::Response) -> ConnectorResult<MutationResponse> {
        let (status, body) = HttpClient::read_text(response).await?;
        Ok(MutationResponse::from_body(status, body))
    }
}

#[async_trait]
impl crate::traits::Connector for SnipeItConnector {
    fn name(&self) -> &str {
        &self.config.connector.name
    }

    fn connector_type(&self) -> &str {
        "asset_management"
    }

    async fn health_check(&self) -> ConnectorResult<ConnectorHealth> {
        match self.client.get("/hardware", &[("limit", "1".to_string())]).await {
            Ok(response) if response.status().is_success() => Ok(ConnectorHealth::Healthy),
            Ok(response) => Ok(ConnectorHealth::Unhealthy(format!(
                "HTTP {}",
                response.status()
            ))),
            Err(e) => Ok(ConnectorHealth::Unhealthy(e.to_string())),
        }
    }

    async fn test_connection(&self) -> ConnectorResult<bool> {
        Ok(matches!(self.health_check().await?, ConnectorHealth::Healthy))
    }
}

#[async_trait]
impl AssetManagementConnector for SnipeItConnector {
    #[instrument(skip(self))]
    async fn search_hardware(&self, query: &str) -> ConnectorResult<Vec<HardwareRow>> {
        self.search("/hardware", "search", query).await
    }

    #[instrument(skip(self))]
    async fn hardware_by_tag(&self, asset_tag: &str) -> ConnectorResult<Option<HardwareRow>> {
        let response = self
            .client
            .get(&format!("/hardware/bytag/{}", asset_tag), &[])
            .await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            debug!(asset_tag, "Asset tag not found");
            return Ok(None);
        }
        let body: Value = HttpClient::read_json(response).await?;
        Self::tag_lookup(body)
    }

    #[instrument(skip(self, payload))]
    async fn create_hardware(
        &self,
        payload: &HardwarePayload,
    ) -> ConnectorResult<MutationResponse> {
        let body = Value::Object(payload.clone());
        let response = self.client.post("/hardware", &body).await?;
        self.mutate(response).await
    }

    #[instrument(skip(self, payload))]
    async fn update_hardware(
        &self,
        asset_id: u64,
        payload: &HardwarePayload,
    ) -> ConnectorResult<MutationResponse> {
        let body = Value::Object(payload.clone());
        let response = self
            .client
            .patch(&format!("/hardware/{}", asset_id), &body)
            .await?;
        self.mutate(response).await
    }

    #[instrument(skip(self))]
    async fn search_models(&self, name: &str) -> ConnectorResult<Vec<ReferenceRow>> {
        self.search("/models", "search", name).await
    }

    #[instrument(skip(self))]
    async fn create_model(
        &self,
        request: &CreateModelRequest,
    ) -> ConnectorResult<MutationResponse> {
        let body = serde_json::to_value(request)
            .map_err(|e| crate::traits::ConnectorError::Internal(e.to_string()))?;
        let response = self.client.post("/models", &body).await?;
        self.mutate(response).await
    }

    #[instrument(skip(self))]
    async fn assign_fieldset(
        &self,
        model_id: u64,
        fieldset_id: u64,
    ) -> ConnectorResult<MutationResponse> {
        let body = json!({ "fieldset_id": fieldset_id });
        let response = self
            .client
            .patch(&format!("/models/{}", model_id), &body)
            .await?;
        self.mutate(response).await
    }

    #[instrument(skip(self))]
    async fn search_status_labels(&self, name: &str) -> ConnectorResult<Vec<ReferenceRow>> {
        self.search("/statuslabels", "name", name).await
    }

    #[instrument(skip(self))]
    async fn search_categories(&self, name: &str) -> ConnectorResult<Vec<ReferenceRow>> {
        self.search("/categories", "search", name).await
    }

    #[instrument(skip(self))]
    async fn create_category(&self, name: &str) -> ConnectorResult<MutationResponse> {
        let body = json!({ "name": name, "category_type": "asset" });
        let response = self.client.post("/categories", &body).await?;
        self.mutate(response).await
    }

    #[instrument(skip(self))]
    async fn search_users(&self, email: &str) -> ConnectorResult<Vec<ReferenceRow>> {
        self.search("/users", "email", email).await
    }
}

fn malformed(error: &serde_json::Error, body: &Value) -> ConnectorError {
    ConnectorError::InvalidResponse(format!(
        "Failed to parse asset: {} - Body: {}",
        error, body
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secure_string::SecureString;
    use crate::traits::{AuthConfig, Connector};
    use std::collections::HashMap;

    fn create_test_config() -> SnipeItConfig {
        SnipeItConfig {
            connector: ConnectorConfig {
                name: "snipeit-test".to_string(),
                base_url: "https://snipe.example.com/api/v1".to_string(),
                auth: AuthConfig::BearerToken {
                    token: SecureString::new("token".to_string()),
                },
                timeout_secs: 30,
                max_attempts: 4,
                retry_delay_secs: 20,
                verify_tls: true,
                headers: HashMap::new(),
            },
            search_limit: default_search_limit(),
            requests_per_minute: default_requests_per_minute(),
        }
    }

    #[test]
    fn test_connector_identity() {
        let connector = SnipeItConnector::new(create_test_config()).unwrap();
        assert_eq!(connector.name(), "snipeit-test");
        assert_eq!(connector.connector_type(), "asset_management");
    }

    #[test]
    fn test_config_defaults_from_yaml_like_json() {
        let config: SnipeItConfig = serde_json::from_value(json!({
            "name": "snipeit",
            "base_url": "https://snipe.example.com/api/v1",
            "auth": { "type": "bearer_token", "token": "abc" },
            "timeout_secs": 30,
            "max_attempts": 4,
            "retry_delay_secs": 20,
            "verify_tls": true,
            "headers": {}
        }))
        .unwrap();

        assert_eq!(config.search_limit, 50);
        assert_eq!(config.requests_per_minute, 120);
    }

    #[test]
    fn test_tag_lookup_shapes() {
        let found = SnipeItConnector::tag_lookup(json!({
            "id": 8,
            "asset_tag": "SN001",
            "serial": "SN001",
            "model": { "id": 42, "name": "Widget X" }
        }))
        .unwrap();
        assert_eq!(found.map(|row| row.id), Some(8));

        let missing = SnipeItConnector::tag_lookup(json!({
            "status": "error",
            "messages": "Asset does not exist.",
            "payload": null
        }))
        .unwrap();
        assert!(missing.is_none());

        let unauthenticated = SnipeItConnector::tag_lookup(json!({
            "status": "error",
            "messages": "Unauthenticated."
        }));
        assert!(matches!(
            unauthenticated,
            Err(ConnectorError::InvalidResponse(body)) if body.contains("Unauthenticated")
        ));
    }
}
