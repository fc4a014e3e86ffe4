//! Gemini text-generation connector.
//!
//! Calls `models/{model}:generateContent` of the Generative Language API and
//! returns the text of the first candidate.

use crate::http::HttpClient;
use crate::traits::{
    ClassifierConnector, ConnectorConfig, ConnectorError, ConnectorHealth, ConnectorResult,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, instrument};

/// Gemini connector configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// Base connector configuration. `base_url` is the API root, without version.
    #[serde(flatten)]
    pub connector: ConnectorConfig,
    /// Model used for generation.
    #[serde(default = "default_model")]
    pub model: String,
}

/// Model used when none is configured.
pub fn default_model() -> String {
    "gemini-1.5-flash".to_string()
}

/// Gemini `generateContent` connector.
pub struct GeminiConnector {
    config: GeminiConfig,
    client: HttpClient,
}

impl GeminiConnector {
    /// Creates a new Gemini connector.
    pub fn new(config: GeminiConfig) -> ConnectorResult<Self> {
        let client = HttpClient::new(config.connector.clone())?;
        info!(model = %config.model, "Gemini connector initialized");
        Ok(Self { config, client })
    }

    fn generate_path(&self) -> String {
        format!("/v1beta/models/{}:generateContent", self.config.model)
    }
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateResponse {
    fn first_text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

#[async_trait]
impl crate::traits::Connector for GeminiConnector {
    fn name(&self) -> &str {
        &self.config.connector.name
    }

    fn connector_type(&self) -> &str {
        "classifier"
    }

    async fn health_check(&self) -> ConnectorResult<ConnectorHealth> {
        let path = format!("/v1beta/models/{}", self.config.model);
        match self.client.get(&path, &[]).await {
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
impl ClassifierConnector for GeminiConnector {
    #[instrument(skip(self, prompt), fields(model = %self.config.model))]
    async fn generate(&self, prompt: &str) -> ConnectorResult<String> {
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });
        let response = self.client.post(&self.generate_path(), &body).await?;
        let parsed: GenerateResponse = HttpClient::read_json(response).await?;

        let text = parsed.first_text().ok_or_else(|| {
            ConnectorError::InvalidResponse("Response contained no candidate text".to_string())
        })?;
        debug!(chars = text.len(), "Generation completed");
        Ok(text)
    }
}
