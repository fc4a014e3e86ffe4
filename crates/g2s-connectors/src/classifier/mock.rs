//! Mock classifier connector for testing.

use crate::traits::{ClassifierConnector, ConnectorError, ConnectorHealth, ConnectorResult};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Mock classifier that returns a canned reply.
pub struct MockClassifier {
    name: String,
    reply: Arc<RwLock<ConnectorResult<String>>>,
    prompts: Arc<RwLock<Vec<String>>>,
    calls: AtomicUsize,
}

impl MockClassifier {
    /// Creates a mock that answers every prompt with `reply`.
    pub fn new(name: &str, reply: &str) -> Self {
        Self {
            name: name.to_string(),
            reply: Arc::new(RwLock::new(Ok(reply.to_string()))),
            prompts: Arc::new(RwLock::new(Vec::new())),
            calls: AtomicUsize::new(0),
        }
    }

    /// Creates a mock whose every call fails with `error`.
    pub fn failing(name: &str, error: ConnectorError) -> Self {
        let mut mock = Self::new(name, "");
        mock.reply = Arc::new(RwLock::new(Err(error)));
        mock
    }

    /// Replaces the canned reply.
    pub async fn set_reply(&self, reply: &str) {
        *self.reply.write().await = Ok(reply.to_string());
    }

    /// Number of `generate` calls received.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Prompts received, in order.
    pub async fn prompts(&self) -> Vec<String> {
        self.prompts.read().await.clone()
    }
}

#[async_trait]
impl crate::traits::Connector for MockClassifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn connector_type(&self) -> &str {
        "classifier"
    }

    async fn health_check(&self) -> ConnectorResult<ConnectorHealth> {
        Ok(ConnectorHealth::Healthy)
    }

    async fn test_connection(&self) -> ConnectorResult<bool> {
        Ok(true)
    }
}

#[async_trait]
impl ClassifierConnector for MockClassifier {
    async fn generate(&self, prompt: &str) -> ConnectorResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.write().await.push(prompt.to_string());
        self.reply.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_canned_reply_and_counter() {
        let mock = MockClassifier::new("mock", "**Desktop**");
        assert_eq!(mock.generate("classify A").await.unwrap(), "**Desktop**");
        assert_eq!(mock.generate("classify B").await.unwrap(), "**Desktop**");
        assert_eq!(mock.call_count(), 2);
        assert_eq!(mock.prompts().await, vec!["classify A", "classify B"]);
    }

    #[tokio::test]
    async fn test_failing() {
        let mock = MockClassifier::failing("mock", ConnectorError::Timeout("slow".into()));
        assert!(mock.generate("x").await.is_err());
        assert_eq!(mock.call_count(), 1);
    }
}
