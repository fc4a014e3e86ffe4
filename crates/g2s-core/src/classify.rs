//! Model classification through the AI connector.
//!
//! The prompt asks for a single label from a fixed vocabulary, wrapped in a
//! `**` marker pair. Only the text between the first pair of markers is
//! accepted as an answer.

use g2s_connectors::{ClassifierConnector, ConnectorResult};
use std::sync::Arc;
use tracing::{debug, warn};

/// Delimiter around the chosen label.
pub const MARKER: &str = "**";

/// Result of parsing a classifier reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// A label was found between markers.
    Parsed(String),
    /// No usable marker pair; carries the trimmed raw reply.
    Unparsed(String),
}

impl Classification {
    /// Returns the parsed label, if any.
    pub fn label(&self) -> Option<&str> {
        match self {
            Classification::Parsed(label) => Some(label),
            Classification::Unparsed(_) => None,
        }
    }
}

/// Builds the classification prompt for a model name.
pub fn build_prompt(model_name: &str, vocabulary: &[String]) -> String {
    format!(
        "Given the following technology model, Model: {model} select the most appropriate \
         category from this list:\n{list}\n\
         Reply with exactly one category from the list, wrapped in double asterisks, \
         for example {marker}{example}{marker}.",
        model = model_name,
        list = vocabulary.join(","),
        marker = MARKER,
        example = vocabulary.first().map(String::as_str).unwrap_or("Desktop"),
    )
}

/// Extracts the label between the first pair of markers.
///
/// A label matching a vocabulary entry case-insensitively is returned with
/// the vocabulary's spelling.
pub fn parse_classification(raw: &str, vocabulary: &[String]) -> Classification {
    let label = raw.split_once(MARKER).and_then(|(_, rest)| {
        rest.split_once(MARKER)
            .map(|(inner, _)| inner.trim())
            .filter(|inner| !inner.is_empty())
    });

    match label {
        Some(label) => {
            let canonical = vocabulary
                .iter()
                .find(|entry| entry.eq_ignore_ascii_case(label))
                .cloned()
                .unwrap_or_else(|| label.to_string());
            Classification::Parsed(canonical)
        }
        None => {
            warn!(reply = %raw.trim(), "Classifier reply has no marked label");
            Classification::Unparsed(raw.trim().to_string())
        }
    }
}

/// Bridge between the reference resolver and the classifier connector.
pub struct ModelClassifier {
    connector: Arc<dyn ClassifierConnector>,
    vocabulary: Vec<String>,
}

impl ModelClassifier {
    /// Creates a classifier over `connector` with the given vocabulary.
    pub fn new(connector: Arc<dyn ClassifierConnector>, vocabulary: Vec<String>) -> Self {
        Self {
            connector,
            vocabulary,
        }
    }

    /// Returns the category vocabulary.
    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    /// Classifies a model name with a single connector call.
    pub async fn classify(&self, model_name: &str) -> ConnectorResult<Classification> {
        let prompt = build_prompt(model_name, &self.vocabulary);
        let reply = self.connector.generate(&prompt).await?;
        let classification = parse_classification(&reply, &self.vocabulary);
        debug!(model = model_name, ?classification, "Model classified");
        Ok(classification)
    }
}
