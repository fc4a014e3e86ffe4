//! AI classification connectors.

pub mod gemini;
pub mod mock;

pub use gemini::{GeminiConfig, GeminiConnector};
pub use mock::MockClassifier;
