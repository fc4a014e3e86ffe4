//! Reference resolution: status labels, models, categories and users.
//!
//! Every lookup searches the remote collection by name. An empty result and
//! a failed lookup both read as "not found"; only model and category lookups
//! may fall through to creation. Resolved identifiers are memoized for the
//! lifetime of the resolver, which is one synchronization run.

use crate::classify::{Classification, ModelClassifier};
use crate::settings::{ModelMatchPolicy, SyncSettings};
use g2s_connectors::{
    AssetManagementConnector, ConnectorError, ConnectorResult, CreateModelRequest,
    MutationResponse, ReferenceRow,
};
use moka::future::Cache;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Upper bound on memoized names per collection.
const CACHE_CAPACITY: u64 = 10_000;

/// Errors raised while resolving or creating a model.
#[derive(Error, Debug, Clone)]
pub enum ResolveError {
    /// The classifier reply carried no marked label.
    #[error("model '{model}' could not be classified: unparsed reply '{raw}'")]
    Unclassified { model: String, raw: String },

    /// The classifier call itself failed.
    #[error("classification of model '{model}' failed: {source}")]
    Classifier {
        model: String,
        #[source]
        source: ConnectorError,
    },

    /// The category could neither be found nor created.
    #[error("category '{category}' is unavailable: {detail}")]
    CategoryUnavailable { category: String, detail: String },

    /// The model creation call was rejected.
    #[error("model '{model}' was not created: {detail}")]
    ModelRejected { model: String, detail: String },

    /// The field set could not be assigned to a new model.
    #[error("field set {fieldset_id} was not assigned to model {model_id}: {detail}")]
    FieldsetAssignment {
        model_id: u64,
        fieldset_id: u64,
        detail: String,
    },

    /// A mutating call could not be confirmed.
    #[error("request could not be confirmed: {0}")]
    Transport(#[from] ConnectorError),
}

/// Resolves reference names to Snipe-IT identifiers.
pub struct ReferenceResolver {
    connector: Arc<dyn AssetManagementConnector>,
    classifier: Arc<ModelClassifier>,
    settings: SyncSettings,
    statuses: Cache<String, u64>,
    models: Cache<String, u64>,
    categories: Cache<String, u64>,
    users: Cache<String, Option<u64>>,
    models_created: AtomicU64,
}

impl ReferenceResolver {
    /// Creates a resolver with empty run-scoped caches.
    pub fn new(
        connector: Arc<dyn AssetManagementConnector>,
        classifier: Arc<ModelClassifier>,
        settings: SyncSettings,
    ) -> Self {
        Self {
            connector,
            classifier,
            settings,
            statuses: Cache::new(CACHE_CAPACITY),
            models: Cache::new(CACHE_CAPACITY),
            categories: Cache::new(CACHE_CAPACITY),
            users: Cache::new(CACHE_CAPACITY),
            models_created: AtomicU64::new(0),
        }
    }

    /// Number of models created by this resolver.
    pub fn models_created(&self) -> u64 {
        self.models_created.load(Ordering::SeqCst)
    }

    /// Resolves a status label to its id. Never fails.
    ///
    /// The active label maps to the configured active id without a lookup.
    /// A missing label, an empty result or a failed lookup map to the
    /// fallback id.
    pub async fn resolve_status(&self, label: Option<&str>) -> u64 {
        let Some(label) = non_empty(label) else {
            return self.settings.fallback_status_id;
        };
        if label.eq_ignore_ascii_case(&self.settings.active_status_label) {
            return self.settings.active_status_id;
        }

        let fallback = self.settings.fallback_status_id;
        let result = self
            .statuses
            .try_get_with(cache_key(label), async {
                let rows = self.connector.search_status_labels(label).await?;
                Ok::<_, ConnectorError>(match rows.first() {
                    Some(row) if row.name.eq_ignore_ascii_case(label) => row.id,
                    _ => {
                        debug!(label, fallback, "Status label not found");
                        fallback
                    }
                })
            })
            .await;

        result.unwrap_or_else(|e| {
            warn!(label, fallback, error = %e, "Status lookup failed");
            fallback
        })
    }

    /// Looks up a model id by name, honoring the configured match policy.
    pub async fn lookup_model(&self, name: &str) -> Option<u64> {
        let rows = self.search("model", name, self.connector.search_models(name)).await?;
        if let Some(id) = exact_match(&rows, name) {
            return Some(id);
        }
        match (self.settings.model_match, rows.first()) {
            (ModelMatchPolicy::BestEffort, Some(row)) => {
                warn!(
                    wanted = name,
                    chosen = %row.name,
                    id = row.id,
                    "No exact model match, using first search result"
                );
                Some(row.id)
            }
            _ => None,
        }
    }

    /// Looks up a category id by exact name.
    pub async fn lookup_category(&self, name: &str) -> Option<u64> {
        let rows = self
            .search("category", name, self.connector.search_categories(name))
            .await?;
        exact_match(&rows, name)
    }

    /// Looks up a user id by exact email. Results are memoized for the run.
    pub async fn lookup_user(&self, email: &str) -> Option<u64> {
        let email = non_empty(Some(email))?;
        let result = self
            .users
            .try_get_with(cache_key(email), async {
                let rows = self.connector.search_users(email).await?;
                Ok::<_, ConnectorError>(rows.iter().find_map(|row| {
                    let matches = row
                        .email
                        .as_deref()
                        .is_some_and(|e| e.eq_ignore_ascii_case(email))
                        || row
                            .username
                            .as_deref()
                            .is_some_and(|u| u.eq_ignore_ascii_case(email));
                    matches.then_some(row.id)
                }))
            })
            .await;

        match result {
            Ok(id) => id,
            Err(e) => {
                warn!(email, error = %e, "User lookup failed");
                None
            }
        }
    }

    /// Resolves a model name to an id, creating the model when absent.
    ///
    /// An empty name resolves to the default model. Concurrent callers asking
    /// for the same name share a single lookup-or-create.
    pub async fn resolve_model(&self, name: Option<&str>) -> Result<u64, ResolveError> {
        let Some(name) = non_empty(name) else {
            return Ok(self.settings.default_model_id);
        };

        self.models
            .try_get_with(cache_key(name), async {
                match self.lookup_model(name).await {
                    Some(id) => Ok(id),
                    None => self.create_model(name).await,
                }
            })
            .await
            .map_err(|e| (*e).clone())
    }

    /// Read-only model resolution: never classifies or creates.
    pub async fn peek_model(&self, name: Option<&str>) -> Option<u64> {
        let Some(name) = non_empty(name) else {
            return Some(self.settings.default_model_id);
        };
        if let Some(id) = self.models.get(&cache_key(name)).await {
            return Some(id);
        }
        let id = self.lookup_model(name).await?;
        self.models.insert(cache_key(name), id).await;
        Some(id)
    }

    async fn create_model(&self, name: &str) -> Result<u64, ResolveError> {
        let label = match self.classifier.classify(name).await {
            Ok(Classification::Parsed(label)) => label,
            Ok(Classification::Unparsed(raw)) => {
                return Err(ResolveError::Unclassified {
                    model: name.to_string(),
                    raw,
                })
            }
            Err(source) => {
                return Err(ResolveError::Classifier {
                    model: name.to_string(),
                    source,
                })
            }
        };

        let category_id = self.resolve_category(&label).await?;

        let request = CreateModelRequest {
            name: name.to_string(),
            category_id,
            manufacturer_id: self.settings.default_manufacturer_id,
        };
        let response = self.connector.create_model(&request).await?;
        let model_id = created_id(&response).ok_or_else(|| ResolveError::ModelRejected {
            model: name.to_string(),
            detail: describe(&response),
        })?;

        let fieldset_id = self.settings.fieldset_id;
        let response = self.connector.assign_fieldset(model_id, fieldset_id).await?;
        if !response.is_success() {
            return Err(ResolveError::FieldsetAssignment {
                model_id,
                fieldset_id,
                detail: describe(&response),
            });
        }

        self.models_created.fetch_add(1, Ordering::SeqCst);
        info!(
            model = name,
            model_id,
            category = %label,
            category_id,
            fieldset_id,
            "Created model"
        );
        Ok(model_id)
    }

    async fn resolve_category(&self, name: &str) -> Result<u64, ResolveError> {
        self.categories
            .try_get_with(cache_key(name), async {
                if let Some(id) = self.lookup_category(name).await {
                    return Ok::<_, ResolveError>(id);
                }
                let response = self.connector.create_category(name).await?;
                let id = created_id(&response).ok_or_else(|| {
                    ResolveError::CategoryUnavailable {
                        category: name.to_string(),
                        detail: describe(&response),
                    }
                })?;
                info!(category = name, category_id = id, "Created category");
                Ok::<_, ResolveError>(id)
            })
            .await
            .map_err(|e| (*e).clone())
    }

    async fn search(
        &self,
        kind: &str,
        name: &str,
        request: impl std::future::Future<Output = ConnectorResult<Vec<ReferenceRow>>>,
    ) -> Option<Vec<ReferenceRow>> {
        match request.await {
            Ok(rows) if rows.is_empty() => {
                debug!(kind, name, "No search results");
                None
            }
            Ok(rows) => Some(rows),
            Err(e) => {
                warn!(kind, name, error = %e, "Lookup failed, treating as not found");
                None
            }
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn cache_key(name: &str) -> String {
    name.trim().to_lowercase()
}

fn exact_match(rows: &[ReferenceRow], name: &str) -> Option<u64> {
    rows.iter()
        .find(|row| row.name.trim().eq_ignore_ascii_case(name.trim()))
        .map(|row| row.id)
}

fn created_id(response: &MutationResponse) -> Option<u64> {
    if !response.is_success() {
        return None;
    }
    response.envelope.as_ref()?.payload_id()
}

fn describe(response: &MutationResponse) -> String {
    match &response.envelope {
        Some(envelope) => format!("HTTP {}: {}", response.status, envelope.messages),
        None => format!("HTTP {}: {}", response.status, response.body),
    }
}
