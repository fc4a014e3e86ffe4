//! # g2s-core
//!
//! Reconciliation core for google2snipe.
//!
//! Given device records from a directory source, the core resolves reference
//! names (status, model, category, user) to Snipe-IT identifiers, creates or
//! updates the matching hardware assets, and aggregates per-device outcomes
//! into a run report.

pub mod classify;
pub mod normalize;
pub mod resolver;
pub mod settings;
pub mod sync;
pub mod upsert;

pub use classify::{build_prompt, parse_classification, Classification, ModelClassifier};
pub use normalize::normalize_hardware_address;
pub use resolver::{ReferenceResolver, ResolveError};
pub use settings::{FieldKeys, ModelMatchPolicy, SyncSettings};
pub use sync::{
    DeviceFailure, DevicePlan, NoProgress, SyncDriver, SyncOptions, SyncProgress, SyncReport,
};
pub use upsert::{PlannedAction, UpsertEngine, UpsertError, UpsertOutcome, UpsertState};
