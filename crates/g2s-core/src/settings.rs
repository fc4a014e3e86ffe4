//! Reconciliation settings.
//!
//! Custom field keys and reference identifiers are specific to each Snipe-IT
//! instance, so they are carried here rather than hardcoded.

use serde::{Deserialize, Serialize};

/// Snipe-IT custom attribute keys written on each asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldKeys {
    /// Hardware (MAC) address.
    #[serde(default = "default_mac_field")]
    pub mac_address: String,
    /// Sync date (`YYYY-MM-DD`).
    #[serde(default = "default_sync_date_field")]
    pub sync_date: String,
    /// Last-known network address.
    #[serde(default = "default_ip_field")]
    pub ip_address: String,
    /// Most recent user email.
    #[serde(default = "default_user_field")]
    pub user: String,
}

fn default_mac_field() -> String {
    "_snipeit_mac_address_1".to_string()
}

fn default_sync_date_field() -> String {
    "_snipeit_sync_date_9".to_string()
}

fn default_ip_field() -> String {
    "_snipeit_ip_address_3".to_string()
}

fn default_user_field() -> String {
    "_snipeit_user_10".to_string()
}

impl Default for FieldKeys {
    fn default() -> Self {
        Self {
            mac_address: default_mac_field(),
            sync_date: default_sync_date_field(),
            ip_address: default_ip_field(),
            user: default_user_field(),
        }
    }
}

/// How a model search result is matched against the wanted name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelMatchPolicy {
    /// Exact case-insensitive match, else the first returned row.
    #[default]
    BestEffort,
    /// Exact case-insensitive match only; otherwise the model is created.
    Exact,
}

/// Category vocabulary offered to the classifier.
pub const DEFAULT_CATEGORIES: [&str; 8] = [
    "IMac",
    "Tablets",
    "Mobile Devices",
    "Servers",
    "Networking Equipment",
    "Printers & Scanners",
    "Desktop",
    "Chromebook",
];

/// Settings for one synchronization run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    /// Custom attribute keys.
    pub fields: FieldKeys,
    /// Model used when a device reports no model name.
    pub default_model_id: u64,
    /// Field set assigned to every created model.
    pub fieldset_id: u64,
    /// Directory status label treated as active.
    pub active_status_label: String,
    /// Status label id used for active devices, without a lookup.
    pub active_status_id: u64,
    /// Status label id used when a lookup finds nothing or fails.
    pub fallback_status_id: u64,
    /// Manufacturer attached to created models, when required by the instance.
    pub default_manufacturer_id: Option<u64>,
    /// Classification vocabulary.
    pub categories: Vec<String>,
    /// Model search match policy.
    pub model_match: ModelMatchPolicy,
    /// Whether to set `assigned_user` from the device's last user.
    pub assign_users: bool,
    /// Compute planned actions without mutating calls.
    pub dry_run: bool,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            fields: FieldKeys::default(),
            default_model_id: 87,
            fieldset_id: 9,
            active_status_label: "ACTIVE".to_string(),
            active_status_id: 2,
            fallback_status_id: 2,
            default_manufacturer_id: None,
            categories: DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect(),
            model_match: ModelMatchPolicy::default(),
            assign_users: false,
            dry_run: false,
        }
    }
}
