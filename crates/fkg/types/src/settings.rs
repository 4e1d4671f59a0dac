//! Instance, storage, federation and logging settings.
//!
//! These are plain data; the `fkg` binary layers file and environment sources
//! on top of the defaults and hands the result to each component explicitly.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root settings object.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub instance: InstanceSettings,

    #[serde(default)]
    pub storage: StorageSettings,

    #[serde(default)]
    pub federation: FederationSettings,

    #[serde(default)]
    pub logging: LoggingSettings,

    /// Directory of JSON schemas (`<dir>/<version>/*.json`). Builtin schemas
    /// are used when unset.
    #[serde(default)]
    pub schemas_dir: Option<PathBuf>,
}

/// Identity of the local authority.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceSettings {
    /// Namespace under which this instance mints identifiers.
    #[serde(default = "default_instance_id")]
    pub id: String,

    #[serde(default = "default_authority_name")]
    pub authority_name: String,

    #[serde(default = "default_jurisdiction")]
    pub jurisdiction: String,

    #[serde(default)]
    pub public_key: Option<String>,

    #[serde(default = "default_schema_version")]
    pub schema_version: String,
}

impl Default for InstanceSettings {
    fn default() -> Self {
        Self {
            id: default_instance_id(),
            authority_name: default_authority_name(),
            jurisdiction: default_jurisdiction(),
            public_key: None,
            schema_version: default_schema_version(),
        }
    }
}

/// Storage backend selection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StorageSettings {
    /// Volatile in-memory graph (development/testing)
    #[default]
    Memory,

    /// In-memory graph snapshotted to a JSON file after every commit
    File {
        /// Snapshot path
        path: PathBuf,
    },
}

/// Trust policy for a remote authority.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteTrust {
    #[serde(default)]
    pub verify_signatures: bool,

    #[serde(default = "default_allowed_entity_types")]
    pub allow_entity_types: Vec<String>,
}

impl Default for RemoteTrust {
    fn default() -> Self {
        Self {
            verify_signatures: false,
            allow_entity_types: default_allowed_entity_types(),
        }
    }
}

/// A federated remote whose PKG can be pulled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Namespace the remote's records are imported under
    pub id: String,

    /// Base URL; the PKG is fetched from `{endpoint}/pkg/latest`
    pub endpoint: String,

    #[serde(default)]
    pub public_key: Option<String>,

    #[serde(default)]
    pub trust: RemoteTrust,
}

impl RemoteConfig {
    pub fn new(id: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            endpoint: endpoint.into(),
            public_key: None,
            trust: RemoteTrust::default(),
        }
    }

    /// URL of the remote's latest PKG archive.
    pub fn pkg_url(&self) -> String {
        format!("{}/pkg/latest", self.endpoint.trim_end_matches('/'))
    }
}

/// Federation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FederationSettings {
    #[serde(default)]
    pub remotes: Vec<RemoteConfig>,

    /// Hard timeout for one PKG download, in seconds
    #[serde(default = "default_pull_timeout")]
    pub pull_timeout_secs: u64,

    /// Remotes pulled at the same time by `pull_all_remotes`
    #[serde(default = "default_max_concurrent_pulls")]
    pub max_concurrent_pulls: usize,
}

impl Default for FederationSettings {
    fn default() -> Self {
        Self {
            remotes: Vec::new(),
            pull_timeout_secs: default_pull_timeout(),
            max_concurrent_pulls: default_max_concurrent_pulls(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// Default value helpers
fn default_instance_id() -> String {
    "local.dev".to_string()
}

fn default_authority_name() -> String {
    "Local Development".to_string()
}

fn default_jurisdiction() -> String {
    "Development".to_string()
}

fn default_schema_version() -> String {
    crate::DEFAULT_SCHEMA_VERSION.to_string()
}

fn default_allowed_entity_types() -> Vec<String> {
    vec![
        "organization".to_string(),
        "service".to_string(),
        "location".to_string(),
    ]
}

fn default_pull_timeout() -> u64 {
    60
}

fn default_max_concurrent_pulls() -> usize {
    4
}

fn default_log_level() -> String {
    "info".to_string()
}
