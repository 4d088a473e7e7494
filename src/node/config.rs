//! Node configuration types and persistence
//!
//! Defines the node records shown in the node picker, the built-in node
//! table, and the registry configuration loaded from disk.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Key of the built-in production network node
pub const MAINNET_KEY: &str = "MAINNET";

/// Key of the built-in test network node
pub const TESTNET_KEY: &str = "TESTNET";

/// Key selected when nothing else is (or the selection became invalid)
pub const DEFAULT_NODE: &str = MAINNET_KEY;

/// Default storage namespace, matches the extension's local storage prefix
pub const DEFAULT_NAMESPACE: &str = "TronLink";

const MAINNET_API: &str = "https://api.trongrid.io";
const TESTNET_API: &str = "https://api.shasta.trongrid.io";

/// Stable identifier of a node
///
/// Symbolic (`MAINNET`, `TESTNET`) for built-ins, an endpoint digest for
/// user nodes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeKey(String);

impl NodeKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for NodeKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for NodeKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

/// A node configuration (full node, solidity node, event server)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeRecord {
    /// Display name (trimmed and lower-cased for user nodes)
    pub name: String,

    /// Full node URL
    pub full: String,

    /// Solidity node URL
    pub solidity: String,

    /// Event server URL
    pub event: String,

    /// Whether this node targets the production network
    #[serde(default)]
    pub mainnet: bool,

    /// True only for built-in nodes
    #[serde(rename = "default", default)]
    pub is_default: bool,
}

impl NodeRecord {
    /// Built-in record whose three endpoints share the same API host
    fn builtin(name: &str, api: &str, mainnet: bool) -> Self {
        Self {
            name: name.to_string(),
            full: api.to_string(),
            solidity: api.to_string(),
            event: api.to_string(),
            mainnet,
            is_default: true,
        }
    }
}

/// Node submitted by the user for addition
///
/// Fields default to empty so that incomplete input reaches the validator
/// instead of failing deserialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeCandidate {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub full: String,
    #[serde(default)]
    pub solidity: String,
    #[serde(default)]
    pub event: String,
    #[serde(default)]
    pub mainnet: bool,
}

/// The built-in node table, recreated on every load and never persisted
pub fn builtin_nodes() -> Vec<(NodeKey, NodeRecord)> {
    vec![
        (
            NodeKey::from(MAINNET_KEY),
            NodeRecord::builtin("Mainnet", MAINNET_API, true),
        ),
        (
            NodeKey::from(TESTNET_KEY),
            NodeRecord::builtin("Shasta Testnet", TESTNET_API, false),
        ),
    ]
}

/// Whether `key` names one of the built-in nodes
pub fn is_builtin_key(key: &str) -> bool {
    key == MAINNET_KEY || key == TESTNET_KEY
}

/// Registry configuration stored in registry_config.json
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RegistryConfig {
    /// Storage namespace; the registry blob lives under `<namespace>_NODES`
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Directory holding storage blobs (platform data dir if unset)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_dir: Option<String>,

    /// Built-in node selected by default
    #[serde(default = "default_node")]
    pub default_node: String,

    /// Directory for log files (platform data dir if unset)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<String>,
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

fn default_node() -> String {
    DEFAULT_NODE.to_string()
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            storage_dir: None,
            default_node: default_node(),
            log_dir: None,
        }
    }
}

impl RegistryConfig {
    /// Get the path to the registry config file
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(crate::APP_DIR_NAME);

        // Ensure directory exists
        let _ = fs::create_dir_all(&config_dir);

        config_dir.join("registry_config.json")
    }

    /// Load config from disk, or return default if not found
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Load config from a specific file, or return default if unreadable
    pub fn load_from(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
                log::warn!("Ignoring malformed registry config {}: {}", path.display(), e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Save config to disk
    pub fn save(&self) -> Result<(), String> {
        self.save_to(&Self::config_path())
    }

    /// Save config to a specific file
    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| format!("Failed to create config dir: {}", e))?;
        }

        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize config: {}", e))?;

        fs::write(path, contents).map_err(|e| format!("Failed to write config: {}", e))?;

        log::info!("Registry config saved to {}", path.display());
        Ok(())
    }

    /// Storage key of the registry blob
    pub fn storage_key(&self) -> String {
        format!("{}_NODES", self.namespace)
    }

    /// The configured default key, or `MAINNET` if it is not a built-in
    pub fn effective_default_node(&self) -> NodeKey {
        if is_builtin_key(&self.default_node) {
            NodeKey::new(self.default_node.clone())
        } else {
            log::warn!(
                "Configured default node {} is not a built-in node, using {}",
                self.default_node,
                DEFAULT_NODE
            );
            NodeKey::from(DEFAULT_NODE)
        }
    }

    /// Directory holding storage blobs
    pub fn storage_directory(&self) -> PathBuf {
        match &self.storage_dir {
            Some(dir) if !dir.is_empty() => PathBuf::from(crate::expand_path(dir)),
            _ => crate::app_data_dir().join("storage"),
        }
    }

    /// Directory for log files
    pub fn log_directory(&self) -> PathBuf {
        match &self.log_dir {
            Some(dir) if !dir.is_empty() => PathBuf::from(crate::expand_path(dir)),
            _ => crate::app_data_dir().join("logs"),
        }
    }
}
