//! Registry state types
//!
//! The persisted blob, the provenance-tagged effective node mapping, the
//! read views handed to the frontend, and the shared registry handle.

use super::config::{NodeKey, NodeRecord, RegistryConfig};
use super::registry::NodeRegistry;
use super::storage::FileStorage;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// Where an entry of the effective node set comes from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    /// Shipped with the wallet, never persisted or removed
    Builtin,
    /// Added by the user, persisted and removable
    User,
}

/// One entry of the effective node set
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeEntry {
    pub record: NodeRecord,
    pub provenance: Provenance,
}

impl NodeEntry {
    pub fn builtin(record: NodeRecord) -> Self {
        Self {
            record,
            provenance: Provenance::Builtin,
        }
    }

    pub fn user(record: NodeRecord) -> Self {
        Self {
            record,
            provenance: Provenance::User,
        }
    }

    pub fn is_builtin(&self) -> bool {
        self.provenance == Provenance::Builtin
    }
}

/// State written to storage: the selection plus user nodes only
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_node: Option<NodeKey>,

    pub nodes: BTreeMap<NodeKey, NodeRecord>,
}

impl PersistedState {
    /// Parse a stored blob, tolerating anything malformed
    ///
    /// A missing or non-object `nodes` field yields no user nodes, and
    /// individual entries that do not parse are skipped.
    pub fn from_blob(blob: &Value) -> Self {
        let selected_node = blob
            .get("selectedNode")
            .and_then(Value::as_str)
            .filter(|key| !key.is_empty())
            .map(NodeKey::from);

        let mut nodes = BTreeMap::new();
        if let Some(stored) = blob.get("nodes").and_then(Value::as_object) {
            for (key, value) in stored {
                match serde_json::from_value::<NodeRecord>(value.clone()) {
                    Ok(mut record) => {
                        record.is_default = false;
                        nodes.insert(NodeKey::from(key.as_str()), record);
                    }
                    Err(e) => log::warn!("Skipping malformed stored node {}: {}", key, e),
                }
            }
        }

        Self {
            selected_node,
            nodes,
        }
    }

    pub fn to_blob(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }
}

/// The selected node with its key attached (sent to frontend)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentNode {
    #[serde(flatten)]
    pub record: NodeRecord,

    pub node_hash: NodeKey,
}

/// All known nodes and the current selection (sent to frontend)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeList {
    pub selected_node: NodeKey,
    pub nodes: BTreeMap<NodeKey, NodeRecord>,
}

/// Thread-safe registry handle
pub type SharedNodeRegistry = Arc<Mutex<NodeRegistry>>;

/// Create a shared registry backed by file storage, as described by `config`
pub fn create_node_registry(config: &RegistryConfig) -> SharedNodeRegistry {
    let storage = FileStorage::new(config.storage_directory());
    log::info!("Node storage at {}", storage.dir().display());
    Arc::new(Mutex::new(NodeRegistry::new(storage, config)))
}
