//! Node registry
//!
//! Owns the effective node set (built-ins overlaid by user nodes), the
//! current selection, and persistence of both through a [`Storage`].
//!
//! Every mutation writes the full state back to storage straight away.
//! Reads never fail: malformed storage loads as "no user nodes" and an
//! invalid selection heals to the default built-in node.

use super::config::{builtin_nodes, NodeCandidate, NodeKey, NodeRecord, RegistryConfig};
use super::error::NodeError;
use super::hasher::{derive_node_key, NodeHasher, Sha256NodeHasher};
use super::state::{CurrentNode, NodeEntry, NodeList, PersistedState};
use super::storage::Storage;
use super::validator::{NodeValidator, UrlNodeValidator};
use std::collections::BTreeMap;

/// Registry of RPC nodes known to the wallet
pub struct NodeRegistry {
    storage: Box<dyn Storage>,
    validator: Box<dyn NodeValidator>,
    hasher: Box<dyn NodeHasher>,

    /// Storage key of the persisted blob
    storage_key: String,

    /// Built-in key used whenever the selection is invalid
    default_node: NodeKey,

    /// Currently selected key
    selected: NodeKey,

    builtins: BTreeMap<NodeKey, NodeRecord>,

    /// User nodes only; this is what gets persisted
    user_nodes: BTreeMap<NodeKey, NodeRecord>,

    /// Effective view: built-ins overlaid by user nodes
    nodes: BTreeMap<NodeKey, NodeEntry>,
}

impl NodeRegistry {
    /// Create a registry with the default validator and hasher, and load
    /// its persisted state
    pub fn new(storage: impl Storage + 'static, config: &RegistryConfig) -> Self {
        Self::with_collaborators(
            Box::new(storage),
            Box::new(UrlNodeValidator),
            Box::new(Sha256NodeHasher),
            config,
        )
    }

    /// Create a registry with explicit collaborators, and load its
    /// persisted state
    pub fn with_collaborators(
        storage: Box<dyn Storage>,
        validator: Box<dyn NodeValidator>,
        hasher: Box<dyn NodeHasher>,
        config: &RegistryConfig,
    ) -> Self {
        let default_node = config.effective_default_node();

        let mut registry = Self {
            storage,
            validator,
            hasher,
            storage_key: config.storage_key(),
            selected: default_node.clone(),
            default_node,
            builtins: BTreeMap::new(),
            user_nodes: BTreeMap::new(),
            nodes: BTreeMap::new(),
        };
        registry.init();
        registry
    }

    /// Reset the selection, rebuild the built-in table and re-read storage
    ///
    /// Safe to call repeatedly.
    pub fn init(&mut self) {
        self.selected = self.default_node.clone();
        self.builtins = builtin_nodes().into_iter().collect();
        self.load();
    }

    /// Read persisted state and recompute the effective view
    fn load(&mut self) {
        log::info!("Reading nodes from storage");

        let state = PersistedState::from_blob(&self.storage.load(&self.storage_key));
        self.user_nodes = state.nodes;
        self.recompute();

        log::info!("Found {} user nodes", self.user_nodes.len());

        // A stale in-memory selection (e.g. the node just removed) heals here;
        // the fallback is written back on the next save, not immediately.
        if !self.nodes.contains_key(&self.selected) {
            self.selected = self.default_node.clone();
        }

        if let Some(selected) = state.selected_node {
            self.set_node(selected.as_str());
        }
    }

    /// Rebuild the effective view: built-ins overlaid by user nodes
    fn recompute(&mut self) {
        let builtins = self
            .builtins
            .iter()
            .map(|(key, record)| (key.clone(), NodeEntry::builtin(record.clone())));
        let users = self
            .user_nodes
            .iter()
            .map(|(key, record)| (key.clone(), NodeEntry::user(record.clone())));

        // User entries come second so they win on key collision
        self.nodes = builtins.chain(users).collect();
    }

    /// Write the selection and user nodes to storage
    ///
    /// Failures are logged; the in-memory state stays authoritative for this
    /// process.
    fn save(&self) {
        log::info!("Writing node configuration to storage");

        let state = PersistedState {
            selected_node: Some(self.selected.clone()),
            nodes: self.user_nodes.clone(),
        };

        let result = state
            .to_blob()
            .map_err(anyhow::Error::from)
            .and_then(|blob| self.storage.save(&blob, &self.storage_key));

        if let Err(e) = result {
            log::error!("Failed to persist node configuration: {:#}", e);
        }
    }

    /// Key a user node with these endpoints would get
    pub fn node_key(&self, full: &str, solidity: &str, event: &str) -> NodeKey {
        derive_node_key(&*self.hasher, full, solidity, event)
    }

    /// Validate and add a user node, returning its key
    pub fn add_node(&mut self, candidate: &NodeCandidate) -> Result<NodeKey, NodeError> {
        if let Some(error) = self.validator.check(candidate) {
            log::warn!("Invalid node provided: {:?}", candidate);
            log::error!("Node error: {}", error);
            return Err(NodeError::Invalid(error));
        }

        log::info!("Adding new node {:?}", candidate);

        let name = candidate.name.trim().to_lowercase();
        let node_key = self.node_key(&candidate.full, &candidate.solidity, &candidate.event);

        if self.nodes.contains_key(&node_key) {
            log::warn!("Node {} already exists", node_key);
            return Err(NodeError::AlreadyExists);
        }

        if self
            .nodes
            .values()
            .any(|entry| entry.record.name.to_lowercase() == name)
        {
            log::warn!("Node name {} already in use", name);
            return Err(NodeError::NameInUse);
        }

        let record = NodeRecord {
            name,
            full: candidate.full.clone(),
            solidity: candidate.solidity.clone(),
            event: candidate.event.clone(),
            mainnet: candidate.mainnet,
            is_default: false,
        };

        self.user_nodes.insert(node_key.clone(), record.clone());
        self.nodes.insert(node_key.clone(), NodeEntry::user(record));
        self.save();

        Ok(node_key)
    }

    /// Remove a user node
    ///
    /// Built-in nodes are never stored as user nodes, so removing one is a
    /// no-op. Returns whether a user node was removed.
    pub fn remove_node(&mut self, node_key: &str) -> bool {
        log::info!("Removing node {}", node_key);

        let removed = self.user_nodes.remove(node_key).is_some();
        if !removed {
            log::warn!("No user node {} to remove", node_key);
        }

        self.save();
        self.load();

        removed
    }

    /// Select a node; fails without side effects for empty or unknown keys
    pub fn set_node(&mut self, node_key: &str) -> bool {
        if node_key.is_empty() || !self.nodes.contains_key(node_key) {
            log::warn!("Attempted to set invalid node {}", node_key);
            return false;
        }

        log::info!("Setting node to {}", node_key);

        self.selected = NodeKey::from(node_key);
        self.save();

        true
    }

    /// The selected node, healing an invalid selection to the default first
    pub fn current_node(&mut self) -> CurrentNode {
        if !self.nodes.contains_key(&self.selected) {
            log::warn!(
                "Selected node {} no longer exists, falling back to {}",
                self.selected,
                self.default_node
            );
            self.selected = self.default_node.clone();
        }

        // The default key is always a built-in, so the lookup only misses
        // if the built-in table itself was emptied
        let record = self
            .nodes
            .get(&self.selected)
            .map(|entry| entry.record.clone())
            .unwrap_or_default();

        CurrentNode {
            record,
            node_hash: self.selected.clone(),
        }
    }

    /// All effective nodes and the current selection
    pub fn all_nodes(&self) -> NodeList {
        NodeList {
            selected_node: self.selected.clone(),
            nodes: self
                .nodes
                .iter()
                .map(|(key, entry)| (key.clone(), entry.record.clone()))
                .collect(),
        }
    }

    /// Drop every user node and select the default node
    pub fn reset_to_defaults(&mut self) {
        log::info!("Resetting nodes to defaults");

        self.user_nodes.clear();
        self.selected = self.default_node.clone();
        self.recompute();
        self.save();
    }

    /// Currently selected key, as stored (not healed)
    pub fn selected_key(&self) -> &NodeKey {
        &self.selected
    }

    /// Effective entry for `node_key`, with its provenance
    pub fn entry(&self, node_key: &str) -> Option<&NodeEntry> {
        self.nodes.get(node_key)
    }

    /// Effective entries in key order
    pub fn entries(&self) -> impl Iterator<Item = (&NodeKey, &NodeEntry)> {
        self.nodes.iter()
    }

    /// User nodes only
    pub fn user_nodes(&self) -> &BTreeMap<NodeKey, NodeRecord> {
        &self.user_nodes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::config::{MAINNET_KEY, TESTNET_KEY};
    use crate::node::hasher::compute_bytes_hash;
    use crate::node::state::Provenance;
    use crate::node::storage::MemoryStorage;
    use serde_json::{json, Value};
    use std::sync::Arc;

    const KEY: &str = "TronLink_NODES";

    fn registry(storage: &Arc<MemoryStorage>) -> NodeRegistry {
        NodeRegistry::new(Arc::clone(storage), &RegistryConfig::default())
    }

    fn candidate(name: &str, url: &str) -> NodeCandidate {
        NodeCandidate {
            name: name.to_string(),
            full: url.to_string(),
            solidity: url.to_string(),
            event: url.to_string(),
            mainnet: true,
        }
    }

    #[test]
    fn test_fresh_registry_has_builtins() {
        let storage = Arc::new(MemoryStorage::new());
        let mut reg = registry(&storage);

        let all = reg.all_nodes();
        assert_eq!(all.selected_node.as_str(), MAINNET_KEY);
        assert_eq!(all.nodes.len(), 2);
        assert!(all.nodes.contains_key(MAINNET_KEY));
        assert!(all.nodes.contains_key(TESTNET_KEY));

        let current = reg.current_node();
        assert_eq!(current.node_hash.as_str(), MAINNET_KEY);
        assert_eq!(current.record.name, "Mainnet");

        // Nothing was written for an empty store
        assert_eq!(storage.get(KEY), None);
    }

    #[test]
    fn test_add_node_example() {
        let storage = Arc::new(MemoryStorage::new());
        let mut reg = registry(&storage);

        let key = reg.add_node(&candidate("My Node", "https://x.io")).unwrap();
        assert_eq!(
            key.as_str(),
            compute_bytes_hash(b"https://x.io&https://x.io&https://x.io")
        );

        assert!(reg.set_node(key.as_str()));
        let current = reg.current_node();
        assert_eq!(current.node_hash, key);
        assert_eq!(current.record.name, "my node");
        assert!(!current.record.is_default);
        assert_eq!(reg.entry(key.as_str()).unwrap().provenance, Provenance::User);
    }

    #[test]
    fn test_add_distinct_nodes() {
        let storage = Arc::new(MemoryStorage::new());
        let mut reg = registry(&storage);

        let a = reg.add_node(&candidate("Alpha", "https://a.io")).unwrap();
        let b = reg.add_node(&candidate("Beta", "https://b.io")).unwrap();
        assert_ne!(a, b);

        let all = reg.all_nodes();
        assert_eq!(all.nodes.len(), 4);
        assert_eq!(all.nodes[a.as_str()].name, "alpha");
        assert_eq!(all.nodes[b.as_str()].name, "beta");
        assert_eq!(reg.user_nodes().len(), 2);

        let stored = storage.get(KEY).unwrap();
        assert_eq!(stored["nodes"].as_object().unwrap().len(), 2);
        assert!(stored["nodes"].get(MAINNET_KEY).is_none());
    }

    #[test]
    fn test_duplicate_endpoints_rejected() {
        let storage = Arc::new(MemoryStorage::new());
        let mut reg = registry(&storage);

        let first = reg.add_node(&candidate("First", "https://x.io")).unwrap();
        let before = reg.all_nodes();
        let blob_before = storage.get(KEY);

        let err = reg
            .add_node(&candidate("Second", "HTTPS://X.IO"))
            .unwrap_err();
        assert_eq!(err, NodeError::AlreadyExists);
        assert_eq!(err.to_string(), "Node already exists");

        assert_eq!(reg.node_key("HTTPS://X.IO", "https://X.io", "https://x.IO"), first);
        assert_eq!(reg.all_nodes(), before);
        assert_eq!(storage.get(KEY), blob_before);
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let storage = Arc::new(MemoryStorage::new());
        let mut reg = registry(&storage);

        reg.add_node(&candidate("My Node", "https://a.io")).unwrap();

        let err = reg
            .add_node(&candidate("  my NODE ", "https://b.io"))
            .unwrap_err();
        assert_eq!(err, NodeError::NameInUse);
        assert_eq!(err.to_string(), "Name already in use");

        // Built-in names count too
        let err = reg.add_node(&candidate("shasta testnet", "https://c.io")).unwrap_err();
        assert_eq!(err, NodeError::NameInUse);
        assert_eq!(reg.user_nodes().len(), 1);
    }

    #[test]
    fn test_invalid_candidate_rejected() {
        let storage = Arc::new(MemoryStorage::new());
        let mut reg = registry(&storage);

        let err = reg.add_node(&candidate("Broken", "not-a-url")).unwrap_err();
        assert_eq!(err, NodeError::Invalid("Invalid full node provided".to_string()));
        assert!(reg.user_nodes().is_empty());
        assert_eq!(storage.get(KEY), None);
    }

    #[test]
    fn test_set_unknown_node_keeps_selection() {
        let storage = Arc::new(MemoryStorage::new());
        let mut reg = registry(&storage);

        assert!(reg.set_node(TESTNET_KEY));
        assert!(!reg.set_node("does-not-exist"));
        assert!(!reg.set_node(""));

        assert_eq!(reg.selected_key().as_str(), TESTNET_KEY);
        assert_eq!(reg.current_node().node_hash.as_str(), TESTNET_KEY);
    }

    #[test]
    fn test_remove_builtin_is_noop() {
        let storage = Arc::new(MemoryStorage::new());
        let mut reg = registry(&storage);

        assert!(!reg.remove_node(MAINNET_KEY));
        assert!(!reg.remove_node(TESTNET_KEY));

        let all = reg.all_nodes();
        assert!(all.nodes.contains_key(MAINNET_KEY));
        assert!(all.nodes.contains_key(TESTNET_KEY));
        assert!(reg.entry(MAINNET_KEY).unwrap().is_builtin());
    }

    #[test]
    fn test_remove_selected_user_node_falls_back() {
        let storage = Arc::new(MemoryStorage::new());
        let mut reg = registry(&storage);

        let key = reg.add_node(&candidate("Mine", "https://mine.io")).unwrap();
        assert!(reg.set_node(key.as_str()));

        assert!(reg.remove_node(key.as_str()));
        assert!(!reg.all_nodes().nodes.contains_key(key.as_str()));

        let current = reg.current_node();
        assert_eq!(current.node_hash.as_str(), MAINNET_KEY);
        assert_eq!(current.record.name, "Mainnet");
    }

    #[test]
    fn test_restart_recovers_state() {
        let storage = Arc::new(MemoryStorage::new());

        let key = {
            let mut reg = registry(&storage);
            let key = reg.add_node(&candidate("My Node", "https://x.io")).unwrap();
            assert!(reg.set_node(key.as_str()));
            key
        };

        let mut restarted = registry(&storage);
        assert_eq!(restarted.selected_key(), &key);

        let all = restarted.all_nodes();
        let record = &all.nodes[key.as_str()];
        assert_eq!(record.name, "my node");
        assert_eq!(record.full, "https://x.io");
        assert!(record.mainnet);
        assert!(!record.is_default);

        assert_eq!(restarted.current_node().node_hash, key);
    }

    #[test]
    fn test_stale_stored_selection_not_written_back() {
        let storage = Arc::new(MemoryStorage::new());
        storage.insert(KEY, json!({ "selectedNode": "gone", "nodes": {} }));

        let mut reg = registry(&storage);
        assert_eq!(reg.selected_key().as_str(), MAINNET_KEY);
        assert_eq!(reg.current_node().node_hash.as_str(), MAINNET_KEY);

        // Fallback lives in memory until the next mutation persists it
        assert_eq!(storage.get(KEY).unwrap()["selectedNode"], "gone");

        assert!(reg.set_node(TESTNET_KEY));
        assert_eq!(storage.get(KEY).unwrap()["selectedNode"], TESTNET_KEY);
    }

    #[test]
    fn test_malformed_storage_tolerated() {
        let storage = Arc::new(MemoryStorage::new());
        storage.insert(KEY, json!("garbage"));

        let reg = registry(&storage);
        assert_eq!(reg.all_nodes().nodes.len(), 2);
        assert!(reg.user_nodes().is_empty());
    }

    #[test]
    fn test_user_node_shadows_builtin_key() {
        let storage = Arc::new(MemoryStorage::new());
        storage.insert(
            KEY,
            json!({
                "nodes": {
                    "TESTNET": {
                        "name": "override",
                        "full": "https://o.io",
                        "solidity": "https://o.io",
                        "event": "https://o.io",
                        "mainnet": false,
                        "default": false
                    }
                }
            }),
        );

        let mut reg = registry(&storage);
        let entry = reg.entry(TESTNET_KEY).unwrap();
        assert_eq!(entry.provenance, Provenance::User);
        assert_eq!(entry.record.name, "override");

        // Removing the override restores the built-in
        assert!(reg.remove_node(TESTNET_KEY));
        let entry = reg.entry(TESTNET_KEY).unwrap();
        assert!(entry.is_builtin());
        assert_eq!(entry.record.name, "Shasta Testnet");
    }

    #[test]
    fn test_init_is_idempotent() {
        let storage = Arc::new(MemoryStorage::new());
        let mut reg = registry(&storage);
        let key = reg.add_node(&candidate("Mine", "https://mine.io")).unwrap();
        assert!(reg.set_node(key.as_str()));

        let before = reg.all_nodes();
        reg.init();
        reg.init();
        assert_eq!(reg.all_nodes(), before);
    }

    #[test]
    fn test_reset_to_defaults() {
        let storage = Arc::new(MemoryStorage::new());
        let mut reg = registry(&storage);
        let key = reg.add_node(&candidate("Mine", "https://mine.io")).unwrap();
        assert!(reg.set_node(key.as_str()));

        reg.reset_to_defaults();

        assert!(reg.user_nodes().is_empty());
        assert_eq!(reg.selected_key().as_str(), MAINNET_KEY);
        assert_eq!(
            storage.get(KEY).unwrap(),
            json!({ "selectedNode": MAINNET_KEY, "nodes": {} })
        );
    }

    #[test]
    fn test_configured_default_node() {
        let storage = Arc::new(MemoryStorage::new());
        let config = RegistryConfig {
            namespace: "Other".to_string(),
            default_node: TESTNET_KEY.to_string(),
            ..Default::default()
        };

        let mut reg = NodeRegistry::new(Arc::clone(&storage), &config);
        assert_eq!(reg.current_node().node_hash.as_str(), TESTNET_KEY);

        assert!(reg.set_node(MAINNET_KEY));
        assert!(storage.get("Other_NODES").is_some());
        assert!(storage.get(KEY).is_none());
    }

    struct UpperHasher;

    impl NodeHasher for UpperHasher {
        fn digest(&self, input: &str) -> String {
            input.to_uppercase()
        }
    }

    struct RejectAll;

    impl NodeValidator for RejectAll {
        fn check(&self, _candidate: &NodeCandidate) -> Option<String> {
            Some("nope".to_string())
        }
    }

    #[test]
    fn test_injected_collaborators() {
        let storage = Arc::new(MemoryStorage::new());
        let mut reg = NodeRegistry::with_collaborators(
            Box::new(Arc::clone(&storage)),
            Box::new(UrlNodeValidator),
            Box::new(UpperHasher),
            &RegistryConfig::default(),
        );
        let key = reg.add_node(&candidate("Mine", "https://m.io")).unwrap();
        assert_eq!(key.as_str(), "HTTPS://M.IO&HTTPS://M.IO&HTTPS://M.IO");

        let mut strict = NodeRegistry::with_collaborators(
            Box::new(Arc::clone(&storage)),
            Box::new(RejectAll),
            Box::new(Sha256NodeHasher),
            &RegistryConfig::default(),
        );
        assert_eq!(
            strict.add_node(&candidate("Other", "https://o.io")),
            Err(NodeError::Invalid("nope".to_string()))
        );
    }

    struct FailingStorage;

    impl Storage for FailingStorage {
        fn load(&self, _key: &str) -> Value {
            Value::Null
        }

        fn save(&self, _blob: &Value, _key: &str) -> anyhow::Result<()> {
            anyhow::bail!("disk full")
        }
    }

    #[test]
    fn test_storage_failure_is_not_fatal() {
        let mut reg = NodeRegistry::new(FailingStorage, &RegistryConfig::default());

        let key = reg.add_node(&candidate("Mine", "https://mine.io")).unwrap();
        assert!(reg.set_node(key.as_str()));
        assert_eq!(reg.current_node().node_hash, key);
    }
}
