//! Node registry module for the wallet background service
//!
//! This module keeps the list of RPC nodes the wallet can talk to, which
//! one is active, and persists both across restarts.
//!
//! ## Features
//!
//! - **Built-in Nodes**: Mainnet and Shasta testnet, always available
//! - **User Nodes**: Added by the user, keyed by a hash of their endpoints
//! - **Selection**: One active node; invalid selections heal to the default
//! - **Persistence**: Selection and user nodes written on every change
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                    node module                           │
//! ├─────────────────────────────────────────────────────────┤
//! │  commands.rs   - Command handlers for the frontend       │
//! │  config.rs     - Node records, built-ins, registry config│
//! │  registry.rs   - Add/remove/select and effective view    │
//! │  state.rs      - Persisted blob and read views           │
//! │  storage.rs    - Storage trait, file and memory backends │
//! │  validator.rs  - Candidate node validation               │
//! │  hasher.rs     - SHA256 node keys                        │
//! │  error.rs      - Add-node error type                     │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod commands;
pub mod config;
pub mod error;
pub mod hasher;
pub mod registry;
pub mod state;
pub mod storage;
pub mod validator;

// Re-export key types for convenience
pub use config::{NodeCandidate, NodeKey, NodeRecord, RegistryConfig};
pub use error::NodeError;
pub use hasher::{NodeHasher, Sha256NodeHasher};
pub use registry::NodeRegistry;
pub use state::{create_node_registry, CurrentNode, NodeList, Provenance, SharedNodeRegistry};
pub use storage::{FileStorage, MemoryStorage, Storage};
pub use validator::{NodeValidator, UrlNodeValidator};
