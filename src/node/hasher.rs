//! Node key hashing
//!
//! User-added nodes are keyed by a digest of their endpoint triple, so the
//! same endpoints always map to the same key regardless of letter case.

use super::config::NodeKey;
use sha2::{Digest, Sha256};

/// Separator used when joining the endpoint triple before hashing
pub const ENDPOINT_SEPARATOR: &str = "&";

/// Deterministic content hash used to derive user node keys
pub trait NodeHasher: Send + Sync {
    /// Digest an arbitrary string into a stable key string
    fn digest(&self, input: &str) -> String;
}

/// Default hasher: lowercase hex SHA256
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256NodeHasher;

impl NodeHasher for Sha256NodeHasher {
    fn digest(&self, input: &str) -> String {
        compute_bytes_hash(input.as_bytes())
    }
}

/// Compute SHA256 hash of bytes (lowercase hex)
pub fn compute_bytes_hash(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Build the string that gets hashed for an endpoint triple
///
/// Each URL is lower-cased and the three are joined with `&` in the order
/// full, solidity, event.
pub fn endpoint_fingerprint(full: &str, solidity: &str, event: &str) -> String {
    [
        full.to_lowercase(),
        solidity.to_lowercase(),
        event.to_lowercase(),
    ]
    .join(ENDPOINT_SEPARATOR)
}

/// Derive the key of a user node from its endpoints
pub fn derive_node_key(hasher: &dyn NodeHasher, full: &str, solidity: &str, event: &str) -> NodeKey {
    NodeKey::new(hasher.digest(&endpoint_fingerprint(full, solidity, event)))
}
