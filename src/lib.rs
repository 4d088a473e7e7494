//! RPC node registry for the wallet background service
//!
//! Keeps the built-in and user-added RPC nodes, the active selection, and
//! persists both to local storage. See [`node`] for the pieces.

use std::path::PathBuf;

pub mod logging;
pub mod node;

pub use node::{
    create_node_registry, NodeCandidate, NodeError, NodeKey, NodeRecord, NodeRegistry,
    RegistryConfig, SharedNodeRegistry,
};

/// Directory name used under the platform config and data dirs
pub const APP_DIR_NAME: &str = "wallet-nodes";

/// Platform data directory for this application
pub fn app_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}

/// Expand environment variables and ~ in paths
/// Windows: %VAR% style
/// Unix: ~ expands to HOME
pub fn expand_path(path: &str) -> String {
    let mut result = path.to_string();

    #[cfg(windows)]
    {
        // Expand %VAR% style environment variables on Windows
        while let Some(start) = result.find('%') {
            if let Some(end) = result[start + 1..].find('%') {
                let var_name = &result[start + 1..start + 1 + end];
                if let Ok(value) = std::env::var(var_name) {
                    result = format!("{}{}{}", &result[..start], value, &result[start + 2 + end..]);
                } else {
                    break;
                }
            } else {
                break;
            }
        }
    }

    #[cfg(not(windows))]
    {
        // Expand ~ to HOME directory on Unix
        if result.starts_with("~/") {
            if let Some(home) = dirs::home_dir() {
                result = format!("{}{}", home.display(), &result[1..]);
            }
        } else if result == "~" {
            if let Some(home) = dirs::home_dir() {
                result = home.to_string_lossy().to_string();
            }
        }
    }

    result
}
