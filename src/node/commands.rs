//! Command handlers for node management
//!
//! These are the entry points the wallet frontend calls to populate the node
//! picker and change the active node.

use super::config::{NodeCandidate, NodeKey};
use super::state::{CurrentNode, NodeList, SharedNodeRegistry};
use serde::Serialize;

/// Result wrapper for commands
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResult<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> CommandResult<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

/// Payload of a successful add
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AddNodeResponse {
    pub node_key: NodeKey,
}

// ============================================================================
// Query Commands
// ============================================================================

/// Get all nodes and the current selection
pub fn get_nodes(state: &SharedNodeRegistry) -> CommandResult<NodeList> {
    match state.lock() {
        Ok(registry) => CommandResult::ok(registry.all_nodes()),
        Err(e) => CommandResult::err(format!("Failed to get nodes: {}", e)),
    }
}

/// Get the currently selected node
pub fn get_current_node(state: &SharedNodeRegistry) -> CommandResult<CurrentNode> {
    match state.lock() {
        Ok(mut registry) => CommandResult::ok(registry.current_node()),
        Err(e) => CommandResult::err(format!("Failed to get current node: {}", e)),
    }
}

// ============================================================================
// Mutation Commands
// ============================================================================

/// Add a user node
pub fn add_node(candidate: NodeCandidate, state: &SharedNodeRegistry) -> CommandResult<AddNodeResponse> {
    match state.lock() {
        Ok(mut registry) => match registry.add_node(&candidate) {
            Ok(node_key) => CommandResult::ok(AddNodeResponse { node_key }),
            Err(e) => CommandResult::err(e.to_string()),
        },
        Err(e) => CommandResult::err(format!("Failed to add node: {}", e)),
    }
}

/// Remove a user node; `data` is whether anything was removed
pub fn remove_node(node_key: String, state: &SharedNodeRegistry) -> CommandResult<bool> {
    match state.lock() {
        Ok(mut registry) => CommandResult::ok(registry.remove_node(&node_key)),
        Err(e) => CommandResult::err(format!("Failed to remove node: {}", e)),
    }
}

/// Select the active node; `data` is false for unknown keys
pub fn select_node(node_key: String, state: &SharedNodeRegistry) -> CommandResult<bool> {
    match state.lock() {
        Ok(mut registry) => CommandResult::ok(registry.set_node(&node_key)),
        Err(e) => CommandResult::err(format!("Failed to select node: {}", e)),
    }
}

/// Drop all user nodes and select the default node
pub fn reset_nodes(state: &SharedNodeRegistry) -> CommandResult<()> {
    match state.lock() {
        Ok(mut registry) => {
            registry.reset_to_defaults();
            CommandResult::ok(())
        }
        Err(e) => CommandResult::err(format!("Failed to reset nodes: {}", e)),
    }
}
