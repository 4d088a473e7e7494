//! Errors returned by registry operations

use thiserror::Error;

/// Reasons a node could not be added
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NodeError {
    /// Rejected by the validator; carries its message
    #[error("{0}")]
    Invalid(String),

    /// A node with the same endpoints is already registered
    #[error("Node already exists")]
    AlreadyExists,

    /// Another node (built-in or user) already uses this name
    #[error("Name already in use")]
    NameInUse,
}
