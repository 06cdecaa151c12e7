//
//  error.rs
//  Lineage
//
//  Created by hak (tharun)
//

use thiserror::Error;

use crate::graph::types::Side;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, LineageError>;

/// Errors produced by the lineage engine and its collaborators.
#[derive(Debug, Error)]
pub enum LineageError {
    /// A collaborator call failed before returning a payload.
    #[error("transport error: {0}")]
    Transport(String),

    #[error("request timed out after {0} ms")]
    Timeout(u64),

    #[error(transparent)]
    MalformedIdentifier(#[from] MalformedIdentifier),

    #[error("node not found: {0}")]
    NodeNotFound(String),

    #[error("node {node_id} cannot be expanded {side}")]
    NotExpandable { node_id: String, side: Side },

    #[error("node {0} is not an asset")]
    NotAnAsset(String),

    #[error("node {0} is not a process with a name")]
    NoProcess(String),

    /// A commit was attempted against a snapshot that is no longer current.
    #[error("stale snapshot: based on version {base}, current is {current}")]
    StaleSnapshot { base: u64, current: u64 },

    /// The anchor entry changed while a request was in flight.
    #[error("anchor changed while request for {0} was in flight")]
    AnchorChanged(String),

    #[error("graph invariant violated: {0}")]
    InvariantViolation(String),

    #[error("fixture error: {0}")]
    Fixture(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("config error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl LineageError {
    /// Whether the error came from the network boundary rather than the caller.
    pub fn is_transport(&self) -> bool {
        matches!(self, LineageError::Transport(_) | LineageError::Timeout(_))
    }
}

/// A fully-qualified name that does not have the `system:project.dataset.table` shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed identifier '{fqn}': {reason}")]
pub struct MalformedIdentifier {
    pub fqn: String,
    pub reason: String,
}

impl MalformedIdentifier {
    pub fn new(fqn: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            fqn: fqn.into(),
            reason: reason.into(),
        }
    }
}
