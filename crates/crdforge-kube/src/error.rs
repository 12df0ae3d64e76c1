//! Error types for crdforge-kube

use std::time::Duration;

use thiserror::Error;

/// Result type for reconcile operations
pub type Result<T> = std::result::Result<T, ReconcileError>;

/// Step of the reconcile that talked to the cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Lookup,
    Create,
    Update,
    Poll,
    Delete,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lookup => write!(f, "look up"),
            Self::Create => write!(f, "create"),
            Self::Update => write!(f, "update"),
            Self::Poll => write!(f, "poll"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

/// Errors that can occur while reconciling definitions
///
/// Every variant names the definition being applied so a failed batch can be
/// diagnosed and retried as a whole.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReconcileError {
    /// The definition or its validations did not compile
    #[error("cannot compile definition '{definition}': {source}")]
    Compile {
        definition: String,
        #[source]
        source: crdforge_core::CompileError,
    },

    /// A cluster request failed
    #[error("failed to {phase} {kind} '{object}' for definition '{definition}': {source}")]
    Cluster {
        definition: String,
        kind: String,
        object: String,
        phase: Phase,
        #[source]
        source: kube::Error,
    },

    /// The cluster rejected the definition's names
    #[error("name conflict on definition '{definition}': {reason}")]
    NameConflict { definition: String, reason: String },

    /// The definition was not established in time
    #[error("definition '{definition}' not established after {timeout:?}")]
    Timeout {
        definition: String,
        timeout: Duration,
    },

    /// The caller cancelled the apply
    #[error("apply cancelled while reconciling definition '{definition}'")]
    Cancelled { definition: String },

    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ReconcileError {
    /// Check if this is a Kubernetes 404 Not Found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, ReconcileError::Cluster { source: kube::Error::Api(resp), .. } if resp.code == 404)
    }

    /// Check if this is a conflict error (409)
    pub fn is_conflict(&self) -> bool {
        matches!(self, ReconcileError::Cluster { source: kube::Error::Api(resp), .. } if resp.code == 409)
    }

    /// Name of the definition the error belongs to
    pub fn definition(&self) -> Option<&str> {
        match self {
            Self::Compile { definition, .. }
            | Self::Cluster { definition, .. }
            | Self::NameConflict { definition, .. }
            | Self::Timeout { definition, .. }
            | Self::Cancelled { definition } => Some(definition),
            Self::InvalidConfig(_) => None,
        }
    }
}
