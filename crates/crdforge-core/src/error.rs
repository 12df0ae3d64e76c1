//! Error types for crdforge-core

use thiserror::Error;

use crate::schema::SchemaError;

/// Result type for compilation
pub type Result<T> = std::result::Result<T, CompileError>;

/// Errors raised while compiling a definition into its wire form
///
/// These are all caller mistakes or introspection failures; none of them are
/// worth retrying without changing the definition.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CompileError {
    /// The definition has no versions
    #[error("definition '{kind}.{group}' must define at least one version")]
    EmptyVersionList { kind: String, group: String },

    /// Validations were requested but none are configured
    #[error("definition '{kind}.{group}' has no validation policies")]
    NoValidationPolicies { kind: String, group: String },

    /// Not exactly one version is marked as the storage version
    #[error("definition '{name}' must mark exactly one version as stored, found {found}")]
    StorageVersion { name: String, found: usize },

    /// An inline webhook URL does not parse
    #[error("invalid webhook URL '{url}' for {owner}: {reason}")]
    InvalidWebhookUrl {
        owner: String,
        url: String,
        reason: String,
    },

    /// The schema source for a version failed
    #[error("schema generation failed for version '{version}' of '{name}': {source}")]
    SchemaGeneration {
        name: String,
        version: String,
        #[source]
        source: SchemaError,
    },

    /// Rendering the compiled object failed
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_yaml::Error> for CompileError {
    fn from(e: serde_yaml::Error) -> Self {
        CompileError::Serialization(e.to_string())
    }
}
