//! crdforge core - define CustomResourceDefinitions in Rust and compile them
//!
//! This crate provides:
//! - **Definition model**: a builder describing a custom resource type, its
//!   versions, conversion strategy and validating webhooks
//! - **Schema sources**: structural schemas from Rust types (schemars) or raw
//!   JSON schema documents
//! - **Compiler**: turns a definition into `apiextensions.k8s.io/v1` and
//!   `admissionregistration.k8s.io/v1` wire objects
//!
//! Installing the compiled objects into a cluster lives in `crdforge-kube`.

pub mod compile;
pub mod conversion;
pub mod definition;
pub mod error;
pub mod schema;
pub mod validation;
pub mod version;
pub mod webhook;

pub use compile::{compile_definition, compile_validations, render_yaml};
pub use conversion::{ConversionPolicy, ConversionStrategy};
pub use definition::{DefinitionBuilder, ResourceDefinition, Scope};
pub use error::{CompileError, Result};
pub use schema::{RawSchema, SchemaError, SchemaSource, SharedSchemaSource, TypeSchema, schema_for};
pub use validation::{
    FailurePolicy, MatchPolicy, Operation, Rule, SideEffectClass, ValidationPolicy,
};
pub use version::{PrinterColumn, ScalePaths, VersionSpec};
pub use webhook::{ServiceRef, WebhookTarget};
