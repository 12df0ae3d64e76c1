//! Structural schema sources
//!
//! Every version of a definition carries a [`SchemaSource`] standing in for a
//! representative object of that version. The compiler asks it for the
//! structural OpenAPI v3 schema the cluster validates instances against.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::JSONSchemaProps;
use kube::core::schema::StructuralSchemaRewriter;
use schemars::JsonSchema;
use schemars::r#gen::SchemaSettings;
use thiserror::Error;

/// Failure to produce a structural schema
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SchemaError {
    /// The introspected shape has no structural representation
    #[error("cannot represent '{source_name}' as a structural schema: {message}")]
    Unrepresentable {
        source_name: String,
        message: String,
    },

    /// The schema root is not an object schema
    #[error("schema for '{source_name}' must have type 'object' at its root, got {found}")]
    NotAnObject { source_name: String, found: String },
}

/// Produces the structural schema of a version's representative object
pub trait SchemaSource: Send + Sync + fmt::Debug {
    /// Human-readable name of the source, used in error messages
    fn name(&self) -> String;

    /// Generate the structural schema
    fn generate(&self) -> Result<JSONSchemaProps, SchemaError>;
}

/// Shared handle to a schema source
pub type SharedSchemaSource = Arc<dyn SchemaSource>;

/// Schema source introspecting a Rust type with schemars
///
/// The type plays the role of the representative object: its schema is
/// generated with OpenAPI v3 settings, subschemas inlined and kube's
/// structural rewrites applied, the same way `#[derive(CustomResource)]`
/// generates schemas.
pub struct TypeSchema<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> fmt::Debug for TypeSchema<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeSchema")
            .field("type", &std::any::type_name::<T>())
            .finish()
    }
}

impl<T: JsonSchema> SchemaSource for TypeSchema<T> {
    fn name(&self) -> String {
        std::any::type_name::<T>().to_string()
    }

    fn generate(&self) -> Result<JSONSchemaProps, SchemaError> {
        let generator = SchemaSettings::openapi3()
            .with(|s| {
                s.inline_subschemas = true;
                s.meta_schema = None;
            })
            .with_visitor(StructuralSchemaRewriter)
            .into_generator();
        let root = generator.into_root_schema_for::<T>();

        let value = serde_json::to_value(&root).map_err(|e| SchemaError::Unrepresentable {
            source_name: self.name(),
            message: e.to_string(),
        })?;
        into_structural(self.name(), value)
    }
}

/// Schema source for a type implementing [`JsonSchema`]
pub fn schema_for<T: JsonSchema + 'static>() -> SharedSchemaSource {
    Arc::new(TypeSchema::<T> {
        _marker: PhantomData,
    })
}

/// An explicit, pre-built schema
#[derive(Debug, Clone)]
pub struct RawSchema {
    name: String,
    schema: serde_json::Value,
}

impl RawSchema {
    /// Wrap a JSON schema document
    pub fn new(name: impl Into<String>, schema: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            schema,
        }
    }

    /// Wrap as a shared source
    pub fn shared(self) -> SharedSchemaSource {
        Arc::new(self)
    }
}

impl SchemaSource for RawSchema {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn generate(&self) -> Result<JSONSchemaProps, SchemaError> {
        into_structural(self.name.clone(), self.schema.clone())
    }
}

/// Convert a JSON schema document into the wire schema type
fn into_structural(
    source_name: String,
    value: serde_json::Value,
) -> Result<JSONSchemaProps, SchemaError> {
    let props: JSONSchemaProps =
        serde_json::from_value(value).map_err(|e| SchemaError::Unrepresentable {
            source_name: source_name.clone(),
            message: e.to_string(),
        })?;

    match props.type_.as_deref() {
        Some("object") => Ok(props),
        other => Err(SchemaError::NotAnObject {
            source_name,
            found: other.unwrap_or("none").to_string(),
        }),
    }
}
