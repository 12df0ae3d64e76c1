//! Definition model and its builder
//!
//! A [`DefinitionBuilder`] accumulates identity, scope, versions, conversion
//! and validation settings. Mutators only assign fields; every check is left
//! to the compiler. [`DefinitionBuilder::build`] hands out the immutable
//! [`ResourceDefinition`] consumed by the compiler and the reconciler.
//!
//! ```ignore
//! let mut builder = DefinitionBuilder::new("example.org", "Foo");
//! builder.namespaced(true).short_names(["fo"]);
//! builder
//!     .version("v1", schema_for::<Foo>())
//!     .status()
//!     .column("Ready", ".status.ready");
//! let definition = builder.build();
//! ```

use crate::conversion::ConversionPolicy;
use crate::schema::SharedSchemaSource;
use crate::validation::ValidationPolicy;
use crate::version::VersionSpec;

/// Whether instances live in a namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Scope {
    #[default]
    Cluster,
    Namespaced,
}

impl Scope {
    /// Wire name of the scope
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cluster => "Cluster",
            Self::Namespaced => "Namespaced",
        }
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An immutable custom resource type definition
#[derive(Debug, Clone)]
pub struct ResourceDefinition {
    pub(crate) group: String,
    pub(crate) kind: String,
    pub(crate) scope: Scope,
    pub(crate) singular: Option<String>,
    pub(crate) plural: Option<String>,
    pub(crate) short_names: Vec<String>,
    pub(crate) categories: Vec<String>,
    pub(crate) preserve_unknown_fields: bool,
    pub(crate) versions: Vec<VersionSpec>,
    pub(crate) conversion: Option<ConversionPolicy>,
    pub(crate) validations: Vec<ValidationPolicy>,
}

impl ResourceDefinition {
    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn versions(&self) -> &[VersionSpec] {
        &self.versions
    }

    pub fn conversion(&self) -> Option<&ConversionPolicy> {
        self.conversion.as_ref()
    }

    pub fn validations(&self) -> &[ValidationPolicy] {
        &self.validations
    }

    /// Resolved `(singular, plural)` names
    ///
    /// Explicit names win; otherwise both derive from the lower-cased kind,
    /// with a trailing `s` for the plural.
    pub fn resolve_names(&self) -> (String, String) {
        let singular = self
            .singular
            .clone()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| self.kind.to_lowercase());
        let plural = self
            .plural
            .clone()
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| format!("{}s", self.kind.to_lowercase()));
        (singular, plural)
    }

    /// Object name of the definition in the cluster: `<plural>.<group>`
    pub fn identity(&self) -> String {
        let (_, plural) = self.resolve_names();
        format!("{}.{}", plural, self.group)
    }
}

/// Builder for [`ResourceDefinition`]
#[derive(Debug, Clone)]
pub struct DefinitionBuilder {
    definition: ResourceDefinition,
}

impl DefinitionBuilder {
    /// Start a cluster-scoped definition of `kind` in `group`
    pub fn new(group: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            definition: ResourceDefinition {
                group: group.into(),
                kind: kind.into(),
                scope: Scope::Cluster,
                singular: None,
                plural: None,
                short_names: Vec::new(),
                categories: Vec::new(),
                preserve_unknown_fields: false,
                versions: Vec::new(),
                conversion: None,
                validations: Vec::new(),
            },
        }
    }

    /// Start a definition whose kind is the name of the Rust type `T`
    pub fn for_type<T: ?Sized>(group: impl Into<String>) -> Self {
        Self::new(group, type_kind::<T>())
    }

    /// Override the kind
    pub fn kind(&mut self, kind: impl Into<String>) -> &mut Self {
        self.definition.kind = kind.into();
        self
    }

    /// Override the group
    pub fn group(&mut self, group: impl Into<String>) -> &mut Self {
        self.definition.group = group.into();
        self
    }

    pub fn namespaced(&mut self, namespaced: bool) -> &mut Self {
        self.definition.scope = if namespaced {
            Scope::Namespaced
        } else {
            Scope::Cluster
        };
        self
    }

    /// Override the derived singular and plural names
    pub fn names(&mut self, singular: impl Into<String>, plural: impl Into<String>) -> &mut Self {
        self.definition.singular = Some(singular.into());
        self.definition.plural = Some(plural.into());
        self
    }

    pub fn short_names<I, S>(&mut self, names: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.definition.short_names = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn categories<I, S>(&mut self, categories: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.definition.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    /// Set the definition-level `preserveUnknownFields` flag
    pub fn preserve_unknown_fields(&mut self) -> &mut Self {
        self.definition.preserve_unknown_fields = true;
        self
    }

    /// Append a version and return it for further configuration
    ///
    /// Versions keep their insertion order through compilation.
    pub fn version(
        &mut self,
        name: impl Into<String>,
        schema: SharedSchemaSource,
    ) -> &mut VersionSpec {
        self.definition.versions.push(VersionSpec::new(name, schema));
        let last = self.definition.versions.len() - 1;
        &mut self.definition.versions[last]
    }

    /// Conversion policy, created with strategy `None` on first access
    pub fn conversion(&mut self) -> &mut ConversionPolicy {
        self.definition
            .conversion
            .get_or_insert_with(ConversionPolicy::default)
    }

    /// Append a validation policy and return it for further configuration
    pub fn validation(&mut self, name: impl Into<String>) -> &mut ValidationPolicy {
        self.definition.validations.push(ValidationPolicy::new(name));
        let last = self.definition.validations.len() - 1;
        &mut self.definition.validations[last]
    }

    /// Finish the definition
    pub fn build(&self) -> ResourceDefinition {
        self.definition.clone()
    }
}

/// Last path segment of a type name, without generic arguments
fn type_kind<T: ?Sized>() -> String {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::RawSchema;

    struct Foo;
    #[allow(dead_code)]
    struct Wrapper<T>(T);

    fn object_schema() -> SharedSchemaSource {
        RawSchema::new("object", serde_json::json!({ "type": "object" })).shared()
    }

    #[test]
    fn test_defaults() {
        let def = DefinitionBuilder::new("example.org", "Foo").build();
        assert_eq!(def.scope(), Scope::Cluster);
        assert_eq!(def.resolve_names(), ("foo".to_string(), "foos".to_string()));
        assert_eq!(def.identity(), "foos.example.org");
        assert!(def.conversion().is_none());
        assert!(def.validations().is_empty());
    }

    #[test]
    fn test_explicit_names_win() {
        let mut builder = DefinitionBuilder::new("example.org", "Policy");
        builder.names("policy", "policies");
        let def = builder.build();
        assert_eq!(def.identity(), "policies.example.org");
    }

    #[test]
    fn test_kind_from_type() {
        let def = DefinitionBuilder::for_type::<Foo>("example.org").build();
        assert_eq!(def.kind(), "Foo");

        let def = DefinitionBuilder::for_type::<Wrapper<Foo>>("example.org").build();
        assert_eq!(def.kind(), "Wrapper");
    }

    #[test]
    fn test_new_version_is_served_and_stored() {
        let mut builder = DefinitionBuilder::new("example.org", "Foo");
        builder.version("v1", object_schema());
        let def = builder.build();
        assert!(def.versions()[0].is_served());
        assert!(def.versions()[0].is_stored());
    }

    #[test]
    fn test_mutators_chain_on_same_handle() {
        let mut builder = DefinitionBuilder::new("example.org", "Foo");
        builder
            .version("v1", object_schema())
            .stored(false)
            .column("baz", ".spec.baz");
        builder.version("v2", object_schema());
        builder.namespaced(true);

        let def = builder.build();
        assert_eq!(def.scope(), Scope::Namespaced);
        assert!(!def.versions()[0].is_stored());
        assert_eq!(def.versions()[0].columns().len(), 1);
        assert_eq!(def.versions()[1].name(), "v2");
    }

    #[test]
    fn test_build_snapshot_is_independent() {
        let mut builder = DefinitionBuilder::new("example.org", "Foo");
        let before = builder.build();
        builder.version("v1", object_schema());
        assert!(before.versions().is_empty());
        assert_eq!(builder.build().versions().len(), 1);
    }

    #[test]
    fn test_conversion_created_once() {
        let mut builder = DefinitionBuilder::new("example.org", "Foo");
        builder.conversion().strategy_webhook();
        builder.conversion().review_versions(["v1"]);
        let def = builder.build();
        let conv = def.conversion().unwrap();
        assert_eq!(conv.strategy(), crate::ConversionStrategy::Webhook);
    }
}
