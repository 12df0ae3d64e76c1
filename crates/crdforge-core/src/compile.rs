//! Compilation of definitions into their wire representation
//!
//! Produces `apiextensions.k8s.io/v1` CustomResourceDefinitions and
//! `admissionregistration.k8s.io/v1` ValidatingWebhookConfigurations. The
//! only work besides field mapping is running each version's schema source.

use k8s_openapi::ByteString;
use k8s_openapi::api::admissionregistration::v1 as admission;
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1 as apiext;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::Serialize;

use crate::conversion::{ConversionPolicy, ConversionStrategy};
use crate::definition::ResourceDefinition;
use crate::error::{CompileError, Result};
use crate::validation::ValidationPolicy;
use crate::version::VersionSpec;
use crate::webhook::WebhookTarget;

/// Compile a definition into a CustomResourceDefinition
///
/// Versions are emitted in insertion order; the cluster's storage and
/// conversion handling depends on it.
pub fn compile_definition(def: &ResourceDefinition) -> Result<apiext::CustomResourceDefinition> {
    if def.versions.is_empty() {
        return Err(CompileError::EmptyVersionList {
            kind: def.kind.clone(),
            group: def.group.clone(),
        });
    }

    let name = def.identity();
    let stored = def.versions.iter().filter(|v| v.stored).count();
    if stored != 1 {
        return Err(CompileError::StorageVersion {
            name,
            found: stored,
        });
    }

    let (singular, plural) = def.resolve_names();

    let conversion = match &def.conversion {
        Some(policy) => Some(compile_conversion(&name, policy)?),
        None => None,
    };

    let versions = def
        .versions
        .iter()
        .map(|v| compile_version(&name, v))
        .collect::<Result<Vec<_>>>()?;

    tracing::debug!(
        definition = %name,
        versions = versions.len(),
        "compiled definition"
    );

    Ok(apiext::CustomResourceDefinition {
        metadata: ObjectMeta {
            name: Some(name),
            ..Default::default()
        },
        spec: apiext::CustomResourceDefinitionSpec {
            group: def.group.clone(),
            names: apiext::CustomResourceDefinitionNames {
                kind: def.kind.clone(),
                plural,
                singular: Some(singular),
                short_names: non_empty(&def.short_names),
                categories: non_empty(&def.categories),
                list_kind: None,
            },
            scope: def.scope.as_str().to_string(),
            preserve_unknown_fields: def.preserve_unknown_fields.then_some(true),
            conversion,
            versions,
        },
        status: None,
    })
}

fn compile_version(name: &str, version: &VersionSpec) -> Result<apiext::CustomResourceDefinitionVersion> {
    let mut schema = version
        .schema
        .generate()
        .map_err(|source| CompileError::SchemaGeneration {
            name: name.to_string(),
            version: version.name.clone(),
            source,
        })?;

    if version.preserve_unknown_fields {
        schema.x_kubernetes_preserve_unknown_fields = Some(true);
    }

    let scale = version
        .scale
        .as_ref()
        .map(|paths| apiext::CustomResourceSubresourceScale {
            label_selector_path: Some(paths.label_selector_path.clone()),
            spec_replicas_path: paths.spec_replicas_path.clone(),
            status_replicas_path: paths.status_replicas_path.clone(),
        });
    let status = version
        .status
        .then(|| apiext::CustomResourceSubresourceStatus(serde_json::Value::Object(Default::default())));
    let subresources = (scale.is_some() || status.is_some())
        .then_some(apiext::CustomResourceSubresources { scale, status });

    let columns = version
        .columns
        .iter()
        .map(|c| apiext::CustomResourceColumnDefinition {
            name: c.name.clone(),
            json_path: c.json_path.clone(),
            type_: c.type_.clone(),
            priority: Some(c.priority),
            description: c.description.clone(),
            format: c.format.clone(),
        })
        .collect::<Vec<_>>();

    Ok(apiext::CustomResourceDefinitionVersion {
        name: version.name.clone(),
        served: version.served,
        storage: version.stored,
        schema: Some(apiext::CustomResourceValidation {
            open_api_v3_schema: Some(schema),
        }),
        additional_printer_columns: (!columns.is_empty()).then_some(columns),
        subresources,
        deprecated: version.deprecation.is_some().then_some(true),
        deprecation_warning: version.deprecation.clone(),
        ..Default::default()
    })
}

fn compile_conversion(name: &str, policy: &ConversionPolicy) -> Result<apiext::CustomResourceConversion> {
    let webhook = match policy.strategy {
        ConversionStrategy::None => None,
        ConversionStrategy::Webhook => {
            check_url(name, &policy.target)?;
            let target = &policy.target;
            let client_config = target.is_set().then(|| apiext::WebhookClientConfig {
                url: target.resolved_url().map(str::to_string),
                service: target
                    .resolved_service()
                    .map(|svc| apiext::ServiceReference {
                        namespace: svc.namespace,
                        name: svc.name,
                        path: svc.path,
                        port: svc.port,
                    }),
                ca_bundle: target.ca_bundle.clone().map(ByteString),
            });

            Some(apiext::WebhookConversion {
                client_config,
                conversion_review_versions: policy.review_versions.clone(),
            })
        }
    };

    Ok(apiext::CustomResourceConversion {
        strategy: policy.strategy.as_str().to_string(),
        webhook,
    })
}

/// Compile the validation policies of a definition into webhook registrations
///
/// Each policy becomes one ValidatingWebhookConfiguration named after the
/// policy, holding a single webhook of the same name.
pub fn compile_validations(
    def: &ResourceDefinition,
) -> Result<Vec<admission::ValidatingWebhookConfiguration>> {
    if def.validations.is_empty() {
        return Err(CompileError::NoValidationPolicies {
            kind: def.kind.clone(),
            group: def.group.clone(),
        });
    }

    def.validations.iter().map(compile_validation).collect()
}

fn compile_validation(policy: &ValidationPolicy) -> Result<admission::ValidatingWebhookConfiguration> {
    check_url(&policy.name, &policy.target)?;
    let target = &policy.target;

    let rules = policy
        .rules
        .iter()
        .map(|r| admission::RuleWithOperations {
            operations: Some(r.operations.iter().map(|op| op.as_str().to_string()).collect()),
            api_groups: Some(r.api_groups.clone()),
            api_versions: Some(r.api_versions.clone()),
            resources: Some(r.resources.clone()),
            scope: r.scope.clone(),
        })
        .collect();

    let webhook = admission::ValidatingWebhook {
        name: policy.name.clone(),
        client_config: admission::WebhookClientConfig {
            url: target.resolved_url().map(str::to_string),
            service: target
                .resolved_service()
                .map(|svc| admission::ServiceReference {
                    namespace: svc.namespace,
                    name: svc.name,
                    path: svc.path,
                    port: svc.port,
                }),
            ca_bundle: target.ca_bundle.clone().map(ByteString),
        },
        rules: Some(rules),
        match_policy: policy.match_policy.map(|m| m.as_str().to_string()),
        side_effects: policy.side_effects.as_str().to_string(),
        failure_policy: policy.failure_policy.map(|f| f.as_str().to_string()),
        timeout_seconds: policy.timeout_seconds,
        namespace_selector: Some(policy.namespace_selector.clone()),
        object_selector: Some(policy.object_selector.clone()),
        admission_review_versions: policy.review_versions.clone(),
        ..Default::default()
    };

    Ok(admission::ValidatingWebhookConfiguration {
        metadata: ObjectMeta {
            name: Some(policy.name.clone()),
            ..Default::default()
        },
        webhooks: Some(vec![webhook]),
    })
}

/// Render a compiled object as YAML
pub fn render_yaml<T: Serialize>(object: &T) -> Result<String> {
    Ok(serde_yaml::to_string(object)?)
}

fn check_url(owner: &str, target: &WebhookTarget) -> Result<()> {
    if let Some(raw) = target.resolved_url() {
        url::Url::parse(raw).map_err(|e| CompileError::InvalidWebhookUrl {
            owner: owner.to_string(),
            url: raw.to_string(),
            reason: e.to_string(),
        })?;
    }
    Ok(())
}

fn non_empty(items: &[String]) -> Option<Vec<String>> {
    (!items.is_empty()).then(|| items.to_vec())
}
