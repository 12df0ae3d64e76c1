//! Install and update definitions in a cluster
//!
//! For each definition, in order:
//!
//! ```text
//! compile ──► create or update ──► poll ──► Established ──► validations ──► done
//!                                   │
//!                                   ├──► NamesAccepted=False ──► NameConflict
//!                                   └──► deadline ──────────────► Timeout
//! ```
//!
//! The first failure stops the batch. Objects applied before it stay in the
//! cluster; the recorded [`AppliedObject`]s tell callers what to undo.

use std::future::Future;

use crdforge_core::{CompileError, ResourceDefinition, compile_definition, compile_validations};
use k8s_openapi::api::admissionregistration::v1::ValidatingWebhookConfiguration;
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::ResourceExt;
use kube::core::ErrorResponse;
use tokio::time::{Instant, sleep};

use crate::cluster::{ClusterApi, ClusterObject};
use crate::config::ReconcileConfig;
use crate::error::{Phase, ReconcileError, Result};
use crate::readiness::DefinitionState;

/// Whether an object was created or updated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyAction {
    Created,
    Updated,
}

impl std::fmt::Display for ApplyAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Updated => write!(f, "updated"),
        }
    }
}

/// An object written to the cluster, as the cluster returned it
#[derive(Debug, Clone)]
pub enum AppliedObject {
    Definition {
        action: ApplyAction,
        object: CustomResourceDefinition,
    },
    Validation {
        action: ApplyAction,
        object: ValidatingWebhookConfiguration,
    },
}

impl AppliedObject {
    pub fn name(&self) -> String {
        match self {
            Self::Definition { object, .. } => object.name_any(),
            Self::Validation { object, .. } => object.name_any(),
        }
    }

    pub fn action(&self) -> ApplyAction {
        match self {
            Self::Definition { action, .. } | Self::Validation { action, .. } => *action,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Definition { .. } => "CustomResourceDefinition",
            Self::Validation { .. } => "ValidatingWebhookConfiguration",
        }
    }

    /// Get a display message for this result
    pub fn message(&self) -> String {
        format!("{} {} {}", self.action(), self.kind(), self.name())
    }
}

/// Converges the cluster to a list of definitions
pub struct Reconciler<C: ClusterApi> {
    cluster: C,
    config: ReconcileConfig,
}

impl<C: ClusterApi> Reconciler<C> {
    /// Create a reconciler with the default poll timing
    pub fn new(cluster: C) -> Self {
        Self::with_config(cluster, ReconcileConfig::default())
    }

    pub fn with_config(cluster: C, config: ReconcileConfig) -> Self {
        Self { cluster, config }
    }

    /// Get the cluster
    pub fn cluster(&self) -> &C {
        &self.cluster
    }

    pub fn config(&self) -> &ReconcileConfig {
        &self.config
    }

    /// Apply definitions in order and wait for each to be established
    ///
    /// Returns every object created or updated, in the order applied.
    pub async fn apply(&self, definitions: &[ResourceDefinition]) -> Result<Vec<AppliedObject>> {
        let mut applied = Vec::new();
        self.apply_recorded(definitions, &mut applied, std::future::pending())
            .await?;
        Ok(applied)
    }

    /// Apply definitions, recording progress into `applied`
    ///
    /// Objects written before a failure or cancellation remain in `applied`.
    /// When `cancel` completes, the definition in progress is abandoned with
    /// [`ReconcileError::Cancelled`].
    pub async fn apply_recorded<F>(
        &self,
        definitions: &[ResourceDefinition],
        applied: &mut Vec<AppliedObject>,
        cancel: F,
    ) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        self.config.validate()?;
        tokio::pin!(cancel);

        for definition in definitions {
            let identity = definition.identity();
            tokio::select! {
                result = self.apply_one(definition, &identity, applied) => result?,
                _ = &mut cancel => {
                    tracing::warn!(definition = %identity, "apply cancelled");
                    return Err(ReconcileError::Cancelled {
                        definition: identity.clone(),
                    });
                }
            }
        }

        Ok(())
    }

    async fn apply_one(
        &self,
        definition: &ResourceDefinition,
        identity: &str,
        applied: &mut Vec<AppliedObject>,
    ) -> Result<()> {
        let compile_error = |source: CompileError| ReconcileError::Compile {
            definition: identity.to_string(),
            source,
        };
        let compiled = compile_definition(definition).map_err(compile_error)?;
        let registrations = if definition.validations().is_empty() {
            Vec::new()
        } else {
            compile_validations(definition).map_err(compile_error)?
        };

        let (action, object) = self
            .upsert(identity, compiled, |live, desired| live.spec = desired.spec)
            .await?;
        applied.push(AppliedObject::Definition { action, object });

        self.wait_established(identity).await?;

        for registration in registrations {
            let (action, object) = self
                .upsert(identity, registration, |live, desired| {
                    live.webhooks = desired.webhooks
                })
                .await?;
            applied.push(AppliedObject::Validation { action, object });
        }

        Ok(())
    }

    /// Create `desired`, or merge it into the live object and update that
    ///
    /// The live object keeps its server-assigned metadata, which carries the
    /// resource version the update is checked against.
    async fn upsert<K, F>(&self, definition: &str, desired: K, merge: F) -> Result<(ApplyAction, K)>
    where
        K: ClusterObject,
        F: FnOnce(&mut K, K),
    {
        let name = desired.name_any();
        let kind = K::kind(&()).to_string();
        let cluster_error = |phase: Phase, source: kube::Error| ReconcileError::Cluster {
            definition: definition.to_string(),
            kind: kind.clone(),
            object: name.clone(),
            phase,
            source,
        };

        let live = self
            .cluster
            .get::<K>(&name)
            .await
            .map_err(|e| cluster_error(Phase::Lookup, e))?;

        match live {
            None => {
                let created = self
                    .cluster
                    .create(&desired)
                    .await
                    .map_err(|e| cluster_error(Phase::Create, e))?;
                tracing::info!(kind = %kind, name = %name, "created");
                Ok((ApplyAction::Created, created))
            }
            Some(mut live) => {
                merge(&mut live, desired);
                let updated = self
                    .cluster
                    .update(&live)
                    .await
                    .map_err(|e| cluster_error(Phase::Update, e))?;
                tracing::info!(kind = %kind, name = %name, "updated");
                Ok((ApplyAction::Updated, updated))
            }
        }
    }

    /// Poll until the definition is established
    ///
    /// A lookup error ends the wait immediately, and so does a definition
    /// that disappeared after it was written.
    async fn wait_established(&self, name: &str) -> Result<()> {
        let start = Instant::now();

        loop {
            let live = self
                .cluster
                .get::<CustomResourceDefinition>(name)
                .await
                .map_err(|source| poll_error(name, source))?
                .ok_or_else(|| poll_error(name, gone(name)))?;

            match DefinitionState::of(&live) {
                DefinitionState::Established => {
                    tracing::info!(definition = %name, elapsed = ?start.elapsed(), "established");
                    return Ok(());
                }
                DefinitionState::NameConflict { reason } => {
                    tracing::warn!(definition = %name, %reason, "name conflict");
                    return Err(ReconcileError::NameConflict {
                        definition: name.to_string(),
                        reason,
                    });
                }
                DefinitionState::Pending => {
                    tracing::debug!(definition = %name, "not established yet");
                }
            }

            if start.elapsed() >= self.config.timeout {
                tracing::warn!(definition = %name, timeout = ?self.config.timeout, "not established in time");
                return Err(ReconcileError::Timeout {
                    definition: name.to_string(),
                    timeout: self.config.timeout,
                });
            }

            sleep(self.config.poll_interval).await;
        }
    }

    /// Delete previously applied objects, most recent first
    ///
    /// Objects already gone are skipped.
    pub async fn remove(&self, applied: &[AppliedObject]) -> Result<()> {
        for object in applied.iter().rev() {
            let name = object.name();
            let result = match object {
                AppliedObject::Definition { .. } => {
                    self.cluster.delete::<CustomResourceDefinition>(&name).await
                }
                AppliedObject::Validation { .. } => {
                    self.cluster
                        .delete::<ValidatingWebhookConfiguration>(&name)
                        .await
                }
            };

            match result {
                Ok(()) => tracing::info!(kind = object.kind(), name = %name, "deleted"),
                Err(kube::Error::Api(resp)) if resp.code == 404 => {
                    tracing::debug!(kind = object.kind(), name = %name, "already deleted");
                }
                Err(source) => {
                    return Err(ReconcileError::Cluster {
                        definition: name.clone(),
                        kind: object.kind().to_string(),
                        object: name,
                        phase: Phase::Delete,
                        source,
                    });
                }
            }
        }

        Ok(())
    }
}

fn poll_error(name: &str, source: kube::Error) -> ReconcileError {
    ReconcileError::Cluster {
        definition: name.to_string(),
        kind: "CustomResourceDefinition".to_string(),
        object: name.to_string(),
        phase: Phase::Poll,
        source,
    }
}

fn gone(name: &str) -> kube::Error {
    kube::Error::Api(ErrorResponse {
        status: "Failure".to_string(),
        message: format!("customresourcedefinitions \"{name}\" not found"),
        reason: "NotFound".to_string(),
        code: 404,
    })
}
