//! crdforge kube - install crdforge definitions into a Kubernetes cluster
//!
//! This crate provides:
//! - **Cluster access** (`cluster`): a small typed API over the cluster, backed
//!   by `kube` or by an in-memory mock for tests
//! - **Reconciler** (`reconcile`): create-or-update of definitions and their
//!   validating webhooks, waiting for each definition to be established
//! - **Readiness** (`readiness`): interpretation of definition conditions
//! - **Configuration** (`config`): poll interval and deadline

pub mod cluster;
pub mod config;
pub mod error;
pub mod readiness;
pub mod reconcile;

pub use cluster::{
    ClusterApi, ClusterObject, KubeCluster, MockCluster, MockOperation, MockReadiness,
    OperationCounts,
};
pub use config::ReconcileConfig;
pub use error::{Phase, ReconcileError, Result};
pub use readiness::DefinitionState;
pub use reconcile::{AppliedObject, ApplyAction, Reconciler};
