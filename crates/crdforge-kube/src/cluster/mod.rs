//! Cluster access used by the reconciler
//!
//! - **KubeCluster**: talks to a real API server through a `kube::Client`
//! - **MockCluster**: in-memory cluster for tests, with optimistic concurrency
//!   and scripted readiness of definitions

mod client;
mod mock;

pub use client::KubeCluster;
pub use mock::{MockCluster, MockOperation, MockReadiness, OperationCounts};

use std::fmt::Debug;

use async_trait::async_trait;
use k8s_openapi::ClusterResourceScope;
use kube::Resource;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// A typed, cluster-scoped API object
pub trait ClusterObject:
    Resource<DynamicType = (), Scope = ClusterResourceScope>
    + Clone
    + Debug
    + Serialize
    + DeserializeOwned
    + Send
    + Sync
    + 'static
{
}

impl<K> ClusterObject for K where
    K: Resource<DynamicType = (), Scope = ClusterResourceScope>
        + Clone
        + Debug
        + Serialize
        + DeserializeOwned
        + Send
        + Sync
        + 'static
{
}

/// Minimal cluster API the reconciler needs
///
/// Implementations must be Send + Sync so a reconciler can be shared across
/// tasks. Errors are returned as `kube::Error` so callers can inspect API
/// status codes the same way for real and mock clusters.
#[async_trait]
pub trait ClusterApi: Send + Sync {
    /// Get an object by name, `None` if it does not exist
    async fn get<K: ClusterObject>(&self, name: &str) -> Result<Option<K>, kube::Error>;

    /// Create an object
    async fn create<K: ClusterObject>(&self, object: &K) -> Result<K, kube::Error>;

    /// Replace an object; its resource version must match the live one
    async fn update<K: ClusterObject>(&self, object: &K) -> Result<K, kube::Error>;

    /// Delete an object by name
    async fn delete<K: ClusterObject>(&self, name: &str) -> Result<(), kube::Error>;
}
