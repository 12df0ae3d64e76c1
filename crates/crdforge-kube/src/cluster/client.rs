//! Cluster access through a real Kubernetes client

use async_trait::async_trait;
use kube::ResourceExt;
use kube::api::{Api, DeleteParams, PostParams};

use super::{ClusterApi, ClusterObject};

/// Cluster backed by a `kube::Client`
///
/// The client is passed in explicitly; connection and authentication are the
/// caller's concern.
#[derive(Clone)]
pub struct KubeCluster {
    client: kube::Client,
}

impl KubeCluster {
    /// Wrap an existing client
    pub fn new(client: kube::Client) -> Self {
        Self { client }
    }

    /// Connect using the default kubeconfig or in-cluster configuration
    pub async fn try_default() -> Result<Self, kube::Error> {
        Ok(Self::new(kube::Client::try_default().await?))
    }

    /// Get the underlying Kubernetes client
    pub fn client(&self) -> &kube::Client {
        &self.client
    }

    fn api<K: ClusterObject>(&self) -> Api<K> {
        Api::all(self.client.clone())
    }
}

#[async_trait]
impl ClusterApi for KubeCluster {
    async fn get<K: ClusterObject>(&self, name: &str) -> Result<Option<K>, kube::Error> {
        self.api::<K>().get_opt(name).await
    }

    async fn create<K: ClusterObject>(&self, object: &K) -> Result<K, kube::Error> {
        self.api::<K>().create(&PostParams::default(), object).await
    }

    async fn update<K: ClusterObject>(&self, object: &K) -> Result<K, kube::Error> {
        let name = object.name_any();
        self.api::<K>()
            .replace(&name, &PostParams::default(), object)
            .await
    }

    async fn delete<K: ClusterObject>(&self, name: &str) -> Result<(), kube::Error> {
        self.api::<K>()
            .delete(name, &DeleteParams::default())
            .await
            .map(|_| ())
    }
}
