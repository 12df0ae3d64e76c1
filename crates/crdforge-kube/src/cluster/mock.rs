//! In-memory cluster for testing
//!
//! Objects are kept as JSON keyed by kind and name. Resource versions are
//! enforced on update like the API server does, and CustomResourceDefinitions
//! get their status conditions from a scripted [`MockReadiness`].

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use kube::ResourceExt;
use kube::core::ErrorResponse;
use serde_json::{Value, json};

use super::{ClusterApi, ClusterObject};

const DEFINITION_KIND: &str = "CustomResourceDefinition";

type ObjectKey = (String, String);

/// How the mock reports a definition's conditions
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MockReadiness {
    /// Established on the first read after a write
    #[default]
    Established,
    /// Names rejected with the given reason
    NameConflict(String),
    /// Names accepted but never established
    Never,
    /// Established once read more than this many times after a write
    AfterPolls(usize),
    /// Deleted by someone else before the first read
    Vanishes,
}

impl MockReadiness {
    fn status(&self, reads: usize) -> Value {
        match self {
            Self::Established => established_status(),
            Self::NameConflict(reason) => {
                status_json(("False", reason.as_str()), ("False", "NotAccepted"))
            }
            Self::Never => status_json(("True", "NoConflicts"), ("False", "Installing")),
            Self::AfterPolls(n) if reads > *n => established_status(),
            Self::AfterPolls(_) | Self::Vanishes => {
                status_json(("True", "NoConflicts"), ("False", "Installing"))
            }
        }
    }
}

fn established_status() -> Value {
    status_json(("True", "NoConflicts"), ("True", "InitialNamesAccepted"))
}

fn status_json(names_accepted: (&str, &str), established: (&str, &str)) -> Value {
    json!({
        "acceptedNames": { "kind": "", "plural": "" },
        "storedVersions": [],
        "conditions": [
            {
                "type": "NamesAccepted",
                "status": names_accepted.0,
                "reason": names_accepted.1,
                "message": "",
            },
            {
                "type": "Established",
                "status": established.0,
                "reason": established.1,
                "message": "",
            },
        ],
    })
}

/// Cluster operation, used to inject failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockOperation {
    Get,
    Create,
    Update,
    Delete,
}

/// Counts of operations performed for testing assertions
#[derive(Debug, Default, Clone)]
pub struct OperationCounts {
    pub gets: usize,
    pub creates: usize,
    pub updates: usize,
    pub deletes: usize,
}

impl OperationCounts {
    fn of(&self, op: MockOperation) -> usize {
        match op {
            MockOperation::Get => self.gets,
            MockOperation::Create => self.creates,
            MockOperation::Update => self.updates,
            MockOperation::Delete => self.deletes,
        }
    }
}

#[derive(Default)]
struct MockState {
    objects: BTreeMap<ObjectKey, Value>,
    reads_since_write: HashMap<ObjectKey, usize>,
    readiness: MockReadiness,
    readiness_by_name: HashMap<String, MockReadiness>,
    /// Operation -> number of calls that still succeed
    failures: HashMap<MockOperation, usize>,
    counts: OperationCounts,
    resource_version: u64,
}

impl MockState {
    fn check_failure(&self, op: MockOperation) -> Result<(), kube::Error> {
        match self.failures.get(&op) {
            Some(after) if self.counts.of(op) > *after => Err(api_error(
                500,
                "InternalError",
                format!("injected {op:?} failure"),
            )),
            _ => Ok(()),
        }
    }

    fn readiness_for(&self, name: &str) -> &MockReadiness {
        self.readiness_by_name.get(name).unwrap_or(&self.readiness)
    }

    fn store(&mut self, key: ObjectKey, mut value: Value) -> Value {
        self.resource_version += 1;
        value["metadata"]["resourceVersion"] = json!(self.resource_version.to_string());
        if let Some(obj) = value.as_object_mut() {
            obj.remove("status");
        }
        self.reads_since_write.insert(key.clone(), 0);
        self.objects.insert(key, value.clone());
        value
    }
}

/// In-memory cluster for testing
#[derive(Clone, Default)]
pub struct MockCluster {
    state: Arc<RwLock<MockState>>,
}

impl MockCluster {
    /// Create an empty cluster establishing every definition immediately
    pub fn new() -> Self {
        Self::default()
    }

    /// Use the given readiness for all definitions
    pub fn with_readiness(self, readiness: MockReadiness) -> Self {
        self.state.write().unwrap().readiness = readiness;
        self
    }

    /// Override readiness for one definition
    pub fn set_readiness(&self, name: &str, readiness: MockReadiness) {
        self.state
            .write()
            .unwrap()
            .readiness_by_name
            .insert(name.to_string(), readiness);
    }

    /// Fail every call of `op` after `after` successful ones
    pub fn fail_on(&self, op: MockOperation, after: usize) {
        let mut state = self.state.write().unwrap();
        let done = state.counts.of(op);
        state.failures.insert(op, done + after);
    }

    /// Pre-populate an object, bypassing counters and failures
    pub fn insert<K: ClusterObject>(&self, object: &K) {
        let key = key_of::<K>(&object.name_any());
        let value = serde_json::to_value(object).unwrap();
        self.state.write().unwrap().store(key, value);
    }

    /// Stored object by name, without status and without counting a read
    pub fn object<K: ClusterObject>(&self, name: &str) -> Option<K> {
        let state = self.state.read().unwrap();
        state
            .objects
            .get(&key_of::<K>(name))
            .cloned()
            .and_then(|v| serde_json::from_value(v).ok())
    }

    /// Number of stored objects
    pub fn object_count(&self) -> usize {
        self.state.read().unwrap().objects.len()
    }

    /// Get operation counts for assertions
    pub fn operation_counts(&self) -> OperationCounts {
        self.state.read().unwrap().counts.clone()
    }

    /// Reset operation counts
    pub fn reset_counts(&self) {
        let mut state = self.state.write().unwrap();
        state.counts = OperationCounts::default();
        state.failures.clear();
    }
}

#[async_trait]
impl ClusterApi for MockCluster {
    async fn get<K: ClusterObject>(&self, name: &str) -> Result<Option<K>, kube::Error> {
        let key = key_of::<K>(name);
        let mut state = self.state.write().unwrap();
        state.counts.gets += 1;
        state.check_failure(MockOperation::Get)?;

        if key.0 == DEFINITION_KIND && *state.readiness_for(name) == MockReadiness::Vanishes {
            state.objects.remove(&key);
            state.reads_since_write.remove(&key);
        }

        let Some(mut value) = state.objects.get(&key).cloned() else {
            return Ok(None);
        };

        if key.0 == DEFINITION_KIND {
            let reads = state.reads_since_write.entry(key.clone()).or_insert(0);
            *reads += 1;
            let reads = *reads;
            value["status"] = state.readiness_for(name).status(reads);
        }

        serde_json::from_value(value)
            .map(Some)
            .map_err(kube::Error::SerdeError)
    }

    async fn create<K: ClusterObject>(&self, object: &K) -> Result<K, kube::Error> {
        let name = object.name_any();
        let key = key_of::<K>(&name);
        let mut state = self.state.write().unwrap();
        state.counts.creates += 1;
        state.check_failure(MockOperation::Create)?;

        if state.objects.contains_key(&key) {
            return Err(api_error(
                409,
                "AlreadyExists",
                format!("{} \"{}\" already exists", key.0, name),
            ));
        }

        let mut value = serde_json::to_value(object).map_err(kube::Error::SerdeError)?;
        value["metadata"]["uid"] = json!(format!("mock-{}", state.resource_version + 1));
        let stored = state.store(key, value);
        serde_json::from_value(stored).map_err(kube::Error::SerdeError)
    }

    async fn update<K: ClusterObject>(&self, object: &K) -> Result<K, kube::Error> {
        let name = object.name_any();
        let key = key_of::<K>(&name);
        let mut state = self.state.write().unwrap();
        state.counts.updates += 1;
        state.check_failure(MockOperation::Update)?;

        let Some(current) = state.objects.get(&key) else {
            return Err(not_found(&key));
        };
        let live = current["metadata"]["resourceVersion"].as_str().map(str::to_string);

        match object.resource_version() {
            None => {
                return Err(api_error(
                    422,
                    "Invalid",
                    "metadata.resourceVersion must be specified for an update".to_string(),
                ));
            }
            Some(rv) if Some(&rv) != live.as_ref() => {
                return Err(api_error(
                    409,
                    "Conflict",
                    format!(
                        "Operation cannot be fulfilled on {} \"{}\": the object has been modified",
                        key.0, name
                    ),
                ));
            }
            Some(_) => {}
        }

        let value = serde_json::to_value(object).map_err(kube::Error::SerdeError)?;
        let stored = state.store(key, value);
        serde_json::from_value(stored).map_err(kube::Error::SerdeError)
    }

    async fn delete<K: ClusterObject>(&self, name: &str) -> Result<(), kube::Error> {
        let key = key_of::<K>(name);
        let mut state = self.state.write().unwrap();
        state.counts.deletes += 1;
        state.check_failure(MockOperation::Delete)?;

        state.reads_since_write.remove(&key);
        match state.objects.remove(&key) {
            Some(_) => Ok(()),
            None => Err(not_found(&key)),
        }
    }
}

fn key_of<K: ClusterObject>(name: &str) -> ObjectKey {
    (K::kind(&()).to_string(), name.to_string())
}

fn not_found(key: &ObjectKey) -> kube::Error {
    api_error(404, "NotFound", format!("{} \"{}\" not found", key.0, key.1))
}

fn api_error(code: u16, reason: &str, message: String) -> kube::Error {
    kube::Error::Api(ErrorResponse {
        status: "Failure".to_string(),
        message,
        reason: reason.to_string(),
        code,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::admissionregistration::v1::ValidatingWebhookConfiguration;
    use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    fn definition(name: &str) -> CustomResourceDefinition {
        CustomResourceDefinition {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn condition(crd: &CustomResourceDefinition, type_: &str) -> String {
        crd.status
            .as_ref()
            .and_then(|s| s.conditions.as_ref())
            .and_then(|c| c.iter().find(|c| c.type_ == type_))
            .map(|c| c.status.clone())
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn test_mock_create_and_get() {
        let cluster = MockCluster::new();

        let created = cluster.create(&definition("foos.example.org")).await.unwrap();
        assert!(created.metadata.resource_version.is_some());

        let fetched: CustomResourceDefinition =
            cluster.get("foos.example.org").await.unwrap().unwrap();
        assert_eq!(condition(&fetched, "Established"), "True");

        let counts = cluster.operation_counts();
        assert_eq!(counts.creates, 1);
        assert_eq!(counts.gets, 1);
    }

    #[tokio::test]
    async fn test_mock_get_missing() {
        let cluster = MockCluster::new();
        let missing: Option<CustomResourceDefinition> = cluster.get("nope").await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_mock_kinds_are_separate() {
        let cluster = MockCluster::new();
        cluster.create(&definition("foo.example.org")).await.unwrap();

        let other: Option<ValidatingWebhookConfiguration> =
            cluster.get("foo.example.org").await.unwrap();
        assert!(other.is_none());
    }

    #[tokio::test]
    async fn test_mock_create_duplicate_fails() {
        let cluster = MockCluster::new();
        cluster.create(&definition("foos.example.org")).await.unwrap();

        let err = cluster.create(&definition("foos.example.org")).await.unwrap_err();
        assert!(matches!(err, kube::Error::Api(resp) if resp.code == 409));
    }

    #[tokio::test]
    async fn test_mock_update_requires_matching_resource_version() {
        let cluster = MockCluster::new();
        let created = cluster.create(&definition("foos.example.org")).await.unwrap();

        let err = cluster.update(&definition("foos.example.org")).await.unwrap_err();
        assert!(matches!(err, kube::Error::Api(resp) if resp.code == 422));

        let updated = cluster.update(&created).await.unwrap();
        assert_ne!(
            updated.metadata.resource_version,
            created.metadata.resource_version
        );

        // created now carries a stale resource version
        let err = cluster.update(&created).await.unwrap_err();
        assert!(matches!(err, kube::Error::Api(resp) if resp.code == 409));
    }

    #[tokio::test]
    async fn test_mock_readiness_after_polls() {
        let cluster = MockCluster::new().with_readiness(MockReadiness::AfterPolls(2));
        cluster.create(&definition("foos.example.org")).await.unwrap();

        for _ in 0..2 {
            let crd: CustomResourceDefinition =
                cluster.get("foos.example.org").await.unwrap().unwrap();
            assert_eq!(condition(&crd, "Established"), "False");
        }
        let crd: CustomResourceDefinition = cluster.get("foos.example.org").await.unwrap().unwrap();
        assert_eq!(condition(&crd, "Established"), "True");
    }

    #[tokio::test]
    async fn test_mock_name_conflict() {
        let cluster = MockCluster::new();
        cluster.set_readiness(
            "foos.example.org",
            MockReadiness::NameConflict("plural in use".to_string()),
        );
        cluster.create(&definition("foos.example.org")).await.unwrap();

        let crd: CustomResourceDefinition = cluster.get("foos.example.org").await.unwrap().unwrap();
        assert_eq!(condition(&crd, "NamesAccepted"), "False");
    }

    #[tokio::test]
    async fn test_mock_definition_vanishes() {
        let cluster = MockCluster::new().with_readiness(MockReadiness::Vanishes);
        cluster.create(&definition("foos.example.org")).await.unwrap();
        assert_eq!(cluster.object_count(), 1);

        let crd: Option<CustomResourceDefinition> = cluster.get("foos.example.org").await.unwrap();
        assert!(crd.is_none());
        assert_eq!(cluster.object_count(), 0);
    }

    #[tokio::test]
    async fn test_mock_injected_failure() {
        let cluster = MockCluster::new();
        cluster.fail_on(MockOperation::Get, 1);

        let first: Result<Option<CustomResourceDefinition>, _> = cluster.get("a").await;
        assert!(first.is_ok());
        let second: Result<Option<CustomResourceDefinition>, _> = cluster.get("a").await;
        assert!(matches!(second, Err(kube::Error::Api(resp)) if resp.code == 500));
    }

    #[tokio::test]
    async fn test_mock_delete() {
        let cluster = MockCluster::new();
        cluster.create(&definition("foos.example.org")).await.unwrap();
        cluster
            .delete::<CustomResourceDefinition>("foos.example.org")
            .await
            .unwrap();
        assert_eq!(cluster.object_count(), 0);

        let err = cluster
            .delete::<CustomResourceDefinition>("foos.example.org")
            .await
            .unwrap_err();
        assert!(matches!(err, kube::Error::Api(resp) if resp.code == 404));
    }
}
