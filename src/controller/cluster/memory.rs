//! # In-Memory Cluster
//!
//! A deterministic `ClusterClient` that keeps objects in process memory.
//!
//! Every successful create or update is appended to a write log so callers
//! can assert exactly which calls a pass issued. Objects receive a
//! monotonically increasing `resourceVersion`, and updates that carry a stale
//! version are rejected the way the API server rejects conflicting replaces.

use super::{ClusterClient, ClusterError};
use crate::manifest::{Resource, ResourceKey};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOp {
    Create,
    Update,
}

/// One successful write, as received by the cluster
#[derive(Debug, Clone, PartialEq)]
pub struct Write {
    pub op: WriteOp,
    pub resource: Resource,
}

impl Write {
    #[must_use]
    pub fn key(&self) -> ResourceKey {
        self.resource.key()
    }
}

#[derive(Debug, Default)]
struct State {
    objects: HashMap<ResourceKey, Resource>,
    writes: Vec<Write>,
    next_version: u64,
    failing_creates: HashSet<(String, String)>,
    failing_updates: HashSet<(String, String)>,
}

impl State {
    fn stamp_version(&mut self, resource: &mut Resource) {
        self.next_version += 1;
        resource.metadata.resource_version = Some(self.next_version.to_string());
    }
}

#[derive(Debug, Default)]
pub struct InMemoryCluster {
    state: Mutex<State>,
}

impl InMemoryCluster {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store an object directly, without recording a write
    pub fn seed(&self, resource: Resource) {
        let mut state = self.state();
        let mut resource = resource;
        state.stamp_version(&mut resource);
        state.objects.insert(resource.key(), resource);
    }

    /// Mutate a live object out of band, as another actor would.
    /// Returns false when the object does not exist.
    pub fn edit(&self, key: &ResourceKey, f: impl FnOnce(&mut Resource)) -> bool {
        let mut state = self.state();
        let Some(mut resource) = state.objects.get(key).cloned() else {
            return false;
        };
        f(&mut resource);
        state.stamp_version(&mut resource);
        state.objects.insert(key.clone(), resource);
        true
    }

    /// Live copy of an object, if present
    #[must_use]
    pub fn object(&self, key: &ResourceKey) -> Option<Resource> {
        self.state().objects.get(key).cloned()
    }

    #[must_use]
    pub fn writes(&self) -> Vec<Write> {
        self.state().writes.clone()
    }

    /// Drain the write log
    pub fn take_writes(&self) -> Vec<Write> {
        std::mem::take(&mut self.state().writes)
    }

    /// Make every create of `kind`/`name` fail until cleared
    pub fn fail_creates_for(&self, kind: &str, name: &str) {
        self.state()
            .failing_creates
            .insert((kind.to_string(), name.to_string()));
    }

    /// Make every update of `kind`/`name` fail until cleared
    pub fn fail_updates_for(&self, kind: &str, name: &str) {
        self.state()
            .failing_updates
            .insert((kind.to_string(), name.to_string()));
    }

    pub fn clear_failures(&self) {
        let mut state = self.state();
        state.failing_creates.clear();
        state.failing_updates.clear();
    }
}

#[async_trait]
impl ClusterClient for InMemoryCluster {
    async fn get(&self, key: &ResourceKey) -> Result<Resource, ClusterError> {
        self.state()
            .objects
            .get(key)
            .cloned()
            .ok_or_else(|| ClusterError::NotFound(key.clone()))
    }

    async fn create(&self, resource: &Resource) -> Result<(), ClusterError> {
        let key = resource.key();
        let mut state = self.state();

        if state
            .failing_creates
            .contains(&(key.kind.clone(), key.name.clone()))
        {
            return Err(ClusterError::Rejected {
                key,
                message: "create rejected".to_string(),
            });
        }
        if state.objects.contains_key(&key) {
            return Err(ClusterError::Rejected {
                key,
                message: "already exists".to_string(),
            });
        }

        let mut stored = resource.clone();
        state.stamp_version(&mut stored);
        state.objects.insert(key, stored);
        state.writes.push(Write {
            op: WriteOp::Create,
            resource: resource.clone(),
        });
        Ok(())
    }

    async fn update(&self, resource: &Resource) -> Result<(), ClusterError> {
        let key = resource.key();
        let mut state = self.state();

        if state
            .failing_updates
            .contains(&(key.kind.clone(), key.name.clone()))
        {
            return Err(ClusterError::Rejected {
                key,
                message: "update rejected".to_string(),
            });
        }
        let Some(current) = state.objects.get(&key) else {
            return Err(ClusterError::NotFound(key));
        };
        if let Some(version) = resource.metadata.resource_version.as_deref() {
            if current.metadata.resource_version.as_deref() != Some(version) {
                return Err(ClusterError::Rejected {
                    key,
                    message: "the object has been modified; please apply your changes to the \
                              latest version"
                        .to_string(),
                });
            }
        }

        let mut stored = resource.clone();
        state.stamp_version(&mut stored);
        state.objects.insert(key, stored);
        state.writes.push(Write {
            op: WriteOp::Update,
            resource: resource.clone(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_map(name: &str) -> Resource {
        Resource::new("v1", "ConfigMap", Some("ns"), name)
    }

    #[tokio::test]
    async fn test_create_then_get() {
        let cluster = InMemoryCluster::new();
        cluster.create(&config_map("a")).await.unwrap();

        let live = cluster.get(&config_map("a").key()).await.unwrap();
        assert_eq!(live.metadata.resource_version.as_deref(), Some("1"));
        assert_eq!(cluster.writes().len(), 1);
        assert_eq!(cluster.writes()[0].op, WriteOp::Create);
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let cluster = InMemoryCluster::new();
        let err = cluster.get(&config_map("a").key()).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_stale_resource_version_conflicts() {
        let cluster = InMemoryCluster::new();
        cluster.create(&config_map("a")).await.unwrap();
        let key = config_map("a").key();
        let stale = cluster.get(&key).await.unwrap();

        assert!(cluster.edit(&key, |r| r.set_annotation("touched", "yes")));
        let err = cluster.update(&stale).await.unwrap_err();
        assert!(matches!(err, ClusterError::Rejected { .. }));
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let cluster = InMemoryCluster::new();
        cluster.fail_creates_for("ConfigMap", "a");
        assert!(cluster.create(&config_map("a")).await.is_err());
        assert!(cluster.writes().is_empty());

        cluster.clear_failures();
        cluster.create(&config_map("a")).await.unwrap();
        cluster.fail_updates_for("ConfigMap", "a");
        assert!(cluster.update(&config_map("a")).await.is_err());
        assert_eq!(cluster.take_writes().len(), 1);
        assert!(cluster.writes().is_empty());
    }
}
