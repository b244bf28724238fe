//! # Cluster API Boundary
//!
//! The capability surface the installer needs from a Kubernetes cluster:
//! fetch one object by identity, create it, replace it.
//!
//! - `kube_cluster.rs` - `KubeCluster`, backed by a kube `Client` and `DynamicObject`
//! - `memory.rs` - `InMemoryCluster`, a deterministic in-process cluster used
//!   by tests and by `installctl plan --dry-run`

mod kube_cluster;
mod memory;

pub use kube_cluster::KubeCluster;
pub use memory::{InMemoryCluster, Write, WriteOp};

use crate::manifest::{Resource, ResourceKey};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClusterError {
    #[error("{0} not found")]
    NotFound(ResourceKey),
    #[error("API request for {key} failed: {source}")]
    Kube {
        key: ResourceKey,
        #[source]
        source: kube::Error,
    },
    #[error("API server rejected {key}: {message}")]
    Rejected { key: ResourceKey, message: String },
    #[error("failed to convert {key}: {source}")]
    Conversion {
        key: ResourceKey,
        #[source]
        source: serde_json::Error,
    },
}

impl ClusterError {
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Object-level access to the cluster.
///
/// Implementations never cache live state across calls: every `get` reflects
/// the cluster at the time of the call.
#[async_trait]
pub trait ClusterClient: Send + Sync {
    /// Fetch the live object identified by `key`, `ClusterError::NotFound` if absent
    async fn get(&self, key: &ResourceKey) -> Result<Resource, ClusterError>;

    async fn create(&self, resource: &Resource) -> Result<(), ClusterError>;

    /// Replace the whole object with `resource`
    async fn update(&self, resource: &Resource) -> Result<(), ClusterError>;
}
