//! # Kube Cluster
//!
//! `ClusterClient` backed by a kube `Client`. Objects travel as `DynamicObject`;
//! the API resource and scope of each kind are discovered once with
//! `discovery::pinned_kind` and cached for the life of the client.

use super::{ClusterClient, ClusterError};
use crate::manifest::{Resource, ResourceKey};
use async_trait::async_trait;
use kube::api::{Api, DynamicObject, Patch, PatchParams, PostParams};
use kube::core::GroupVersionKind;
use kube::discovery::{self, ApiResource, Scope};
use kube::Client;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

/// Live cluster access through the Kubernetes API server
pub struct KubeCluster {
    client: Client,
    field_manager: String,
    resources: RwLock<HashMap<String, (ApiResource, Scope)>>,
}

impl std::fmt::Debug for KubeCluster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeCluster")
            .field("field_manager", &self.field_manager)
            .finish_non_exhaustive()
    }
}

impl KubeCluster {
    #[must_use]
    pub fn new(client: Client, field_manager: &str) -> Self {
        Self {
            client,
            field_manager: field_manager.to_string(),
            resources: RwLock::new(HashMap::new()),
        }
    }

    async fn api_for(&self, key: &ResourceKey) -> Result<Api<DynamicObject>, ClusterError> {
        let cache_key = format!("{}/{}", key.api_version, key.kind);

        let cached = self.resources.read().await.get(&cache_key).cloned();
        let (resource, scope) = if let Some(found) = cached {
            found
        } else {
            let (group, version) = split_api_version(&key.api_version);
            let gvk = GroupVersionKind::gvk(group, version, &key.kind);
            let (resource, capabilities) = discovery::pinned_kind(&self.client, &gvk)
                .await
                .map_err(|source| ClusterError::Kube {
                    key: key.clone(),
                    source,
                })?;
            debug!(
                "Discovered {} as {} ({:?})",
                cache_key, resource.plural, capabilities.scope
            );
            let entry = (resource, capabilities.scope);
            self.resources
                .write()
                .await
                .insert(cache_key, entry.clone());
            entry
        };

        let api = match (scope, key.namespace.as_deref()) {
            (Scope::Cluster, _) => Api::all_with(self.client.clone(), &resource),
            (Scope::Namespaced, Some(namespace)) => {
                Api::namespaced_with(self.client.clone(), namespace, &resource)
            }
            (Scope::Namespaced, None) => {
                Api::default_namespaced_with(self.client.clone(), &resource)
            }
        };
        Ok(api)
    }
}

#[async_trait]
impl ClusterClient for KubeCluster {
    async fn get(&self, key: &ResourceKey) -> Result<Resource, ClusterError> {
        let api = self.api_for(key).await?;
        match api.get(&key.name).await {
            Ok(object) => from_dynamic(key, &object),
            Err(kube::Error::Api(api_err)) if api_err.code == 404 => {
                Err(ClusterError::NotFound(key.clone()))
            }
            Err(source) => Err(ClusterError::Kube {
                key: key.clone(),
                source,
            }),
        }
    }

    async fn create(&self, resource: &Resource) -> Result<(), ClusterError> {
        let key = resource.key();
        let api = self.api_for(&key).await?;
        let object = to_dynamic(&key, resource)?;
        api.create(&PostParams::default(), &object)
            .await
            .map_err(|source| ClusterError::Kube { key, source })?;
        Ok(())
    }

    async fn update(&self, resource: &Resource) -> Result<(), ClusterError> {
        let key = resource.key();
        let api = self.api_for(&key).await?;
        let object = to_dynamic(&key, resource)?;

        // Objects read back from the cluster carry a resourceVersion and are
        // replaced so that concurrent writers surface as conflicts. Manifest
        // objects are applied server-side.
        let result = if object.metadata.resource_version.is_some() {
            api.replace(&key.name, &PostParams::default(), &object)
                .await
                .map(|_| ())
        } else {
            let params = PatchParams::apply(&self.field_manager).force();
            api.patch(&key.name, &params, &Patch::Apply(&object))
                .await
                .map(|_| ())
        };
        result.map_err(|source| ClusterError::Kube { key, source })
    }
}

fn split_api_version(api_version: &str) -> (&str, &str) {
    api_version.split_once('/').unwrap_or(("", api_version))
}

fn to_dynamic(key: &ResourceKey, resource: &Resource) -> Result<DynamicObject, ClusterError> {
    serde_json::to_value(resource)
        .and_then(serde_json::from_value)
        .map_err(|source| ClusterError::Conversion {
            key: key.clone(),
            source,
        })
}

fn from_dynamic(key: &ResourceKey, object: &DynamicObject) -> Result<Resource, ClusterError> {
    serde_json::to_value(object)
        .and_then(serde_json::from_value)
        .map_err(|source| ClusterError::Conversion {
            key: key.clone(),
            source,
        })
}
