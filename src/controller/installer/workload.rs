//! # Workload Reconciler
//!
//! Deployment reconciliation where the replica count belongs to the cluster.
//!
//! The workload hash is taken over the Deployment spec with `replicas` forced
//! to a sentinel, so scaling by hand or by an autoscaler never registers as
//! drift. Any other spec change made outside the installer is reverted while
//! the live replica count is kept.
//!
//! Failed update calls are not errors here: they usually mean a
//! resourceVersion conflict or a busy API server, so the step reports
//! `Convergence::Requeue` and the pass is retried. A Deployment that cannot be
//! hashed or converted is still fatal.

use super::{fingerprint, Convergence, InstallError, Installer, Phase};
use crate::constants::{LAST_APPLIED_HASH_KEY, REPLICAS_FOR_HASH};
use crate::controller::cluster::{ClusterClient, ClusterError};
use crate::manifest::Resource;
use crate::observability::metrics;
use k8s_openapi::api::apps::v1::Deployment;
use tracing::{debug, info, warn};

/// Fingerprint of a Deployment spec with the replica count normalized
pub fn compute_workload_hash(deployment: &Deployment) -> Result<String, serde_json::Error> {
    let mut spec = deployment.spec.clone().unwrap_or_default();
    spec.replicas = Some(REPLICAS_FOR_HASH);
    fingerprint(&spec)
}

fn workload_hash(deployment: &Deployment, resource: &Resource) -> Result<String, InstallError> {
    compute_workload_hash(deployment).map_err(|source| InstallError::MalformedPayload {
        resource: resource.key().to_string(),
        source,
    })
}

fn typed(resource: &Resource) -> Result<Deployment, InstallError> {
    resource
        .to_typed()
        .map_err(|source| InstallError::MalformedPayload {
            resource: resource.key().to_string(),
            source,
        })
}

impl<C: ClusterClient> Installer<C> {
    /// Reconcile every workload. A requeue from one workload does not stop
    /// the others; any other error does.
    pub async fn ensure_workloads(&self) -> Result<Convergence, InstallError> {
        let mut outcome = Convergence::Applied;
        for desired in &self.resources.workloads {
            outcome = outcome.merge(self.ensure_workload(desired).await?);
        }
        Ok(outcome)
    }

    pub async fn ensure_workload(&self, desired: &Resource) -> Result<Convergence, InstallError> {
        let key = desired.key();
        let desired_deployment = typed(desired)?;

        let live = match self.cluster.get(&key).await {
            Ok(live) => live,
            Err(ClusterError::NotFound(_)) => {
                return self.create_workload(desired, &desired_deployment).await;
            }
            Err(e) => return Err(e.into()),
        };

        let existing = typed(&live)?;
        let existing_hash = workload_hash(&existing, &live)?;

        match live.annotation(LAST_APPLIED_HASH_KEY) {
            None => {
                debug!("{} has no hash annotation, adopting", key);
                self.update_workload(existing, &desired_deployment, &live).await
            }
            Some(stored) if stored == existing_hash => {
                let desired_hash = workload_hash(&desired_deployment, desired)?;
                if desired_hash == stored {
                    debug!("{} is up to date", key);
                    Ok(Convergence::Applied)
                } else {
                    self.update_workload(existing, &desired_deployment, &live).await
                }
            }
            Some(_) => {
                warn!("{} was modified outside the installer, reverting", key);
                metrics::increment_workload_drift_reverts();
                self.update_workload(existing, &desired_deployment, &live).await
            }
        }
    }

    async fn create_workload(
        &self,
        desired: &Resource,
        deployment: &Deployment,
    ) -> Result<Convergence, InstallError> {
        let hash = workload_hash(deployment, desired)?;
        let mut object = desired.clone();
        object.set_annotation(LAST_APPLIED_HASH_KEY, &hash);

        info!("Creating {}", desired.key());
        self.cluster.create(&object).await?;
        metrics::increment_resources_created(Phase::Workload.as_str());
        Ok(Convergence::Applied)
    }

    /// Replace the live spec with the desired one, keeping live replicas
    async fn update_workload(
        &self,
        mut existing: Deployment,
        desired: &Deployment,
        live: &Resource,
    ) -> Result<Convergence, InstallError> {
        let key = live.key();
        let live_replicas = existing.spec.as_ref().and_then(|s| s.replicas);

        let mut spec = desired.spec.clone().unwrap_or_default();
        spec.replicas = live_replicas;
        existing.spec = Some(spec);

        let hash = workload_hash(&existing, live)?;
        existing
            .metadata
            .annotations
            .get_or_insert_with(Default::default)
            .insert(LAST_APPLIED_HASH_KEY.to_string(), hash);
        let object = Resource::from_typed(&existing).map_err(|source| {
            InstallError::MalformedPayload {
                resource: key.to_string(),
                source,
            }
        })?;

        info!("Updating {}", key);
        match self.cluster.update(&object).await {
            Ok(()) => {
                metrics::increment_resources_updated(Phase::Workload.as_str());
                Ok(Convergence::Applied)
            }
            Err(e) => {
                warn!("Failed to update {}, requeueing: {}", key, e);
                Ok(Convergence::Requeue)
            }
        }
    }
}
