//! # Generic Resource Installer
//!
//! Create-or-skip-or-update for every non-workload resource.
//!
//! For each resource, in manifest order: fingerprint the desired content,
//! fetch the live object, then
//!
//! - create it with the fingerprint stamped when it does not exist,
//! - skip it when the stored fingerprint matches,
//! - otherwise stamp the new fingerprint and apply the whole object.
//!
//! The first failing call aborts the rest of the phase.

use super::{fingerprint_resource, InstallError, Installer, Phase};
use crate::constants::LAST_APPLIED_HASH_KEY;
use crate::controller::cluster::{ClusterClient, ClusterError};
use crate::manifest::Resource;
use crate::observability::metrics;
use tracing::{debug, info};

impl<C: ClusterClient> Installer<C> {
    pub async fn ensure_crds(&self) -> Result<(), InstallError> {
        self.ensure_resources(Phase::Crd).await
    }

    pub async fn ensure_cluster_scoped(&self) -> Result<(), InstallError> {
        self.ensure_resources(Phase::ClusterScoped).await
    }

    pub async fn ensure_namespace_scoped(&self) -> Result<(), InstallError> {
        self.ensure_resources(Phase::NamespaceScoped).await
    }

    async fn ensure_resources(&self, phase: Phase) -> Result<(), InstallError> {
        for desired in self.resources.phase(phase) {
            ensure_resource(self.cluster.as_ref(), desired, phase).await?;
        }
        Ok(())
    }
}

async fn ensure_resource<C: ClusterClient + ?Sized>(
    cluster: &C,
    desired: &Resource,
    phase: Phase,
) -> Result<(), InstallError> {
    let key = desired.key();
    let expected = fingerprint_resource(desired)?;

    match cluster.get(&key).await {
        Err(ClusterError::NotFound(_)) => {
            info!("Creating {}", key);
            let mut object = desired.clone();
            object.set_annotation(LAST_APPLIED_HASH_KEY, &expected);
            cluster.create(&object).await?;
            metrics::increment_resources_created(phase.as_str());
            Ok(())
        }
        Err(e) => Err(e.into()),
        Ok(existing) => {
            if existing.annotation(LAST_APPLIED_HASH_KEY) == Some(expected.as_str()) {
                debug!("{} is up to date", key);
                return Ok(());
            }

            info!("Updating {}", key);
            let mut object = desired.clone();
            object.set_annotation(LAST_APPLIED_HASH_KEY, &expected);
            cluster.update(&object).await?;
            metrics::increment_resources_updated(phase.as_str());
            Ok(())
        }
    }
}
