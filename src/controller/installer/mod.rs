//! # Installer
//!
//! Converges one manifest into the cluster.
//!
//! ## Module Structure
//!
//! - `classify.rs` - Phase classification table and manifest partitioning
//! - `hash.rs` - Content fingerprints used for drift detection
//! - `resources.rs` - Create/skip/update loop for non-workload resources
//! - `workload.rs` - Deployment reconciliation with replica exclusion
//! - `readiness.rs` - Availability and completion checks
//! - `error.rs` - `InstallError`
//!
//! ## Drift Detection
//!
//! The only state kept outside the live objects is the hash annotation
//! (`operator.installer.dev/last-applied-hash`) stamped on every object the
//! installer writes. A resource whose stored hash equals the fingerprint of
//! its desired content is left alone.

mod classify;
mod error;
mod hash;
mod readiness;
mod resources;
mod workload;

pub use classify::{classify, ClassificationTable, ClassifiedResources, Phase};
pub use error::InstallError;
pub use hash::{fingerprint, fingerprint_resource};
pub use workload::compute_workload_hash;

use crate::controller::cluster::ClusterClient;
use crate::manifest::{Manifest, Resource, ResourceKey};
use std::sync::Arc;
use tracing::{debug, info};

const JOB_KIND: &str = "Job";

/// Outcome of a convergence step that completed without error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Convergence {
    /// Live state matches the manifest, or the writes needed for it succeeded
    Applied,
    /// A write is pending or was contended; run the pass again
    Requeue,
}

impl Convergence {
    #[must_use]
    pub fn is_requeue(self) -> bool {
        self == Convergence::Requeue
    }

    /// Requeue if either side asked for it
    #[must_use]
    pub fn merge(self, other: Convergence) -> Convergence {
        if self.is_requeue() || other.is_requeue() {
            Convergence::Requeue
        } else {
            Convergence::Applied
        }
    }
}

/// Installs one classified manifest through a cluster client
#[derive(Debug)]
pub struct Installer<C> {
    cluster: Arc<C>,
    resources: ClassifiedResources,
    jobs: Vec<Resource>,
}

impl<C: ClusterClient> Installer<C> {
    #[must_use]
    pub fn new(manifest: &Manifest, cluster: Arc<C>, table: &ClassificationTable) -> Self {
        let resources = classify(manifest, table);
        let jobs = manifest
            .filter_by_kind(JOB_KIND)
            .into_iter()
            .cloned()
            .collect();
        debug!(
            "Classified {} resources: {} crds, {} cluster scoped, {} namespaced, {} workloads",
            resources.len(),
            resources.crds.len(),
            resources.cluster_scoped.len(),
            resources.namespace_scoped.len(),
            resources.workloads.len()
        );
        Self {
            cluster,
            resources,
            jobs,
        }
    }

    #[must_use]
    pub fn resources(&self) -> &ClassifiedResources {
        &self.resources
    }

    /// Install every phase in order. An error stops the remaining phases.
    pub async fn install(&self) -> Result<Convergence, InstallError> {
        self.ensure_crds().await?;
        self.ensure_cluster_scoped().await?;
        self.ensure_namespace_scoped().await?;
        let outcome = self.ensure_workloads().await?;

        if outcome.is_requeue() {
            info!("Installer set applied with pending workload updates");
        } else {
            debug!("Installer set applied");
        }
        Ok(outcome)
    }

    /// Webhooks first, then controllers, then every other workload, then jobs
    pub async fn check_readiness(&self) -> Result<(), InstallError> {
        self.is_webhook_ready().await?;
        self.is_controller_ready().await?;
        self.all_workloads_ready().await?;
        self.are_jobs_complete().await
    }

    /// Resources in the order `install` visits them
    #[must_use]
    pub fn plan(&self) -> Vec<(Phase, ResourceKey)> {
        Phase::ALL
            .iter()
            .flat_map(|phase| {
                self.resources
                    .phase(*phase)
                    .iter()
                    .map(move |r| (*phase, r.key()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::cluster::InMemoryCluster;

    #[test]
    fn test_convergence_merge() {
        use Convergence::{Applied, Requeue};
        assert_eq!(Applied.merge(Applied), Applied);
        assert_eq!(Applied.merge(Requeue), Requeue);
        assert_eq!(Requeue.merge(Applied), Requeue);
    }

    #[test]
    fn test_plan_follows_phase_order() {
        let manifest: Manifest = [
            Resource::new("apps/v1", "Deployment", Some("ns"), "web"),
            Resource::new("v1", "ConfigMap", Some("ns"), "settings"),
            Resource::new("apiextensions.k8s.io/v1", "CustomResourceDefinition", None, "foos"),
            Resource::new("v1", "Namespace", None, "ns"),
        ]
        .into_iter()
        .collect();
        let installer = Installer::new(
            &manifest,
            Arc::new(InMemoryCluster::new()),
            &ClassificationTable::default(),
        );

        let plan: Vec<(Phase, String)> = installer
            .plan()
            .into_iter()
            .map(|(phase, key)| (phase, key.name))
            .collect();
        assert_eq!(
            plan,
            vec![
                (Phase::Crd, "foos".to_string()),
                (Phase::ClusterScoped, "ns".to_string()),
                (Phase::NamespaceScoped, "settings".to_string()),
                (Phase::Workload, "web".to_string()),
            ]
        );
    }
}
