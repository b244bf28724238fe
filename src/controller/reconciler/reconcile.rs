//! # Reconcile Pass
//!
//! One convergence attempt for the owning `ComponentInstall`.
//!
//! ## Pass Flow
//!
//! 1. Ignore (and mark not ready) any object other than the configured singleton
//! 2. Apply spec defaults
//! 3. Ensure the target namespace with the manifest's namespace labels
//! 4. Run the pre-reconcile extension hook
//! 5. Install the installer set, then check its readiness
//! 6. Run the post-reconcile extension hook
//!
//! Status conditions are updated in place on the object passed in; persisting
//! them is left to the caller.

use super::extension::Extension;
use super::namespace::{ensure_target_namespace, namespace_labels};
use super::status::update_status;
use super::types::{Context, PassConfig, PassOutcome, ReconcilerError};
use crate::controller::cluster::ClusterClient;
use crate::controller::installer::{Convergence, Installer};
use crate::crd::{ComponentInstall, ComponentInstallStatus};
use crate::manifest::Manifest;
use crate::observability::metrics;
use kube_runtime::controller::Action;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn, Instrument};

const WAITING_FOR_INSTALLER_SET: &str = "Waiting for installer set to converge";

/// Drives one component manifest into the cluster
pub struct ComponentReconciler<C, E> {
    cluster: Arc<C>,
    installer: Installer<C>,
    namespace_labels: BTreeMap<String, String>,
    extension: E,
    config: PassConfig,
}

impl<C, E> std::fmt::Debug for ComponentReconciler<C, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentReconciler")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<C: ClusterClient, E: Extension> ComponentReconciler<C, E> {
    #[must_use]
    pub fn new(manifest: &Manifest, cluster: Arc<C>, extension: E, config: PassConfig) -> Self {
        let installer = Installer::new(manifest, Arc::clone(&cluster), &config.table);
        Self {
            cluster,
            installer,
            namespace_labels: namespace_labels(manifest),
            extension,
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &PassConfig {
        &self.config
    }

    #[must_use]
    pub fn installer(&self) -> &Installer<C> {
        &self.installer
    }

    /// Run one pass over `install`, updating its spec defaults and status.
    ///
    /// Returns `Requeue` while workload writes are pending. Readiness failures
    /// come back as `ReconcilerError::NotReady` so the caller retries them.
    pub async fn reconcile_pass(
        &self,
        install: &mut ComponentInstall,
    ) -> Result<PassOutcome, ReconcilerError> {
        let name = install.metadata.name.clone().unwrap_or_default();
        {
            let status = status_mut(install);
            status.initialize_conditions();
            status.set_version(&self.config.version);
        }

        if name != self.config.resource_name {
            let message = format!(
                "Resource ignored, expected name {}, got {}",
                self.config.resource_name, name
            );
            warn!("{}", message);
            status_mut(install).mark_not_ready(&message);
            return Ok(PassOutcome::Complete);
        }

        install.spec.set_defaults(self.config.platform);

        let target_namespace = install.spec.target_namespace.clone();
        ensure_target_namespace(
            self.cluster.as_ref(),
            &target_namespace,
            &self.namespace_labels,
        )
        .await
        .map_err(|source| ReconcilerError::Namespace {
            namespace: target_namespace.clone(),
            source,
        })?;

        if let Err(e) = self.extension.pre_reconcile(install).await {
            let message = format!("PreReconciliation failed: {e}");
            status_mut(install).mark_pre_reconciler_failed(&message);
            return Err(ReconcilerError::PreReconcile(e));
        }
        status_mut(install).mark_pre_reconciler_complete();

        match self.installer.install().await {
            Ok(Convergence::Applied) => {}
            Ok(Convergence::Requeue) => {
                debug!("Installer set for {} needs another pass", name);
                status_mut(install).mark_installer_set_not_ready(WAITING_FOR_INSTALLER_SET);
                return Ok(PassOutcome::Requeue);
            }
            Err(e) => {
                status_mut(install).mark_installer_set_not_available(&e.to_string());
                return Err(ReconcilerError::Install(e));
            }
        }
        status_mut(install).mark_installer_set_available();

        if let Err(e) = self.installer.check_readiness().await {
            status_mut(install).mark_installer_set_not_ready(&e.to_string());
            return Err(ReconcilerError::NotReady(e));
        }
        status_mut(install).mark_installer_set_ready();

        if let Err(e) = self.extension.post_reconcile(install).await {
            let message = format!("PostReconciliation failed: {e}");
            status_mut(install).mark_post_reconciler_failed(&message);
            return Err(ReconcilerError::PostReconcile(e));
        }
        status_mut(install).mark_post_reconciler_complete();

        let generation = install.metadata.generation;
        status_mut(install).observed_generation = generation;
        Ok(PassOutcome::Complete)
    }
}

fn status_mut(install: &mut ComponentInstall) -> &mut ComponentInstallStatus {
    install.status.get_or_insert_with(ComponentInstallStatus::default)
}

/// Reconcile entry point for the kube-runtime controller.
///
/// Runs the pass on a copy of the object and persists status when the pass
/// changed it, whether or not the pass succeeded.
pub async fn reconcile(
    install: Arc<ComponentInstall>,
    ctx: Arc<Context>,
) -> Result<Action, ReconcilerError> {
    let name = install.metadata.name.clone().unwrap_or_default();
    let span = tracing::span!(
        tracing::Level::INFO,
        "reconcile",
        resource.name = name.as_str(),
        resource.kind = "ComponentInstall"
    );
    reconcile_instrumented(install, ctx, name).instrument(span).await
}

async fn reconcile_instrumented(
    install: Arc<ComponentInstall>,
    ctx: Arc<Context>,
    name: String,
) -> Result<Action, ReconcilerError> {
    let start = Instant::now();
    info!("Reconciling ComponentInstall: {}", name);
    metrics::increment_reconciliations();

    let mut updated = (*install).clone();
    let result = ctx.reconciler.reconcile_pass(&mut updated).await;

    let persisted = match updated.status.as_ref() {
        Some(status) if updated.status != install.status => {
            update_status(&ctx, &name, status).await
        }
        _ => Ok(()),
    };
    metrics::observe_reconciliation_duration(start.elapsed().as_secs_f64());

    match settle_pass(&name, result, persisted) {
        Ok(PassOutcome::Complete) => {
            ctx.backoff.record_success(&name);
            info!("ComponentInstall {} reconciled", name);
            Ok(Action::requeue(ctx.config.resync_interval_duration()))
        }
        Ok(PassOutcome::Requeue) => {
            ctx.backoff.record_success(&name);
            metrics::increment_requeues("installer-set");
            Ok(Action::requeue(ctx.config.requeue_after_duration()))
        }
        Err(e) => {
            error!("Reconcile pass for {} failed: {}", name, e);
            Err(e)
        }
    }
}

/// Combine the pass result with the status write. A failed pass keeps its own
/// error so the error policy still sees why it failed.
fn settle_pass(
    name: &str,
    result: Result<PassOutcome, ReconcilerError>,
    persisted: Result<(), ReconcilerError>,
) -> Result<PassOutcome, ReconcilerError> {
    match (result, persisted) {
        (result, Ok(())) => result,
        (Ok(_), Err(status_error)) => Err(status_error),
        (Err(e), Err(status_error)) => {
            warn!("Status of {} not persisted after failed pass: {}", name, status_error);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Platform;
    use crate::controller::cluster::InMemoryCluster;
    use crate::controller::installer::{ClassificationTable, InstallError};
    use crate::controller::reconciler::NoopExtension;
    use crate::crd::{ComponentInstallSpec, CONDITION_READY};

    fn pass_config() -> PassConfig {
        PassConfig {
            resource_name: "pipeline".to_string(),
            version: "v1.2.3".to_string(),
            platform: Platform::Kubernetes,
            table: ClassificationTable::default(),
        }
    }

    fn install(name: &str) -> ComponentInstall {
        ComponentInstall::new(name, ComponentInstallSpec::default())
    }

    #[tokio::test]
    async fn test_wrong_name_is_ignored() {
        let cluster = Arc::new(InMemoryCluster::new());
        let reconciler = ComponentReconciler::new(
            &Manifest::default(),
            Arc::clone(&cluster),
            NoopExtension,
            pass_config(),
        );

        let mut object = install("other");
        let outcome = reconciler.reconcile_pass(&mut object).await.unwrap();

        assert_eq!(outcome, PassOutcome::Complete);
        assert!(cluster.writes().is_empty());
        let status = object.status.unwrap();
        let ready = status.condition(CONDITION_READY).unwrap();
        assert_eq!(ready.status, "False");
        assert!(ready.message.as_deref().unwrap().contains("expected name pipeline"));
        assert_eq!(status.version.as_deref(), Some("v1.2.3"));
    }

    #[tokio::test]
    async fn test_empty_manifest_completes() {
        let cluster = Arc::new(InMemoryCluster::new());
        let reconciler = ComponentReconciler::new(
            &Manifest::default(),
            Arc::clone(&cluster),
            NoopExtension,
            pass_config(),
        );

        let mut object = install("pipeline");
        let outcome = reconciler.reconcile_pass(&mut object).await.unwrap();

        assert_eq!(outcome, PassOutcome::Complete);
        assert_eq!(object.spec.target_namespace, "installer-pipelines");
        assert!(object.status.unwrap().is_ready());
        // Only the target namespace was written
        assert_eq!(cluster.writes().len(), 1);
    }

    fn status_conflict() -> ReconcilerError {
        let response: kube::error::ErrorResponse = serde_json::from_value(serde_json::json!({
            "status": "Failure",
            "message": "the object has been modified",
            "reason": "Conflict",
            "code": 409
        }))
        .unwrap();
        ReconcilerError::Status {
            name: "pipeline".to_string(),
            source: kube::Error::Api(response),
        }
    }

    fn not_ready() -> ReconcilerError {
        ReconcilerError::NotReady(InstallError::NotReady {
            resource: "Deployment/installer-pipelines/controller".to_string(),
            reason: "Available condition is False".to_string(),
        })
    }

    #[test]
    fn test_failed_pass_keeps_its_error_when_status_write_fails() {
        let settled = settle_pass("pipeline", Err(not_ready()), Err(status_conflict()));
        assert!(matches!(settled, Err(ReconcilerError::NotReady(_))));
    }

    #[test]
    fn test_status_write_failure_fails_a_successful_pass() {
        let settled = settle_pass("pipeline", Ok(PassOutcome::Complete), Err(status_conflict()));
        assert!(matches!(settled, Err(ReconcilerError::Status { .. })));
    }

    #[test]
    fn test_persisted_status_keeps_pass_outcome() {
        let settled = settle_pass("pipeline", Ok(PassOutcome::Requeue), Ok(()));
        assert_eq!(settled.unwrap(), PassOutcome::Requeue);

        let settled = settle_pass("pipeline", Err(not_ready()), Ok(()));
        assert_eq!(settled.unwrap_err().reason(), "not-ready");
    }
}
