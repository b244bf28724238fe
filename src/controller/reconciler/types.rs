//! # Reconciler Types
//!
//! Core types shared by the reconcile pass and the runtime.

use crate::config::{ControllerConfig, Platform};
use crate::controller::backoff::BackoffRegistry;
use crate::controller::cluster::{ClusterError, KubeCluster};
use crate::controller::installer::{ClassificationTable, InstallError};
use crate::controller::reconciler::{ComponentReconciler, NoopExtension};
use kube::Client;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconcilerError {
    #[error("PreReconciliation failed: {0}")]
    PreReconcile(#[source] anyhow::Error),
    #[error("failed to ensure target namespace {namespace}: {source}")]
    Namespace {
        namespace: String,
        #[source]
        source: ClusterError,
    },
    #[error("installer set failed: {0}")]
    Install(#[source] InstallError),
    #[error("installer set not ready: {0}")]
    NotReady(#[source] InstallError),
    #[error("PostReconciliation failed: {0}")]
    PostReconcile(#[source] anyhow::Error),
    #[error("failed to update status of {name}: {source}")]
    Status {
        name: String,
        #[source]
        source: kube::Error,
    },
}

impl ReconcilerError {
    /// Short label for metrics and logs
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            Self::PreReconcile(_) => "pre-reconcile",
            Self::Namespace { .. } => "namespace",
            Self::Install(_) => "install",
            Self::NotReady(_) => "not-ready",
            Self::PostReconcile(_) => "post-reconcile",
            Self::Status { .. } => "status",
        }
    }
}

/// Result of a reconcile pass that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassOutcome {
    /// Everything is installed and ready
    Complete,
    /// Progress was made or a write is pending; run the pass again soon
    Requeue,
}

/// Settings fixed for the life of a reconciler. Nothing is read from the
/// environment while a pass runs.
#[derive(Debug, Clone)]
pub struct PassConfig {
    /// Name of the single `ComponentInstall` this controller acts on
    pub resource_name: String,
    /// Component version reported in status
    pub version: String,
    pub platform: Platform,
    pub table: ClassificationTable,
}

impl PassConfig {
    #[must_use]
    pub fn from_config(config: &ControllerConfig) -> Self {
        Self {
            resource_name: config.resource_name.clone(),
            version: config.component_version.clone(),
            platform: config.platform,
            table: config.classification_table(),
        }
    }
}

/// Shared state handed to every reconcile call by the kube-runtime controller
pub struct Context {
    pub client: Client,
    pub reconciler: ComponentReconciler<KubeCluster, NoopExtension>,
    pub config: ControllerConfig,
    pub backoff: BackoffRegistry,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("reconciler", &self.reconciler)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Context {
    #[must_use]
    pub fn new(
        client: Client,
        reconciler: ComponentReconciler<KubeCluster, NoopExtension>,
        config: ControllerConfig,
    ) -> Self {
        let backoff = BackoffRegistry::new(config.backoff_min_minutes, config.backoff_max_minutes);
        Self {
            client,
            reconciler,
            config,
            backoff,
        }
    }
}
