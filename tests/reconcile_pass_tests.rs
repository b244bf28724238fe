//! # Reconcile Pass Tests
//!
//! Full passes of `ComponentReconciler` over an in-memory cluster: stage
//! ordering, status conditions, extension hooks and requeue behavior.

mod common;

use async_trait::async_trait;
use common::*;
use installer_controller::controller::cluster::InMemoryCluster;
use installer_controller::controller::reconciler::{
    ComponentReconciler, Extension, NoopExtension, PassOutcome, ReconcilerError,
};
use installer_controller::crd::{
    ComponentInstall, ComponentInstallSpec, CONDITION_INSTALLER_SET_AVAILABLE,
    CONDITION_INSTALLER_SET_READY, CONDITION_POST_RECONCILER, CONDITION_PRE_RECONCILER,
    CONDITION_READY,
};
use installer_controller::manifest::{Manifest, Resource, ResourceKey};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug, Default)]
struct HookCalls {
    pre: AtomicUsize,
    post: AtomicUsize,
}

/// Extension that counts hook calls and fails the hooks it is told to
#[derive(Debug, Default)]
struct RecordingExtension {
    fail_pre: bool,
    fail_post: bool,
    calls: Arc<HookCalls>,
}

#[async_trait]
impl Extension for RecordingExtension {
    async fn pre_reconcile(&self, _install: &ComponentInstall) -> anyhow::Result<()> {
        self.calls.pre.fetch_add(1, Ordering::SeqCst);
        if self.fail_pre {
            anyhow::bail!("image registry unreachable");
        }
        Ok(())
    }

    async fn post_reconcile(&self, _install: &ComponentInstall) -> anyhow::Result<()> {
        self.calls.post.fetch_add(1, Ordering::SeqCst);
        if self.fail_post {
            anyhow::bail!("default tasks not installed");
        }
        Ok(())
    }
}

fn component(name: &str) -> ComponentInstall {
    let mut install = ComponentInstall::new(name, ComponentInstallSpec::default());
    install.metadata.generation = Some(3);
    install
}

fn condition_status(install: &ComponentInstall, condition_type: &str) -> String {
    install
        .status
        .as_ref()
        .and_then(|s| s.condition(condition_type))
        .map(|c| c.status.clone())
        .unwrap_or_default()
}

fn condition_message(install: &ComponentInstall, condition_type: &str) -> String {
    install
        .status
        .as_ref()
        .and_then(|s| s.condition(condition_type))
        .and_then(|c| c.message.clone())
        .unwrap_or_default()
}

fn target_namespace_key() -> ResourceKey {
    Resource::new("v1", "Namespace", None, TARGET_NAMESPACE).key()
}

fn reconciler<E: Extension>(
    resources: Vec<Resource>,
    cluster: &Arc<InMemoryCluster>,
    extension: E,
) -> ComponentReconciler<InMemoryCluster, E> {
    ComponentReconciler::new(
        &Manifest::new(resources),
        Arc::clone(cluster),
        extension,
        pass_config(),
    )
}

#[tokio::test]
async fn test_pass_converges_and_reports_ready() {
    let cluster = Arc::new(InMemoryCluster::new());
    let api = deployment("api", "api:v1", 2);
    let reconciler = reconciler(
        vec![config_map("settings", "a"), api.clone()],
        &cluster,
        NoopExtension,
    );
    let mut install = component(RESOURCE_NAME);

    // Workloads exist but the deployment controller has not caught up yet
    let err = reconciler.reconcile_pass(&mut install).await.unwrap_err();
    assert!(matches!(err, ReconcilerError::NotReady(_)));
    assert_eq!(condition_status(&install, CONDITION_INSTALLER_SET_AVAILABLE), "True");
    assert_eq!(condition_status(&install, CONDITION_INSTALLER_SET_READY), "False");
    assert_eq!(condition_status(&install, CONDITION_READY), "False");
    assert!(condition_message(&install, CONDITION_READY).contains("api"));
    assert_eq!(install.status.as_ref().unwrap().observed_generation, None);

    mark_available(&cluster, &api);
    cluster.take_writes();

    let outcome = reconciler.reconcile_pass(&mut install).await.unwrap();
    assert_eq!(outcome, PassOutcome::Complete);
    assert!(cluster.writes().is_empty());

    let status = install.status.as_ref().unwrap();
    assert!(status.is_ready());
    assert_eq!(status.version.as_deref(), Some("v0.1.0"));
    assert_eq!(status.observed_generation, Some(3));
    for condition in [
        CONDITION_PRE_RECONCILER,
        CONDITION_INSTALLER_SET_AVAILABLE,
        CONDITION_INSTALLER_SET_READY,
        CONDITION_POST_RECONCILER,
    ] {
        assert_eq!(condition_status(&install, condition), "True", "{condition}");
    }
}

#[tokio::test]
async fn test_spec_defaults_are_applied() {
    let cluster = Arc::new(InMemoryCluster::new());
    let reconciler = reconciler(Vec::new(), &cluster, NoopExtension);
    let mut install = component(RESOURCE_NAME);

    reconciler.reconcile_pass(&mut install).await.unwrap();

    assert_eq!(install.spec.target_namespace, TARGET_NAMESPACE);
    assert_eq!(install.spec.properties.enable_api_fields, "beta");
    assert!(cluster.object(&target_namespace_key()).is_some());
}

#[tokio::test]
async fn test_other_names_are_ignored() {
    let cluster = Arc::new(InMemoryCluster::new());
    let extension = RecordingExtension::default();
    let reconciler = reconciler(vec![config_map("settings", "a")], &cluster, extension);
    let mut install = component("not-the-one");

    let outcome = reconciler.reconcile_pass(&mut install).await.unwrap();

    assert_eq!(outcome, PassOutcome::Complete);
    assert!(cluster.writes().is_empty());
    assert_eq!(condition_status(&install, CONDITION_READY), "False");
    assert_eq!(condition_status(&install, CONDITION_PRE_RECONCILER), "Unknown");
    assert!(install.spec.target_namespace.is_empty());
}

#[tokio::test]
async fn test_target_namespace_gets_manifest_labels() {
    let cluster = Arc::new(InMemoryCluster::new());
    let mut labelled = namespace("component-system");
    labelled.metadata.labels = Some(BTreeMap::from([(
        "pod-security.kubernetes.io/enforce".to_string(),
        "restricted".to_string(),
    )]));
    let reconciler = reconciler(vec![labelled], &cluster, NoopExtension);
    let mut install = component(RESOURCE_NAME);

    reconciler.reconcile_pass(&mut install).await.unwrap();

    let target = cluster.object(&target_namespace_key()).unwrap();
    assert_eq!(
        target.labels().get("pod-security.kubernetes.io/enforce").map(String::as_str),
        Some("restricted")
    );
}

#[tokio::test]
async fn test_pre_reconcile_failure_stops_the_pass() {
    let cluster = Arc::new(InMemoryCluster::new());
    let extension = RecordingExtension {
        fail_pre: true,
        ..RecordingExtension::default()
    };
    let calls = Arc::clone(&extension.calls);
    let reconciler = reconciler(vec![config_map("settings", "a")], &cluster, extension);
    let mut install = component(RESOURCE_NAME);

    let err = reconciler.reconcile_pass(&mut install).await.unwrap_err();

    assert!(matches!(err, ReconcilerError::PreReconcile(_)));
    assert_eq!(calls.post.load(Ordering::SeqCst), 0);
    assert_eq!(condition_status(&install, CONDITION_PRE_RECONCILER), "False");
    assert!(
        condition_message(&install, CONDITION_PRE_RECONCILER).contains("image registry unreachable")
    );
    assert_eq!(condition_status(&install, CONDITION_READY), "False");

    // Only the target namespace was written; the installer set never ran
    let writes = cluster.writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].resource.kind, "Namespace");
}

#[tokio::test]
async fn test_post_reconcile_failure_is_reported() {
    let cluster = Arc::new(InMemoryCluster::new());
    let extension = RecordingExtension {
        fail_post: true,
        ..RecordingExtension::default()
    };
    let reconciler = reconciler(vec![config_map("settings", "a")], &cluster, extension);
    let mut install = component(RESOURCE_NAME);

    let err = reconciler.reconcile_pass(&mut install).await.unwrap_err();

    assert!(matches!(err, ReconcilerError::PostReconcile(_)));
    assert_eq!(condition_status(&install, CONDITION_INSTALLER_SET_READY), "True");
    assert_eq!(condition_status(&install, CONDITION_POST_RECONCILER), "False");
    assert_eq!(condition_status(&install, CONDITION_READY), "False");
}

#[tokio::test]
async fn test_hooks_run_once_per_pass() {
    let cluster = Arc::new(InMemoryCluster::new());
    let extension = RecordingExtension::default();
    let calls = Arc::clone(&extension.calls);
    let reconciler = reconciler(Vec::new(), &cluster, extension);
    let mut install = component(RESOURCE_NAME);

    reconciler.reconcile_pass(&mut install).await.unwrap();
    reconciler.reconcile_pass(&mut install).await.unwrap();
    assert!(install.status.as_ref().unwrap().is_ready());
    assert_eq!(calls.pre.load(Ordering::SeqCst), 2);
    assert_eq!(calls.post.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_workload_update_failure_requeues_pass() {
    let cluster = Arc::new(InMemoryCluster::new());
    let v1 = deployment("api", "api:v1", 1);
    let first = reconciler(vec![v1.clone()], &cluster, NoopExtension);
    let mut install = component(RESOURCE_NAME);
    let _ = first.reconcile_pass(&mut install).await;
    mark_available(&cluster, &v1);

    cluster.fail_updates_for("Deployment", "api");
    let extension = RecordingExtension::default();
    let calls = Arc::clone(&extension.calls);
    let second = reconciler(vec![deployment("api", "api:v2", 1)], &cluster, extension);
    let outcome = second.reconcile_pass(&mut install).await.unwrap();

    assert_eq!(outcome, PassOutcome::Requeue);
    assert_eq!(calls.pre.load(Ordering::SeqCst), 1);
    assert_eq!(calls.post.load(Ordering::SeqCst), 0);
    assert_eq!(condition_status(&install, CONDITION_INSTALLER_SET_READY), "False");
    assert_eq!(condition_status(&install, CONDITION_READY), "False");

    assert_eq!(live_image(&cluster, &v1), "api:v1");

    cluster.clear_failures();
    let _ = second.reconcile_pass(&mut install).await;
    assert_eq!(live_image(&cluster, &v1), "api:v2");
}

#[tokio::test]
async fn test_install_error_marks_installer_set_unavailable() {
    let cluster = Arc::new(InMemoryCluster::new());
    cluster.fail_creates_for("ConfigMap", "settings");
    let extension = RecordingExtension::default();
    let calls = Arc::clone(&extension.calls);
    let reconciler = reconciler(vec![config_map("settings", "a")], &cluster, extension);
    let mut install = component(RESOURCE_NAME);

    let err = reconciler.reconcile_pass(&mut install).await.unwrap_err();

    assert!(matches!(err, ReconcilerError::Install(_)));
    assert_eq!(calls.post.load(Ordering::SeqCst), 0);
    assert_eq!(condition_status(&install, CONDITION_INSTALLER_SET_AVAILABLE), "False");
    assert!(condition_message(&install, CONDITION_INSTALLER_SET_AVAILABLE).contains("settings"));
    assert_eq!(condition_status(&install, CONDITION_READY), "False");
}

#[tokio::test]
async fn test_second_pass_writes_nothing() {
    let cluster = Arc::new(InMemoryCluster::new());
    let api = deployment("api", "api:v1", 1);
    let reconciler = reconciler(
        vec![
            namespace(TARGET_NAMESPACE),
            crd("widgets", "example.com", "Widget"),
            cluster_role("reader"),
            config_map("settings", "a"),
            api.clone(),
        ],
        &cluster,
        NoopExtension,
    );
    let mut install = component(RESOURCE_NAME);

    let _ = reconciler.reconcile_pass(&mut install).await;
    mark_available(&cluster, &api);
    reconciler.reconcile_pass(&mut install).await.unwrap();
    cluster.take_writes();

    let outcome = reconciler.reconcile_pass(&mut install).await.unwrap();
    assert_eq!(outcome, PassOutcome::Complete);
    let writes = cluster.writes();
    assert!(writes.is_empty(), "unexpected writes: {writes:?}");
}
