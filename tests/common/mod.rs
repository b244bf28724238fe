//! Common test utilities for installer and reconciler integration tests
//!
//! Builders for manifest resources and helpers that play the part of other
//! cluster actors (the deployment controller, the job controller, a human
//! running `kubectl edit`) against an `InMemoryCluster`.

#![allow(dead_code, reason = "each test binary uses a different subset")]

use installer_controller::config::Platform;
use installer_controller::controller::cluster::InMemoryCluster;
use installer_controller::controller::installer::{ClassificationTable, Installer};
use installer_controller::controller::reconciler::PassConfig;
use installer_controller::manifest::{Manifest, Resource};
use k8s_openapi::api::apps::v1::Deployment;
use serde_json::json;
use std::sync::Arc;

pub const TARGET_NAMESPACE: &str = "installer-pipelines";
pub const RESOURCE_NAME: &str = "pipeline";

pub fn namespace(name: &str) -> Resource {
    Resource::new("v1", "Namespace", None, name)
}

pub fn crd(plural: &str, group: &str, kind: &str) -> Resource {
    Resource::new(
        "apiextensions.k8s.io/v1",
        "CustomResourceDefinition",
        None,
        &format!("{plural}.{group}"),
    )
    .with_field(
        "spec",
        json!({
            "group": group,
            "names": {"kind": kind, "plural": plural},
            "scope": "Namespaced",
            "versions": [{"name": "v1", "served": true, "storage": true}]
        }),
    )
}

pub fn cluster_role(name: &str) -> Resource {
    Resource::new("rbac.authorization.k8s.io/v1", "ClusterRole", None, name).with_field(
        "rules",
        json!([{"apiGroups": [""], "resources": ["pods"], "verbs": ["get", "list"]}]),
    )
}

pub fn config_map(name: &str, value: &str) -> Resource {
    Resource::new("v1", "ConfigMap", Some(TARGET_NAMESPACE), name)
        .with_field("data", json!({"key": value}))
}

pub fn deployment(name: &str, image: &str, replicas: i32) -> Resource {
    Resource::new("apps/v1", "Deployment", Some(TARGET_NAMESPACE), name).with_field(
        "spec",
        json!({
            "replicas": replicas,
            "selector": {"matchLabels": {"app": name}},
            "template": {
                "metadata": {"labels": {"app": name}},
                "spec": {"containers": [{"name": name, "image": image}]}
            }
        }),
    )
}

pub fn job(name: &str) -> Resource {
    Resource::new("batch/v1", "Job", Some(TARGET_NAMESPACE), name).with_field(
        "spec",
        json!({
            "template": {
                "spec": {
                    "restartPolicy": "Never",
                    "containers": [{"name": name, "image": "busybox"}]
                }
            }
        }),
    )
}

pub fn installer(
    resources: Vec<Resource>,
    cluster: &Arc<InMemoryCluster>,
) -> Installer<InMemoryCluster> {
    Installer::new(
        &Manifest::new(resources),
        Arc::clone(cluster),
        &ClassificationTable::default(),
    )
}

pub fn pass_config() -> PassConfig {
    PassConfig {
        resource_name: RESOURCE_NAME.to_string(),
        version: "v0.1.0".to_string(),
        platform: Platform::Kubernetes,
        table: ClassificationTable::default(),
    }
}

/// Report a workload as `Available`, the way the deployment controller would
pub fn mark_available(cluster: &InMemoryCluster, resource: &Resource) {
    set_status(cluster, resource, json!({
        "conditions": [{"type": "Available", "status": "True"}]
    }));
}

/// Report a job as `Complete`, the way the job controller would
pub fn mark_complete(cluster: &InMemoryCluster, resource: &Resource) {
    set_status(cluster, resource, json!({
        "conditions": [{"type": "Complete", "status": "True"}]
    }));
}

fn set_status(cluster: &InMemoryCluster, resource: &Resource, status: serde_json::Value) {
    let edited = cluster.edit(&resource.key(), |live| {
        *live = live.clone().with_field("status", status);
    });
    assert!(edited, "{} is not in the cluster", resource.key());
}

pub fn live_deployment(cluster: &InMemoryCluster, resource: &Resource) -> Deployment {
    cluster
        .object(&resource.key())
        .expect("deployment exists")
        .to_typed()
        .expect("live object is a Deployment")
}

pub fn live_image(cluster: &InMemoryCluster, resource: &Resource) -> String {
    live_deployment(cluster, resource)
        .spec
        .and_then(|s| s.template.spec)
        .and_then(|s| s.containers.into_iter().next())
        .and_then(|c| c.image)
        .expect("container image")
}

pub fn live_replicas(cluster: &InMemoryCluster, resource: &Resource) -> Option<i32> {
    live_deployment(cluster, resource).spec.and_then(|s| s.replicas)
}

/// Change the first container image and the replica count out of band
pub fn edit_deployment(cluster: &InMemoryCluster, resource: &Resource, image: &str, replicas: i32) {
    let edited = cluster.edit(&resource.key(), |live| {
        let spec = &mut live.data["spec"];
        spec["replicas"] = json!(replicas);
        spec["template"]["spec"]["containers"][0]["image"] = json!(image);
    });
    assert!(edited, "{} is not in the cluster", resource.key());
}
