//! # Hash Command
//!
//! Prints the fingerprint the controller stamps on each resource, so a hash
//! annotation seen on a live object can be traced back to manifest content.

use anyhow::{Context, Result};
use installer_controller::controller::installer::{compute_workload_hash, fingerprint_resource};
use installer_controller::manifest::Manifest;
use k8s_openapi::api::apps::v1::Deployment;

const DEPLOYMENT_KIND: &str = "Deployment";

/// Print one fingerprint per resource in the manifest at `path`
pub fn hash_command(path: &str) -> Result<()> {
    let manifest = Manifest::from_path(path)
        .with_context(|| format!("Failed to load manifest from '{path}'"))?;

    for resource in manifest.resources() {
        let hash = if resource.kind == DEPLOYMENT_KIND {
            let deployment: Deployment = resource
                .to_typed()
                .with_context(|| format!("Malformed Deployment {}", resource.key()))?;
            compute_workload_hash(&deployment)
                .with_context(|| format!("Failed to hash {}", resource.key()))?
        } else {
            fingerprint_resource(resource)
                .with_context(|| format!("Failed to hash {}", resource.key()))?
        };
        println!("{hash}  {}", resource.key());
    }

    Ok(())
}
