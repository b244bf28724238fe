//! # Plan Command
//!
//! Shows the order in which the controller installs a manifest, optionally
//! replaying the install against an empty in-memory cluster.

use anyhow::{Context, Result};
use installer_controller::controller::cluster::InMemoryCluster;
use installer_controller::controller::installer::{ClassificationTable, Installer};
use installer_controller::manifest::Manifest;
use std::sync::Arc;

/// Print the install plan for the manifest at `path`
pub async fn plan_command(
    path: &str,
    dry_run: bool,
    cluster_scoped: &[String],
    namespace_scoped: &[String],
) -> Result<()> {
    let manifest = Manifest::from_path(path)
        .with_context(|| format!("Failed to load manifest from '{path}'"))?;
    let table = ClassificationTable::default()
        .with_cluster_scoped(cluster_scoped)
        .with_namespace_scoped(namespace_scoped);

    let cluster = Arc::new(InMemoryCluster::new());
    let installer = Installer::new(&manifest, Arc::clone(&cluster), &table);

    println!("📋 Install plan for '{path}' ({} resources)", manifest.len());
    println!();

    let mut current = None;
    for (phase, key) in installer.plan() {
        if current != Some(phase) {
            println!("Phase {phase}:");
            current = Some(phase);
        }
        println!("  {key}");
    }

    if !dry_run {
        return Ok(());
    }

    let outcome = installer
        .install()
        .await
        .context("Dry-run install failed")?;

    println!();
    println!("Dry-run writes:");
    for write in cluster.writes() {
        println!("  {:?} {}", write.op, write.key());
    }
    println!();
    println!("Outcome: {outcome:?}");

    Ok(())
}
