//! # Installer Controller
//!
//! A Kubernetes controller that installs a component manifest into the cluster
//! and keeps it converged.
//!
//! ## Overview
//!
//! The controller watches a single cluster-scoped `ComponentInstall` and, on
//! every pass:
//!
//! 1. **Prepares the target namespace** with the labels declared in the manifest
//! 2. **Installs the manifest in phases** - CRDs, cluster-scoped resources,
//!    namespace-scoped resources, then workloads
//! 3. **Detects drift** by comparing a content fingerprint stored on each live
//!    object with the fingerprint of the desired content
//! 4. **Checks readiness** of webhooks, controllers, other workloads and jobs
//! 5. **Reports progress** as status conditions on the `ComponentInstall`
//!
//! Replica counts are never part of a workload fingerprint, so scaling a
//! Deployment by hand or through an autoscaler is left alone.

use anyhow::Result;
use installer_controller::runtime::{initialization::initialize, watch_loop::run_watch_loop};

#[tokio::main]
async fn main() -> Result<()> {
    let init = initialize().await?;
    run_watch_loop(init.installs, init.context, init.server_state).await
}
