//! # Status Persistence
//!
//! Writes the conditions computed by a reconcile pass back to the cluster.

use super::types::{Context, ReconcilerError};
use crate::crd::{ComponentInstall, ComponentInstallStatus};
use kube::api::{Api, Patch, PatchParams};
use serde_json::json;
use tracing::debug;

/// Merge-patch the status subresource of the named `ComponentInstall`
pub async fn update_status(
    ctx: &Context,
    name: &str,
    status: &ComponentInstallStatus,
) -> Result<(), ReconcilerError> {
    let api: Api<ComponentInstall> = Api::all(ctx.client.clone());

    let patch = json!({ "status": status });
    api.patch_status(
        name,
        &PatchParams::apply(&ctx.config.field_manager),
        &Patch::Merge(patch),
    )
    .await
    .map_err(|source| ReconcilerError::Status {
        name: name.to_string(),
        source,
    })?;

    debug!("Updated status of ComponentInstall {}", name);
    Ok(())
}
