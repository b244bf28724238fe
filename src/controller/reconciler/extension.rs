//! # Platform Extensions
//!
//! Hooks a platform runs around the installer set. An error from either hook
//! ends the pass and is reported in the matching status condition.

use crate::crd::ComponentInstall;
use async_trait::async_trait;

#[async_trait]
pub trait Extension: Send + Sync {
    /// Runs after the target namespace exists, before any resource is installed
    async fn pre_reconcile(&self, install: &ComponentInstall) -> anyhow::Result<()>;

    /// Runs once the installer set is installed and ready
    async fn post_reconcile(&self, install: &ComponentInstall) -> anyhow::Result<()>;
}

/// Extension for plain Kubernetes: nothing to do
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopExtension;

#[async_trait]
impl Extension for NoopExtension {
    async fn pre_reconcile(&self, _install: &ComponentInstall) -> anyhow::Result<()> {
        Ok(())
    }

    async fn post_reconcile(&self, _install: &ComponentInstall) -> anyhow::Result<()> {
        Ok(())
    }
}
