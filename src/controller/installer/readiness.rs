//! # Readiness
//!
//! Live status checks for installed workloads and jobs.
//!
//! Workloads are grouped by role from their name: webhooks, controllers, and
//! everything else. Each group check fails on its first member that is not
//! `Available`.

use super::{InstallError, Installer};
use crate::controller::cluster::ClusterClient;
use crate::manifest::Resource;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::batch::v1::Job;
use serde::de::DeserializeOwned;
use tracing::debug;

const WEBHOOK_ROLE: &str = "webhook";
const CONTROLLER_ROLE: &str = "controller";

const CONDITION_AVAILABLE: &str = "Available";
const CONDITION_COMPLETE: &str = "Complete";
const STATUS_TRUE: &str = "True";

impl<C: ClusterClient> Installer<C> {
    pub async fn is_webhook_ready(&self) -> Result<(), InstallError> {
        self.workloads_ready(|name| name.contains(WEBHOOK_ROLE))
            .await
    }

    pub async fn is_controller_ready(&self) -> Result<(), InstallError> {
        self.workloads_ready(|name| name.contains(CONTROLLER_ROLE))
            .await
    }

    /// Every workload that is neither a webhook nor a controller
    pub async fn all_workloads_ready(&self) -> Result<(), InstallError> {
        self.workloads_ready(|name| !name.contains(WEBHOOK_ROLE) && !name.contains(CONTROLLER_ROLE))
            .await
    }

    /// Every `Job` in the manifest has completed
    pub async fn are_jobs_complete(&self) -> Result<(), InstallError> {
        for job in &self.jobs {
            self.is_job_complete(job).await?;
        }
        Ok(())
    }

    pub async fn is_workload_ready(&self, resource: &Resource) -> Result<(), InstallError> {
        let deployment: Deployment = self.fetch_typed(resource).await?;
        let available = deployment
            .status
            .and_then(|s| s.conditions)
            .unwrap_or_default()
            .iter()
            .any(|c| c.type_ == CONDITION_AVAILABLE && c.status == STATUS_TRUE);

        if available {
            debug!("{} is available", resource.key());
            Ok(())
        } else {
            Err(InstallError::NotReady {
                resource: resource.key().to_string(),
                reason: "deployment is not available".to_string(),
            })
        }
    }

    pub async fn is_job_complete(&self, resource: &Resource) -> Result<(), InstallError> {
        let job: Job = self.fetch_typed(resource).await?;
        let complete = job
            .status
            .and_then(|s| s.conditions)
            .unwrap_or_default()
            .iter()
            .any(|c| c.type_ == CONDITION_COMPLETE && c.status == STATUS_TRUE);

        if complete {
            Ok(())
        } else {
            Err(InstallError::NotReady {
                resource: resource.key().to_string(),
                reason: "job has not completed".to_string(),
            })
        }
    }

    async fn workloads_ready(&self, matches: impl Fn(&str) -> bool) -> Result<(), InstallError> {
        for workload in &self.resources.workloads {
            if matches(workload.name()) {
                self.is_workload_ready(workload).await?;
            }
        }
        Ok(())
    }

    async fn fetch_typed<K: DeserializeOwned>(
        &self,
        resource: &Resource,
    ) -> Result<K, InstallError> {
        let live = self.cluster.get(&resource.key()).await?;
        live.to_typed().map_err(|source| InstallError::MalformedPayload {
            resource: resource.key().to_string(),
            source,
        })
    }
}
