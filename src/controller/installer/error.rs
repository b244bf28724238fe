//! Installer error types.

use crate::controller::cluster::ClusterError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InstallError {
    /// Any cluster I/O failure other than not-found, surfaced as-is
    #[error(transparent)]
    Cluster(#[from] ClusterError),
    /// The resource content cannot be converted to the expected shape
    #[error("malformed payload for {resource}: {source}")]
    MalformedPayload {
        resource: String,
        #[source]
        source: serde_json::Error,
    },
    /// A readiness or completion predicate failed
    #[error("{resource} is not ready: {reason}")]
    NotReady { resource: String, reason: String },
}

impl InstallError {
    #[must_use]
    pub fn is_not_ready(&self) -> bool {
        matches!(self, Self::NotReady { .. })
    }
}
