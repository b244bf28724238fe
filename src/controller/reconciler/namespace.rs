//! Target namespace creation and label sync.

use crate::controller::cluster::{ClusterClient, ClusterError};
use crate::manifest::{Manifest, Resource};
use std::collections::BTreeMap;
use tracing::{debug, info};

const NAMESPACE_KIND: &str = "Namespace";

/// Labels of the first `Namespace` in the manifest
#[must_use]
pub fn namespace_labels(manifest: &Manifest) -> BTreeMap<String, String> {
    manifest
        .filter_by_kind(NAMESPACE_KIND)
        .first()
        .map(|ns| ns.labels())
        .unwrap_or_default()
}

/// Create `name` with `labels`, or add the missing labels to the live
/// namespace. Labels already on the namespace are kept.
pub async fn ensure_target_namespace<C: ClusterClient + ?Sized>(
    cluster: &C,
    name: &str,
    labels: &BTreeMap<String, String>,
) -> Result<(), ClusterError> {
    let mut desired = Resource::new("v1", NAMESPACE_KIND, None, name);

    match cluster.get(&desired.key()).await {
        Err(ClusterError::NotFound(_)) => {
            info!("Creating target namespace {}", name);
            if !labels.is_empty() {
                desired.metadata.labels = Some(labels.clone());
            }
            cluster.create(&desired).await
        }
        Err(e) => Err(e),
        Ok(mut live) => {
            let current = live.metadata.labels.get_or_insert_with(BTreeMap::new);
            let missing = labels
                .iter()
                .any(|(k, v)| current.get(k) != Some(v));
            if !missing {
                debug!("Target namespace {} is up to date", name);
                return Ok(());
            }

            for (key, value) in labels {
                current.insert(key.clone(), value.clone());
            }
            info!("Updating labels of target namespace {}", name);
            cluster.update(&live).await
        }
    }
}
