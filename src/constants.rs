//! # Constants
//!
//! Shared constants used throughout the controller.
//!
//! These values represent reasonable defaults and can be overridden via
//! configuration or environment variables where applicable.

/// Annotation holding the fingerprint of the last content this controller applied
pub const LAST_APPLIED_HASH_KEY: &str = "operator.installer.dev/last-applied-hash";

/// Replica count written into a workload spec before hashing it.
/// Never a realistic replica count, so scaling a workload never changes its fingerprint.
pub const REPLICAS_FOR_HASH: i32 = 999;

/// Field manager used for server-side apply and status patches
pub const DEFAULT_FIELD_MANAGER: &str = "installer-controller";

/// Name of the singleton `ComponentInstall` this controller reconciles
pub const DEFAULT_RESOURCE_NAME: &str = "pipeline";

/// Namespace the component is installed into when the spec leaves it empty
pub const DEFAULT_TARGET_NAMESPACE: &str = "installer-pipelines";

/// Default value for `spec.properties.enableApiFields`
pub const DEFAULT_ENABLE_API_FIELDS: &str = "beta";

/// Default service account filled in on OpenShift
pub const DEFAULT_OPENSHIFT_SERVICE_ACCOUNT: &str = "pipeline";

/// Default location of the component manifest inside the controller image
pub const DEFAULT_MANIFEST_PATH: &str = "/var/run/installer/manifests";

/// Version reported in status when none is configured
pub const DEFAULT_COMPONENT_VERSION: &str = "devel";

/// Default HTTP server port for metrics and health probes
pub const DEFAULT_METRICS_PORT: u16 = 5000;

/// Requeue interval after a pass that made progress but has not converged (seconds)
pub const DEFAULT_REQUEUE_AFTER_SECS: u64 = 10;

/// Requeue interval while installed workloads are not yet ready (seconds)
pub const DEFAULT_NOT_READY_REQUEUE_SECS: u64 = 15;

/// Periodic resync of a converged component (seconds)
pub const DEFAULT_RESYNC_INTERVAL_SECS: u64 = 600;

/// Fibonacci backoff bounds for failed passes (minutes)
pub const DEFAULT_BACKOFF_MIN_MINUTES: u64 = 1;
pub const DEFAULT_BACKOFF_MAX_MINUTES: u64 = 10;
