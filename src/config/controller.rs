//! # Controller Configuration
//!
//! Controller-level settings loaded from environment variables.
//!
//! The environment is read exactly once, at startup. Reconcile passes receive
//! the values they need through [`PassConfig`](crate::controller::reconciler::PassConfig).

use crate::controller::installer::ClassificationTable;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Platform the component is installed on.
/// Some defaults differ between vanilla Kubernetes and OpenShift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Platform {
    #[default]
    Kubernetes,
    OpenShift,
}

impl Platform {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Kubernetes => "kubernetes",
            Platform::OpenShift => "openshift",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "kubernetes" | "k8s" => Ok(Platform::Kubernetes),
            "openshift" | "ocp" => Ok(Platform::OpenShift),
            other => Err(format!("unknown platform '{other}'")),
        }
    }
}

/// Controller-level configuration
///
/// All settings have sensible defaults and can be overridden via environment variables.
/// Environment variables are populated from a ConfigMap using `envFrom` in the deployment.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// File or directory holding the component manifest
    pub manifest_path: String,
    /// Version of the component being installed, reported in status
    pub component_version: String,
    /// Expected name of the singleton `ComponentInstall`
    pub resource_name: String,
    /// Target platform, drives platform-specific defaulting
    pub platform: Platform,
    /// HTTP port for metrics and probes
    pub metrics_port: u16,
    /// Requeue delay after a pass that made progress but has not converged (seconds)
    pub requeue_after_secs: u64,
    /// Requeue delay while workloads are not ready (seconds)
    pub not_ready_requeue_secs: u64,
    /// Periodic resync of a converged component (seconds)
    pub resync_interval_secs: u64,
    /// Fibonacci backoff lower bound for failed passes (minutes)
    pub backoff_min_minutes: u64,
    /// Fibonacci backoff upper bound for failed passes (minutes)
    pub backoff_max_minutes: u64,
    /// Extra kinds installed in the cluster-scoped phase
    pub cluster_scoped_kinds: Vec<String>,
    /// Kinds forced into the namespace-scoped phase
    pub namespace_scoped_kinds: Vec<String>,
    /// Field manager for server-side apply
    pub field_manager: String,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        use crate::constants::*;
        Self {
            manifest_path: DEFAULT_MANIFEST_PATH.to_string(),
            component_version: DEFAULT_COMPONENT_VERSION.to_string(),
            resource_name: DEFAULT_RESOURCE_NAME.to_string(),
            platform: Platform::Kubernetes,
            metrics_port: DEFAULT_METRICS_PORT,
            requeue_after_secs: DEFAULT_REQUEUE_AFTER_SECS,
            not_ready_requeue_secs: DEFAULT_NOT_READY_REQUEUE_SECS,
            resync_interval_secs: DEFAULT_RESYNC_INTERVAL_SECS,
            backoff_min_minutes: DEFAULT_BACKOFF_MIN_MINUTES,
            backoff_max_minutes: DEFAULT_BACKOFF_MAX_MINUTES,
            cluster_scoped_kinds: Vec::new(),
            namespace_scoped_kinds: Vec::new(),
            field_manager: DEFAULT_FIELD_MANAGER.to_string(),
        }
    }
}

impl ControllerConfig {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        use crate::constants::*;
        Self {
            manifest_path: env_var_or_default_str("MANIFEST_PATH", DEFAULT_MANIFEST_PATH),
            component_version: env_var_or_default_str(
                "COMPONENT_VERSION",
                DEFAULT_COMPONENT_VERSION,
            ),
            resource_name: env_var_or_default_str("RESOURCE_NAME", DEFAULT_RESOURCE_NAME),
            platform: env_var_or_default("PLATFORM", Platform::Kubernetes),
            metrics_port: env_var_or_default("METRICS_PORT", DEFAULT_METRICS_PORT),
            requeue_after_secs: env_var_or_default(
                "REQUEUE_AFTER_SECS",
                DEFAULT_REQUEUE_AFTER_SECS,
            ),
            not_ready_requeue_secs: env_var_or_default(
                "NOT_READY_REQUEUE_SECS",
                DEFAULT_NOT_READY_REQUEUE_SECS,
            ),
            resync_interval_secs: env_var_or_default(
                "RESYNC_INTERVAL_SECS",
                DEFAULT_RESYNC_INTERVAL_SECS,
            ),
            backoff_min_minutes: env_var_or_default(
                "BACKOFF_MIN_MINUTES",
                DEFAULT_BACKOFF_MIN_MINUTES,
            ),
            backoff_max_minutes: env_var_or_default(
                "BACKOFF_MAX_MINUTES",
                DEFAULT_BACKOFF_MAX_MINUTES,
            ),
            cluster_scoped_kinds: env_var_list("CLUSTER_SCOPED_KINDS"),
            namespace_scoped_kinds: env_var_list("NAMESPACE_SCOPED_KINDS"),
            field_manager: env_var_or_default_str("FIELD_MANAGER", DEFAULT_FIELD_MANAGER),
        }
    }

    /// Classification table with the configured overrides applied
    #[must_use]
    pub fn classification_table(&self) -> ClassificationTable {
        ClassificationTable::default()
            .with_cluster_scoped(&self.cluster_scoped_kinds)
            .with_namespace_scoped(&self.namespace_scoped_kinds)
    }

    /// Get requeue duration for passes that have not converged yet
    pub fn requeue_after_duration(&self) -> Duration {
        Duration::from_secs(self.requeue_after_secs)
    }

    /// Get requeue duration while workloads are not ready
    pub fn not_ready_requeue_duration(&self) -> Duration {
        Duration::from_secs(self.not_ready_requeue_secs)
    }

    /// Get resync duration for converged components
    pub fn resync_interval_duration(&self) -> Duration {
        Duration::from_secs(self.resync_interval_secs)
    }
}

/// Read environment variable or return default value
fn env_var_or_default<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Read environment variable as string or return default
fn env_var_or_default_str(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Read a comma-separated environment variable, dropping empty entries
fn env_var_list(key: &str) -> Vec<String> {
    std::env::var(key)
        .map(|v| parse_list(&v))
        .unwrap_or_default()
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}
