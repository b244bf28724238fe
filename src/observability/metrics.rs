//! # Metrics
//!
//! Prometheus metrics for monitoring the controller.
//!
//! ## Metrics Exposed
//!
//! - `installer_reconciliations_total` - Total number of reconcile passes
//! - `installer_reconciliation_errors_total` - Total number of failed passes
//! - `installer_reconciliation_duration_seconds` - Duration of reconcile passes
//! - `installer_requeues_total` - Passes that ended in a requeue, by reason
//! - `installer_resources_created_total` - Resources created, by phase
//! - `installer_resources_updated_total` - Resources updated, by phase
//! - `installer_workload_drift_reverts_total` - Out-of-band workload edits reverted

use anyhow::Result;
use prometheus::{Histogram, IntCounter, IntCounterVec, Registry};
use std::sync::LazyLock;

// Metrics
pub(crate) static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

static RECONCILIATIONS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "installer_reconciliations_total",
        "Total number of reconcile passes",
    )
    .expect("Failed to create RECONCILIATIONS_TOTAL metric - this should never happen")
});

static RECONCILIATION_ERRORS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "installer_reconciliation_errors_total",
        "Total number of reconcile passes that returned an error",
    )
    .expect("Failed to create RECONCILIATION_ERRORS_TOTAL metric - this should never happen")
});

static RECONCILIATION_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "installer_reconciliation_duration_seconds",
            "Duration of reconcile passes in seconds",
        )
        .buckets(vec![0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0]),
    )
    .expect("Failed to create RECONCILIATION_DURATION metric - this should never happen")
});

static REQUEUES_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "installer_requeues_total",
            "Total number of reconcile passes that asked to be requeued, by reason",
        ),
        &["reason"],
    )
    .expect("Failed to create REQUEUES_TOTAL metric - this should never happen")
});

static RESOURCES_CREATED_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "installer_resources_created_total",
            "Total number of resources created, by install phase",
        ),
        &["phase"],
    )
    .expect("Failed to create RESOURCES_CREATED_TOTAL metric - this should never happen")
});

static RESOURCES_UPDATED_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "installer_resources_updated_total",
            "Total number of resources updated, by install phase",
        ),
        &["phase"],
    )
    .expect("Failed to create RESOURCES_UPDATED_TOTAL metric - this should never happen")
});

static WORKLOAD_DRIFT_REVERTS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "installer_workload_drift_reverts_total",
        "Total number of out-of-band workload spec edits reverted",
    )
    .expect("Failed to create WORKLOAD_DRIFT_REVERTS_TOTAL metric - this should never happen")
});

#[allow(
    clippy::missing_errors_doc,
    reason = "Error documentation is provided in doc comments"
)]
pub fn register_metrics() -> Result<()> {
    REGISTRY.register(Box::new(RECONCILIATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_ERRORS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_DURATION.clone()))?;
    REGISTRY.register(Box::new(REQUEUES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RESOURCES_CREATED_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RESOURCES_UPDATED_TOTAL.clone()))?;
    REGISTRY.register(Box::new(WORKLOAD_DRIFT_REVERTS_TOTAL.clone()))?;

    Ok(())
}

pub fn increment_reconciliations() {
    RECONCILIATIONS_TOTAL.inc();
}

pub fn increment_reconciliation_errors() {
    RECONCILIATION_ERRORS_TOTAL.inc();
}

pub fn observe_reconciliation_duration(duration: f64) {
    RECONCILIATION_DURATION.observe(duration);
}

pub fn increment_requeues(reason: &str) {
    REQUEUES_TOTAL.with_label_values(&[reason]).inc();
}

pub fn increment_resources_created(phase: &str) {
    RESOURCES_CREATED_TOTAL.with_label_values(&[phase]).inc();
}

pub fn increment_resources_updated(phase: &str) {
    RESOURCES_UPDATED_TOTAL.with_label_values(&[phase]).inc();
}

pub fn increment_workload_drift_reverts() {
    WORKLOAD_DRIFT_REVERTS_TOTAL.inc();
}
