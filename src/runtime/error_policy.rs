//! # Error Policy
//!
//! Requeue decisions for failed reconcile passes.
//!
//! Workloads that are not ready yet are polled on a short fixed interval.
//! Every other failure backs off per resource following a Fibonacci sequence,
//! and the sequence resets on the next successful pass.

use crate::controller::reconciler::{Context, ReconcilerError};
use crate::crd::ComponentInstall;
use crate::observability;
use kube_runtime::controller::Action;
use std::sync::Arc;
use tracing::{error, info};

/// Handle reconciliation errors with Fibonacci backoff
pub fn handle_reconciliation_error(
    obj: Arc<ComponentInstall>,
    error: &ReconcilerError,
    ctx: Arc<Context>,
) -> Action {
    let name = obj.metadata.name.as_deref().unwrap_or("unknown");

    let error_span = tracing::span!(
        tracing::Level::ERROR,
        "controller.watch.reconciliation_error",
        resource.name = name,
        reason = error.reason(),
        error = %error
    );
    let _error_guard = error_span.enter();

    if let ReconcilerError::NotReady(_) = error {
        let delay = ctx.config.not_ready_requeue_duration();
        info!(
            "ComponentInstall {} waiting on workloads, checking again in {}s",
            name,
            delay.as_secs()
        );
        observability::metrics::increment_requeues("not-ready");
        return Action::requeue(delay);
    }

    error!("Reconciliation error for {}: {:?}", name, error);
    observability::metrics::increment_reconciliation_errors();
    observability::metrics::increment_requeues("error-backoff");

    let (delay, error_count) = ctx.backoff.record_failure(name);
    info!(
        "Retrying {} with Fibonacci backoff: {}s (error count: {})",
        name,
        delay.as_secs(),
        error_count
    );
    Action::requeue(delay)
}
