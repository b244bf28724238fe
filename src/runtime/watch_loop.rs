//! # Watch Loop
//!
//! Controller watch loop that monitors `ComponentInstall` resources and
//! triggers a reconcile pass when they change or their requeue timer fires.

use crate::controller::reconciler::{reconcile, Context};
use crate::controller::server::ServerState;
use crate::crd::ComponentInstall;
use crate::runtime::error_policy::handle_reconciliation_error;
use futures::StreamExt;
use kube::api::Api;
use kube_runtime::{watcher, Controller};
use std::sync::Arc;
use tracing::{debug, info, warn, Instrument};

/// Run the controller watch loop until a shutdown signal arrives.
///
/// In-flight passes are dropped at their next await point on shutdown; a
/// partially applied installer set is picked up again by the next process.
pub async fn run_watch_loop(
    installs: Api<ComponentInstall>,
    context: Arc<Context>,
    server_state: Arc<ServerState>,
) -> Result<(), anyhow::Error> {
    let watch_span = tracing::span!(
        tracing::Level::INFO,
        "controller.watch",
        operation = "watch_loop"
    );

    info!("Starting controller watch loop...");
    Controller::new(installs, watcher::Config::default().any_semantic())
        .shutdown_on_signal()
        .run(reconcile, handle_reconciliation_error, context)
        .for_each(|result| {
            match result {
                Ok((object, _action)) => debug!("watch.event.success: {}", object.name),
                Err(e) => warn!("Controller stream error: {}", e),
            }
            futures::future::ready(())
        })
        .instrument(watch_span)
        .await;

    server_state.set_ready(false);
    info!("Controller stopped gracefully");
    Ok(())
}
