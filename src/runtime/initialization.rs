//! # Initialization
//!
//! Controller initialization logic including rustls setup, tracing, metrics,
//! server startup, Kubernetes client setup and manifest loading.

use crate::config::ControllerConfig;
use crate::controller::cluster::KubeCluster;
use crate::controller::reconciler::{ComponentReconciler, Context, NoopExtension, PassConfig};
use crate::controller::server::{start_server, ServerState};
use crate::crd::ComponentInstall;
use crate::manifest::Manifest;
use crate::observability;
use anyhow::{Context as _, Result};
use kube::{api::Api, Client};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Initialization result containing all necessary components for the controller
pub struct InitializationResult {
    /// Kubernetes client
    pub client: Client,
    /// API for the ComponentInstall CRD
    pub installs: Api<ComponentInstall>,
    /// Reconciler context
    pub context: Arc<Context>,
    /// Server state for health checks
    pub server_state: Arc<ServerState>,
}

impl std::fmt::Debug for InitializationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InitializationResult")
            .field("server_ready", &self.server_state.ready())
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

/// Install ring as the process-wide rustls provider. Returns false when a
/// provider was already in place.
fn install_crypto_provider() -> bool {
    rustls::crypto::ring::default_provider()
        .install_default()
        .is_ok()
}

/// Initialize the controller runtime
///
/// This function handles:
/// - rustls crypto provider setup
/// - Tracing subscriber setup
/// - Metrics registration
/// - HTTP server startup
/// - Kubernetes client creation
/// - Manifest loading and reconciler setup
pub async fn initialize() -> Result<InitializationResult> {
    // Must happen before any TLS connection is made
    let provider_installed = install_crypto_provider();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "installer_controller=info".into()),
        )
        .init();

    if !provider_installed {
        warn!("rustls crypto provider was already installed");
    }

    info!("Starting Installer Controller");
    info!(
        "Build info: timestamp={}, datetime={}, git_hash={}",
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_DATETIME"),
        env!("BUILD_GIT_HASH")
    );

    let config = ControllerConfig::from_env();
    info!(
        "Configuration: resource={}, version={}, platform={}, manifest={}",
        config.resource_name, config.component_version, config.platform, config.manifest_path
    );

    observability::metrics::register_metrics()?;

    let server_state = Arc::new(ServerState::default());
    let server_state_clone = Arc::clone(&server_state);
    let port = config.metrics_port;
    tokio::spawn(async move {
        if let Err(e) = start_server(port, server_state_clone).await {
            error!("HTTP server error: {}", e);
        }
    });

    let client = Client::try_default()
        .await
        .context("Failed to create Kubernetes client")?;

    let manifest = Manifest::from_path(&config.manifest_path)
        .with_context(|| format!("Failed to load manifest from {}", config.manifest_path))?;
    info!(
        "Loaded {} resources from {}",
        manifest.len(),
        config.manifest_path
    );
    if manifest.is_empty() {
        warn!("Manifest at {} contains no resources", config.manifest_path);
    }

    let cluster = Arc::new(KubeCluster::new(client.clone(), &config.field_manager));
    let reconciler = ComponentReconciler::new(
        &manifest,
        cluster,
        NoopExtension,
        PassConfig::from_config(&config),
    );
    let context = Arc::new(Context::new(client.clone(), reconciler, config));

    let installs: Api<ComponentInstall> = Api::all(client.clone());

    Ok(InitializationResult {
        client,
        installs,
        context,
        server_state,
    })
}
