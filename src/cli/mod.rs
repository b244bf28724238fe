//! # INSTALLCTL CLI
//!
//! Command-line interface for the Installer Controller.
//!
//! Inspects a `ComponentInstall` in the cluster and previews what the
//! controller would do with a manifest before it is shipped.
//!
//! ## Usage
//!
//! ```bash
//! # Show conditions of the installed component
//! installctl status pipeline
//!
//! # List the install order of a manifest
//! installctl plan ./manifests
//!
//! # Apply the manifest to an empty in-memory cluster and list the writes
//! installctl plan ./manifests --dry-run
//!
//! # Print the drift fingerprints the controller stamps on each resource
//! installctl hash ./manifests/deployment.yaml
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use kube::Client;

mod hash;
mod plan;
mod status;

/// Installer Controller CLI
#[derive(Parser)]
#[command(name = "installctl")]
#[command(
    about = "Installer Controller CLI",
    long_about = None,
    after_help = "\
Examples:
  installctl status pipeline
  installctl plan ./manifests --dry-run
  installctl hash ./manifests/controller.yaml
"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show detailed status of a ComponentInstall resource
    Status {
        /// Name of the ComponentInstall resource
        #[arg(value_name = "NAME")]
        name: String,
    },
    /// Show the phase-ordered install plan for a manifest
    Plan {
        /// Manifest file or directory
        #[arg(value_name = "PATH")]
        path: String,

        /// Install into an empty in-memory cluster and list the writes
        #[arg(long)]
        dry_run: bool,

        /// Extra kinds installed in the cluster-scoped phase
        #[arg(long, value_delimiter = ',')]
        cluster_scoped: Vec<String>,

        /// Kinds forced into the namespace-scoped phase
        #[arg(long, value_delimiter = ',')]
        namespace_scoped: Vec<String>,
    },
    /// Print content fingerprints for every resource in a manifest
    Hash {
        /// Manifest file or directory
        #[arg(value_name = "PATH")]
        path: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "installctl=warn".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Status { name } => {
            // Only the status command talks to the API server
            if rustls::crypto::ring::default_provider()
                .install_default()
                .is_err()
            {
                tracing::warn!("rustls crypto provider was already installed");
            }
            let client = Client::try_default()
                .await
                .context("Failed to create Kubernetes client. Ensure kubeconfig is configured.")?;
            status::status_command(client, name).await
        }
        Commands::Plan {
            path,
            dry_run,
            cluster_scoped,
            namespace_scoped,
        } => plan::plan_command(&path, dry_run, &cluster_scoped, &namespace_scoped).await,
        Commands::Hash { path } => hash::hash_command(&path),
    }
}
