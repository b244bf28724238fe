//! # Prelude
//!
//! Re-exports commonly used types and traits for convenience.
//!
//! ## Usage
//!
//! ```rust
//! use installer_controller::prelude::*;
//! ```
//!
//! This brings into scope:
//! - All CRD types (`ComponentInstall`, `ComponentInstallStatus`, etc.)
//! - Manifest types (`Manifest`, `Resource`, `ResourceKey`)
//! - Cluster access (`ClusterClient`, `KubeCluster`, `InMemoryCluster`)
//! - Installer and reconciler types
//! - Config types

// CRD types - most commonly used
pub use crate::crd::*;

// Manifest model
pub use crate::manifest::{Manifest, ManifestError, Resource, ResourceKey};

// Cluster access - needed for implementing alternative backends
pub use crate::controller::cluster::{ClusterClient, ClusterError, InMemoryCluster, KubeCluster};

// Installer types
pub use crate::controller::installer::{
    ClassificationTable, Convergence, InstallError, Installer, Phase,
};

// Reconciler types - core controller functionality
pub use crate::controller::reconciler::{
    reconcile, ComponentReconciler, Context, Extension, NoopExtension, PassConfig, PassOutcome,
    ReconcilerError,
};

// Config types - for configuration management
pub use crate::config::{ControllerConfig, Platform};
