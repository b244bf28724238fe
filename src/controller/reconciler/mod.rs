//! # Reconciler
//!
//! Reconciliation of the `ComponentInstall` resource.
//!
//! A pass validates the object, applies spec defaults, prepares the target
//! namespace, runs the platform extension hooks around the installer set and
//! records the outcome of each stage as a status condition. The controller
//! acts on a single object whose name is fixed by configuration.

pub mod extension;
pub mod namespace;
pub mod reconcile;
pub mod status;
pub mod types;

// Re-export public API
pub use extension::{Extension, NoopExtension};
pub use reconcile::{reconcile, ComponentReconciler};
pub use types::{Context, PassConfig, PassOutcome, ReconcilerError};
