//! # Custom Resource Definitions
//!
//! CRD types for the Installer Controller.
//!
//! ## Module Structure
//!
//! - `spec.rs` - `ComponentInstall` specification and defaulting
//! - `status.rs` - Status conditions reported by each reconcile pass

mod spec;
mod status;

// Re-export all public types
pub use spec::{ComponentInstall, ComponentInstallSpec, ComponentProperties};
pub use status::{
    ComponentInstallStatus, Condition, CONDITION_INSTALLER_SET_AVAILABLE,
    CONDITION_INSTALLER_SET_READY, CONDITION_POST_RECONCILER, CONDITION_PRE_RECONCILER,
    CONDITION_READY,
};
