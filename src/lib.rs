//! Installer Controller Library
//!
//! This library provides the core functionality for the Installer Controller:
//! loading a component manifest, installing it phase by phase, detecting drift
//! through content fingerprints and reporting progress on a `ComponentInstall`.
//!
//! ## Quick Start
//!
//! ```rust
//! use installer_controller::prelude::*;
//! ```
//!
//! This brings commonly used types and traits into scope. For more specific imports,
//! use the individual modules.

pub mod config;
pub mod constants;
pub mod controller;
pub mod crd;
pub mod manifest;
pub mod observability;
pub mod prelude;
pub mod runtime;
