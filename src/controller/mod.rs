//! # Controller
//!
//! Core controller modules for the Installer Controller.
//!
//! - `backoff`: Fibonacci backoff mechanism for retries
//! - `cluster`: Cluster access seam with Kubernetes and in-memory backends
//! - `installer`: Phase-ordered install of a component manifest with drift detection
//! - `reconciler`: Core reconciliation logic for `ComponentInstall`
//! - `server`: HTTP server for metrics and health checks

pub mod backoff;
pub mod cluster;
pub mod installer;
pub mod reconciler;
pub mod server;
