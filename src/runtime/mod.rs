//! # Runtime
//!
//! Process wiring for the controller binary.
//!
//! - `initialization`: crypto provider, tracing, metrics, probe server and reconciler setup
//! - `error_policy`: requeue decisions for failed reconcile passes
//! - `watch_loop`: kube-runtime controller over `ComponentInstall`

pub mod error_policy;
pub mod initialization;
pub mod watch_loop;
