//! # Configuration
//!
//! Controller configuration loaded once at startup.
//!
//! - `controller`: environment-driven [`ControllerConfig`] and the per-pass
//!   [`PassConfig`](crate::controller::reconciler::PassConfig) derived from it

mod controller;

pub use controller::{ControllerConfig, Platform};
