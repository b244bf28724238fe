//! # CRD Generator
//!
//! Generates the `ComponentInstall` CustomResourceDefinition YAML from the
//! Rust type definitions.
//!
//! ## Usage
//!
//! ```bash
//! # Generate CRD YAML
//! cargo run --bin crdgen > config/crd/componentinstall.yaml
//!
//! # Generate and apply directly
//! cargo run --bin crdgen | kubectl apply -f -
//! ```

use anyhow::{Context, Result};
use installer_controller::crd::ComponentInstall;
use kube::core::CustomResourceExt;

fn main() -> Result<()> {
    let crd = ComponentInstall::crd();
    let yaml = serde_yaml::to_string(&crd).context("Failed to serialize CRD to YAML")?;
    print!("{yaml}");
    Ok(())
}
