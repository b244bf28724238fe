//! # Status Command
//!
//! Command to show detailed status of a ComponentInstall resource.

use anyhow::{Context, Result};
use installer_controller::crd::ComponentInstall;
use kube::{api::Api, Client};

/// Show detailed status of a ComponentInstall resource
pub async fn status_command(client: Client, name: String) -> Result<()> {
    println!("📊 Status for ComponentInstall '{name}'");
    println!();

    let api: Api<ComponentInstall> = Api::all(client);

    let install = api
        .get(&name)
        .await
        .with_context(|| format!("Failed to get ComponentInstall '{name}'"))?;

    println!("Resource Information:");
    println!(
        "  Name: {}",
        install.metadata.name.as_deref().unwrap_or("<unknown>")
    );
    if let Some(uid) = &install.metadata.uid {
        println!("  UID: {uid}");
    }
    if let Some(generation) = install.metadata.generation {
        println!("  Generation: {generation}");
    }

    println!();
    println!("Spec:");
    println!(
        "  Target Namespace: {}",
        display_or_default(&install.spec.target_namespace)
    );
    println!(
        "  Enable API Fields: {}",
        display_or_default(&install.spec.properties.enable_api_fields)
    );
    if !install.spec.properties.default_service_account.is_empty() {
        println!(
            "  Default Service Account: {}",
            install.spec.properties.default_service_account
        );
    }

    let Some(status) = &install.status else {
        println!();
        println!("Status: No status available (resource may not have been reconciled yet)");
        return Ok(());
    };

    println!();
    println!("Status:");
    println!("  Ready: {}", status.is_ready());
    if let Some(version) = &status.version {
        println!("  Version: {version}");
    }
    if let Some(observed_generation) = status.observed_generation {
        println!("  Observed Generation: {observed_generation}");
    }

    if !status.conditions.is_empty() {
        println!();
        println!("Conditions:");
        for condition in &status.conditions {
            println!("  {}: {}", condition.r#type, condition.status);
            if let Some(reason) = &condition.reason {
                println!("    Reason: {reason}");
            }
            if let Some(message) = &condition.message {
                println!("    Message: {message}");
            }
            if let Some(last_transition_time) = &condition.last_transition_time {
                println!("    Last Transition: {last_transition_time}");
            }
        }
    }

    Ok(())
}

fn display_or_default(value: &str) -> &str {
    if value.is_empty() {
        "<default>"
    } else {
        value
    }
}
