//! # Ownership Command
//!
//! Lists virtual secrets with their ownership state.

use anyhow::{Context, Result};
use cert_mirror_controller::controller::ownership::OwnershipArbiter;
use k8s_openapi::api::core::v1::Secret;
use kube::{api::Api, api::ListParams, Client};

pub async fn ownership_command(
    client: Client,
    namespace: Option<String>,
    label: String,
    controller_name: String,
) -> Result<()> {
    let api: Api<Secret> = if let Some(ns) = &namespace {
        println!("Listing secrets in namespace '{ns}'...");
        Api::namespaced(client, ns)
    } else {
        println!("Listing secrets in all namespaces...");
        Api::all(client)
    };

    let secrets = api
        .list(&ListParams::default())
        .await
        .context("Failed to list secrets")?;

    if secrets.items.is_empty() {
        println!("No secrets found.");
        return Ok(());
    }

    let arbiter = OwnershipArbiter::new(label, controller_name);

    println!("\n{:<40} {:<20} {:<30}", "NAME", "NAMESPACE", "OWNERSHIP");
    println!("{}", "-".repeat(90));

    for secret in secrets.items {
        let name = secret.metadata.name.as_deref().unwrap_or("<unknown>");
        let ns = secret.metadata.namespace.as_deref().unwrap_or("<unknown>");
        let ownership = arbiter.ownership_of(secret.metadata.labels.as_ref());
        println!("{name:<40} {ns:<20} {:<30}", ownership.to_string());
    }

    Ok(())
}
