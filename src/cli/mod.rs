//! # CERTMIRRORCTL CLI
//!
//! Command-line interface for the cert mirror controller.
//!
//! ## Usage
//!
//! ```bash
//! # Print the physical name of a virtual object
//! certmirrorctl translate --name tls-a --namespace team1 --suffix my-vcluster
//!
//! # Show which secrets a Certificate or Issuer manifest references
//! certmirrorctl refs certificate.yaml
//!
//! # Show who owns each secret in a namespace of the virtual cluster
//! certmirrorctl ownership --namespace team1
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod ownership;
mod refs;
mod translate;

/// Cert Mirror Controller CLI
#[derive(Parser)]
#[command(name = "certmirrorctl")]
#[command(
    about = "Cert Mirror Controller CLI",
    long_about = None,
    after_help = "\
Examples:
  certmirrorctl translate --name tls-a --namespace team1
  certmirrorctl refs issuer.yaml
  certmirrorctl ownership --namespace team1
"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the physical name a virtual object is mirrored to
    Translate {
        /// Virtual object name
        #[arg(long)]
        name: String,

        /// Virtual object namespace
        #[arg(long)]
        namespace: String,

        /// Name suffix, usually the virtual cluster's name
        #[arg(long, env = "NAME_SUFFIX", default_value = cert_mirror_controller::constants::DEFAULT_NAME_SUFFIX)]
        suffix: String,
    },
    /// Print the secrets a Certificate or Issuer manifest references
    Refs {
        /// Path to a YAML manifest
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// List virtual secrets with their ownership state
    Ownership {
        /// Namespace to list (defaults to all namespaces)
        #[arg(short, long)]
        namespace: Option<String>,

        /// Ownership label key
        #[arg(long, env = "CONTROLLER_LABEL", default_value = cert_mirror_controller::constants::DEFAULT_CONTROLLER_LABEL)]
        label: String,

        /// This controller's name as written into the label
        #[arg(long, env = "CONTROLLER_NAME", default_value = cert_mirror_controller::constants::DEFAULT_CONTROLLER_NAME)]
        controller_name: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Required for rustls 0.23+ before any client is built
    rustls::crypto::ring::default_provider()
        .install_default()
        .unwrap_or_else(|_| panic!("Failed to install rustls crypto provider"));

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "certmirrorctl=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Translate {
            name,
            namespace,
            suffix,
        } => {
            translate::translate_command(&name, &namespace, &suffix);
            Ok(())
        }
        Commands::Refs { file } => refs::refs_command(&file),
        Commands::Ownership {
            namespace,
            label,
            controller_name,
        } => {
            let client = kube::Client::try_default()
                .await
                .context("Failed to create Kubernetes client. Ensure kubeconfig is configured.")?;
            ownership::ownership_command(client, namespace, label, controller_name).await
        }
    }
}
