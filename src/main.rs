//! # Cert Mirror Controller
//!
//! Mirrors cert-manager resources from a virtual cluster into its host cluster.
//!
//! ## Overview
//!
//! 1. **Certificates and Issuers** - copied down with every namespaced reference
//!    rewritten to the physical name; status flows back up
//! 2. **Secrets** - copied down only while a Certificate or Issuer uses them, and
//!    only while this controller holds the ownership label
//! 3. **CRDs** - `certificates.cert-manager.io` and `issuers.cert-manager.io` are
//!    copied to whichever cluster lacks them at startup
//!
//! See [`cert_mirror_controller::runtime`] for the wiring.

use anyhow::Result;
use cert_mirror_controller::runtime::controllers::ControllerSet;
use cert_mirror_controller::runtime::initialization::initialize;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let init = initialize().await?;

    let controllers = ControllerSet::new(
        init.virtual_client.clone(),
        init.physical_client.clone(),
        Arc::clone(&init.context),
    );
    info!("Starting controllers:");
    let futures = controllers.build();

    // Controllers stop on SIGTERM/SIGINT themselves; only flip readiness here
    let shutdown_state = Arc::clone(&init.server_state);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received shutdown signal, marking server as not ready");
            shutdown_state.set_ready(false);
        }
    });

    init.server_state.set_ready(true);
    futures::future::join_all(futures).await;

    info!("Controller stopped");
    Ok(())
}
