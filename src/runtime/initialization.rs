//! # Initialization
//!
//! Controller initialization logic including rustls setup, tracing,
//! metrics, server startup, Kubernetes client setup for both clusters,
//! CRD provisioning and construction of the sync engine.

use super::context::Context;
use crate::config::ControllerConfig;
use crate::constants::{CERTIFICATE_CRD, ISSUER_CRD, SCHEMA_ESTABLISH_POLL_MS};
use crate::controller::ownership::OwnershipArbiter;
use crate::controller::schema::SchemaProvisioner;
use crate::controller::server::{start_server, ServerState};
use crate::controller::syncer::{CertificateSyncer, IssuerSyncer, SecretSyncer, SyncEngine};
use crate::crd::{Certificate, Issuer};
use crate::index::{ReverseIndex, UsageDetector};
use crate::observability;
use crate::store::{spawn_reflector, KubeStore, ObjectStore};
use crate::translate::{NamespacedTranslator, SuffixTranslator};
use anyhow::{Context as _, Result};
use k8s_openapi::api::core::v1::Secret;
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{api::Api, Client, Config};
use kube_runtime::watcher;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// Initialization result containing all necessary components for the controller
pub struct InitializationResult {
    /// Client for the virtual cluster
    pub virtual_client: Client,
    /// Client for the physical (host) cluster
    pub physical_client: Client,
    /// Reconciliation context shared by every controller
    pub context: Arc<Context>,
    /// Server state for health checks
    pub server_state: Arc<ServerState>,
}

impl std::fmt::Debug for InitializationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InitializationResult")
            .field(
                "server_ready",
                &self
                    .server_state
                    .is_ready
                    .load(std::sync::atomic::Ordering::Relaxed),
            )
            .finish_non_exhaustive()
    }
}

/// Initialize the controller runtime
///
/// This function handles:
/// - rustls crypto provider setup
/// - Tracing subscriber setup
/// - Metrics registration and HTTP server startup
/// - Kubernetes clients for the virtual and physical clusters
/// - Copying missing cert-manager CRDs between the clusters
/// - Sync engine construction
pub async fn initialize() -> Result<InitializationResult> {
    // Required for rustls 0.23+ before any client is built
    rustls::crypto::ring::default_provider()
        .install_default()
        .unwrap_or_else(|_| panic!("Failed to install rustls crypto provider"));

    let config = ControllerConfig::from_env();
    observability::logging::init_logging(&config.log_level, &config.log_format);

    info!("Starting cert mirror controller");
    info!(
        "Build info: timestamp={}, datetime={}, git_hash={}",
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_DATETIME"),
        env!("BUILD_GIT_HASH")
    );
    info!(
        target_namespace = %config.target_namespace,
        name_suffix = %config.name_suffix,
        controller_name = %config.controller_name,
        "configuration loaded"
    );

    observability::metrics::register_metrics()?;

    let server_state = Arc::new(ServerState::default());
    let server_state_clone = Arc::clone(&server_state);
    let server_port = config.metrics_port;
    tokio::spawn(async move {
        if let Err(e) = start_server(server_port, server_state_clone).await {
            error!("HTTP server error: {}", e);
        }
    });

    let virtual_client = client_for(config.virtual_kubeconfig.as_deref())
        .await
        .context("Failed to create virtual cluster client")?;
    let physical_client = client_for(config.physical_kubeconfig.as_deref())
        .await
        .context("Failed to create physical cluster client")?;

    if config.ensure_schemas {
        SchemaProvisioner::new(
            virtual_client.clone(),
            physical_client.clone(),
            config.schema_establish_timeout(),
            Duration::from_millis(SCHEMA_ESTABLISH_POLL_MS),
        )
        .ensure_all(&[CERTIFICATE_CRD, ISSUER_CRD])
        .await
        .context("Failed to provision cert-manager CRDs")?;
    } else {
        info!("CRD provisioning disabled");
    }

    let context = Arc::new(build_context(&virtual_client, &physical_client, config));

    info!("Controller initialized, starting controllers...");

    Ok(InitializationResult {
        virtual_client,
        physical_client,
        context,
        server_state,
    })
}

/// Client from an explicit kubeconfig path, or the inferred config.
pub async fn client_for(kubeconfig: Option<&str>) -> Result<Client> {
    let Some(path) = kubeconfig else {
        return Ok(Client::try_default().await?);
    };
    let kubeconfig = Kubeconfig::read_from(path)
        .with_context(|| format!("Failed to read kubeconfig {path}"))?;
    let config = Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
        .await
        .with_context(|| format!("Failed to load kubeconfig {path}"))?;
    Ok(Client::try_from(config)?)
}

/// Wire stores, indexes and syncers into the shared context.
fn build_context(virtual_client: &Client, physical_client: &Client, config: ControllerConfig) -> Context {
    let virtual_store = Arc::new(KubeStore::new(virtual_client.clone(), "virtual"));
    let physical_store = Arc::new(KubeStore::new(physical_client.clone(), "physical"));
    let translator = NamespacedTranslator::new(
        Arc::new(SuffixTranslator::new(config.name_suffix.clone())),
        config.target_namespace.clone(),
        config.name_suffix.clone(),
    );

    let watcher_config = watcher::Config::default().timeout(config.watch_timeout_secs);
    let index = Arc::new(ReverseIndex::new(
        Arc::new(spawn_reflector(
            Api::<Certificate>::all(virtual_client.clone()),
            watcher_config.clone(),
        )),
        Arc::new(spawn_reflector(
            Api::<Issuer>::all(virtual_client.clone()),
            watcher_config,
        )),
    ));

    let virtual_secrets: Arc<dyn ObjectStore<Secret>> = Arc::clone(&virtual_store) as _;
    let secrets = SecretSyncer::new(
        Arc::clone(&virtual_secrets),
        Arc::clone(&physical_store) as _,
        translator.clone(),
        UsageDetector::new(index),
        OwnershipArbiter::new(config.controller_label.clone(), config.controller_name.clone()),
    );
    let certificates = CertificateSyncer::new(
        Arc::clone(&virtual_store) as _,
        Arc::clone(&physical_store) as _,
        translator.clone(),
    );
    let issuers = IssuerSyncer::new(virtual_store as _, physical_store as _, translator);

    Context::new(
        SyncEngine::new(secrets, certificates, issuers),
        virtual_secrets,
        config,
    )
}
