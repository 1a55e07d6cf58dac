//! # Controllers
//!
//! One kube-runtime controller per mirrored kind, watching the virtual
//! cluster, plus an up-sync controller over physical secrets.
//!
//! Requeue sources:
//! - the virtual object itself
//! - its physical counterpart, mapped back through the origin annotations
//! - for secrets, every Certificate and Issuer that references them

use super::context::{Context, ReconcilerError};
use super::error_policy::{handle_physical_error, handle_reconciliation_error, resource_key};
use crate::constants::MARKER_LABEL;
use crate::controller::syncer::{Mirrored, SyncError, SyncOutcome};
use crate::crd::{Certificate, Issuer};
use crate::index::{map_certificate, map_issuer};
use crate::observability::metrics;
use crate::translate::virtual_identity;
use futures::StreamExt;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::NamespaceResourceScope;
use kube::api::Api;
use kube::{Client, Resource, ResourceExt};
use kube_runtime::controller::Action;
use kube_runtime::reflector::ObjectRef;
use kube_runtime::watcher::Config as WatcherConfig;
use kube_runtime::Controller;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tracing::{debug, info};

pub type ControllerFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Reconcile one virtual object.
pub async fn reconcile<K: Mirrored>(obj: Arc<K>, ctx: Arc<Context>) -> Result<Action, ReconcilerError> {
    let namespace = obj.namespace().unwrap_or_default();
    let name = obj.name_any();
    if obj.meta().deletion_timestamp.is_some() {
        debug!(resource.kind = %K::KIND, resource.namespace = %namespace, resource.name = %name, "skipping object being deleted");
        return Ok(Action::await_change());
    }

    let outcome = ctx
        .engine
        .reconcile(&obj.as_ref().clone().into_mirror())
        .await?;

    let key = resource_key("virtual", K::KIND.as_str(), &namespace, &name);
    if ctx.reset_backoff(&key) {
        info!(resource = %key, "recovered, backoff reset");
    }

    // A claim only writes the label; run the mirror step right away instead
    // of waiting for the resync.
    if outcome == SyncOutcome::Claimed {
        metrics::increment_requeues("claimed");
        return Ok(Action::requeue(std::time::Duration::from_secs(1)));
    }

    metrics::increment_requeues("resync");
    Ok(Action::requeue(ctx.config.resync_interval()))
}

/// Physical secrets whose virtual counterpart is gone go through `sync_up`.
pub async fn reconcile_physical_secret(
    obj: Arc<Secret>,
    ctx: Arc<Context>,
) -> Result<Action, ReconcilerError> {
    let Some((namespace, name)) = virtual_identity(&obj.metadata) else {
        debug!(physical.name = %obj.name_any(), "physical secret has no origin annotations");
        return Ok(Action::await_change());
    };

    let virtual_obj = ctx
        .virtual_secrets
        .get(&namespace, &name)
        .await
        .map_err(SyncError::from)?;
    if virtual_obj.is_none() {
        ctx.engine
            .sync_up(&obj.as_ref().clone().into_mirror())
            .await?;
    }

    let key = resource_key(
        "physical",
        "Secret",
        &obj.namespace().unwrap_or_default(),
        &obj.name_any(),
    );
    ctx.reset_backoff(&key);
    Ok(Action::await_change())
}

/// Map a physical object back to the virtual object it mirrors.
fn to_virtual<K>(physical: K) -> Option<ObjectRef<K>>
where
    K: Resource<DynamicType = ()>,
{
    let (namespace, name) = virtual_identity(physical.meta())?;
    Some(ObjectRef::new(&name).within(&namespace))
}

fn log_reconcile_result<T: std::fmt::Debug, E: std::fmt::Debug>(
    controller_name: &'static str,
) -> impl Fn(Result<T, E>) -> std::future::Ready<()> {
    move |result| {
        match result {
            Ok(object) => debug!(?object, "{} reconciliation completed", controller_name),
            Err(e) => tracing::error!(error = ?e, "{} reconciliation error", controller_name),
        }
        std::future::ready(())
    }
}

/// Wires the controllers for both clusters.
#[derive(Clone)]
pub struct ControllerSet {
    virtual_client: Client,
    physical_client: Client,
    ctx: Arc<Context>,
}

impl std::fmt::Debug for ControllerSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControllerSet").field("ctx", &self.ctx).finish_non_exhaustive()
    }
}

impl ControllerSet {
    #[must_use]
    pub fn new(virtual_client: Client, physical_client: Client, ctx: Arc<Context>) -> Self {
        Self {
            virtual_client,
            physical_client,
            ctx,
        }
    }

    fn watcher_config(&self) -> WatcherConfig {
        WatcherConfig::default().timeout(self.ctx.config.watch_timeout_secs)
    }

    /// Only objects this controller wrote into the physical namespace.
    fn physical_watcher_config(&self) -> WatcherConfig {
        self.watcher_config()
            .labels(&format!("{MARKER_LABEL}={}", self.ctx.config.name_suffix))
    }

    fn physical_api<K>(&self) -> Api<K>
    where
        K: Resource<DynamicType = (), Scope = NamespaceResourceScope>,
    {
        Api::namespaced(self.physical_client.clone(), &self.ctx.config.target_namespace)
    }

    /// Controller for a kind with no dependents of its own.
    fn resource_controller<K>(&self, name: &'static str) -> ControllerFuture
    where
        K: Mirrored + Resource<Scope = NamespaceResourceScope> + DeserializeOwned,
    {
        let virtual_api: Api<K> = Api::all(self.virtual_client.clone());
        Box::pin(
            Controller::new(virtual_api, self.watcher_config())
                .watches(self.physical_api::<K>(), self.physical_watcher_config(), to_virtual::<K>)
                .shutdown_on_signal()
                .run(reconcile::<K>, handle_reconciliation_error::<K>, Arc::clone(&self.ctx))
                .for_each(log_reconcile_result(name)),
        )
    }

    fn secret_controller(&self) -> ControllerFuture {
        let secrets: Api<Secret> = Api::all(self.virtual_client.clone());
        let certificates: Api<Certificate> = Api::all(self.virtual_client.clone());
        let issuers: Api<Issuer> = Api::all(self.virtual_client.clone());
        Box::pin(
            Controller::new(secrets, self.watcher_config())
                .watches(certificates, self.watcher_config(), map_certificate)
                .watches(issuers, self.watcher_config(), map_issuer)
                .watches(
                    self.physical_api::<Secret>(),
                    self.physical_watcher_config(),
                    to_virtual::<Secret>,
                )
                .shutdown_on_signal()
                .run(
                    reconcile::<Secret>,
                    handle_reconciliation_error::<Secret>,
                    Arc::clone(&self.ctx),
                )
                .for_each(log_reconcile_result("Secret")),
        )
    }

    fn upsync_controller(&self) -> ControllerFuture {
        Box::pin(
            Controller::new(self.physical_api::<Secret>(), self.physical_watcher_config())
                .shutdown_on_signal()
                .run(
                    reconcile_physical_secret,
                    handle_physical_error,
                    Arc::clone(&self.ctx),
                )
                .for_each(log_reconcile_result("PhysicalSecret")),
        )
    }

    #[must_use]
    pub fn build(&self) -> Vec<ControllerFuture> {
        info!("- Secret controller");
        info!("- Certificate controller");
        info!("- Issuer controller");
        info!("- Physical secret controller");
        vec![
            self.secret_controller(),
            self.resource_controller::<Certificate>("Certificate"),
            self.resource_controller::<Issuer>("Issuer"),
            self.upsync_controller(),
        ]
    }
}
