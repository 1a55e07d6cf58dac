//! # Secret Syncer
//!
//! Secrets are shared: several Certificates and Issuers may reference the
//! same one, and other controllers may mirror it too. Every pass first asks
//! the usage detector and the ownership arbiter whether this controller may
//! touch the secret at all, and only mirrors it when the answer is `Proceed`.

use super::{SyncError, SyncOutcome, Syncer};
use crate::controller::ownership::{decide, Decision, OwnershipArbiter};
use crate::index::UsageDetector;
use crate::observability::metrics;
use crate::store::ObjectStore;
use crate::translate::NamespacedTranslator;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use kube::ResourceExt;
use std::sync::Arc;
use tracing::{debug, info};

pub struct SecretSyncer {
    virtual_store: Arc<dyn ObjectStore<Secret>>,
    physical_store: Arc<dyn ObjectStore<Secret>>,
    translator: NamespacedTranslator,
    usage: UsageDetector,
    arbiter: OwnershipArbiter,
}

impl std::fmt::Debug for SecretSyncer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretSyncer")
            .field("translator", &self.translator)
            .field("arbiter", &self.arbiter)
            .finish_non_exhaustive()
    }
}

impl SecretSyncer {
    pub fn new(
        virtual_store: Arc<dyn ObjectStore<Secret>>,
        physical_store: Arc<dyn ObjectStore<Secret>>,
        translator: NamespacedTranslator,
        usage: UsageDetector,
        arbiter: OwnershipArbiter,
    ) -> Self {
        Self {
            virtual_store,
            physical_store,
            translator,
            usage,
            arbiter,
        }
    }

    /// Resolve usage and ownership. `Some(outcome)` ends the pass.
    async fn arbitrate(&self, virtual_obj: &Secret) -> Result<Option<SyncOutcome>, SyncError> {
        let namespace = virtual_obj.namespace().unwrap_or_default();
        let name = virtual_obj.name_any();
        let used = self.usage.is_used(&namespace, &name).await?;
        let ownership = self.arbiter.ownership_of(virtual_obj.metadata.labels.as_ref());
        let decision = decide(&ownership, used);

        debug!(
            resource.namespace = %namespace,
            resource.name = %name,
            used,
            ownership = %ownership,
            decision = decision.as_str(),
            "secret ownership resolved"
        );

        match decision {
            Decision::Proceed => Ok(None),
            Decision::Idle => Ok(Some(SyncOutcome::Unchanged)),
            Decision::Defer => Ok(Some(SyncOutcome::Deferred)),
            Decision::Claim => {
                let mut claimed = virtual_obj.clone();
                self.arbiter.claim(&mut claimed.metadata.labels);
                self.virtual_store.update(&claimed).await?;
                metrics::increment_ownership_transitions(decision.as_str());
                info!(
                    resource.namespace = %namespace,
                    resource.name = %name,
                    controller = self.arbiter.controller_name(),
                    "claimed secret"
                );
                Ok(Some(SyncOutcome::Claimed))
            }
            Decision::Relinquish => {
                let mut released = virtual_obj.clone();
                if self.arbiter.relinquish(&mut released.metadata.labels) {
                    self.virtual_store.update(&released).await?;
                    metrics::increment_ownership_transitions(decision.as_str());
                    info!(
                        resource.namespace = %namespace,
                        resource.name = %name,
                        "secret no longer referenced, released ownership"
                    );
                }
                Ok(Some(SyncOutcome::Relinquished))
            }
        }
    }

    /// The physical copy of a virtual secret
    #[must_use]
    pub fn translate(&self, virtual_obj: &Secret) -> Secret {
        let mut physical = self.translator.translate_metadata(virtual_obj);
        physical.data.clone_from(&virtual_obj.data);
        physical.type_.clone_from(&virtual_obj.type_);
        physical.string_data = None;
        physical.immutable = None;
        physical
    }
}

#[async_trait]
impl Syncer for SecretSyncer {
    type Object = Secret;

    async fn physical_of(&self, virtual_obj: &Secret) -> Result<Option<Secret>, SyncError> {
        let name = self.translator.physical_name_of(virtual_obj);
        Ok(self
            .physical_store
            .get(self.translator.target_namespace(), &name)
            .await?)
    }

    async fn sync_down(&self, virtual_obj: &Secret) -> Result<SyncOutcome, SyncError> {
        if let Some(outcome) = self.arbitrate(virtual_obj).await? {
            return Ok(outcome);
        }
        let physical = self.translate(virtual_obj);
        self.physical_store.create(&physical).await?;
        info!(
            resource.namespace = %virtual_obj.namespace().unwrap_or_default(),
            resource.name = %virtual_obj.name_any(),
            physical.name = %physical.name_any(),
            "created physical secret"
        );
        Ok(SyncOutcome::Created)
    }

    async fn sync(&self, physical: &Secret, virtual_obj: &Secret) -> Result<SyncOutcome, SyncError> {
        if let Some(outcome) = self.arbitrate(virtual_obj).await? {
            return Ok(outcome);
        }

        let metadata = self
            .translator
            .translate_metadata_update(virtual_obj, physical);
        if !metadata.changed
            && physical.data == virtual_obj.data
            && physical.type_ == virtual_obj.type_
        {
            return Ok(SyncOutcome::Unchanged);
        }

        let mut updated = physical.clone();
        updated.metadata.labels = Some(metadata.labels);
        updated.metadata.annotations = Some(metadata.annotations);
        updated.data.clone_from(&virtual_obj.data);
        updated.type_.clone_from(&virtual_obj.type_);
        self.physical_store.update(&updated).await?;
        info!(
            resource.namespace = %virtual_obj.namespace().unwrap_or_default(),
            resource.name = %virtual_obj.name_any(),
            physical.name = %physical.name_any(),
            "updated physical secret"
        );
        Ok(SyncOutcome::Updated)
    }

    async fn sync_up(&self, physical: &Secret) -> Result<SyncOutcome, SyncError> {
        // Secrets only ever flow virtual -> physical.
        debug!(physical.name = %physical.name_any(), "ignoring physical-only secret");
        Ok(SyncOutcome::Unchanged)
    }
}
