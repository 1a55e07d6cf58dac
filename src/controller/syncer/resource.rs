//! # Status-First Resource Syncer
//!
//! Certificates and Issuers are owned by a single virtual object each, so no
//! ownership arbitration applies. Their physical copies are where cert-manager
//! actually runs, which makes the physical status the source of truth.
//!
//! A `sync` pass does exactly one of:
//! 1. copy the physical status onto the virtual object, if the two differ
//! 2. otherwise update the physical object, if its metadata or rewritten spec differ
//! 3. otherwise nothing

use super::{Mirrored, SyncError, SyncOutcome, Syncer};
use crate::store::ObjectStore;
use crate::translate::{IdentifierTranslator, NamespacedTranslator};
use async_trait::async_trait;
use kube::core::object::{HasSpec, HasStatus};
use kube::ResourceExt;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, info};

/// A mirrored kind with a spec that references other namespaced objects and
/// a status reported back from the physical side.
pub trait StatusMirrored:
    Mirrored
    + HasSpec<Spec: Clone + PartialEq + Send + Sync>
    + HasStatus<Status: Clone + Default + PartialEq + Send + Sync>
{
    /// The physical spec of this (virtual) object
    fn rewrite_spec(&self, names: &dyn IdentifierTranslator) -> <Self as HasSpec>::Spec;
}

pub struct ResourceSyncer<K: Send + Sync> {
    virtual_store: Arc<dyn ObjectStore<K>>,
    physical_store: Arc<dyn ObjectStore<K>>,
    translator: NamespacedTranslator,
    _kind: PhantomData<fn() -> K>,
}

impl<K: StatusMirrored> std::fmt::Debug for ResourceSyncer<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceSyncer")
            .field("kind", &K::KIND)
            .field("translator", &self.translator)
            .finish_non_exhaustive()
    }
}

impl<K: StatusMirrored> ResourceSyncer<K> {
    pub fn new(
        virtual_store: Arc<dyn ObjectStore<K>>,
        physical_store: Arc<dyn ObjectStore<K>>,
        translator: NamespacedTranslator,
    ) -> Self {
        Self {
            virtual_store,
            physical_store,
            translator,
            _kind: PhantomData,
        }
    }

    /// Physical copy of a virtual object: translated metadata, rewritten
    /// spec, no status.
    #[must_use]
    pub fn translate(&self, virtual_obj: &K) -> K {
        let mut physical = self.translator.translate_metadata(virtual_obj);
        *physical.spec_mut() = virtual_obj.rewrite_spec(self.translator.names());
        *physical.status_mut() = None;
        physical
    }

    /// Absent and empty statuses compare equal.
    fn status_differs(physical: &K, virtual_obj: &K) -> bool {
        let physical_status = physical.status().cloned().unwrap_or_default();
        let virtual_status = virtual_obj.status().cloned().unwrap_or_default();
        physical_status != virtual_status
    }

    async fn translate_update(
        &self,
        physical: &K,
        virtual_obj: &K,
    ) -> Result<SyncOutcome, SyncError> {
        let metadata = self
            .translator
            .translate_metadata_update(virtual_obj, physical);
        let spec = virtual_obj.rewrite_spec(self.translator.names());
        if !metadata.changed && &spec == physical.spec() {
            return Ok(SyncOutcome::Unchanged);
        }

        let mut updated = physical.clone();
        updated.meta_mut().labels = Some(metadata.labels);
        updated.meta_mut().annotations = Some(metadata.annotations);
        *updated.spec_mut() = spec;
        self.physical_store.update(&updated).await?;
        info!(
            resource.kind = %K::KIND,
            resource.namespace = %virtual_obj.namespace().unwrap_or_default(),
            resource.name = %virtual_obj.name_any(),
            physical.name = %physical.name_any(),
            "updated physical object"
        );
        Ok(SyncOutcome::Updated)
    }
}

#[async_trait]
impl<K: StatusMirrored> Syncer for ResourceSyncer<K> {
    type Object = K;

    async fn physical_of(&self, virtual_obj: &K) -> Result<Option<K>, SyncError> {
        let name = self.translator.physical_name_of(virtual_obj);
        Ok(self
            .physical_store
            .get(self.translator.target_namespace(), &name)
            .await?)
    }

    async fn sync_down(&self, virtual_obj: &K) -> Result<SyncOutcome, SyncError> {
        let physical = self.translate(virtual_obj);
        self.physical_store.create(&physical).await?;
        info!(
            resource.kind = %K::KIND,
            resource.namespace = %virtual_obj.namespace().unwrap_or_default(),
            resource.name = %virtual_obj.name_any(),
            physical.name = %physical.name_any(),
            "created physical object"
        );
        Ok(SyncOutcome::Created)
    }

    async fn sync(&self, physical: &K, virtual_obj: &K) -> Result<SyncOutcome, SyncError> {
        if Self::status_differs(physical, virtual_obj) {
            let mut updated = virtual_obj.clone();
            *updated.status_mut() = physical.status().cloned();
            self.virtual_store.update_status(&updated).await?;
            debug!(
                resource.kind = %K::KIND,
                resource.namespace = %virtual_obj.namespace().unwrap_or_default(),
                resource.name = %virtual_obj.name_any(),
                "propagated physical status"
            );
            return Ok(SyncOutcome::StatusPropagated);
        }

        self.translate_update(physical, virtual_obj).await
    }
}
