//! # Sync Engine
//!
//! Single entry point used by the runtime. Dispatches a [`MirrorObject`] to
//! the syncer of its kind and records the outcome.

use super::{
    CertificateSyncer, IssuerSyncer, MirrorKind, MirrorObject, SecretSyncer, SyncError,
    SyncOutcome, Syncer,
};
use crate::observability::metrics;
use std::future::Future;
use std::time::Instant;
use tracing::{debug, warn};

#[derive(Debug)]
pub struct SyncEngine {
    secrets: SecretSyncer,
    certificates: CertificateSyncer,
    issuers: IssuerSyncer,
}

/// Look up the physical counterpart, then sync down or sync.
async fn reconcile_with<S: Syncer>(
    syncer: &S,
    virtual_obj: &S::Object,
) -> Result<SyncOutcome, SyncError> {
    match syncer.physical_of(virtual_obj).await? {
        Some(physical) => syncer.sync(&physical, virtual_obj).await,
        None => syncer.sync_down(virtual_obj).await,
    }
}

async fn observe<F>(kind: MirrorKind, namespace: &str, name: &str, pass: F) -> Result<SyncOutcome, SyncError>
where
    F: Future<Output = Result<SyncOutcome, SyncError>>,
{
    let start = Instant::now();
    let result = pass.await;
    metrics::observe_sync_duration(kind.as_str(), start.elapsed().as_secs_f64());
    match &result {
        Ok(outcome) => {
            metrics::increment_syncs(kind.as_str(), outcome.as_str());
            debug!(
                resource.kind = %kind,
                resource.namespace = %namespace,
                resource.name = %name,
                outcome = %outcome,
                "sync pass finished"
            );
        }
        Err(e) => {
            metrics::increment_sync_errors(kind.as_str());
            warn!(
                resource.kind = %kind,
                resource.namespace = %namespace,
                resource.name = %name,
                error = %e,
                "sync pass failed"
            );
        }
    }
    result
}

impl SyncEngine {
    #[must_use]
    pub fn new(secrets: SecretSyncer, certificates: CertificateSyncer, issuers: IssuerSyncer) -> Self {
        Self {
            secrets,
            certificates,
            issuers,
        }
    }

    /// One full pass for a virtual object.
    pub async fn reconcile(&self, virtual_obj: &MirrorObject) -> Result<SyncOutcome, SyncError> {
        let (namespace, name) = (virtual_obj.namespace(), virtual_obj.name());
        let pass = async {
            match virtual_obj {
                MirrorObject::Secret(v) => reconcile_with(&self.secrets, v).await,
                MirrorObject::Certificate(v) => reconcile_with(&self.certificates, v).await,
                MirrorObject::Issuer(v) => reconcile_with(&self.issuers, v).await,
            }
        };
        observe(virtual_obj.kind(), &namespace, &name, pass).await
    }

    pub async fn sync_down(&self, virtual_obj: &MirrorObject) -> Result<SyncOutcome, SyncError> {
        let (namespace, name) = (virtual_obj.namespace(), virtual_obj.name());
        let pass = async {
            match virtual_obj {
                MirrorObject::Secret(v) => self.secrets.sync_down(v).await,
                MirrorObject::Certificate(v) => self.certificates.sync_down(v).await,
                MirrorObject::Issuer(v) => self.issuers.sync_down(v).await,
            }
        };
        observe(virtual_obj.kind(), &namespace, &name, pass).await
    }

    /// Steady-state pass. Both objects must be of the same kind.
    pub async fn sync(
        &self,
        physical: &MirrorObject,
        virtual_obj: &MirrorObject,
    ) -> Result<SyncOutcome, SyncError> {
        let (namespace, name) = (virtual_obj.namespace(), virtual_obj.name());
        let pass = async {
            match (physical, virtual_obj) {
                (MirrorObject::Secret(p), MirrorObject::Secret(v)) => self.secrets.sync(p, v).await,
                (MirrorObject::Certificate(p), MirrorObject::Certificate(v)) => {
                    self.certificates.sync(p, v).await
                }
                (MirrorObject::Issuer(p), MirrorObject::Issuer(v)) => self.issuers.sync(p, v).await,
                (p, v) => Err(SyncError::KindMismatch {
                    expected: v.kind(),
                    found: p.kind(),
                }),
            }
        };
        observe(virtual_obj.kind(), &namespace, &name, pass).await
    }

    pub async fn sync_up(&self, physical: &MirrorObject) -> Result<SyncOutcome, SyncError> {
        let (namespace, name) = (physical.namespace(), physical.name());
        let pass = async {
            match physical {
                MirrorObject::Secret(p) => self.secrets.sync_up(p).await,
                MirrorObject::Certificate(p) => self.certificates.sync_up(p).await,
                MirrorObject::Issuer(p) => self.issuers.sync_up(p).await,
            }
        };
        observe(physical.kind(), &namespace, &name, pass).await
    }
}
