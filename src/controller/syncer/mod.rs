//! # Syncers
//!
//! Per-kind reconciliation entry points and the engine that dispatches to them.
//!
//! - `secrets`: shared Secrets, gated by usage and the ownership label
//! - `resource`: status-first mirroring shared by Certificates and Issuers
//! - `certificates` / `issuers`: the per-kind spec rewriting for `resource`
//! - `engine`: kind dispatch, physical lookup, metrics
//!
//! Syncers never retry and never cache; each pass re-reads what it needs
//! and either returns an outcome or the first error it hit.

mod certificates;
mod engine;
mod issuers;
mod resource;
mod secrets;

pub use certificates::CertificateSyncer;
pub use engine::SyncEngine;
pub use issuers::IssuerSyncer;
pub use resource::{ResourceSyncer, StatusMirrored};
pub use secrets::SecretSyncer;

use crate::crd::{Certificate, Issuer};
use crate::index::IndexError;
use crate::store::StoreError;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use kube::{Resource, ResourceExt};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MirrorKind {
    Secret,
    Certificate,
    Issuer,
}

impl MirrorKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            MirrorKind::Secret => "Secret",
            MirrorKind::Certificate => "Certificate",
            MirrorKind::Issuer => "Issuer",
        }
    }
}

impl fmt::Display for MirrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Any object the engine can mirror.
#[derive(Debug, Clone, PartialEq)]
pub enum MirrorObject {
    Secret(Secret),
    Certificate(Certificate),
    Issuer(Issuer),
}

impl MirrorObject {
    #[must_use]
    pub fn kind(&self) -> MirrorKind {
        match self {
            MirrorObject::Secret(_) => MirrorKind::Secret,
            MirrorObject::Certificate(_) => MirrorKind::Certificate,
            MirrorObject::Issuer(_) => MirrorKind::Issuer,
        }
    }

    #[must_use]
    pub fn namespace(&self) -> String {
        match self {
            MirrorObject::Secret(o) => o.namespace(),
            MirrorObject::Certificate(o) => o.namespace(),
            MirrorObject::Issuer(o) => o.namespace(),
        }
        .unwrap_or_default()
    }

    #[must_use]
    pub fn name(&self) -> String {
        match self {
            MirrorObject::Secret(o) => o.name_any(),
            MirrorObject::Certificate(o) => o.name_any(),
            MirrorObject::Issuer(o) => o.name_any(),
        }
    }
}

/// A kind the engine knows how to mirror.
pub trait Mirrored:
    Resource<DynamicType = ()> + Clone + fmt::Debug + PartialEq + Send + Sync + 'static
{
    const KIND: MirrorKind;

    fn into_mirror(self) -> MirrorObject;
}

impl Mirrored for Secret {
    const KIND: MirrorKind = MirrorKind::Secret;

    fn into_mirror(self) -> MirrorObject {
        MirrorObject::Secret(self)
    }
}

impl Mirrored for Certificate {
    const KIND: MirrorKind = MirrorKind::Certificate;

    fn into_mirror(self) -> MirrorObject {
        MirrorObject::Certificate(self)
    }
}

impl Mirrored for Issuer {
    const KIND: MirrorKind = MirrorKind::Issuer;

    fn into_mirror(self) -> MirrorObject {
        MirrorObject::Issuer(self)
    }
}

/// What a pass did. Everything except `Deferred` and `Unchanged` wrote to a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Created,
    Updated,
    StatusPropagated,
    Claimed,
    Relinquished,
    Deferred,
    Unchanged,
}

impl SyncOutcome {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SyncOutcome::Created => "created",
            SyncOutcome::Updated => "updated",
            SyncOutcome::StatusPropagated => "status_propagated",
            SyncOutcome::Claimed => "claimed",
            SyncOutcome::Relinquished => "relinquished",
            SyncOutcome::Deferred => "deferred",
            SyncOutcome::Unchanged => "unchanged",
        }
    }
}

impl fmt::Display for SyncOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("kind mismatch: expected {expected}, got {found}")]
    KindMismatch {
        expected: MirrorKind,
        found: MirrorKind,
    },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Index(#[from] IndexError),
}

#[async_trait]
pub trait Syncer: Send + Sync {
    type Object: Mirrored;

    /// Read the current physical counterpart of a virtual object.
    async fn physical_of(
        &self,
        virtual_obj: &Self::Object,
    ) -> Result<Option<Self::Object>, SyncError>;

    /// The virtual object has no physical counterpart yet.
    async fn sync_down(&self, virtual_obj: &Self::Object) -> Result<SyncOutcome, SyncError>;

    /// Steady state: both sides exist.
    async fn sync(
        &self,
        physical: &Self::Object,
        virtual_obj: &Self::Object,
    ) -> Result<SyncOutcome, SyncError>;

    /// A physical object without a virtual counterpart.
    async fn sync_up(&self, _physical: &Self::Object) -> Result<SyncOutcome, SyncError> {
        Ok(SyncOutcome::Unchanged)
    }
}
