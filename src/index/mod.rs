//! # Reverse-Dependency Index
//!
//! Answers "which dependents reference this secret?" for the two dependent
//! kinds, Certificates and Issuers.
//!
//! Edges are never stored: each lookup lists the dependents of the secret's
//! namespace from the backing lister (a reflector cache at runtime) and
//! re-extracts their secret references, so the answer always matches what
//! the store currently holds.

mod usage;

pub use usage::UsageDetector;

use crate::constants::{INDEX_BY_CERTIFICATE_SECRET, INDEX_BY_ISSUER_SECRET};
use crate::crd::{Certificate, Issuer};
use crate::store::{ObjectLister, StoreError};
use k8s_openapi::api::core::v1::Secret;
use kube::ResourceExt;
use kube_runtime::reflector::ObjectRef;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("malformed secret key {0:?}, expected namespace/name")]
    MalformedKey(String),

    #[error("index {index} query failed: {source}")]
    Store {
        index: &'static str,
        #[source]
        source: StoreError,
    },
}

/// The closed set of kinds that can depend on a secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DependentKind {
    Certificate,
    Issuer,
}

impl DependentKind {
    pub const ALL: [DependentKind; 2] = [DependentKind::Certificate, DependentKind::Issuer];

    #[must_use]
    pub fn index_name(self) -> &'static str {
        match self {
            DependentKind::Certificate => INDEX_BY_CERTIFICATE_SECRET,
            DependentKind::Issuer => INDEX_BY_ISSUER_SECRET,
        }
    }
}

impl fmt::Display for DependentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DependentKind::Certificate => f.write_str("Certificate"),
            DependentKind::Issuer => f.write_str("Issuer"),
        }
    }
}

/// A borrowed dependent object, tagged with its kind.
#[derive(Debug, Clone, Copy)]
pub enum Dependent<'a> {
    Certificate(&'a Certificate),
    Issuer(&'a Issuer),
}

impl Dependent<'_> {
    #[must_use]
    pub fn kind(&self) -> DependentKind {
        match self {
            Dependent::Certificate(_) => DependentKind::Certificate,
            Dependent::Issuer(_) => DependentKind::Issuer,
        }
    }

    /// Secret identities (`namespace/name`) this dependent references
    #[must_use]
    pub fn secret_keys(&self) -> Vec<String> {
        match self {
            Dependent::Certificate(cert) => secret_names_from_certificate(cert),
            Dependent::Issuer(issuer) => secret_names_from_issuer(issuer),
        }
    }
}

fn push_key(keys: &mut Vec<String>, namespace: &str, name: &str) {
    if !name.is_empty() {
        keys.push(format!("{namespace}/{name}"));
    }
}

/// Keystore password secrets of a certificate: JKS first, then PKCS#12.
///
/// `spec.secretName` is not included; that secret is produced by the
/// issuer in the physical cluster, not mirrored from the virtual one.
#[must_use]
pub fn secret_names_from_certificate(cert: &Certificate) -> Vec<String> {
    let namespace = cert.namespace().unwrap_or_default();
    let mut keys = Vec::new();
    if let Some(keystores) = &cert.spec.keystores {
        if let Some(jks) = &keystores.jks {
            push_key(&mut keys, &namespace, &jks.password_secret_ref.name);
        }
        if let Some(pkcs12) = &keystores.pkcs12 {
            push_key(&mut keys, &namespace, &pkcs12.password_secret_ref.name);
        }
    }
    keys
}

/// Credential secrets of an issuer, one per configured backend block.
#[must_use]
pub fn secret_names_from_issuer(issuer: &Issuer) -> Vec<String> {
    let namespace = issuer.namespace().unwrap_or_default();
    let spec = &issuer.spec;
    let mut keys = Vec::new();
    if let Some(acme) = &spec.acme {
        push_key(&mut keys, &namespace, &acme.private_key_secret_ref.name);
    }
    if let Some(ca) = &spec.ca {
        push_key(&mut keys, &namespace, &ca.secret_name);
    }
    if let Some(token) = spec.vault.as_ref().and_then(|v| v.auth.token_secret_ref.as_ref()) {
        push_key(&mut keys, &namespace, &token.name);
    }
    if let Some(venafi) = &spec.venafi {
        if let Some(tpp) = &venafi.tpp {
            push_key(&mut keys, &namespace, &tpp.credentials_ref.name);
        }
        if let Some(cloud) = &venafi.cloud {
            push_key(&mut keys, &namespace, &cloud.api_token_secret_ref.name);
        }
    }
    keys
}

/// Split a `namespace/name` key. Exactly one `/` is accepted.
pub fn split_key(key: &str) -> Result<(&str, &str), IndexError> {
    let mut parts = key.split('/');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(namespace), Some(name), None) if !namespace.is_empty() && !name.is_empty() => {
            Ok((namespace, name))
        }
        _ => Err(IndexError::MalformedKey(key.to_string())),
    }
}

fn to_secret_refs(keys: Vec<String>) -> Vec<ObjectRef<Secret>> {
    keys.iter()
        .filter_map(|key| match split_key(key) {
            Ok((namespace, name)) => Some(ObjectRef::new(name).within(namespace)),
            Err(e) => {
                tracing::debug!(error = %e, "skipping unmappable secret reference");
                None
            }
        })
        .collect()
}

/// Secrets to requeue when a certificate changes
#[must_use]
pub fn map_certificate(cert: Certificate) -> Vec<ObjectRef<Secret>> {
    to_secret_refs(secret_names_from_certificate(&cert))
}

/// Secrets to requeue when an issuer changes
#[must_use]
pub fn map_issuer(issuer: Issuer) -> Vec<ObjectRef<Secret>> {
    to_secret_refs(secret_names_from_issuer(&issuer))
}

/// Live index over the virtual store's dependents.
#[derive(Clone)]
pub struct ReverseIndex {
    certificates: Arc<dyn ObjectLister<Certificate>>,
    issuers: Arc<dyn ObjectLister<Issuer>>,
}

impl fmt::Debug for ReverseIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReverseIndex").finish_non_exhaustive()
    }
}

impl ReverseIndex {
    pub fn new(
        certificates: Arc<dyn ObjectLister<Certificate>>,
        issuers: Arc<dyn ObjectLister<Issuer>>,
    ) -> Self {
        for kind in DependentKind::ALL {
            tracing::debug!(index = kind.index_name(), dependent = %kind, "registered reverse index");
        }
        Self {
            certificates,
            issuers,
        }
    }

    /// Names of the dependents of `kind` that reference the secret `key`.
    pub async fn lookup(&self, kind: DependentKind, key: &str) -> Result<Vec<String>, IndexError> {
        let (namespace, _) = split_key(key)?;
        let index = kind.index_name();
        let store_err = |source| IndexError::Store { index, source };

        let matches = match kind {
            DependentKind::Certificate => self
                .certificates
                .list(namespace)
                .await
                .map_err(store_err)?
                .iter()
                .filter(|cert| references(Dependent::Certificate(cert), key))
                .map(ResourceExt::name_any)
                .collect(),
            DependentKind::Issuer => self
                .issuers
                .list(namespace)
                .await
                .map_err(store_err)?
                .iter()
                .filter(|issuer| references(Dependent::Issuer(issuer), key))
                .map(ResourceExt::name_any)
                .collect(),
        };
        Ok(matches)
    }
}

fn references(dependent: Dependent<'_>, key: &str) -> bool {
    dependent.secret_keys().iter().any(|k| k == key)
}
