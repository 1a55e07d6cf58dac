//! Common fixtures for the sync scenario tests
//!
//! Every scenario runs against in-memory stores for both clusters, wired
//! exactly the way the runtime wires the Kubernetes-backed stores.

#![allow(dead_code, reason = "not every test binary uses every fixture")]

use async_trait::async_trait;
use cert_mirror_controller::constants::DEFAULT_CONTROLLER_LABEL;
use cert_mirror_controller::controller::ownership::OwnershipArbiter;
use cert_mirror_controller::controller::syncer::{
    CertificateSyncer, IssuerSyncer, SecretSyncer, SyncEngine,
};
use cert_mirror_controller::crd::{
    CaIssuer, Certificate, CertificateSpec, Issuer, IssuerReference, IssuerSpec, JksKeystore,
    Keystores, Pkcs12Keystore, SecretKeySelector,
};
use cert_mirror_controller::index::{ReverseIndex, UsageDetector};
use cert_mirror_controller::store::{MemoryStore, ObjectLister, StoreError};
use cert_mirror_controller::translate::{IdentifierTranslator, NamespacedTranslator, SuffixTranslator};
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::ByteString;
use kube::api::ObjectMeta;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::sync::Arc;

pub const SUFFIX: &str = "vc1";
pub const TARGET_NAMESPACE: &str = "host-ns";
pub const CONTROLLER: &str = "cert-manager-plugin";

/// Both clusters plus an engine over them
pub struct Harness {
    pub virtual_secrets: Arc<MemoryStore<Secret>>,
    pub physical_secrets: Arc<MemoryStore<Secret>>,
    pub virtual_certificates: Arc<MemoryStore<Certificate>>,
    pub physical_certificates: Arc<MemoryStore<Certificate>>,
    pub virtual_issuers: Arc<MemoryStore<Issuer>>,
    pub physical_issuers: Arc<MemoryStore<Issuer>>,
    pub engine: SyncEngine,
}

impl Harness {
    pub fn new() -> Self {
        let virtual_secrets: Arc<MemoryStore<Secret>> = Arc::new(MemoryStore::new());
        let physical_secrets: Arc<MemoryStore<Secret>> = Arc::new(MemoryStore::new());
        let virtual_certificates: Arc<MemoryStore<Certificate>> = Arc::new(MemoryStore::new());
        let physical_certificates: Arc<MemoryStore<Certificate>> = Arc::new(MemoryStore::new());
        let virtual_issuers: Arc<MemoryStore<Issuer>> = Arc::new(MemoryStore::new());
        let physical_issuers: Arc<MemoryStore<Issuer>> = Arc::new(MemoryStore::new());

        let secrets = secret_syncer(
            CONTROLLER,
            &virtual_secrets,
            &physical_secrets,
            Arc::clone(&virtual_certificates) as _,
            Arc::clone(&virtual_issuers) as _,
        );
        let certificates = CertificateSyncer::new(
            Arc::clone(&virtual_certificates) as _,
            Arc::clone(&physical_certificates) as _,
            translator(),
        );
        let issuers = IssuerSyncer::new(
            Arc::clone(&virtual_issuers) as _,
            Arc::clone(&physical_issuers) as _,
            translator(),
        );

        Self {
            virtual_secrets,
            physical_secrets,
            virtual_certificates,
            physical_certificates,
            virtual_issuers,
            physical_issuers,
            engine: SyncEngine::new(secrets, certificates, issuers),
        }
    }

    /// Writes recorded by any store so far
    pub fn total_mutations(&self) -> usize {
        self.virtual_secrets.mutation_count()
            + self.physical_secrets.mutation_count()
            + self.virtual_certificates.mutation_count()
            + self.physical_certificates.mutation_count()
            + self.virtual_issuers.mutation_count()
            + self.physical_issuers.mutation_count()
    }

    pub fn clear_mutations(&self) {
        self.virtual_secrets.clear_mutations();
        self.physical_secrets.clear_mutations();
        self.virtual_certificates.clear_mutations();
        self.physical_certificates.clear_mutations();
        self.virtual_issuers.clear_mutations();
        self.physical_issuers.clear_mutations();
    }
}

pub fn translator() -> NamespacedTranslator {
    NamespacedTranslator::new(Arc::new(SuffixTranslator::new(SUFFIX)), TARGET_NAMESPACE, SUFFIX)
}

/// Physical name the default translator assigns to a virtual object
pub fn physical_name(name: &str, namespace: &str) -> String {
    SuffixTranslator::new(SUFFIX).physical_name(name, namespace)
}

/// A secret syncer acting as `controller_name`, using the given dependents
/// for usage detection
pub fn secret_syncer(
    controller_name: &str,
    virtual_secrets: &Arc<MemoryStore<Secret>>,
    physical_secrets: &Arc<MemoryStore<Secret>>,
    certificates: Arc<dyn ObjectLister<Certificate>>,
    issuers: Arc<dyn ObjectLister<Issuer>>,
) -> SecretSyncer {
    let index = Arc::new(ReverseIndex::new(certificates, issuers));
    SecretSyncer::new(
        Arc::clone(virtual_secrets) as _,
        Arc::clone(physical_secrets) as _,
        translator(),
        UsageDetector::new(index),
        OwnershipArbiter::new(DEFAULT_CONTROLLER_LABEL, controller_name),
    )
}

/// Lister whose every query fails
#[derive(Debug)]
pub struct BrokenLister;

#[async_trait]
impl<K: Send + Sync + 'static> ObjectLister<K> for BrokenLister {
    async fn list(&self, _namespace: &str) -> Result<Vec<K>, StoreError> {
        Err(StoreError::Backend("index unavailable".to_string()))
    }
}

fn meta(namespace: &str, name: &str) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.to_string()),
        namespace: Some(namespace.to_string()),
        ..ObjectMeta::default()
    }
}

pub fn secret(namespace: &str, name: &str, value: &str) -> Secret {
    Secret {
        metadata: meta(namespace, name),
        type_: Some("Opaque".to_string()),
        data: Some(BTreeMap::from([(
            "password".to_string(),
            ByteString(value.as_bytes().to_vec()),
        )])),
        ..Secret::default()
    }
}

/// Secret carrying the ownership label set to `owner`
pub fn owned_secret(namespace: &str, name: &str, owner: &str) -> Secret {
    let mut obj = secret(namespace, name, "hunter2");
    obj.metadata.labels = Some(BTreeMap::from([(
        DEFAULT_CONTROLLER_LABEL.to_string(),
        owner.to_string(),
    )]));
    obj
}

pub fn ownership_label(obj: &Secret) -> Option<String> {
    obj.metadata
        .labels
        .as_ref()
        .and_then(|labels| labels.get(DEFAULT_CONTROLLER_LABEL))
        .cloned()
}

pub fn certificate(namespace: &str, name: &str, issuer: &str, secret_name: &str) -> Certificate {
    Certificate {
        metadata: meta(namespace, name),
        spec: CertificateSpec {
            secret_name: secret_name.to_string(),
            issuer_ref: IssuerReference {
                name: issuer.to_string(),
                kind: "Issuer".to_string(),
                group: "cert-manager.io".to_string(),
                ..IssuerReference::default()
            },
            dns_names: vec!["example.com".to_string()],
            ..CertificateSpec::default()
        },
        status: None,
    }
}

fn password_ref(name: &str) -> SecretKeySelector {
    SecretKeySelector {
        name: name.to_string(),
        key: Some("password".to_string()),
        ..SecretKeySelector::default()
    }
}

/// Certificate whose JKS keystore password lives in `password_secret`
pub fn jks_certificate(namespace: &str, name: &str, password_secret: &str) -> Certificate {
    let mut cert = certificate(namespace, name, "iss-a", &format!("{name}-tls"));
    cert.spec.keystores = Some(Keystores {
        jks: Some(JksKeystore {
            create: true,
            password_secret_ref: password_ref(password_secret),
            ..JksKeystore::default()
        }),
        ..Keystores::default()
    });
    cert
}

/// Certificate with both keystores
pub fn keystore_certificate(namespace: &str, name: &str, jks: &str, pkcs12: &str) -> Certificate {
    let mut cert = jks_certificate(namespace, name, jks);
    if let Some(keystores) = cert.spec.keystores.as_mut() {
        keystores.pkcs12 = Some(Pkcs12Keystore {
            create: true,
            password_secret_ref: password_ref(pkcs12),
            ..Pkcs12Keystore::default()
        });
    }
    cert
}

pub fn ca_issuer(namespace: &str, name: &str, ca_secret: &str) -> Issuer {
    Issuer {
        metadata: meta(namespace, name),
        spec: IssuerSpec {
            ca: Some(CaIssuer {
                secret_name: ca_secret.to_string(),
                ..CaIssuer::default()
            }),
            ..IssuerSpec::default()
        },
        status: None,
    }
}

/// Parse a manifest the way a user would apply it to the virtual cluster
pub fn from_manifest<K: DeserializeOwned>(yaml: &str) -> K {
    serde_yaml::from_str(yaml).expect("fixture manifest parses")
}
