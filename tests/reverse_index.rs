//! # Reverse Index Tests
//!
//! Secret references extracted from dependents, and the live lookups and
//! requeue mappings built on them.

mod common;

use cert_mirror_controller::crd::{Certificate, Issuer};
use cert_mirror_controller::index::{
    map_certificate, map_issuer, secret_names_from_certificate, secret_names_from_issuer,
    DependentKind, ReverseIndex, UsageDetector,
};
use cert_mirror_controller::store::MemoryStore;
use common::*;
use std::collections::BTreeSet;
use std::sync::Arc;

#[test]
fn test_certificate_keystore_secrets() {
    let cert = keystore_certificate("ns", "store", "s1", "s2");
    let keys: BTreeSet<String> = secret_names_from_certificate(&cert).into_iter().collect();
    assert_eq!(
        keys,
        BTreeSet::from(["ns/s1".to_string(), "ns/s2".to_string()])
    );
}

#[test]
fn test_certificate_output_secret_is_not_a_reference() {
    let cert = certificate("ns", "plain", "iss-a", "tls-plain");
    assert!(secret_names_from_certificate(&cert).is_empty());
}

#[test]
fn test_ca_issuer_secret() {
    let issuer = ca_issuer("ns", "ca-issuer", "ca1");
    assert_eq!(secret_names_from_issuer(&issuer), vec!["ns/ca1".to_string()]);
}

#[test]
fn test_requeue_mapping_targets_referenced_secrets() {
    let refs = map_certificate(keystore_certificate("ns", "store", "s1", "s2"));
    let names: Vec<_> = refs.iter().map(|r| (r.namespace.clone(), r.name.clone())).collect();
    assert_eq!(
        names,
        vec![
            (Some("ns".to_string()), "s1".to_string()),
            (Some("ns".to_string()), "s2".to_string()),
        ]
    );

    let refs = map_issuer(ca_issuer("ns", "ca-issuer", "ca1"));
    assert_eq!(refs.len(), 1);
    assert_eq!(refs[0].name, "ca1");
}

#[tokio::test]
async fn test_lookup_reflects_current_dependents() {
    let certificates: Arc<MemoryStore<Certificate>> = Arc::new(MemoryStore::new());
    let issuers: Arc<MemoryStore<Issuer>> = Arc::new(MemoryStore::new());
    certificates.insert(jks_certificate("ns", "a", "shared"));
    certificates.insert(jks_certificate("ns", "b", "shared"));
    certificates.insert(jks_certificate("other", "c", "shared"));
    issuers.insert(ca_issuer("ns", "ca-issuer", "ca1"));

    let index = Arc::new(ReverseIndex::new(
        Arc::clone(&certificates) as _,
        Arc::clone(&issuers) as _,
    ));

    let found = index
        .lookup(DependentKind::Certificate, "ns/shared")
        .await
        .unwrap();
    assert_eq!(found, vec!["a".to_string(), "b".to_string()]);
    assert!(index
        .lookup(DependentKind::Issuer, "ns/shared")
        .await
        .unwrap()
        .is_empty());

    // No persisted copy: a removed dependent disappears from the next lookup
    certificates.remove("ns", "a");
    let found = index
        .lookup(DependentKind::Certificate, "ns/shared")
        .await
        .unwrap();
    assert_eq!(found, vec!["b".to_string()]);

    let usage = UsageDetector::new(index);
    assert!(usage.is_used("ns", "ca1").await.unwrap());
    assert!(usage.is_used("other", "shared").await.unwrap());
    assert!(!usage.is_used("ns", "ca2").await.unwrap());
}

#[tokio::test]
async fn test_usage_detector_surfaces_index_failure() {
    let index = Arc::new(ReverseIndex::new(Arc::new(BrokenLister), Arc::new(BrokenLister)));
    let usage = UsageDetector::new(index);
    assert!(usage.is_used("ns", "s1").await.is_err());
}
