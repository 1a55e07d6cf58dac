//! # Issuer Sync Tests

mod common;

use cert_mirror_controller::controller::syncer::{MirrorObject, SyncOutcome};
use cert_mirror_controller::crd::{
    AcmeIssuer, Condition, Issuer, IssuerStatus, LocalObjectReference, SecretKeySelector,
    VenafiIssuer, VenafiTpp,
};
use cert_mirror_controller::store::MutationKind;
use common::*;

async fn pass(harness: &Harness, namespace: &str, name: &str) -> SyncOutcome {
    let current = harness
        .virtual_issuers
        .snapshot(namespace, name)
        .expect("virtual issuer exists");
    harness
        .engine
        .reconcile(&MirrorObject::Issuer(current))
        .await
        .expect("pass succeeds")
}

fn physical(harness: &Harness, namespace: &str, name: &str) -> Issuer {
    harness
        .physical_issuers
        .snapshot(TARGET_NAMESPACE, &physical_name(name, namespace))
        .expect("physical issuer exists")
}

#[tokio::test]
async fn test_ca_issuer_points_at_mirrored_secret() {
    let harness = Harness::new();
    harness.virtual_issuers.insert(ca_issuer("team1", "ca-issuer", "ca1"));

    assert_eq!(pass(&harness, "team1", "ca-issuer").await, SyncOutcome::Created);
    let created = physical(&harness, "team1", "ca-issuer");
    assert_eq!(created.spec.ca.unwrap().secret_name, physical_name("ca1", "team1"));

    harness.clear_mutations();
    assert_eq!(pass(&harness, "team1", "ca-issuer").await, SyncOutcome::Unchanged);
    assert_eq!(harness.total_mutations(), 0);
}

#[tokio::test]
async fn test_acme_and_venafi_references_are_translated() {
    let harness = Harness::new();
    let mut issuer = ca_issuer("team1", "mixed", "");
    issuer.spec.ca = None;
    issuer.spec.acme = Some(AcmeIssuer {
        server: "https://acme.example.com/directory".to_string(),
        email: Some("ops@example.com".to_string()),
        private_key_secret_ref: SecretKeySelector {
            name: "acme-key".to_string(),
            ..SecretKeySelector::default()
        },
        ..AcmeIssuer::default()
    });
    issuer.spec.venafi = Some(VenafiIssuer {
        zone: "devops\\certs".to_string(),
        tpp: Some(VenafiTpp {
            url: "https://tpp.example.com/vedsdk".to_string(),
            credentials_ref: LocalObjectReference {
                name: "tpp-creds".to_string(),
                ..LocalObjectReference::default()
            },
            ..VenafiTpp::default()
        }),
        ..VenafiIssuer::default()
    });
    harness.virtual_issuers.insert(issuer);

    pass(&harness, "team1", "mixed").await;

    let created = physical(&harness, "team1", "mixed");
    assert_eq!(
        created.spec.acme.unwrap().private_key_secret_ref.name,
        physical_name("acme-key", "team1")
    );
    let venafi = created.spec.venafi.unwrap();
    assert_eq!(venafi.zone, "devops\\certs");
    assert_eq!(
        venafi.tpp.unwrap().credentials_ref.name,
        physical_name("tpp-creds", "team1")
    );
}

#[tokio::test]
async fn test_issuer_status_is_propagated_up() {
    let harness = Harness::new();
    harness.virtual_issuers.insert(ca_issuer("team1", "ca-issuer", "ca1"));
    pass(&harness, "team1", "ca-issuer").await;

    let status = IssuerStatus {
        conditions: vec![Condition {
            type_: "Ready".to_string(),
            status: "True".to_string(),
            reason: Some("KeyPairVerified".to_string()),
            ..Condition::default()
        }],
        acme: None,
    };
    let mut ready = physical(&harness, "team1", "ca-issuer");
    ready.status = Some(status.clone());
    harness.physical_issuers.insert(ready);
    harness.clear_mutations();

    assert_eq!(
        pass(&harness, "team1", "ca-issuer").await,
        SyncOutcome::StatusPropagated
    );
    assert_eq!(
        harness.virtual_issuers.mutations()[0].kind,
        MutationKind::UpdateStatus
    );
    let virtual_obj = harness.virtual_issuers.snapshot("team1", "ca-issuer").unwrap();
    assert_eq!(virtual_obj.status, Some(status));

    harness.clear_mutations();
    assert_eq!(pass(&harness, "team1", "ca-issuer").await, SyncOutcome::Unchanged);
    assert_eq!(harness.total_mutations(), 0);
}

#[tokio::test]
async fn test_empty_physical_status_matches_missing_virtual_status() {
    let harness = Harness::new();
    harness.virtual_issuers.insert(ca_issuer("team1", "ca-issuer", "ca1"));
    pass(&harness, "team1", "ca-issuer").await;

    let mut empty = physical(&harness, "team1", "ca-issuer");
    empty.status = Some(IssuerStatus::default());
    harness.physical_issuers.insert(empty);
    harness.clear_mutations();

    assert_eq!(pass(&harness, "team1", "ca-issuer").await, SyncOutcome::Unchanged);
    assert_eq!(harness.total_mutations(), 0);
}

#[tokio::test]
async fn test_acme_manifest_keeps_solvers_and_account_binding() {
    let harness = Harness::new();
    let manifest: Issuer = from_manifest(include_str!("fixtures/acme-issuer.yaml"));
    let solvers = serde_json::to_value(&manifest.spec).unwrap()["acme"]["solvers"].clone();
    assert_eq!(solvers.as_array().map(Vec::len), Some(2));
    harness.virtual_issuers.insert(manifest);

    assert_eq!(pass(&harness, "team1", "letsencrypt").await, SyncOutcome::Created);

    let created = physical(&harness, "team1", "letsencrypt");
    let acme = &serde_json::to_value(&created.spec).unwrap()["acme"];
    assert_eq!(
        acme["privateKeySecretRef"]["name"],
        physical_name("letsencrypt-account", "team1")
    );
    assert_eq!(acme["solvers"], solvers);
    assert_eq!(acme["preferredChain"], "ISRG Root X1");
    assert_eq!(acme["externalAccountBinding"]["keyID"], "kid-1");
    assert_eq!(acme["email"], "ops@example.com");

    harness.clear_mutations();
    assert_eq!(pass(&harness, "team1", "letsencrypt").await, SyncOutcome::Unchanged);
    assert_eq!(harness.total_mutations(), 0);

    // Drop the DNS solver in the virtual cluster
    let mut edited = harness.virtual_issuers.snapshot("team1", "letsencrypt").unwrap();
    if let Some(acme) = edited.spec.acme.as_mut() {
        acme.extra.insert(
            "solvers".to_string(),
            serde_json::json!([{ "http01": { "ingress": { "ingressClassName": "nginx" } } }]),
        );
    }
    harness.virtual_issuers.insert(edited);

    harness.clear_mutations();
    assert_eq!(pass(&harness, "team1", "letsencrypt").await, SyncOutcome::Updated);
    let updated = physical(&harness, "team1", "letsencrypt");
    let acme = &serde_json::to_value(&updated.spec).unwrap()["acme"];
    assert_eq!(acme["solvers"].as_array().map(Vec::len), Some(1));
    assert_eq!(acme["externalAccountBinding"]["keyID"], "kid-1");

    harness.clear_mutations();
    assert_eq!(pass(&harness, "team1", "letsencrypt").await, SyncOutcome::Unchanged);
    assert_eq!(harness.total_mutations(), 0);
}
