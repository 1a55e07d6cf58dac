//! # Spec Rewriters
//!
//! Produce the physical spec of a mirrored object by translating every
//! embedded reference to a namespaced object. Rewriting is conditional on
//! field presence and never touches anything else, so the same function
//! serves both creation and steady-state diffing. Fields outside the typed
//! model travel in each struct's `extra` map and are copied untouched.

use super::IdentifierTranslator;
use crate::constants::ISSUER_KIND;
use crate::crd::{CertificateSpec, IssuerSpec};

/// Rewrite a virtual Certificate spec for the physical store.
///
/// Translated: `secretName`, `issuerRef.name` when the kind is `Issuer`, and
/// the JKS / PKCS#12 password secret references.
#[must_use]
pub fn rewrite_certificate_spec(
    spec: &CertificateSpec,
    namespace: &str,
    names: &dyn IdentifierTranslator,
) -> CertificateSpec {
    let mut spec = spec.clone();

    if !spec.secret_name.is_empty() {
        spec.secret_name = names.physical_name(&spec.secret_name, namespace);
    }

    // ClusterIssuer references pass through: there is no per-namespace
    // physical copy to point at.
    if spec.issuer_ref.kind == ISSUER_KIND {
        spec.issuer_ref.name = names.physical_name(&spec.issuer_ref.name, namespace);
    }

    if let Some(keystores) = spec.keystores.as_mut() {
        if let Some(jks) = keystores.jks.as_mut() {
            jks.password_secret_ref.name =
                names.physical_name(&jks.password_secret_ref.name, namespace);
        }
        if let Some(pkcs12) = keystores.pkcs12.as_mut() {
            pkcs12.password_secret_ref.name =
                names.physical_name(&pkcs12.password_secret_ref.name, namespace);
        }
    }

    spec
}

/// Rewrite a virtual Issuer spec for the physical store.
///
/// Every secret reference the reverse index extracts from an Issuer is
/// translated here, so a mirrored Issuer points at mirrored secrets.
#[must_use]
pub fn rewrite_issuer_spec(
    spec: &IssuerSpec,
    namespace: &str,
    names: &dyn IdentifierTranslator,
) -> IssuerSpec {
    let mut spec = spec.clone();
    let translate = |name: &mut String| {
        if !name.is_empty() {
            *name = names.physical_name(name, namespace);
        }
    };

    if let Some(acme) = spec.acme.as_mut() {
        translate(&mut acme.private_key_secret_ref.name);
    }
    if let Some(ca) = spec.ca.as_mut() {
        translate(&mut ca.secret_name);
    }
    if let Some(token) = spec
        .vault
        .as_mut()
        .and_then(|vault| vault.auth.token_secret_ref.as_mut())
    {
        translate(&mut token.name);
    }
    if let Some(venafi) = spec.venafi.as_mut() {
        if let Some(tpp) = venafi.tpp.as_mut() {
            translate(&mut tpp.credentials_ref.name);
        }
        if let Some(cloud) = venafi.cloud.as_mut() {
            translate(&mut cloud.api_token_secret_ref.name);
        }
    }

    spec
}
