//! # Custom Resource Definitions
//!
//! cert-manager resource types mirrored by the controller.
//!
//! Only the fields the controller reads, rewrites or compares are modelled.
//! Every type derives `PartialEq` so a "semantic deep equal" is plain `==`.
//!
//! ## Module Structure
//!
//! - `common.rs` - References and conditions shared by both kinds
//! - `certificate.rs` - `Certificate` (cert-manager.io/v1)
//! - `issuer.rs` - `Issuer` (cert-manager.io/v1)

mod certificate;
mod common;
mod issuer;

pub use certificate::{
    Certificate, CertificatePrivateKey, CertificateSpec, CertificateStatus, JksKeystore,
    Keystores, Pkcs12Keystore, SecretTemplate,
};
pub use common::{Condition, IssuerReference, LocalObjectReference, SecretKeySelector};
pub use issuer::{
    AcmeIssuer, AcmeIssuerStatus, CaIssuer, Issuer, IssuerSpec, IssuerStatus, SelfSignedIssuer,
    VaultAuth, VaultIssuer, VenafiCloud, VenafiIssuer, VenafiTpp,
};
