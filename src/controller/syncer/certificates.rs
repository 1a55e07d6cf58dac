use super::resource::{ResourceSyncer, StatusMirrored};
use crate::crd::{Certificate, CertificateSpec};
use crate::translate::{rewrite_certificate_spec, IdentifierTranslator};
use kube::ResourceExt;

pub type CertificateSyncer = ResourceSyncer<Certificate>;

impl StatusMirrored for Certificate {
    fn rewrite_spec(&self, names: &dyn IdentifierTranslator) -> CertificateSpec {
        rewrite_certificate_spec(&self.spec, &self.namespace().unwrap_or_default(), names)
    }
}
