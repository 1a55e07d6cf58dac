use super::resource::{ResourceSyncer, StatusMirrored};
use crate::crd::{Issuer, IssuerSpec};
use crate::translate::{rewrite_issuer_spec, IdentifierTranslator};
use kube::ResourceExt;

pub type IssuerSyncer = ResourceSyncer<Issuer>;

impl StatusMirrored for Issuer {
    fn rewrite_spec(&self, names: &dyn IdentifierTranslator) -> IssuerSpec {
        rewrite_issuer_spec(&self.spec, &self.namespace().unwrap_or_default(), names)
    }
}
