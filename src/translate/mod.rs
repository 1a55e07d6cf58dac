//! # Translation
//!
//! Virtual → physical translation primitives.
//!
//! - [`IdentifierTranslator`]: pure `(name, namespace) → physical name` strategy
//! - `metadata`: namespaced metadata translation and the metadata merger
//! - `spec`: per-kind spec rewriters for cross-references

pub mod metadata;
pub mod spec;

pub use metadata::{merge_metadata, virtual_identity, MetadataUpdate, NamespacedTranslator};
pub use spec::{rewrite_certificate_spec, rewrite_issuer_spec};

use crate::constants::MAX_NAME_LENGTH;
use sha2::{Digest, Sha256};

/// Maps a virtual `(name, namespace)` pair to the name used in the physical namespace.
///
/// Implementations must be pure and deterministic: the same input always
/// yields the same output, and distinct pairs must not collide within one
/// physical namespace.
pub trait IdentifierTranslator: Send + Sync + std::fmt::Debug {
    fn physical_name(&self, name: &str, namespace: &str) -> String;
}

/// Default translator: `name-x-namespace-x-suffix`, hashed down to 63 characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuffixTranslator {
    suffix: String,
}

impl SuffixTranslator {
    pub fn new(suffix: impl Into<String>) -> Self {
        Self {
            suffix: suffix.into(),
        }
    }
}

impl IdentifierTranslator for SuffixTranslator {
    fn physical_name(&self, name: &str, namespace: &str) -> String {
        if name.is_empty() {
            return String::new();
        }
        safe_concat_name(&[name, "x", namespace, "x", &self.suffix])
    }
}

/// Join parts with `-`; names over 63 characters keep a 52 character prefix
/// followed by the first 10 hex characters of the SHA-256 of the full name.
#[must_use]
pub fn safe_concat_name(parts: &[&str]) -> String {
    let full = parts.join("-");
    if full.len() <= MAX_NAME_LENGTH {
        return full;
    }

    let digest = format!("{:x}", Sha256::digest(full.as_bytes()));
    // Names are ASCII in practice; fall back to a char boundary if they are not.
    let mut cut = 52;
    while !full.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}-{}", &full[..cut], &digest[..10]).replace(".-", "-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_physical_name_short() {
        let translator = SuffixTranslator::new("vc1");
        assert_eq!(translator.physical_name("tls-a", "team1"), "tls-a-x-team1-x-vc1");
    }

    #[test]
    fn test_physical_name_empty_stays_empty() {
        let translator = SuffixTranslator::new("vc1");
        assert_eq!(translator.physical_name("", "team1"), "");
    }

    #[test]
    fn test_physical_name_is_deterministic_and_bounded() {
        let translator = SuffixTranslator::new("my-virtual-cluster");
        let name = "a-very-long-certificate-secret-name-that-keeps-going";
        let first = translator.physical_name(name, "some-long-namespace");
        let second = translator.physical_name(name, "some-long-namespace");

        assert_eq!(first, second);
        assert_eq!(first.len(), 63);
        assert!(first.starts_with("a-very-long-certificate-secret-name-that-keeps-going"));
    }

    #[test]
    fn test_physical_name_distinguishes_namespaces() {
        let translator = SuffixTranslator::new("vc1");
        assert_ne!(
            translator.physical_name("tls", "team1"),
            translator.physical_name("tls", "team2")
        );

        let long = "x".repeat(70);
        assert_ne!(
            translator.physical_name(&long, "team1"),
            translator.physical_name(&long, "team2")
        );
    }

    #[test]
    fn test_safe_concat_collapses_dot_dash() {
        let name = format!("{}.", "a".repeat(51));
        let result = safe_concat_name(&[&name, "x", "ns", "x", "vc"]);
        assert!(!result.contains(".-"));
    }
}
