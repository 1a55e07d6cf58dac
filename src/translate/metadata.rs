//! # Metadata Translation
//!
//! Builds the metadata of a physical object from its virtual counterpart and
//! merges label/annotation changes into an existing physical object.
//!
//! Merging is additive: keys derived from the virtual object overwrite the
//! physical values, keys only present on the physical object are kept.

use super::IdentifierTranslator;
use crate::constants::{EXCLUDED_ANNOTATIONS, MARKER_LABEL, NAMESPACE_ANNOTATION, NAME_ANNOTATION};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::Resource;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Result of comparing translated metadata with a stored physical object
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataUpdate {
    pub changed: bool,
    pub labels: BTreeMap<String, String>,
    pub annotations: BTreeMap<String, String>,
}

/// Translates object identity and metadata into one physical namespace.
#[derive(Debug, Clone)]
pub struct NamespacedTranslator {
    names: Arc<dyn IdentifierTranslator>,
    target_namespace: String,
    marker: String,
}

impl NamespacedTranslator {
    pub fn new(
        names: Arc<dyn IdentifierTranslator>,
        target_namespace: impl Into<String>,
        marker: impl Into<String>,
    ) -> Self {
        Self {
            names,
            target_namespace: target_namespace.into(),
            marker: marker.into(),
        }
    }

    #[must_use]
    pub fn target_namespace(&self) -> &str {
        &self.target_namespace
    }

    /// Value of the marker label stamped on every physical object
    #[must_use]
    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// The underlying name strategy, for spec rewriters
    #[must_use]
    pub fn names(&self) -> &dyn IdentifierTranslator {
        self.names.as_ref()
    }

    #[must_use]
    pub fn physical_name(&self, name: &str, namespace: &str) -> String {
        self.names.physical_name(name, namespace)
    }

    /// Physical name of a virtual object
    pub fn physical_name_of<K: Resource>(&self, virtual_obj: &K) -> String {
        let meta = virtual_obj.meta();
        self.physical_name(
            meta.name.as_deref().unwrap_or_default(),
            meta.namespace.as_deref().unwrap_or_default(),
        )
    }

    /// Copy a virtual object and rewrite its metadata for the physical store.
    ///
    /// Server-populated fields are cleared so the copy can be created as-is.
    pub fn translate_metadata<K: Resource + Clone>(&self, virtual_obj: &K) -> K {
        let mut physical = virtual_obj.clone();
        let virtual_meta = virtual_obj.meta();
        let labels = self.translated_labels(virtual_meta);
        let annotations = self.translated_annotations(virtual_meta);

        *physical.meta_mut() = ObjectMeta {
            name: Some(self.physical_name_of(virtual_obj)),
            namespace: Some(self.target_namespace.clone()),
            labels: Some(labels),
            annotations: Some(annotations),
            ..ObjectMeta::default()
        };
        physical
    }

    /// Compare translated metadata with the stored physical object
    pub fn translate_metadata_update<K: Resource>(
        &self,
        virtual_obj: &K,
        physical_obj: &K,
    ) -> MetadataUpdate {
        let virtual_meta = virtual_obj.meta();
        merge_metadata(
            &self.translated_labels(virtual_meta),
            &self.translated_annotations(virtual_meta),
            physical_obj.meta(),
        )
    }

    #[must_use]
    pub fn translated_labels(&self, virtual_meta: &ObjectMeta) -> BTreeMap<String, String> {
        let mut labels = virtual_meta.labels.clone().unwrap_or_default();
        labels.insert(MARKER_LABEL.to_string(), self.marker.clone());
        labels
    }

    #[must_use]
    pub fn translated_annotations(&self, virtual_meta: &ObjectMeta) -> BTreeMap<String, String> {
        let mut annotations = virtual_meta.annotations.clone().unwrap_or_default();
        annotations.retain(|key, _| !EXCLUDED_ANNOTATIONS.contains(&key.as_str()));
        annotations.insert(
            NAME_ANNOTATION.to_string(),
            virtual_meta.name.clone().unwrap_or_default(),
        );
        annotations.insert(
            NAMESPACE_ANNOTATION.to_string(),
            virtual_meta.namespace.clone().unwrap_or_default(),
        );
        annotations
    }
}

/// Virtual `(namespace, name)` recorded on a physical object, if any
#[must_use]
pub fn virtual_identity(physical_meta: &ObjectMeta) -> Option<(String, String)> {
    let annotations = physical_meta.annotations.as_ref()?;
    let namespace = annotations.get(NAMESPACE_ANNOTATION)?;
    let name = annotations.get(NAME_ANNOTATION)?;
    if namespace.is_empty() || name.is_empty() {
        return None;
    }
    Some((namespace.clone(), name.clone()))
}

/// Overlay target labels/annotations onto a physical object's metadata.
#[must_use]
pub fn merge_metadata(
    target_labels: &BTreeMap<String, String>,
    target_annotations: &BTreeMap<String, String>,
    physical_meta: &ObjectMeta,
) -> MetadataUpdate {
    let current_labels = physical_meta.labels.clone().unwrap_or_default();
    let current_annotations = physical_meta.annotations.clone().unwrap_or_default();

    let mut labels = current_labels.clone();
    labels.extend(target_labels.iter().map(|(k, v)| (k.clone(), v.clone())));
    let mut annotations = current_annotations.clone();
    annotations.extend(target_annotations.iter().map(|(k, v)| (k.clone(), v.clone())));

    MetadataUpdate {
        changed: labels != current_labels || annotations != current_annotations,
        labels,
        annotations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translate::SuffixTranslator;
    use k8s_openapi::api::core::v1::Secret;

    fn translator() -> NamespacedTranslator {
        NamespacedTranslator::new(Arc::new(SuffixTranslator::new("vc1")), "host-ns", "vc1")
    }

    fn map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn virtual_secret() -> Secret {
        Secret {
            metadata: ObjectMeta {
                name: Some("db".to_string()),
                namespace: Some("team1".to_string()),
                uid: Some("abc".to_string()),
                resource_version: Some("7".to_string()),
                labels: Some(map(&[("app", "db")])),
                annotations: Some(map(&[
                    ("note", "hello"),
                    ("kubectl.kubernetes.io/last-applied-configuration", "{}"),
                ])),
                ..ObjectMeta::default()
            },
            ..Secret::default()
        }
    }

    #[test]
    fn test_translate_metadata_rewrites_identity() {
        let physical = translator().translate_metadata(&virtual_secret());
        let meta = physical.metadata;

        assert_eq!(meta.name.as_deref(), Some("db-x-team1-x-vc1"));
        assert_eq!(meta.namespace.as_deref(), Some("host-ns"));
        assert_eq!(meta.uid, None);
        assert_eq!(meta.resource_version, None);

        let labels = meta.labels.unwrap();
        assert_eq!(labels.get("app").map(String::as_str), Some("db"));
        assert_eq!(labels.get(MARKER_LABEL).map(String::as_str), Some("vc1"));

        let annotations = meta.annotations.unwrap();
        assert_eq!(annotations.get("note").map(String::as_str), Some("hello"));
        assert!(!annotations.contains_key("kubectl.kubernetes.io/last-applied-configuration"));
        assert_eq!(annotations.get(NAME_ANNOTATION).map(String::as_str), Some("db"));
        assert_eq!(annotations.get(NAMESPACE_ANNOTATION).map(String::as_str), Some("team1"));
    }

    #[test]
    fn test_virtual_identity_roundtrip() {
        let physical = translator().translate_metadata(&virtual_secret());
        assert_eq!(
            virtual_identity(&physical.metadata),
            Some(("team1".to_string(), "db".to_string()))
        );
        assert_eq!(virtual_identity(&ObjectMeta::default()), None);
    }

    #[test]
    fn test_merge_keeps_unrelated_keys() {
        let physical = ObjectMeta {
            labels: Some(map(&[("app", "db"), ("host-only", "1")])),
            annotations: Some(map(&[("a", "1")])),
            ..ObjectMeta::default()
        };

        let update = merge_metadata(&map(&[("app", "db")]), &map(&[("a", "1")]), &physical);
        assert!(!update.changed);

        let update = merge_metadata(&map(&[("app", "web")]), &map(&[]), &physical);
        assert!(update.changed);
        assert_eq!(update.labels, map(&[("app", "web"), ("host-only", "1")]));
        assert_eq!(update.annotations, map(&[("a", "1")]));
    }

    #[test]
    fn test_merge_on_bare_metadata() {
        let update = merge_metadata(&BTreeMap::new(), &BTreeMap::new(), &ObjectMeta::default());
        assert!(!update.changed);

        let update = merge_metadata(&map(&[("k", "v")]), &BTreeMap::new(), &ObjectMeta::default());
        assert!(update.changed);
    }
}
