//! # Kubernetes Store
//!
//! [`ObjectStore`] and [`ObjectLister`] over a live `kube::Client`. One
//! instance serves every kind; the API handle is built per call.

use super::{identity_of, ObjectLister, ObjectStore, StoreError};
use crate::constants::FIELD_MANAGER;
use async_trait::async_trait;
use k8s_openapi::NamespaceResourceScope;
use kube::api::{Api, ListParams, Patch, PatchParams, PostParams};
use kube::{Client, Resource};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;

#[derive(Clone)]
pub struct KubeStore {
    client: Client,
    cluster: &'static str,
}

impl std::fmt::Debug for KubeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeStore")
            .field("cluster", &self.cluster)
            .finish_non_exhaustive()
    }
}

impl KubeStore {
    /// `cluster` is only used for logging ("virtual" / "physical")
    #[must_use]
    pub fn new(client: Client, cluster: &'static str) -> Self {
        Self { client, cluster }
    }

    #[must_use]
    pub fn client(&self) -> &Client {
        &self.client
    }

    fn api<K>(&self, namespace: &str) -> Api<K>
    where
        K: Resource<DynamicType = (), Scope = NamespaceResourceScope>,
    {
        Api::namespaced(self.client.clone(), namespace)
    }
}

fn post_params() -> PostParams {
    PostParams {
        field_manager: Some(FIELD_MANAGER.to_string()),
        ..PostParams::default()
    }
}

#[async_trait]
impl<K> ObjectStore<K> for KubeStore
where
    K: Resource<DynamicType = (), Scope = NamespaceResourceScope>
        + Clone
        + Debug
        + Serialize
        + DeserializeOwned
        + Send
        + Sync
        + 'static,
{
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<K>, StoreError> {
        Ok(self.api::<K>(namespace).get_opt(name).await?)
    }

    async fn create(&self, obj: &K) -> Result<K, StoreError> {
        let (namespace, name) = identity_of(obj)?;
        tracing::debug!(
            cluster = self.cluster,
            resource.kind = %K::kind(&()),
            resource.namespace = %namespace,
            resource.name = %name,
            "store.create"
        );
        Ok(self.api::<K>(&namespace).create(&post_params(), obj).await?)
    }

    async fn update(&self, obj: &K) -> Result<K, StoreError> {
        let (namespace, name) = identity_of(obj)?;
        tracing::debug!(
            cluster = self.cluster,
            resource.kind = %K::kind(&()),
            resource.namespace = %namespace,
            resource.name = %name,
            "store.update"
        );
        Ok(self
            .api::<K>(&namespace)
            .replace(&name, &post_params(), obj)
            .await?)
    }

    async fn update_status(&self, obj: &K) -> Result<K, StoreError> {
        let (namespace, name) = identity_of(obj)?;
        let value = serde_json::to_value(obj).map_err(|source| StoreError::Encode {
            kind: K::kind(&()).to_string(),
            source,
        })?;
        // Merge patch with explicit nulls so fields cleared upstream are cleared here too.
        let status = value
            .get("status")
            .cloned()
            .unwrap_or(serde_json::Value::Null);
        let patch = serde_json::json!({ "status": status });
        Ok(self
            .api::<K>(&namespace)
            .patch_status(
                &name,
                &PatchParams::apply(FIELD_MANAGER),
                &Patch::Merge(&patch),
            )
            .await?)
    }
}

#[async_trait]
impl<K> ObjectLister<K> for KubeStore
where
    K: Resource<DynamicType = (), Scope = NamespaceResourceScope>
        + Clone
        + Debug
        + DeserializeOwned
        + Send
        + Sync
        + 'static,
{
    async fn list(&self, namespace: &str) -> Result<Vec<K>, StoreError> {
        let list = self
            .api::<K>(namespace)
            .list(&ListParams::default())
            .await?;
        Ok(list.items)
    }
}
